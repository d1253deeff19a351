use serde::{Deserialize, Serialize};

/// Counters maintained per batch and merged into the shared slot at batch
/// commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub ddl: u64,
    pub dml: u64,
    pub read: u64,
    pub create: u64,
    pub update: u64,
    pub delete: u64,
    pub bad_events: u64,
    pub total_events: u64,
    pub batches: u64,
    pub average_batch_size: u64,
    /// timestamps in ms: first/last event at the source, through the
    /// pipeline, and applied at the destination
    pub first_src_ts: u64,
    pub first_pipeline_ts: u64,
    pub first_dst_ts: u64,
    pub last_src_ts: u64,
    pub last_pipeline_ts: u64,
    pub last_dst_ts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Ddl,
    Dml,
    Read,
    Create,
    Update,
    Delete,
    BadEvent,
    TotalEvents,
    BatchCompletion,
}

impl BatchStatistics {
    pub fn increment(&mut self, which: StatKind, by: u64) {
        match which {
            StatKind::Ddl => self.ddl += by,
            StatKind::Dml => self.dml += by,
            StatKind::Read => self.read += by,
            StatKind::Create => self.create += by,
            StatKind::Update => self.update += by,
            StatKind::Delete => self.delete += by,
            StatKind::BadEvent => self.bad_events += by,
            StatKind::TotalEvents => self.total_events += by,
            StatKind::BatchCompletion => self.batches += by,
        }
    }

    /// Fold one finished batch into the running totals kept in the shared
    /// slot.
    pub fn merge_batch(&mut self, batch: &BatchStatistics) {
        self.ddl += batch.ddl;
        self.dml += batch.dml;
        self.read += batch.read;
        self.create += batch.create;
        self.update += batch.update;
        self.delete += batch.delete;
        self.bad_events += batch.bad_events;
        self.total_events += batch.total_events;
        self.batches += batch.batches;
        if self.batches > 0 {
            self.average_batch_size = self.total_events / self.batches;
        }
        if batch.first_src_ts > 0 {
            self.first_src_ts = batch.first_src_ts;
            self.first_pipeline_ts = batch.first_pipeline_ts;
            self.first_dst_ts = batch.first_dst_ts;
        }
        if batch.last_src_ts > 0 {
            self.last_src_ts = batch.last_src_ts;
            self.last_pipeline_ts = batch.last_pipeline_ts;
            self.last_dst_ts = batch.last_dst_ts;
        }
    }

    pub fn mark_first(&mut self, src_ts: u64, pipeline_ts: u64) {
        self.first_src_ts = src_ts;
        self.first_pipeline_ts = pipeline_ts;
        self.first_dst_ts = now_ms();
    }

    pub fn mark_last(&mut self, src_ts: u64, pipeline_ts: u64) {
        self.last_src_ts = src_ts;
        self.last_pipeline_ts = pipeline_ts;
        self.last_dst_ts = now_ms();
    }
}

pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_accumulates_and_averages() {
        let mut totals = BatchStatistics::default();
        let mut batch = BatchStatistics::default();
        batch.increment(StatKind::Dml, 4);
        batch.increment(StatKind::TotalEvents, 4);
        batch.increment(StatKind::BatchCompletion, 1);
        totals.merge_batch(&batch);

        let mut batch2 = BatchStatistics::default();
        batch2.increment(StatKind::Dml, 2);
        batch2.increment(StatKind::TotalEvents, 2);
        batch2.increment(StatKind::BatchCompletion, 1);
        totals.merge_batch(&batch2);

        assert_eq!(totals.dml, 6);
        assert_eq!(totals.batches, 2);
        assert_eq!(totals.average_batch_size, 3);
    }

    #[test]
    fn batch_timestamps_overwrite_totals() {
        let mut totals = BatchStatistics::default();
        let mut batch = BatchStatistics::default();
        batch.mark_first(100, 200);
        batch.mark_last(300, 400);
        totals.merge_batch(&batch);
        assert_eq!(totals.first_src_ts, 100);
        assert_eq!(totals.last_src_ts, 300);
        assert!(totals.last_dst_ts >= totals.first_dst_ts);
    }
}
