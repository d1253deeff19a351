use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the applier does when a change event fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStrategy {
    /// count the event as bad and continue the batch
    #[default]
    Skip,
    /// tear the worker down
    Exit,
    /// tear down and let the supervisor respawn after a fixed delay
    Retry,
}

/// Whether DML is applied as SQL text or through tuple-level calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmlMode {
    #[default]
    Tuple,
    TextSql,
}

/// Process-wide tunables, the rough equivalent of the original's GUC set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// sleep between empty polls, ms
    pub naptime_ms: u64,
    /// max change events per batch
    pub batch_size: u32,
    /// offset flush interval, ms
    pub offset_flush_interval_ms: u64,
    pub error_strategy: ErrorStrategy,
    pub dml_mode: DmlMode,
    /// dump the raw event alongside any per-event error
    pub log_event_on_error: bool,
    /// directory holding offset and schema-history files
    pub metadata_dir: PathBuf,
    /// number of connector slots in the shared registry
    pub max_connectors: usize,
    /// bounded wait when stopping the runner, ms
    pub runner_stop_timeout_ms: u64,
    /// supervisor delay before respawning a `retry` worker, ms
    pub retry_delay_ms: u64,
    /// OLR read buffer size, bytes
    pub olr_read_buffer_size: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            naptime_ms: 10,
            batch_size: 2048,
            offset_flush_interval_ms: 1000,
            error_strategy: ErrorStrategy::Skip,
            dml_mode: DmlMode::Tuple,
            log_event_on_error: false,
            metadata_dir: PathBuf::from("pg_synchdb"),
            max_connectors: 30,
            runner_stop_timeout_ms: 100_000,
            retry_delay_ms: 5_000,
            olr_read_buffer_size: 64 * 1024 * 1024,
        }
    }
}
