use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use common::config::ConnInfo;
use common::types::ConnectorStage;

use crate::error::EngineError;
use crate::state::{ConnectorState, Request};
use crate::stats::BatchStatistics;

/// Shared per-connector slot. Workers write their own fields under the
/// slot's exclusive lock; administrative reads take the shared lock. The
/// request mailbox holds at most one pending request.
#[derive(Debug, Default)]
pub struct ConnectorSlot {
    pub name: String,
    pub conninfo: Option<ConnInfo>,
    pub state: ConnectorState,
    pub stage: ConnectorStage,
    pub errmsg: Option<String>,
    /// last offset snapshot, for display: the runner blob or the
    /// `scn/c_scn/c_idx` triple rendered as text
    pub offset: Option<String>,
    pub snapshot_mode: String,
    pub stats: BatchStatistics,
    request: Option<Request>,
}

/// Fixed-size registry of connector slots shared between the supervisor
/// and the workers.
#[derive(Clone)]
pub struct SharedRegistry {
    slots: Arc<Vec<RwLock<ConnectorSlot>>>,
}

impl SharedRegistry {
    pub fn new(max_connectors: usize) -> Self {
        let slots = (0..max_connectors)
            .map(|_| RwLock::new(ConnectorSlot::default()))
            .collect();
        Self {
            slots: Arc::new(slots),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Claim a free slot (or the slot already holding this name) and bind
    /// the connector to it.
    pub fn assign(&self, conn: &ConnInfo, snapshot_mode: &str) -> Result<usize, EngineError> {
        // reuse the slot if the connector was registered before
        for (i, slot) in self.slots.iter().enumerate() {
            let mut guard = slot.write();
            if guard.name == conn.name {
                guard.conninfo = Some(conn.clone());
                guard.snapshot_mode = snapshot_mode.to_string();
                return Ok(i);
            }
        }
        for (i, slot) in self.slots.iter().enumerate() {
            let mut guard = slot.write();
            if guard.name.is_empty() {
                guard.name = conn.name.clone();
                guard.conninfo = Some(conn.clone());
                guard.state = ConnectorState::Stopped;
                guard.stage = ConnectorStage::Undef;
                guard.snapshot_mode = snapshot_mode.to_string();
                return Ok(i);
            }
        }
        Err(EngineError::NoFreeSlot)
    }

    pub fn release(&self, id: usize) {
        let mut guard = self.slots[id].write();
        *guard = ConnectorSlot::default();
    }

    pub fn id_by_name(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.read().name == name)
    }

    pub fn state(&self, id: usize) -> ConnectorState {
        self.slots[id].read().state
    }

    pub fn set_state(&self, id: usize, state: ConnectorState) {
        self.slots[id].write().state = state;
    }

    pub fn stage(&self, id: usize) -> ConnectorStage {
        self.slots[id].read().stage
    }

    pub fn set_stage(&self, id: usize, stage: ConnectorStage) {
        self.slots[id].write().stage = stage;
    }

    pub fn set_errmsg(&self, id: usize, msg: Option<String>) {
        self.slots[id].write().errmsg = msg;
    }

    pub fn set_offset(&self, id: usize, offset: String) {
        self.slots[id].write().offset = Some(offset);
    }

    /// Merge one finished batch into the slot's running totals.
    pub fn merge_stats(&self, id: usize, batch: &BatchStatistics) {
        self.slots[id].write().stats.merge_batch(batch);
    }

    pub fn reset_stats(&self, id: usize) {
        self.slots[id].write().stats = BatchStatistics::default();
    }

    /// Submit a request into the single-slot mailbox; a pending request
    /// must be drained first.
    pub fn submit_request(&self, id: usize, request: Request) -> Result<(), EngineError> {
        let mut guard = self.slots[id].write();
        if guard.request.is_some() {
            warn!("connector '{}' already has a pending request", guard.name);
            return Err(EngineError::RequestBusy(guard.name.clone()));
        }
        let current = guard.state;
        if !request.valid_from(current) {
            return Err(EngineError::InvalidTransition(format!(
                "cannot handle {:?} while {}",
                request,
                current.as_str()
            )));
        }
        guard.request = Some(request);
        Ok(())
    }

    /// Drain the mailbox; the worker calls this at batch boundaries.
    pub fn take_request(&self, id: usize) -> Option<Request> {
        self.slots[id].write().request.take()
    }

    /// Snapshot a slot for reporting.
    pub fn snapshot(&self, id: usize) -> SlotSnapshot {
        let guard = self.slots[id].read();
        SlotSnapshot {
            id,
            name: guard.name.clone(),
            state: guard.state,
            stage: guard.stage,
            errmsg: guard.errmsg.clone(),
            offset: guard.offset.clone(),
            stats: guard.stats,
        }
    }

    pub fn snapshots(&self) -> Vec<SlotSnapshot> {
        (0..self.slots.len())
            .map(|id| self.snapshot(id))
            .filter(|s| !s.name.is_empty())
            .collect()
    }

    pub fn conninfo(&self, id: usize) -> Option<ConnInfo> {
        self.slots[id].read().conninfo.clone()
    }

    pub fn snapshot_mode(&self, id: usize) -> String {
        self.slots[id].read().snapshot_mode.clone()
    }
}

/// Read-only view of one slot.
#[derive(Debug, Clone)]
pub struct SlotSnapshot {
    pub id: usize,
    pub name: String,
    pub state: ConnectorState,
    pub stage: ConnectorStage,
    pub errmsg: Option<String>,
    pub offset: Option<String>,
    pub stats: BatchStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::ConnectorKind;

    fn conn(name: &str) -> ConnInfo {
        ConnInfo {
            name: name.into(),
            kind: ConnectorKind::Mysql,
            hostname: "h".into(),
            port: 3306,
            user: "u".into(),
            pwd: "p".into(),
            srcdb: "s".into(),
            dstdb: "d".into(),
            tables: String::new(),
            snapshot_tables: String::new(),
            active: false,
            extra: Default::default(),
            olr: None,
        }
    }

    #[test]
    fn assign_reuses_slot_for_same_name() {
        let reg = SharedRegistry::new(2);
        let a = reg.assign(&conn("a"), "initial").unwrap();
        let again = reg.assign(&conn("a"), "no_data").unwrap();
        assert_eq!(a, again);
        assert_eq!(reg.snapshot_mode(a), "no_data");
    }

    #[test]
    fn slots_are_bounded() {
        let reg = SharedRegistry::new(1);
        reg.assign(&conn("a"), "initial").unwrap();
        assert!(matches!(
            reg.assign(&conn("b"), "initial"),
            Err(EngineError::NoFreeSlot)
        ));
    }

    #[test]
    fn mailbox_holds_one_request() {
        let reg = SharedRegistry::new(1);
        let id = reg.assign(&conn("a"), "initial").unwrap();
        reg.set_state(id, ConnectorState::Syncing);
        reg.submit_request(id, Request::Pause).unwrap();
        assert!(matches!(
            reg.submit_request(id, Request::Pause),
            Err(EngineError::RequestBusy(_))
        ));
        assert_eq!(reg.take_request(id), Some(Request::Pause));
        assert_eq!(reg.take_request(id), None);
    }

    #[test]
    fn invalid_transitions_are_rejected_at_submit() {
        let reg = SharedRegistry::new(1);
        let id = reg.assign(&conn("a"), "initial").unwrap();
        reg.set_state(id, ConnectorState::Paused);
        assert!(matches!(
            reg.submit_request(id, Request::Pause),
            Err(EngineError::InvalidTransition(_))
        ));
        reg.submit_request(id, Request::Resume).unwrap();
    }
}
