use serde::{Deserialize, Serialize};

use common::config::ConnInfo;

/// Lifecycle states of one connector worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectorState {
    #[default]
    Undef,
    Stopped,
    Initializing,
    Paused,
    Syncing,
    Parsing,
    Converting,
    Executing,
    OffsetUpdate,
    Restarting,
    MemDump,
    SchemaSyncDone,
    ReloadObjmap,
}

impl ConnectorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorState::Undef => "undefined",
            ConnectorState::Stopped => "stopped",
            ConnectorState::Initializing => "initializing",
            ConnectorState::Paused => "paused",
            ConnectorState::Syncing => "polling",
            ConnectorState::Parsing => "parsing",
            ConnectorState::Converting => "converting",
            ConnectorState::Executing => "executing",
            ConnectorState::OffsetUpdate => "updating offset",
            ConnectorState::Restarting => "restarting",
            ConnectorState::MemDump => "dumping memory",
            ConnectorState::SchemaSyncDone => "schema sync",
            ConnectorState::ReloadObjmap => "reloading objmap",
        }
    }
}

/// Administrative request delivered through a connector's single-slot
/// mailbox.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Pause,
    Resume,
    SetOffset(String),
    Restart {
        snapshot_mode: String,
        conninfo: Box<ConnInfo>,
    },
    MemDump,
    ReloadObjmap,
    Stop,
}

impl Request {
    /// Whether the request may be processed while the worker sits in
    /// `current`. `MemDump`, `ReloadObjmap` and `Stop` are valid from any
    /// state; the rest follow the transition table.
    pub fn valid_from(&self, current: ConnectorState) -> bool {
        match self {
            Request::Pause => current == ConnectorState::Syncing,
            Request::Resume => current == ConnectorState::Paused,
            Request::SetOffset(_) => current == ConnectorState::Paused,
            Request::Restart { .. } => current == ConnectorState::Syncing,
            Request::MemDump | Request::ReloadObjmap | Request::Stop => true,
        }
    }
}

/// Worker-internal transition validity: the per-event
/// Syncing/Parsing/Converting/Executing cycle plus the administrative
/// edges. Everything else is rejected.
pub fn transition_allowed(from: ConnectorState, to: ConnectorState) -> bool {
    use ConnectorState::*;
    match (from, to) {
        // normal start
        (Stopped, Initializing) | (Initializing, Syncing) => true,
        // per-event cycle
        (Syncing, Parsing)
        | (Parsing, Converting)
        | (Converting, Executing)
        | (Executing, Syncing)
        | (Parsing, Syncing)
        | (Converting, Syncing)
        | (Executing, Parsing) => true,
        // pause / resume
        (Syncing, Paused) | (Paused, Syncing) => true,
        // offset override
        (Paused, OffsetUpdate) | (OffsetUpdate, Paused) => true,
        // restart with new snapshot mode
        (Syncing, Restarting) | (Restarting, Syncing) | (Restarting, Stopped) => true,
        // schema sync handoff
        (Syncing, SchemaSyncDone) | (SchemaSyncDone, Paused) => true,
        // diagnostics from anywhere, returning to the previous state
        (_, MemDump) | (MemDump, _) => true,
        (_, ReloadObjmap) | (ReloadObjmap, _) => true,
        // teardown
        (_, Stopped) => true,
        _ => false,
    }
}
