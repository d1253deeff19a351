pub mod admin;
pub mod applier;
pub mod error;
pub mod offsets;
pub mod registry;
pub mod state;
pub mod stats;
pub mod worker;

pub use admin::Admin;
pub use applier::Applier;
pub use error::EngineError;
pub use offsets::OlrOffsetStore;
pub use registry::{ConnectorSlot, SharedRegistry};
pub use state::{ConnectorState, Request};
pub use stats::{BatchStatistics, StatKind};
