pub mod batch;
pub mod envelope;
pub mod error;
pub mod runner;

pub use batch::MetadataElement;
pub use envelope::{Envelope, EventClass};
pub use error::DbzError;
pub use runner::{DebeziumRunner, RunnerError};
