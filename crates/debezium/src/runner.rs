use async_trait::async_trait;
use thiserror::Error;

use common::config::ConnInfo;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("runner bridge failure: {0}")]
    Bridge(String),
    #[error("runner did not stop within {0} ms")]
    StopTimeout(u64),
    #[error("runner is not running")]
    NotRunning,
}

/// The externally hosted Debezium runner. The production implementation
/// bridges to the embedded JVM (honouring the `DBZ_ENGINE_DIR` override);
/// tests script one in memory.
///
/// `poll_events` returns one batch as an ordered list whose element 0 is a
/// metadata string: `B-<batchid>` opens a batch, `K-<success>;<errmsg>`
/// reports runner exit. An empty list means nothing to process.
#[async_trait]
pub trait DebeziumRunner: Send {
    async fn start(&mut self, conn: &ConnInfo, snapshot_mode: &str) -> Result<(), RunnerError>;

    /// Graceful stop with a bounded wait.
    async fn stop(&mut self, timeout_ms: u64) -> Result<(), RunnerError>;

    async fn poll_events(&mut self) -> Result<Vec<String>, RunnerError>;

    /// Opaque offset blob as last flushed by the runner.
    async fn offset(&mut self) -> Result<String, RunnerError>;

    /// Write an offset through the runner; only meaningful while paused.
    async fn set_offset(&mut self, offset: &str) -> Result<(), RunnerError>;

    /// Let the runner advance its commit cursor past a finished batch.
    async fn mark_batch_complete(&mut self, batch_id: i32) -> Result<(), RunnerError>;

    /// Diagnostic heap/memory summary.
    async fn memory_dump(&mut self) -> Result<String, RunnerError>;
}
