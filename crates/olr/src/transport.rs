use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::warn;

use crate::error::OlrError;

/// Byte transport to the replicator. Only the framing above it matters to
/// the client; tests substitute an in-memory implementation.
#[async_trait]
pub trait Transport: Send {
    /// Read whatever is available, waiting at most the poll timeout.
    /// `Ok(None)` means the timeout elapsed with no data; `Ok(Some(vec![]))`
    /// never occurs; a closed peer is an error.
    async fn read_some(&mut self) -> Result<Option<Vec<u8>>, OlrError>;

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), OlrError>;
}

const POLL_TIMEOUT: Duration = Duration::from_secs(2);
const READ_CHUNK: usize = 8192;

/// TCP transport with the 2-second poll the worker loop suspends on.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub async fn connect(host: &str, port: u16) -> Result<Self, OlrError> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_some(&mut self) -> Result<Option<Vec<u8>>, OlrError> {
        let mut chunk = vec![0u8; READ_CHUNK];
        match tokio::time::timeout(POLL_TIMEOUT, self.stream.read(&mut chunk)).await {
            Err(_) => Ok(None),
            Ok(Ok(0)) => {
                warn!("peer disconnected");
                Err(OlrError::Transport("peer disconnected".to_string()))
            }
            Ok(Ok(n)) => {
                chunk.truncate(n);
                Ok(Some(chunk))
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), OlrError> {
        self.stream.write_all(bytes).await?;
        Ok(())
    }
}
