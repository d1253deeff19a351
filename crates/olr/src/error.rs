use converter::ConvertError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OlrError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed protobuf message: {0}")]
    Protocol(String),
    #[error("malformed change event: {0}")]
    MalformedEvent(String),
    #[error("unsupported ddl: {0}")]
    UnsupportedDdl(String),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl From<std::io::Error> for OlrError {
    fn from(err: std::io::Error) -> Self {
        OlrError::Transport(err.to_string())
    }
}

impl From<prost::DecodeError> for OlrError {
    fn from(err: prost::DecodeError) -> Self {
        OlrError::Protocol(err.to_string())
    }
}

impl From<serde_json::Error> for OlrError {
    fn from(err: serde_json::Error) -> Self {
        OlrError::MalformedEvent(err.to_string())
    }
}
