use destination::DestinationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("destination rejected '{sql}': {source}")]
    Apply {
        sql: String,
        #[source]
        source: DestinationError,
    },
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),
    #[error("a request is already pending for connector '{0}'")]
    RequestBusy(String),
    #[error("unknown connector '{0}'")]
    UnknownConnector(String),
    #[error("no free connector slot available")]
    NoFreeSlot,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("runner error: {0}")]
    Runner(#[from] debezium::RunnerError),
    #[error(transparent)]
    Destination(#[from] DestinationError),
    #[error(transparent)]
    Convert(#[from] converter::ConvertError),
    #[error(transparent)]
    Config(#[from] common::config::ConfigError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<olr::OlrError> for EngineError {
    fn from(err: olr::OlrError) -> Self {
        match err {
            olr::OlrError::Convert(e) => EngineError::Convert(e),
            other => EngineError::Transport(other.to_string()),
        }
    }
}
