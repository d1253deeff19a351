use converter::ConvertError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbzError {
    #[error("malformed change event: {0}")]
    MalformedEvent(String),
    #[error("cannot parse schema section of change event: {0}")]
    MalformedEventSchema(String),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl From<serde_json::Error> for DbzError {
    fn from(err: serde_json::Error) -> Self {
        DbzError::MalformedEvent(err.to_string())
    }
}
