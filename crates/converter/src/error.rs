use destination::DestinationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("change event references unknown column {0}")]
    UnknownColumn(String),
    #[error("cannot resolve event schema metadata for column {0}")]
    MalformedEventSchema(String),
    #[error("no time representation available to process {0} value")]
    UnknownTimeRepresentation(&'static str),
    #[error("no primary key available to build {0} query for table {1}")]
    NoPrimaryKey(&'static str, String),
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),
    #[error("no valid schema found for '{0}'")]
    SchemaNotFound(String),
    #[error("no valid table found for '{0}'")]
    TableNotFound(String),
    #[error("unsupported ddl: {0}")]
    UnsupportedDdl(String),
    #[error("destination error: {0}")]
    Destination(DestinationError),
    #[error("invalid interval typmod: {0:#x}")]
    InvalidIntervalTypmod(i32),
}

impl From<DestinationError> for ConvertError {
    fn from(err: DestinationError) -> Self {
        match err {
            DestinationError::SchemaNotFound(s) => ConvertError::SchemaNotFound(s),
            DestinationError::TableNotFound(t) => ConvertError::TableNotFound(t),
            other => ConvertError::Destination(other),
        }
    }
}
