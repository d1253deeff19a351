use std::error::Error as StdError;

use common::error::DiagnosticMessage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("cannot read rule file: {context}")]
    FileError {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    #[error("malformed rule file: {context}")]
    ParseError {
        context: DiagnosticMessage,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    #[error("malformed objmap entry: {context}")]
    ObjmapError { context: DiagnosticMessage },
}

impl RuleError {
    #[track_caller]
    pub fn objmap(message: impl Into<String>) -> Self {
        Self::ObjmapError {
            context: DiagnosticMessage::new(message.into()),
        }
    }
}

impl From<std::io::Error> for RuleError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        let message = err.to_string();
        RuleError::FileError {
            context: DiagnosticMessage::new(message),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for RuleError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        RuleError::ParseError {
            context: DiagnosticMessage::new(message),
            source: Some(Box::new(err)),
        }
    }
}
