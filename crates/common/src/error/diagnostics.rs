use std::{borrow::Cow, fmt, panic::Location};

/// Human-readable error context that records where it was constructed.
///
/// Error enums across the workspace carry one of these instead of a bare
/// string so that configuration and rule-file problems point back at the
/// code path that rejected them.
#[derive(Clone, Debug)]
pub struct DiagnosticMessage {
    message: Cow<'static, str>,
    location: &'static Location<'static>,
}

impl DiagnosticMessage {
    #[track_caller]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at {}:{})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_call_site() {
        let message = DiagnosticMessage::new("bad token");
        let rendered = message.to_string();
        assert!(rendered.starts_with("bad token (at "));
        assert!(rendered.contains("diagnostics.rs"));
    }
}
