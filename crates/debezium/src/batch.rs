use tracing::debug;

/// The metadata element at index 0 of each polled batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataElement {
    /// `B-<batchid>`: start of a batch of change events
    BatchStart(i32),
    /// `K-<success>;<errmsg>`: the runner exited; the message is its last
    /// error or exit notice
    Completion { message: Option<String> },
}

impl MetadataElement {
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(rest) = raw.strip_prefix("B-") {
            return rest.parse().ok().map(MetadataElement::BatchStart);
        }
        if let Some(rest) = raw.strip_prefix("K-") {
            debug!("completion message: {rest}");
            let mut parts = rest.splitn(2, ';');
            let _successflag = parts.next();
            let message = parts
                .next()
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            return Some(MetadataElement::Completion { message });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_start() {
        assert_eq!(
            MetadataElement::parse("B-42"),
            Some(MetadataElement::BatchStart(42))
        );
    }

    #[test]
    fn completion_with_message() {
        assert_eq!(
            MetadataElement::parse("K-false;connection refused"),
            Some(MetadataElement::Completion {
                message: Some("connection refused".to_string())
            })
        );
    }

    #[test]
    fn completion_without_message() {
        assert_eq!(
            MetadataElement::parse("K-true;"),
            Some(MetadataElement::Completion { message: None })
        );
    }

    #[test]
    fn unknown_marker() {
        assert_eq!(MetadataElement::parse("X-1"), None);
        assert_eq!(MetadataElement::parse("B-notanumber"), None);
    }
}
