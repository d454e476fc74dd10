use thiserror::Error;

/// Errors that can end a single chat exchange.
///
/// None of these mutate the conversation: history is only appended after the
/// upstream call succeeds.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The message was blank and the session holds no attachments.
    #[error("Please enter a message or upload files.")]
    EmptyMessage,

    /// The upstream call failed in a way that may succeed if repeated
    /// (connect failure, timeout, 429, 5xx).
    #[error("{message}")]
    UpstreamTransient { status: Option<u16>, message: String },

    /// The upstream call was rejected or produced an unusable reply.
    #[error("{message}")]
    UpstreamFatal { status: Option<u16>, message: String },

    /// Reading an uploaded file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// `true` when repeating the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChatError::UpstreamTransient { .. })
    }

    /// HTTP status reported by the provider, if the failure came from one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ChatError::UpstreamTransient { status, .. } | ChatError::UpstreamFatal { status, .. } => {
                *status
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_transient_is_retryable() {
        let transient = ChatError::UpstreamTransient { status: Some(503), message: "busy".into() };
        let fatal = ChatError::UpstreamFatal { status: Some(400), message: "bad".into() };
        assert!(transient.is_retryable());
        assert!(!fatal.is_retryable());
        assert!(!ChatError::EmptyMessage.is_retryable());
    }

    #[test]
    fn empty_message_text_is_user_facing() {
        assert_eq!(
            ChatError::EmptyMessage.to_string(),
            "Please enter a message or upload files."
        );
    }

    #[test]
    fn upstream_status_is_exposed() {
        let err = ChatError::UpstreamFatal { status: Some(401), message: "denied".into() };
        assert_eq!(err.upstream_status(), Some(401));
        assert_eq!(ChatError::EmptyMessage.upstream_status(), None);
    }
}
