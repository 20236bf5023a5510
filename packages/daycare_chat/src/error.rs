//! Error types for store mutations, composition and outbound sends.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown conversation: {0}")]
    UnknownConversation(String),

    #[error("unknown message {message_id} in conversation {conversation_id}")]
    UnknownMessage {
        conversation_id: String,
        message_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachmentError {
    #[error("file {name} is too large, maximum size is {max_mb}MB")]
    TooLarge { name: String, max_mb: u64 },

    #[error("file {name} type is not supported")]
    UnsupportedType { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("no conversation selected")]
    NoConversation,

    #[error("message is empty")]
    EmptyMessage,

    #[error("no message selected for reaction")]
    NoTargetMessage,

    #[error("reaction emoji is empty")]
    EmptyReaction,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("channel is not connected")]
    NotConnected,

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_like_upload_hints() {
        let err = AttachmentError::TooLarge {
            name: "scan.pdf".into(),
            max_mb: 10,
        };
        assert_eq!(
            err.to_string(),
            "file scan.pdf is too large, maximum size is 10MB"
        );
    }

    #[test]
    fn store_errors_pass_through_compose() {
        let err: ComposeError = StoreError::UnknownConversation("p9".into()).into();
        assert_eq!(err.to_string(), "unknown conversation: p9");
    }
}
