//! Turns user input into outbound messages and reactions.
//!
//! The composer only validates and builds; applying the result to the
//! stores and handing it to the transport is [`crate::MessagingSession`]'s job.

use chrono::Utc;
use uuid::Uuid;

use crate::attachment::{AttachmentPolicy, PickedFile};
use crate::error::ComposeError;
use crate::model::{Attachment, DeliveryStatus, Message, ParticipantRole, Reaction};
use crate::protocol::ReactionUpdate;

/// The signed-in user on this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    pub id: String,
    pub name: String,
    pub role: ParticipantRole,
}

/// What the user has typed and attached so far.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl Draft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn attachments(attachments: Vec<Attachment>) -> Self {
        Self {
            text: String::new(),
            attachments,
        }
    }

    /// Mirrors the disabled send button: nothing but whitespace and no files.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachments.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Composer {
    me: LocalUser,
    policy: AttachmentPolicy,
}

impl Composer {
    pub fn new(me: LocalUser, policy: AttachmentPolicy) -> Self {
        Self { me, policy }
    }

    pub fn me(&self) -> &LocalUser {
        &self.me
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    /// Build a message for `conversation` (the counterparty id).
    ///
    /// The id is a random UUID, generated here so that the local echo and
    /// any later receipt for it correlate.
    pub fn compose(&self, conversation: Option<&str>, draft: Draft) -> Result<Message, ComposeError> {
        let conversation = conversation.ok_or(ComposeError::NoConversation)?;
        if draft.is_empty() {
            return Err(ComposeError::EmptyMessage);
        }
        Ok(Message {
            id: new_message_id(),
            sender_id: self.me.id.clone(),
            sender_name: self.me.name.clone(),
            sender_avatar: None,
            recipient_id: conversation.to_string(),
            content: draft.text,
            timestamp: Utc::now(),
            read: true,
            attachments: draft.attachments,
            reactions: Vec::new(),
            status: DeliveryStatus::Pending,
        })
    }

    /// Validate picked files and build an attachment-only message.
    pub fn compose_files(
        &self,
        conversation: Option<&str>,
        files: Vec<PickedFile>,
    ) -> Result<Message, ComposeError> {
        if conversation.is_none() {
            return Err(ComposeError::NoConversation);
        }
        let attachments = self.policy.accept(files)?;
        self.compose(conversation, Draft::attachments(attachments))
    }

    pub fn compose_reaction(
        &self,
        conversation: Option<&str>,
        message_id: &str,
        emoji: &str,
    ) -> Result<ReactionUpdate, ComposeError> {
        let conversation = conversation.ok_or(ComposeError::NoConversation)?;
        if message_id.is_empty() {
            return Err(ComposeError::NoTargetMessage);
        }
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(ComposeError::EmptyReaction);
        }
        Ok(ReactionUpdate {
            message_id: message_id.to_string(),
            conversation_id: conversation.to_string(),
            reaction: Reaction {
                emoji: emoji.to_string(),
                user_id: self.me.id.clone(),
                user_name: self.me.name.clone(),
            },
        })
    }
}

pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn composer() -> Composer {
        Composer::new(
            LocalUser {
                id: "user1".into(),
                name: "Me".into(),
                role: ParticipantRole::Parent,
            },
            AttachmentPolicy::default(),
        )
    }

    #[test]
    fn text_message_fields() {
        let msg = composer()
            .compose(Some("provider1"), Draft::text("Hello"))
            .unwrap();
        assert_eq!(msg.content, "Hello");
        assert_eq!(msg.sender_id, "user1");
        assert_eq!(msg.recipient_id, "provider1");
        assert!(msg.read);
        assert_eq!(msg.status, DeliveryStatus::Pending);
    }

    #[test]
    fn blank_text_is_rejected() {
        let c = composer();
        assert_eq!(
            c.compose(Some("provider1"), Draft::text("   \n")).unwrap_err(),
            ComposeError::EmptyMessage
        );
        assert_eq!(
            c.compose(None, Draft::text("hi")).unwrap_err(),
            ComposeError::NoConversation
        );
    }

    #[test]
    fn content_is_sent_as_typed() {
        let msg = composer()
            .compose(Some("provider1"), Draft::text("  spaced  "))
            .unwrap();
        assert_eq!(msg.content, "  spaced  ");
    }

    #[test]
    fn files_only_message() {
        let msg = composer()
            .compose_files(
                Some("provider1"),
                vec![PickedFile {
                    name: "form.pdf".into(),
                    mime_type: "application/pdf".into(),
                    size_bytes: 1024,
                    url: "file:///tmp/form.pdf".into(),
                }],
            )
            .unwrap();
        assert_eq!(msg.content, "");
        assert_eq!(msg.attachments.len(), 1);
    }

    #[test]
    fn invalid_files_are_rejected() {
        let err = composer()
            .compose_files(
                Some("provider1"),
                vec![PickedFile {
                    name: "setup.exe".into(),
                    mime_type: "application/octet-stream".into(),
                    size_bytes: 1,
                    url: "file:///tmp/setup.exe".into(),
                }],
            )
            .unwrap_err();
        assert!(matches!(err, ComposeError::Attachment(_)));
    }

    #[test]
    fn reaction_requires_target() {
        let c = composer();
        assert_eq!(
            c.compose_reaction(None, "m1", "👍").unwrap_err(),
            ComposeError::NoConversation
        );
        assert_eq!(
            c.compose_reaction(Some("provider1"), "", "👍").unwrap_err(),
            ComposeError::NoTargetMessage
        );
        assert_eq!(
            c.compose_reaction(Some("provider1"), "m1", " ").unwrap_err(),
            ComposeError::EmptyReaction
        );
        let update = c.compose_reaction(Some("provider1"), "m1", "👍").unwrap();
        assert_eq!(update.reaction.user_id, "user1");
        assert_eq!(update.conversation_id, "provider1");
    }

    #[test]
    fn ids_do_not_collide_on_rapid_sends() {
        let c = composer();
        let ids: HashSet<String> = (0..500)
            .map(|_| c.compose(Some("provider1"), Draft::text("x")).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 500);
    }
}
