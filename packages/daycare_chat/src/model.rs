//! Conversation and message types shared by the stores, the composer and the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the marketplace a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Provider,
    Parent,
}

impl ParticipantRole {
    /// The role a counterparty has when talking to someone with this role.
    pub fn counterpart(self) -> Self {
        match self {
            Self::Provider => Self::Parent,
            Self::Parent => Self::Provider,
        }
    }
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider => write!(f, "provider"),
            Self::Parent => write!(f, "parent"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    #[default]
    Active,
    Archived,
}

/// The person on the other end of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub role: ParticipantRole,
}

/// A thread between the local user and one counterparty.
///
/// `id` is the counterparty's user id, so inbound traffic can be routed by
/// `senderId` without a lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub participant_id: String,
    pub participant_name: String,
    pub participant_role: ParticipantRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_avatar: Option<String>,
    #[serde(default)]
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daycare_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
    #[serde(default)]
    pub status: ConversationStatus,
}

impl Conversation {
    /// An empty, active conversation with `participant`.
    pub fn with(participant: &Participant, at: DateTime<Utc>) -> Self {
        Self {
            id: participant.id.clone(),
            participant_id: participant.id.clone(),
            participant_name: participant.name.clone(),
            participant_role: participant.role,
            participant_avatar: None,
            last_message: String::new(),
            last_message_time: at,
            unread_count: 0,
            daycare_name: None,
            child_name: None,
            status: ConversationStatus::Active,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.status == ConversationStatus::Archived
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    pub user_id: String,
    pub user_name: String,
}

impl Reaction {
    /// Reactions are unique per `(user, emoji)`; the display name does not count.
    pub fn same_toggle(&self, other: &Reaction) -> bool {
        self.user_id == other.user_id && self.emoji == other.emoji
    }
}

/// Local delivery state of a message. Never sent over the wire.
///
/// Sender copy: `Pending` -> `Acknowledged` (server echo) -> `Read`, or
/// `Failed` when the transport refused the write.
/// Receiver copy: `Delivered` -> `Read`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    Pending,
    Acknowledged,
    #[default]
    Delivered,
    Read,
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Acknowledged => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_avatar: Option<String>,
    pub recipient_id: String,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
    #[serde(skip)]
    pub status: DeliveryStatus,
}

impl Message {
    /// Short text for conversation lists: the body, or the attachment names
    /// when the message carries only files.
    pub fn preview(&self) -> String {
        if !self.content.trim().is_empty() || self.attachments.is_empty() {
            return self.content.clone();
        }
        let names: Vec<&str> = self.attachments.iter().map(|a| a.name.as_str()).collect();
        format!("[attachment] {}", names.join(", "))
    }

    pub fn has_reaction(&self, reaction: &Reaction) -> bool {
        self.reactions.iter().any(|r| r.same_toggle(reaction))
    }
}
