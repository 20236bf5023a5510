//! Wire protocol
//!
//! Every frame is a JSON envelope `{"type": ..., "payload": ...}`. Known
//! types map onto [`ChatEvent`]; anything else is kept as an unknown type so
//! the transport can log and drop it without failing the connection.

use serde::{Deserialize, Serialize};

use crate::model::{Message, Reaction};

/// The event types this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewMessage,
    MessageRead,
    MessageReaction,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::NewMessage,
        EventKind::MessageRead,
        EventKind::MessageReaction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewMessage => "new_message",
            Self::MessageRead => "message_read",
            Self::MessageReaction => "message_reaction",
        }
    }

    /// Map a wire `type` string; `None` for types this client does not know.
    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub message_id: String,
    pub conversation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionUpdate {
    pub message_id: String,
    pub conversation_id: String,
    pub reaction: Reaction,
}

/// A decoded event, inbound or outbound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ChatEvent {
    NewMessage(Message),
    MessageRead(ReadReceipt),
    MessageReaction(ReactionUpdate),
}

impl ChatEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::NewMessage(_) => EventKind::NewMessage,
            Self::MessageRead(_) => EventKind::MessageRead,
            Self::MessageReaction(_) => EventKind::MessageReaction,
        }
    }

    /// Decode a payload whose envelope type has already been resolved.
    pub fn decode(kind: EventKind, payload: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            EventKind::NewMessage => Self::NewMessage(serde_json::from_value(payload)?),
            EventKind::MessageRead => Self::MessageRead(serde_json::from_value(payload)?),
            EventKind::MessageReaction => {
                Self::MessageReaction(serde_json::from_value(payload)?)
            }
        })
    }

    /// Serialize into a text frame.
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Envelope as read off the wire, before the type is resolved.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl RawFrame {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn event_kind(&self) -> Option<EventKind> {
        EventKind::from_wire(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_receipt_envelope() {
        let text = r#"{"type":"message_read","payload":{"messageId":"m2","conversationId":"provider1"}}"#;
        let event: ChatEvent = serde_json::from_str(text).unwrap();
        assert_eq!(
            event,
            ChatEvent::MessageRead(ReadReceipt {
                message_id: "m2".into(),
                conversation_id: "provider1".into(),
            })
        );
        assert_eq!(event.kind(), EventKind::MessageRead);
    }

    #[test]
    fn reaction_frame_shape() {
        let event = ChatEvent::MessageReaction(ReactionUpdate {
            message_id: "m1".into(),
            conversation_id: "provider1".into(),
            reaction: Reaction {
                emoji: "👍".into(),
                user_id: "user1".into(),
                user_name: "Me".into(),
            },
        });
        let value: serde_json::Value = serde_json::from_str(&event.to_frame().unwrap()).unwrap();
        assert_eq!(value["type"], "message_reaction");
        assert_eq!(value["payload"]["messageId"], "m1");
        assert_eq!(value["payload"]["reaction"]["userId"], "user1");
    }

    #[test]
    fn raw_frame_keeps_unknown_types() {
        let raw = RawFrame::parse(r#"{"type":"typing","payload":{"userId":"u2"}}"#).unwrap();
        assert_eq!(raw.kind, "typing");
        assert!(raw.event_kind().is_none());
    }

    #[test]
    fn raw_frame_rejects_garbage() {
        assert!(RawFrame::parse("not json").is_err());
        assert!(RawFrame::parse(r#"{"payload":{}}"#).is_err());
    }

    #[test]
    fn decode_by_kind() {
        let payload = serde_json::json!({"messageId": "m1", "conversationId": "c1"});
        let event = ChatEvent::decode(EventKind::MessageRead, payload.clone()).unwrap();
        assert!(matches!(event, ChatEvent::MessageRead(_)));
        assert!(ChatEvent::decode(EventKind::NewMessage, payload).is_err());
    }

    #[test]
    fn wire_names() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_wire(kind.as_str()), Some(kind));
        }
    }
}
