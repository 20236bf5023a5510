use std::collections::HashMap;

use crate::error::StoreError;
use crate::model::{DeliveryStatus, Message, Reaction};

/// Result of a reaction toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Per-conversation message logs.
///
/// Each log keeps arrival order. Entries are never removed or reordered;
/// only `read`, `status` and `reactions` change in place.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    logs: HashMap<String, Vec<Message>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, conversation_id: &str, message: Message) {
        self.logs
            .entry(conversation_id.to_string())
            .or_default()
            .push(message);
    }

    /// Append a message that carries only attachments. The log treats it
    /// like any other message.
    pub fn append_attachments(&mut self, conversation_id: &str, message: Message) {
        debug_assert!(!message.attachments.is_empty());
        self.append(conversation_id, message);
    }

    pub fn messages(&self, conversation_id: &str) -> &[Message] {
        self.logs
            .get(conversation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn find(&self, conversation_id: &str, message_id: &str) -> Option<&Message> {
        self.messages(conversation_id)
            .iter()
            .find(|m| m.id == message_id)
    }

    pub fn contains(&self, conversation_id: &str, message_id: &str) -> bool {
        self.find(conversation_id, message_id).is_some()
    }

    /// Apply a read receipt.
    pub fn mark_read(&mut self, conversation_id: &str, message_id: &str) -> Result<(), StoreError> {
        let msg = self.get_mut(conversation_id, message_id)?;
        msg.read = true;
        msg.status = DeliveryStatus::Read;
        Ok(())
    }

    /// The server echoed one of our messages back: it has it.
    /// A message that is already read stays read.
    pub fn acknowledge(
        &mut self,
        conversation_id: &str,
        message_id: &str,
    ) -> Result<DeliveryStatus, StoreError> {
        let msg = self.get_mut(conversation_id, message_id)?;
        if matches!(msg.status, DeliveryStatus::Pending | DeliveryStatus::Failed) {
            msg.status = DeliveryStatus::Acknowledged;
        }
        Ok(msg.status)
    }

    pub fn set_status(
        &mut self,
        conversation_id: &str,
        message_id: &str,
        status: DeliveryStatus,
    ) -> Result<(), StoreError> {
        self.get_mut(conversation_id, message_id)?.status = status;
        Ok(())
    }

    /// Add `reaction` if its `(user, emoji)` pair is absent, remove it otherwise.
    pub fn toggle_reaction(
        &mut self,
        conversation_id: &str,
        message_id: &str,
        reaction: Reaction,
    ) -> Result<Toggle, StoreError> {
        let msg = self.get_mut(conversation_id, message_id)?;
        match msg.reactions.iter().position(|r| r.same_toggle(&reaction)) {
            Some(idx) => {
                msg.reactions.remove(idx);
                Ok(Toggle::Removed)
            }
            None => {
                msg.reactions.push(reaction);
                Ok(Toggle::Added)
            }
        }
    }

    pub fn conversation_ids(&self) -> impl Iterator<Item = &str> {
        self.logs.keys().map(String::as_str)
    }

    fn get_mut(&mut self, conversation_id: &str, message_id: &str) -> Result<&mut Message, StoreError> {
        self.logs
            .get_mut(conversation_id)
            .and_then(|log| log.iter_mut().find(|m| m.id == message_id))
            .ok_or_else(|| StoreError::UnknownMessage {
                conversation_id: conversation_id.to_string(),
                message_id: message_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attachment, AttachmentKind};

    fn msg(id: &str, at: &str) -> Message {
        Message {
            id: id.into(),
            sender_id: "provider1".into(),
            sender_name: "Sunshine Daycare".into(),
            sender_avatar: None,
            recipient_id: "user1".into(),
            content: format!("body of {id}"),
            timestamp: at.parse().unwrap(),
            read: false,
            attachments: Vec::new(),
            reactions: Vec::new(),
            status: DeliveryStatus::Delivered,
        }
    }

    fn thumbs_up(user: &str) -> Reaction {
        Reaction {
            emoji: "👍".into(),
            user_id: user.into(),
            user_name: user.to_uppercase(),
        }
    }

    #[test]
    fn append_keeps_arrival_order() {
        let mut store = MessageStore::new();
        store.append("c1", msg("m1", "2024-03-15T10:35:00Z"));
        store.append("c1", msg("m2", "2024-03-15T10:30:00Z"));
        let ids: Vec<&str> = store.messages("c1").iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn unknown_conversation_is_empty() {
        let store = MessageStore::new();
        assert!(store.messages("nope").is_empty());
    }

    #[test]
    fn mark_read_sets_flag_and_status() {
        let mut store = MessageStore::new();
        store.append("c1", msg("m1", "2024-03-15T10:30:00Z"));
        store.mark_read("c1", "m1").unwrap();
        let m = store.find("c1", "m1").unwrap();
        assert!(m.read);
        assert_eq!(m.status, DeliveryStatus::Read);
    }

    #[test]
    fn mark_read_unknown_is_error_without_mutation() {
        let mut store = MessageStore::new();
        store.append("c1", msg("m1", "2024-03-15T10:30:00Z"));
        let before = store.clone();
        assert!(matches!(
            store.mark_read("c1", "zzz"),
            Err(StoreError::UnknownMessage { .. })
        ));
        assert!(store.mark_read("c2", "m1").is_err());
        assert_eq!(store.messages("c1"), before.messages("c1"));
    }

    #[test]
    fn toggle_twice_restores_original() {
        let mut store = MessageStore::new();
        store.append("c1", msg("m1", "2024-03-15T10:30:00Z"));
        store
            .toggle_reaction("c1", "m1", thumbs_up("u2"))
            .unwrap();
        let original = store.find("c1", "m1").unwrap().reactions.clone();

        assert_eq!(
            store.toggle_reaction("c1", "m1", thumbs_up("u1")).unwrap(),
            Toggle::Added
        );
        assert_eq!(
            store.toggle_reaction("c1", "m1", thumbs_up("u1")).unwrap(),
            Toggle::Removed
        );
        assert_eq!(store.find("c1", "m1").unwrap().reactions, original);
    }

    #[test]
    fn toggle_matches_on_user_and_emoji_only() {
        let mut store = MessageStore::new();
        store.append("c1", msg("m1", "2024-03-15T10:30:00Z"));
        store.toggle_reaction("c1", "m1", thumbs_up("u1")).unwrap();
        let renamed = Reaction {
            user_name: "someone else".into(),
            ..thumbs_up("u1")
        };
        assert_eq!(
            store.toggle_reaction("c1", "m1", renamed).unwrap(),
            Toggle::Removed
        );
        let heart = Reaction {
            emoji: "❤️".into(),
            ..thumbs_up("u1")
        };
        store.toggle_reaction("c1", "m1", heart).unwrap();
        store.toggle_reaction("c1", "m1", thumbs_up("u1")).unwrap();
        assert_eq!(store.find("c1", "m1").unwrap().reactions.len(), 2);
    }

    #[test]
    fn acknowledge_moves_pending_forward_only() {
        let mut store = MessageStore::new();
        let mut pending = msg("m1", "2024-03-15T10:30:00Z");
        pending.status = DeliveryStatus::Pending;
        store.append("c1", pending);
        assert_eq!(
            store.acknowledge("c1", "m1").unwrap(),
            DeliveryStatus::Acknowledged
        );

        store.mark_read("c1", "m1").unwrap();
        assert_eq!(store.acknowledge("c1", "m1").unwrap(), DeliveryStatus::Read);
    }

    #[test]
    fn attachment_only_messages_append() {
        let mut store = MessageStore::new();
        let mut m = msg("m1", "2024-03-15T10:30:00Z");
        m.content.clear();
        m.attachments.push(Attachment {
            id: "a1".into(),
            kind: AttachmentKind::Image,
            url: "blob:1".into(),
            name: "art.png".into(),
        });
        store.append_attachments("c1", m);
        assert_eq!(store.messages("c1").len(), 1);
        assert_eq!(store.messages("c1")[0].content, "");
    }
}
