use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{Conversation, ConversationStatus, Message, Participant, ParticipantRole};

/// Read-status part of a conversation list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadFilter {
    #[default]
    All,
    Unread,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    /// Case-insensitive substring matched against participant, daycare and child names.
    pub search: String,
    pub read: ReadFilter,
    pub include_archived: bool,
}

impl ConversationFilter {
    pub fn matches(&self, conv: &Conversation) -> bool {
        if conv.is_archived() && !self.include_archived {
            return false;
        }
        if self.read == ReadFilter::Unread && conv.unread_count == 0 {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            Some(conv.participant_name.as_str()),
            conv.daycare_name.as_deref(),
            conv.child_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Conversations visible to the local user, in insertion order.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    local_role: ParticipantRole,
    conversations: Vec<Conversation>,
}

impl ConversationStore {
    pub fn new(local_role: ParticipantRole) -> Self {
        Self {
            local_role,
            conversations: Vec::new(),
        }
    }

    /// Add or replace a conversation (used for seeding). Returns the key it
    /// was stored under.
    ///
    /// Conversations are keyed by counterparty, so an `id` that differs from
    /// `participant_id` is rewritten to it.
    pub fn insert(&mut self, mut conversation: Conversation) -> String {
        if conversation.id != conversation.participant_id {
            tracing::warn!(
                id = %conversation.id,
                participant = %conversation.participant_id,
                "rekeying conversation by participant id"
            );
            conversation.id = conversation.participant_id.clone();
        }
        let id = conversation.id.clone();
        match self.position(&id) {
            Some(idx) => self.conversations[idx] = conversation,
            None => self.conversations.push(conversation),
        }
        id
    }

    /// Find the conversation with `participant`, starting one if needed.
    pub fn ensure(&mut self, participant: &Participant) -> &Conversation {
        let idx = match self.position(&participant.id) {
            Some(idx) => idx,
            None => {
                self.conversations
                    .push(Conversation::with(participant, Utc::now()));
                self.conversations.len() - 1
            }
        };
        &self.conversations[idx]
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conversation> + Clone {
        self.conversations.iter()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Record a message addressed to the local user.
    ///
    /// The conversation is keyed by the sender. A sender we have never talked
    /// to gets a fresh conversation. `unread` is false when the conversation
    /// is the one currently on screen.
    pub fn upsert_from_inbound(&mut self, message: &Message, unread: bool) -> &Conversation {
        let idx = match self.position(&message.sender_id) {
            Some(idx) => idx,
            None => {
                tracing::info!(
                    participant = %message.sender_id,
                    "starting conversation from first inbound message"
                );
                let participant = Participant {
                    id: message.sender_id.clone(),
                    name: message.sender_name.clone(),
                    role: self.local_role.counterpart(),
                };
                let mut conv = Conversation::with(&participant, message.timestamp);
                conv.participant_avatar = message.sender_avatar.clone();
                self.conversations.push(conv);
                self.conversations.len() - 1
            }
        };

        let conv = &mut self.conversations[idx];
        conv.last_message = message.content.clone();
        conv.last_message_time = message.timestamp;
        if unread {
            conv.unread_count = conv.unread_count.saturating_add(1);
        }
        conv
    }

    /// Record a message the local user sent into `conversation_id`.
    pub fn upsert_from_outbound(
        &mut self,
        message: &Message,
        conversation_id: &str,
    ) -> Result<(), StoreError> {
        let conv = self.get_mut(conversation_id)?;
        conv.last_message = message.preview();
        conv.last_message_time = message.timestamp;
        Ok(())
    }

    pub fn mark_opened(&mut self, id: &str) -> Result<(), StoreError> {
        self.get_mut(id)?.unread_count = 0;
        Ok(())
    }

    pub fn archive(&mut self, id: &str) -> Result<(), StoreError> {
        self.set_status(id, ConversationStatus::Archived)
    }

    pub fn restore(&mut self, id: &str) -> Result<(), StoreError> {
        self.set_status(id, ConversationStatus::Active)
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations
            .iter()
            .filter(|c| !c.is_archived())
            .map(|c| c.unread_count)
            .sum()
    }

    /// Lazy view over the conversations matching `filter`. Cloning the
    /// iterator restarts it from the top.
    pub fn filter<'a>(
        &'a self,
        filter: &'a ConversationFilter,
    ) -> impl Iterator<Item = &'a Conversation> + Clone + 'a {
        self.conversations.iter().filter(move |c| filter.matches(c))
    }

    /// The most recent activity time across all conversations.
    pub fn latest_activity(&self) -> Option<DateTime<Utc>> {
        self.conversations.iter().map(|c| c.last_message_time).max()
    }

    fn set_status(&mut self, id: &str, status: ConversationStatus) -> Result<(), StoreError> {
        self.get_mut(id)?.status = status;
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Conversation, StoreError> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::UnknownConversation(id.to_string()))
    }
}
