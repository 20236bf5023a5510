//! The messaging session: stores, composer and active selection behind one
//! dispatch point for inbound events and one for user actions.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::attachment::PickedFile;
use crate::composer::{Composer, Draft, LocalUser};
use crate::error::{ComposeError, SendError, StoreError};
use crate::model::{Conversation, DeliveryStatus, Message, Participant};
use crate::protocol::{ChatEvent, ReactionUpdate, ReadReceipt};
use crate::store::{ConversationFilter, ConversationStore, MessageStore, Toggle};

/// Where outbound events go. The transport in production, a recorder in tests.
pub trait Outbox: Send + Sync {
    fn send(&self, event: &ChatEvent) -> Result<(), SendError>;
}

/// What an inbound event changed, for the caller to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Received {
        conversation_id: String,
        message_id: String,
        sender_name: String,
        preview: String,
        unread: u32,
    },
    Acknowledged {
        conversation_id: String,
        message_id: String,
    },
    Read {
        conversation_id: String,
        message_id: String,
    },
    Reaction {
        conversation_id: String,
        message_id: String,
        emoji: String,
        user_name: String,
        toggle: Toggle,
    },
    Ignored,
}

pub struct MessagingSession {
    composer: Composer,
    conversations: ConversationStore,
    messages: MessageStore,
    active: Option<String>,
    outbox: Arc<dyn Outbox>,
}

impl MessagingSession {
    pub fn new(composer: Composer, outbox: Arc<dyn Outbox>) -> Self {
        let role = composer.me().role;
        Self {
            composer,
            conversations: ConversationStore::new(role),
            messages: MessageStore::new(),
            active: None,
            outbox,
        }
    }

    pub fn me(&self) -> &LocalUser {
        self.composer.me()
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn messages(&self, conversation_id: &str) -> &[Message] {
        self.messages.messages(conversation_id)
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active
            .as_deref()
            .and_then(|id| self.conversations.get(id))
    }

    pub fn filter<'a>(
        &'a self,
        filter: &'a ConversationFilter,
    ) -> impl Iterator<Item = &'a Conversation> + Clone + 'a {
        self.conversations.filter(filter)
    }

    /// Load a conversation and its history, e.g. from seed data.
    pub fn seed(&mut self, conversation: Conversation, history: Vec<Message>) {
        let id = self.conversations.insert(conversation);
        for msg in history {
            self.messages.append(&id, msg);
        }
    }

    /// Make `id` the conversation on screen. Does not reset its unread count.
    pub fn select(&mut self, id: &str) -> Result<(), StoreError> {
        if !self.conversations.contains(id) {
            return Err(StoreError::UnknownConversation(id.to_string()));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    /// Select `id` and mark it read.
    pub fn open(&mut self, id: &str) -> Result<(), StoreError> {
        self.select(id)?;
        self.conversations.mark_opened(id)
    }

    /// Start (or resume) a conversation with someone and open it.
    pub fn start_with(&mut self, participant: &Participant) -> Result<(), StoreError> {
        let id = self.conversations.ensure(participant).id.clone();
        self.open(&id)
    }

    pub fn archive(&mut self, id: &str) -> Result<(), StoreError> {
        self.conversations.archive(id)?;
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        Ok(())
    }

    pub fn restore(&mut self, id: &str) -> Result<(), StoreError> {
        self.conversations.restore(id)
    }

    /// Send what the user typed to the active conversation.
    pub fn send_text(&mut self, text: &str) -> Result<Message, ComposeError> {
        self.send_draft(Draft::text(text))
    }

    /// Send picked files as an attachment-only message.
    pub fn send_attachments(&mut self, files: Vec<PickedFile>) -> Result<Message, ComposeError> {
        let message = self.composer.compose_files(self.active.as_deref(), files)?;
        self.dispatch_outbound(message)
    }

    pub fn send_draft(&mut self, draft: Draft) -> Result<Message, ComposeError> {
        let message = self.composer.compose(self.active.as_deref(), draft)?;
        self.dispatch_outbound(message)
    }

    /// Toggle the local user's `emoji` on a message in the active conversation.
    pub fn react(&mut self, message_id: &str, emoji: &str) -> Result<Toggle, ComposeError> {
        let update = self
            .composer
            .compose_reaction(self.active.as_deref(), message_id, emoji)?;
        if !self
            .messages
            .contains(&update.conversation_id, &update.message_id)
        {
            return Err(StoreError::UnknownMessage {
                conversation_id: update.conversation_id,
                message_id: update.message_id,
            }
            .into());
        }

        let event = ChatEvent::MessageReaction(update.clone());
        if let Err(e) = self.outbox.send(&event) {
            warn!(message_id = %update.message_id, error = %e, "reaction not delivered");
        }
        let toggle = self.messages.toggle_reaction(
            &update.conversation_id,
            &update.message_id,
            update.reaction,
        )?;
        Ok(toggle)
    }

    // Event first, then the local echo under the same id.
    fn dispatch_outbound(&mut self, mut message: Message) -> Result<Message, ComposeError> {
        let conversation_id = message.recipient_id.clone();
        let sent = self.outbox.send(&ChatEvent::NewMessage(message.clone()));
        if let Err(e) = sent {
            warn!(message_id = %message.id, error = %e, "message not delivered");
            message.status = DeliveryStatus::Failed;
        }

        if message.content.trim().is_empty() {
            self.messages
                .append_attachments(&conversation_id, message.clone());
        } else {
            self.messages.append(&conversation_id, message.clone());
        }
        self.conversations
            .upsert_from_outbound(&message, &conversation_id)?;
        debug!(
            conversation = %conversation_id,
            message_id = %message.id,
            status = %message.status,
            "sent message"
        );
        Ok(message)
    }

    /// Apply one inbound event.
    pub fn apply(&mut self, event: &ChatEvent) -> Applied {
        match event {
            ChatEvent::NewMessage(message) => self.on_new_message(message),
            ChatEvent::MessageRead(receipt) => self.on_read(receipt),
            ChatEvent::MessageReaction(update) => self.on_reaction(update),
        }
    }

    fn on_new_message(&mut self, message: &Message) -> Applied {
        let me = &self.composer.me().id;

        if message.sender_id == *me {
            return match self.messages.acknowledge(&message.recipient_id, &message.id) {
                Ok(_) => Applied::Acknowledged {
                    conversation_id: message.recipient_id.clone(),
                    message_id: message.id.clone(),
                },
                Err(e) => {
                    debug!(error = %e, "echo for a message this client did not send");
                    Applied::Ignored
                }
            };
        }

        if message.recipient_id != *me {
            debug!(
                message_id = %message.id,
                recipient = %message.recipient_id,
                "message not addressed to this user"
            );
            return Applied::Ignored;
        }

        let conversation_id = message.sender_id.clone();
        if self.messages.contains(&conversation_id, &message.id) {
            debug!(message_id = %message.id, "duplicate delivery");
            return Applied::Ignored;
        }

        let mut stored = message.clone();
        stored.status = if stored.read {
            DeliveryStatus::Read
        } else {
            DeliveryStatus::Delivered
        };
        self.messages.append(&conversation_id, stored);

        let unread = self.active.as_deref() != Some(conversation_id.as_str());
        let conv = self.conversations.upsert_from_inbound(message, unread);
        info!(
            conversation = %conversation_id,
            message_id = %message.id,
            unread = conv.unread_count,
            "received message"
        );
        Applied::Received {
            conversation_id,
            message_id: message.id.clone(),
            sender_name: message.sender_name.clone(),
            preview: message.preview(),
            unread: conv.unread_count,
        }
    }

    fn on_read(&mut self, receipt: &ReadReceipt) -> Applied {
        match self
            .messages
            .mark_read(&receipt.conversation_id, &receipt.message_id)
        {
            Ok(()) => Applied::Read {
                conversation_id: receipt.conversation_id.clone(),
                message_id: receipt.message_id.clone(),
            },
            Err(e) => {
                warn!(error = %e, "read receipt for unknown message");
                Applied::Ignored
            }
        }
    }

    fn on_reaction(&mut self, update: &ReactionUpdate) -> Applied {
        // Our own reactions were applied when we sent them.
        if update.reaction.user_id == self.composer.me().id {
            debug!(message_id = %update.message_id, "own reaction echo");
            return Applied::Ignored;
        }
        match self.messages.toggle_reaction(
            &update.conversation_id,
            &update.message_id,
            update.reaction.clone(),
        ) {
            Ok(toggle) => Applied::Reaction {
                conversation_id: update.conversation_id.clone(),
                message_id: update.message_id.clone(),
                emoji: update.reaction.emoji.clone(),
                user_name: update.reaction.user_name.clone(),
                toggle,
            },
            Err(e) => {
                warn!(error = %e, "reaction for unknown message");
                Applied::Ignored
            }
        }
    }
}
