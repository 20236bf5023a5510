//! Daycare Chat - conversation and message state for the messaging client
//!
//! This crate holds everything the client knows about its conversations:
//! the conversation list, the per-conversation message logs, the composer
//! that turns user input into outbound events, and the wire protocol those
//! events travel in. It has no networking; outbound events go through an
//! [`Outbox`] supplied by the caller.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use daycare_chat::{
//!     AttachmentPolicy, ChatEvent, Composer, LocalUser, MessagingSession, Outbox,
//!     Participant, ParticipantRole, SendError,
//! };
//!
//! struct Print;
//!
//! impl Outbox for Print {
//!     fn send(&self, event: &ChatEvent) -> Result<(), SendError> {
//!         println!("{}", event.to_frame()?);
//!         Ok(())
//!     }
//! }
//!
//! let me = LocalUser {
//!     id: "user1".to_string(),
//!     name: "Jane Doe".to_string(),
//!     role: ParticipantRole::Parent,
//! };
//! let mut session = MessagingSession::new(
//!     Composer::new(me, AttachmentPolicy::default()),
//!     Arc::new(Print),
//! );
//! session
//!     .start_with(&Participant {
//!         id: "provider1".to_string(),
//!         name: "Sunshine Daycare".to_string(),
//!         role: ParticipantRole::Provider,
//!     })
//!     .unwrap();
//! session.send_text("Hello").unwrap();
//! ```

pub mod attachment;
pub mod composer;
pub mod error;
pub mod model;
pub mod protocol;
pub mod session;
pub mod store;

pub use attachment::{AttachmentPolicy, PickedFile, default_allowed_types};
pub use composer::{Composer, Draft, LocalUser, new_message_id};
pub use error::{AttachmentError, ComposeError, SendError, StoreError};
pub use model::{
    Attachment, AttachmentKind, Conversation, ConversationStatus, DeliveryStatus, Message,
    Participant, ParticipantRole, Reaction,
};
pub use protocol::{ChatEvent, EventKind, RawFrame, ReactionUpdate, ReadReceipt};
pub use session::{Applied, MessagingSession, Outbox};
pub use store::{ConversationFilter, ConversationStore, MessageStore, ReadFilter, Toggle};
