//! In-memory conversation list and message logs.
//!
//! Both stores are plain owned values mutated through `&mut self`; callers
//! that share them across tasks wrap the owning session in a mutex.

mod conversations;
mod messages;

pub use conversations::{ConversationFilter, ConversationStore, ReadFilter};
pub use messages::{MessageStore, Toggle};
