//! Starting state for the session: a JSON seed file, or built-in demo data.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use daycare_chat::{
    Conversation, DeliveryStatus, LocalUser, Message, MessagingSession, Participant,
    ParticipantRole,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Conversations plus their message logs keyed by conversation id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(default)]
    pub messages: HashMap<String, Vec<Message>>,
}

impl SeedData {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse seed file {}", path.display()))
    }

    /// The sample inbox for `me`'s side of the marketplace.
    pub fn demo(me: &LocalUser) -> Result<Self> {
        match me.role {
            ParticipantRole::Parent => parent_demo(me),
            ParticipantRole::Provider => provider_demo(me),
        }
    }

    /// Load everything into `session`. Returns the number of conversations seeded.
    pub fn apply(mut self, session: &mut MessagingSession) -> usize {
        let me = session.me().id.clone();
        let count = self.conversations.len();
        for conversation in self.conversations {
            let mut history = self.messages.remove(&conversation.id).unwrap_or_default();
            for msg in &mut history {
                msg.status = seeded_status(msg, &me);
            }
            session.seed(conversation, history);
        }
        for (id, orphaned) in self.messages {
            warn!(conversation = %id, count = orphaned.len(), "seed messages without a conversation");
        }
        info!(conversations = count, "seeded session");
        count
    }
}

fn seeded_status(msg: &Message, me: &str) -> DeliveryStatus {
    match (msg.sender_id == me, msg.read) {
        (true, _) => DeliveryStatus::Acknowledged,
        (false, true) => DeliveryStatus::Read,
        (false, false) => DeliveryStatus::Delivered,
    }
}

fn at(rfc3339: &str) -> Result<DateTime<Utc>> {
    Ok(rfc3339.parse()?)
}

fn message(
    id: &str,
    sender: (&str, &str),
    recipient: &str,
    content: &str,
    timestamp: DateTime<Utc>,
) -> Message {
    Message {
        id: id.to_string(),
        sender_id: sender.0.to_string(),
        sender_name: sender.1.to_string(),
        sender_avatar: None,
        recipient_id: recipient.to_string(),
        content: content.to_string(),
        timestamp,
        read: true,
        attachments: Vec::new(),
        reactions: Vec::new(),
        status: DeliveryStatus::default(),
    }
}

fn conversation(
    participant: Participant,
    last_message: &str,
    last_message_time: DateTime<Utc>,
    unread_count: u32,
) -> Conversation {
    let mut conv = Conversation::with(&participant, last_message_time);
    conv.last_message = last_message.to_string();
    conv.unread_count = unread_count;
    conv
}

fn parent_demo(me: &LocalUser) -> Result<SeedData> {
    let sunshine = ("provider1", "Sunshine Daycare");

    let mut first = conversation(
        Participant {
            id: sunshine.0.into(),
            name: sunshine.1.into(),
            role: ParticipantRole::Provider,
        },
        "Thank you for your inquiry about our program...",
        at("2024-03-15T10:30:00Z")?,
        2,
    );
    first.daycare_name = Some(sunshine.1.into());

    let mut second = conversation(
        Participant {
            id: "provider2".into(),
            name: "Rainbow Kids Center".into(),
            role: ParticipantRole::Provider,
        },
        "Yes, we have availability for that age group...",
        at("2024-03-14T15:45:00Z")?,
        0,
    );
    second.daycare_name = Some("Rainbow Kids Center".into());

    let history = vec![
        message(
            "m1",
            sunshine,
            &me.id,
            "Thank you for your inquiry about our program. We would be happy to schedule a tour for you.",
            at("2024-03-15T10:30:00Z")?,
        ),
        message(
            "m2",
            (me.id.as_str(), me.name.as_str()),
            sunshine.0,
            "That would be great! What times are available next week?",
            at("2024-03-15T10:35:00Z")?,
        ),
    ];

    Ok(SeedData {
        conversations: vec![first, second],
        messages: HashMap::from([(sunshine.0.to_string(), history)]),
    })
}

fn provider_demo(me: &LocalUser) -> Result<SeedData> {
    let john = ("parent1", "John Doe");

    let mut first = conversation(
        Participant {
            id: john.0.into(),
            name: john.1.into(),
            role: ParticipantRole::Parent,
        },
        "Thank you for the update about Emma...",
        at("2024-03-15T10:30:00Z")?,
        2,
    );
    first.child_name = Some("Emma Doe".into());

    let mut second = conversation(
        Participant {
            id: "parent2".into(),
            name: "Sarah Smith".into(),
            role: ParticipantRole::Parent,
        },
        "What time is the parent meeting?",
        at("2024-03-14T15:45:00Z")?,
        0,
    );
    second.child_name = Some("Lucas Smith".into());

    let history = vec![
        message(
            "m1",
            john,
            &me.id,
            "How was Emma today?",
            at("2024-03-15T10:30:00Z")?,
        ),
        message(
            "m2",
            (me.id.as_str(), me.name.as_str()),
            john.0,
            "Emma had a great day! She participated in all activities and ate well during lunch.",
            at("2024-03-15T10:35:00Z")?,
        ),
    ];

    Ok(SeedData {
        conversations: vec![first, second],
        messages: HashMap::from([(john.0.to_string(), history)]),
    })
}
