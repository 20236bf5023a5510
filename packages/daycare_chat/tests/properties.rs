use std::sync::Arc;

use proptest::prelude::*;

use daycare_chat::{
    AttachmentPolicy, ChatEvent, Composer, Conversation, DeliveryStatus, LocalUser, Message,
    MessageStore, MessagingSession, Outbox, Participant, ParticipantRole, Reaction, SendError,
};

struct Discard;

impl Outbox for Discard {
    fn send(&self, _event: &ChatEvent) -> Result<(), SendError> {
        Ok(())
    }
}

fn message(id: usize, from: &str, to: &str) -> Message {
    Message {
        id: format!("m{id}"),
        sender_id: from.to_string(),
        sender_name: from.to_uppercase(),
        sender_avatar: None,
        recipient_id: to.to_string(),
        content: format!("message {id}"),
        timestamp: chrono::Utc::now(),
        read: false,
        attachments: Vec::new(),
        reactions: Vec::new(),
        status: DeliveryStatus::Delivered,
    }
}

fn session() -> MessagingSession {
    let composer = Composer::new(
        LocalUser {
            id: "user1".into(),
            name: "Jane Doe".into(),
            role: ParticipantRole::Parent,
        },
        AttachmentPolicy::default(),
    );
    let mut session = MessagingSession::new(composer, Arc::new(Discard));
    for id in ["provider1", "provider2", "provider3"] {
        session.seed(
            Conversation::with(
                &Participant {
                    id: id.into(),
                    name: id.into(),
                    role: ParticipantRole::Provider,
                },
                chrono::Utc::now(),
            ),
            Vec::new(),
        );
    }
    session
}

fn arb_reaction() -> impl Strategy<Value = Reaction> {
    (
        prop_oneof![Just("👍"), Just("❤️"), Just("😂")],
        prop_oneof![Just("user1"), Just("provider1"), Just("provider2")],
    )
        .prop_map(|(emoji, user)| Reaction {
            emoji: emoji.to_string(),
            user_id: user.to_string(),
            user_name: user.to_uppercase(),
        })
}

proptest! {
    #[test]
    fn toggling_twice_is_identity(
        existing in proptest::collection::vec(arb_reaction(), 0..6),
        reaction in arb_reaction(),
    ) {
        let mut store = MessageStore::new();
        store.append("provider1", message(1, "provider1", "user1"));
        for r in existing {
            store.toggle_reaction("provider1", "m1", r).unwrap();
        }
        let before = store.find("provider1", "m1").unwrap().reactions.clone();

        store.toggle_reaction("provider1", "m1", reaction.clone()).unwrap();
        store.toggle_reaction("provider1", "m1", reaction).unwrap();

        prop_assert_eq!(&store.find("provider1", "m1").unwrap().reactions, &before);
    }

    #[test]
    fn logs_keep_arrival_order(senders in proptest::collection::vec(0usize..3, 1..40)) {
        let mut session = session();
        for (i, sender) in senders.iter().enumerate() {
            let from = format!("provider{}", sender + 1);
            session.apply(&ChatEvent::NewMessage(message(i, &from, "user1")));
        }
        for sender in 0..3 {
            let id = format!("provider{}", sender + 1);
            let expected: Vec<String> = senders
                .iter()
                .enumerate()
                .filter(|(_, s)| **s == sender)
                .map(|(i, _)| format!("m{i}"))
                .collect();
            let actual: Vec<String> = session
                .messages(&id)
                .iter()
                .map(|m| m.id.clone())
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn unread_counts_only_unselected_arrivals(
        active in 0usize..3,
        senders in proptest::collection::vec(0usize..3, 0..40),
    ) {
        let mut session = session();
        let active_id = format!("provider{}", active + 1);
        session.select(&active_id).unwrap();

        for (i, sender) in senders.iter().enumerate() {
            let from = format!("provider{}", sender + 1);
            session.apply(&ChatEvent::NewMessage(message(i, &from, "user1")));
        }

        for sender in 0..3 {
            let id = format!("provider{}", sender + 1);
            let arrivals = senders.iter().filter(|s| **s == sender).count() as u32;
            let expected = if sender == active { 0 } else { arrivals };
            prop_assert_eq!(session.conversations().get(&id).unwrap().unread_count, expected);
        }

        let others = senders.iter().filter(|s| **s != active).count() as u32;
        prop_assert_eq!(session.conversations().total_unread(), others);
    }
}
