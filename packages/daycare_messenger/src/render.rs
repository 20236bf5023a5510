//! Plain-text rendering for the terminal.

use chrono::{DateTime, Local, Utc};
use daycare_chat::{Applied, Conversation, Message, Toggle};
use daycare_transport::ConnectionState;

pub fn clock(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

/// One row of the conversation list.
pub fn conversation_line(conv: &Conversation, active: bool) -> String {
    let marker = if active { '>' } else { ' ' };
    let mut line = format!("{marker} {:<12} {}", conv.id, conv.participant_name);
    if let Some(extra) = conv
        .daycare_name
        .as_ref()
        .or(conv.child_name.as_ref())
        .filter(|extra| **extra != conv.participant_name)
    {
        line.push_str(&format!(" ({extra})"));
    }
    if conv.unread_count > 0 {
        line.push_str(&format!(" [{}]", conv.unread_count));
    }
    if conv.is_archived() {
        line.push_str(" [archived]");
    }
    line.push_str(&format!("  {}  {}", clock(conv.last_message_time), conv.last_message));
    line
}

/// One message in a conversation view.
pub fn message_line(msg: &Message, me: &str) -> String {
    let who = if msg.sender_id == me { "you" } else { msg.sender_name.as_str() };
    let mut line = format!("[{}] {who}: {}", clock(msg.timestamp), msg.content);
    for att in &msg.attachments {
        line.push_str(&format!(" <{}>", att.name));
    }
    if !msg.reactions.is_empty() {
        let emojis: Vec<&str> = msg.reactions.iter().map(|r| r.emoji.as_str()).collect();
        line.push_str(&format!("  {}", emojis.join("")));
    }
    if msg.sender_id == me {
        line.push_str(&format!("  ({})", msg.status));
    }
    line.push_str(&format!("  #{}", msg.id));
    line
}

/// What to tell the user about an inbound event, if anything.
pub fn notice(applied: &Applied) -> Option<String> {
    match applied {
        Applied::Received {
            conversation_id,
            sender_name,
            preview,
            unread,
            ..
        } => Some(if *unread > 0 {
            format!("* {sender_name} ({conversation_id}): {preview} [{unread} unread]")
        } else {
            format!("* {sender_name}: {preview}")
        }),
        Applied::Read { message_id, .. } => Some(format!("* #{message_id} was read")),
        Applied::Reaction {
            message_id,
            emoji,
            user_name,
            toggle,
            ..
        } => Some(match toggle {
            Toggle::Added => format!("* {user_name} reacted {emoji} to #{message_id}"),
            Toggle::Removed => format!("* {user_name} removed {emoji} from #{message_id}"),
        }),
        Applied::Acknowledged { .. } | Applied::Ignored => None,
    }
}

pub fn connection(state: ConnectionState) -> String {
    format!("* connection {state}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use daycare_chat::{DeliveryStatus, Participant, ParticipantRole, Reaction};

    fn conv() -> Conversation {
        let mut conv = Conversation::with(
            &Participant {
                id: "provider1".into(),
                name: "Sunshine Daycare".into(),
                role: ParticipantRole::Provider,
            },
            "2024-03-15T10:30:00Z".parse().unwrap(),
        );
        conv.last_message = "See you Tuesday".into();
        conv
    }

    fn msg(from: &str) -> Message {
        Message {
            id: "m1".into(),
            sender_id: from.into(),
            sender_name: "Sunshine Daycare".into(),
            sender_avatar: None,
            recipient_id: "user1".into(),
            content: "Hello".into(),
            timestamp: "2024-03-15T10:30:00Z".parse().unwrap(),
            read: false,
            attachments: Vec::new(),
            reactions: Vec::new(),
            status: DeliveryStatus::Pending,
        }
    }

    #[test]
    fn conversation_row_shows_unread_and_marker() {
        let mut c = conv();
        assert!(!conversation_line(&c, false).contains('['));
        c.unread_count = 3;
        let line = conversation_line(&c, true);
        assert!(line.starts_with("> provider1"));
        assert!(line.contains("[3]"));
        assert!(line.ends_with("See you Tuesday"));
    }

    #[test]
    fn child_name_is_shown_for_parents() {
        let mut c = conv();
        c.child_name = Some("Emma Doe".into());
        assert!(conversation_line(&c, false).contains("(Emma Doe)"));
    }

    #[test]
    fn own_messages_show_status() {
        let line = message_line(&msg("user1"), "user1");
        assert!(line.contains("you: Hello"));
        assert!(line.contains("(pending)"));
        assert!(line.ends_with("#m1"));

        let mut theirs = msg("provider1");
        theirs.reactions.push(Reaction {
            emoji: "👍".into(),
            user_id: "user1".into(),
            user_name: "Me".into(),
        });
        let line = message_line(&theirs, "user1");
        assert!(line.contains("Sunshine Daycare: Hello"));
        assert!(line.contains("👍"));
        assert!(!line.contains("(pending)"));
    }

    #[test]
    fn time_is_hours_and_minutes() {
        let text = clock("2024-03-15T10:30:00Z".parse().unwrap());
        assert_eq!(text.len(), 5);
        assert_eq!(&text[2..3], ":");
    }

    #[test]
    fn notices() {
        assert_eq!(notice(&Applied::Ignored), None);
        let received = Applied::Received {
            conversation_id: "provider1".into(),
            message_id: "m9".into(),
            sender_name: "Sunshine Daycare".into(),
            preview: "hi".into(),
            unread: 2,
        };
        assert_eq!(
            notice(&received).unwrap(),
            "* Sunshine Daycare (provider1): hi [2 unread]"
        );
        assert_eq!(
            connection(ConnectionState::Reconnecting { attempt: 2 }),
            "* connection reconnecting (attempt 2)"
        );
    }
}
