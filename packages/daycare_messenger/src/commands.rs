//! The interactive command language.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use daycare_chat::{ConversationFilter, MessagingSession, PickedFile, ReadFilter};
use daycare_transport::Transport;

use crate::render;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List { filter_unread: bool, archived: bool, search: String },
    Open(String),
    Select(String),
    History,
    Send(String),
    Attach(Vec<PathBuf>),
    React { message_id: String, emoji: String },
    Archive(String),
    Restore(String),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
commands:
  list [--unread] [--archived] [search]   show conversations
  open <id>                               show a conversation and mark it read
  select <id>                             switch conversation without marking it read
  history                                 show messages in the current conversation
  send <text>                             send a message (or just type the text)
  attach <path>...                        send files as attachments
  react <message-id> <emoji>              toggle a reaction
  archive <id> / restore <id>             hide or bring back a conversation
  status                                  connection and unread summary
  quit";

/// Parse one input line. `Ok(None)` for a blank line. Text that does not
/// start with a known command word is sent as a message.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim_start();
    if line.trim().is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (line.trim_end(), ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let one = |usage: &'static str| match args.as_slice() {
        [id] => Ok(id.to_string()),
        _ => Err(ParseError::Usage(usage)),
    };

    let cmd = match word {
        "list" | "ls" => {
            let mut filter_unread = false;
            let mut archived = false;
            let mut search = Vec::new();
            for arg in &args {
                match *arg {
                    "--unread" => filter_unread = true,
                    "--archived" => archived = true,
                    other => search.push(other),
                }
            }
            Command::List {
                filter_unread,
                archived,
                search: search.join(" "),
            }
        }
        "open" => Command::Open(one("open <id>")?),
        "select" => Command::Select(one("select <id>")?),
        "history" | "h" => Command::History,
        "send" => Command::Send(rest.to_string()),
        "attach" => {
            if args.is_empty() {
                return Err(ParseError::Usage("attach <path>..."));
            }
            Command::Attach(args.iter().map(PathBuf::from).collect())
        }
        "react" => match args.as_slice() {
            [message_id, emoji] => Command::React {
                message_id: message_id.to_string(),
                emoji: emoji.to_string(),
            },
            _ => return Err(ParseError::Usage("react <message-id> <emoji>")),
        },
        "archive" => Command::Archive(one("archive <id>")?),
        "restore" => Command::Restore(one("restore <id>")?),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other if other.starts_with('/') => return Err(ParseError::Unknown(other.to_string())),
        _ => Command::Send(line.to_string()),
    };
    Ok(Some(cmd))
}

/// What a command produced: lines to print, and whether to stop.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
            quit: false,
        }
    }
}

/// Run one command. User mistakes come back as `Err` for a one-line hint.
pub fn execute(session: &mut MessagingSession, transport: &Transport, cmd: Command) -> Result<Reply> {
    let reply = match cmd {
        Command::List {
            filter_unread,
            archived,
            search,
        } => {
            let filter = ConversationFilter {
                search,
                read: if filter_unread {
                    ReadFilter::Unread
                } else {
                    ReadFilter::All
                },
                include_archived: archived,
            };
            let active = session.active().map(str::to_string);
            let lines: Vec<String> = session
                .filter(&filter)
                .map(|c| render::conversation_line(c, active.as_deref() == Some(c.id.as_str())))
                .collect();
            if lines.is_empty() {
                Reply::line("no conversations")
            } else {
                Reply {
                    lines,
                    quit: false,
                }
            }
        }
        Command::Open(id) => {
            session.open(&id)?;
            history(session)
        }
        Command::Select(id) => {
            session.select(&id)?;
            Reply::line(format!("selected {id}"))
        }
        Command::History => history(session),
        Command::Send(text) => {
            let msg = session.send_text(&text)?;
            Reply::line(render::message_line(&msg, &session.me().id))
        }
        Command::Attach(paths) => {
            let files = paths
                .iter()
                .map(|p| picked_file(p))
                .collect::<Result<Vec<_>>>()?;
            let msg = session.send_attachments(files)?;
            Reply::line(render::message_line(&msg, &session.me().id))
        }
        Command::React { message_id, emoji } => {
            let toggle = session.react(&message_id, &emoji)?;
            Reply::line(format!("{toggle:?} {emoji} on #{message_id}").to_lowercase())
        }
        Command::Archive(id) => {
            session.archive(&id)?;
            Reply::line(format!("archived {id}"))
        }
        Command::Restore(id) => {
            session.restore(&id)?;
            Reply::line(format!("restored {id}"))
        }
        Command::Status => Reply {
            lines: vec![
                format!(
                    "{} as {} ({}) on {}",
                    transport.state(),
                    session.me().name,
                    session.me().role,
                    transport.url()
                ),
                format!(
                    "{} conversations, {} unread, viewing {}",
                    session.conversations().len(),
                    session.conversations().total_unread(),
                    session.active().unwrap_or("nothing")
                ),
            ],
            quit: false,
        },
        Command::Help => Reply::line(HELP),
        Command::Quit => Reply {
            lines: Vec::new(),
            quit: true,
        },
    };
    Ok(reply)
}

fn history(session: &MessagingSession) -> Reply {
    let Some(conv) = session.active_conversation() else {
        return Reply::line("no conversation selected");
    };
    let mut lines = vec![format!("-- {} --", conv.participant_name)];
    let me = &session.me().id;
    lines.extend(
        session
            .messages(&conv.id)
            .iter()
            .map(|m| render::message_line(m, me)),
    );
    Reply {
        lines,
        quit: false,
    }
}

/// Describe a local file the way the attachment policy expects.
pub fn picked_file(path: &Path) -> Result<PickedFile> {
    let path = path
        .canonicalize()
        .with_context(|| format!("cannot attach {}", path.display()))?;
    let meta = std::fs::metadata(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    anyhow::ensure!(meta.is_file(), "{} is not a file", path.display());

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok(PickedFile {
        name,
        mime_type,
        size_bytes: meta.len(),
        url: format!("file://{}", path.display()),
    })
}
