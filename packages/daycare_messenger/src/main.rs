use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use daycare_chat::{Composer, EventKind, MessagingSession, ParticipantRole};
use daycare_transport::{Handlers, Transport, WsConnector};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::prelude::*;

mod commands;
mod config;
mod render;
mod seed;

use crate::config::{CliOverrides, FileConfig, TransportOverrides, UserOverrides};
use crate::seed::SeedData;

#[derive(Parser)]
#[command(name = "messenger")]
#[command(about = "Parent/provider messaging for the daycare marketplace")]
struct Cli {
    /// Config file (defaults to ./daycare.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Messaging server WebSocket URL
    #[arg(long)]
    url: Option<String>,

    /// User id to speak as
    #[arg(long)]
    user_id: Option<String>,

    /// Display name shown to the other side
    #[arg(long)]
    user_name: Option<String>,

    /// Which side of the marketplace you are on
    #[arg(long, value_enum)]
    role: Option<Role>,

    /// JSON file with conversations and messages to start from
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Role {
    Parent,
    Provider,
}

impl From<Role> for ParticipantRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Parent => ParticipantRole::Parent,
            Role::Provider => ParticipantRole::Provider,
        }
    }
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            transport: TransportOverrides {
                url: self.url.clone(),
            },
            user: UserOverrides {
                id: self.user_id.clone(),
                name: self.user_name.clone(),
                role: self.role.map(Into::into),
            },
            seed: self.seed.clone(),
        }
    }
}

type SharedSession = Arc<Mutex<MessagingSession>>;

fn lock(session: &SharedSession) -> MutexGuard<'_, MessagingSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_directive = if cli.debug {
        "messenger=debug,daycare_transport=debug,daycare_chat=debug,info"
    } else {
        "messenger=info,daycare_transport=info,daycare_chat=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let config: FileConfig = config::load_config(cli.config.as_deref(), &cli.overrides())
        .extract()
        .context("invalid configuration")?;

    if cli.print_config {
        print!(
            "{}",
            toml::to_string(&config).context("failed to render configuration")?
        );
        return Ok(());
    }

    run(config).await
}

async fn run(config: FileConfig) -> Result<()> {
    let me = config.local_user();
    info!(user = %me.id, role = %me.role, url = %config.transport.url, "starting messenger");

    let transport = Transport::new(
        config.transport.url.clone(),
        Arc::new(WsConnector),
        config.reconnect_policy(),
    );

    let mut session = MessagingSession::new(
        Composer::new(me.clone(), config.attachment_policy()),
        Arc::new(transport.clone()),
    );
    let seed = match &config.seed {
        Some(path) => SeedData::load(path)?,
        None => SeedData::demo(&me)?,
    };
    seed.apply(&mut session);
    let session: SharedSession = Arc::new(Mutex::new(session));

    // Every inbound event goes through the session; notices go to stdout.
    let handlers = EventKind::ALL
        .into_iter()
        .fold(Handlers::new(), |handlers, kind| {
            let session = session.clone();
            handlers.on(kind, move |event| {
                let applied = lock(&session).apply(event);
                if let Some(line) = render::notice(&applied) {
                    println!("{line}");
                }
            })
        });

    let mut state = transport.watch_state();
    let state_task = tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let current = *state.borrow_and_update();
            println!("{}", render::connection(current));
        }
    });

    let binding = transport.bind(handlers);
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal");
                break;
            }
            line = lines.next_line() => line.context("failed to read stdin")?,
        };
        let Some(line) = line else {
            break;
        };

        let cmd = match commands::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        match commands::execute(&mut lock(&session), binding.transport(), cmd) {
            Ok(reply) => {
                for line in &reply.lines {
                    println!("{line}");
                }
                if reply.quit {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "command failed");
                println!("{e}");
            }
        }
    }

    drop(binding);
    transport.disconnect();
    state_task.abort();
    Ok(())
}
