//! Reconnecting duplex transport with type-keyed subscriber sets.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use daycare_chat::{ChatEvent, EventKind, Outbox, RawFrame, SendError};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::connector::{Channel, Connector};

/// Called with every decoded event of the kind it was subscribed to.
pub type EventHandler = Arc<dyn Fn(&ChatEvent) + Send + Sync>;

/// Called once per successful open.
pub type ConnectHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
        }
    }
}

/// Fixed-delay retry with a fixed cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(3),
        }
    }
}

struct Shared {
    state: ConnectionState,
    outbound: Option<mpsc::UnboundedSender<String>>,
    /// Token of the running connect cycle, if any.
    cycle: Option<CancellationToken>,
    subscribers: HashMap<EventKind, Vec<EventHandler>>,
    connect_handlers: Vec<ConnectHandler>,
}

struct Inner {
    url: String,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    shared: Mutex<Shared>,
    state_tx: watch::Sender<ConnectionState>,
}

/// Cheap to clone; all clones drive the same connection.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .finish()
    }
}

fn same_handler<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl Transport {
    pub fn new(
        url: impl Into<String>,
        connector: Arc<dyn Connector>,
        policy: ReconnectPolicy,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                connector,
                policy,
                shared: Mutex::new(Shared {
                    state: ConnectionState::Disconnected,
                    outbound: None,
                    cycle: None,
                    subscribers: HashMap::new(),
                    connect_handlers: Vec::new(),
                }),
                state_tx,
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.inner.policy
    }

    pub fn state(&self) -> ConnectionState {
        self.shared().state
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Start a connect cycle. No-op unless currently disconnected.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&self) {
        let token = {
            let mut shared = self.shared();
            if shared.state != ConnectionState::Disconnected {
                debug!(state = %shared.state, "connect ignored");
                return;
            }
            let token = CancellationToken::new();
            shared.cycle = Some(token.clone());
            self.set_state(&mut shared, ConnectionState::Connecting);
            token
        };
        info!(url = %self.inner.url, "connecting");
        tokio::spawn(self.clone().run_cycle(token));
    }

    /// Close the channel and stop any pending reconnect. Subscriptions stay.
    pub fn disconnect(&self) {
        let mut shared = self.shared();
        if let Some(token) = shared.cycle.take() {
            token.cancel();
        }
        shared.outbound = None;
        if shared.state != ConnectionState::Disconnected {
            info!(url = %self.inner.url, "disconnected");
        }
        self.set_state(&mut shared, ConnectionState::Disconnected);
    }

    /// Register `handler` for `kind`. Registering the same handler twice is a no-op.
    pub fn subscribe(&self, kind: EventKind, handler: EventHandler) {
        let mut shared = self.shared();
        let handlers = shared.subscribers.entry(kind).or_default();
        if !handlers.iter().any(|h| same_handler(h, &handler)) {
            handlers.push(handler);
        }
    }

    pub fn unsubscribe(&self, kind: EventKind, handler: &EventHandler) {
        let mut shared = self.shared();
        if let Some(handlers) = shared.subscribers.get_mut(&kind) {
            handlers.retain(|h| !same_handler(h, handler));
            if handlers.is_empty() {
                shared.subscribers.remove(&kind);
            }
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.shared().subscribers.get(&kind).map_or(0, Vec::len)
    }

    pub fn on_connect(&self, handler: ConnectHandler) {
        let mut shared = self.shared();
        if !shared
            .connect_handlers
            .iter()
            .any(|h| same_handler(h, &handler))
        {
            shared.connect_handlers.push(handler);
        }
    }

    /// Write one event if the channel is open. Never queues, never retries.
    pub fn send(&self, event: &ChatEvent) -> Result<(), SendError> {
        let shared = self.shared();
        let outbound = match (&shared.state, &shared.outbound) {
            (ConnectionState::Connected, Some(tx)) => tx,
            _ => {
                error!(kind = %event.kind(), state = %shared.state, "cannot send, channel is not open");
                return Err(SendError::NotConnected);
            }
        };
        let frame = event.to_frame()?;
        outbound.send(frame).map_err(|_| {
            error!(kind = %event.kind(), "cannot send, channel closed");
            SendError::NotConnected
        })
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, shared: &mut Shared, state: ConnectionState) {
        shared.state = state;
        self.inner.state_tx.send_replace(state);
    }

    /// Apply `f` to the shared state unless `token`'s cycle was cancelled.
    /// Returns `None` when the cycle is stale.
    fn with_live<R>(&self, token: &CancellationToken, f: impl FnOnce(&mut Shared) -> R) -> Option<R> {
        let mut shared = self.shared();
        if token.is_cancelled() {
            return None;
        }
        Some(f(&mut shared))
    }

    async fn run_cycle(self, token: CancellationToken) {
        let policy = self.inner.policy;
        let mut attempt: u32 = 0;

        loop {
            let live = self.with_live(&token, |shared| {
                self.set_state(shared, ConnectionState::Connecting)
            });
            if live.is_none() {
                return;
            }

            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = self.inner.connector.connect(&self.inner.url) => result,
            };

            match result {
                Ok(channel) => {
                    attempt = 0;
                    if !self.serve(channel, &token).await {
                        return;
                    }
                }
                Err(e) => {
                    warn!(url = %self.inner.url, error = %e, "connect failed");
                }
            }

            attempt += 1;
            if attempt > policy.max_attempts {
                error!(
                    url = %self.inner.url,
                    attempts = policy.max_attempts,
                    "giving up reconnecting"
                );
                self.with_live(&token, |shared| {
                    shared.cycle = None;
                    shared.outbound = None;
                    self.set_state(shared, ConnectionState::Disconnected);
                });
                return;
            }

            let live = self.with_live(&token, |shared| {
                self.set_state(shared, ConnectionState::Reconnecting { attempt })
            });
            if live.is_none() {
                return;
            }
            info!(attempt, delay_ms = policy.delay.as_millis() as u64, "reconnecting");

            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(policy.delay) => {}
            }
        }
    }

    /// Run one open connection until it closes. Returns `false` if the
    /// cycle was cancelled, `true` on an abnormal close.
    async fn serve(&self, channel: Channel, token: &CancellationToken) -> bool {
        let Channel {
            outbound,
            mut inbound,
        } = channel;

        let handlers = self.with_live(token, |shared| {
            shared.outbound = Some(outbound);
            self.set_state(shared, ConnectionState::Connected);
            shared.connect_handlers.clone()
        });
        let Some(handlers) = handlers else {
            return false;
        };
        info!(url = %self.inner.url, "connected");
        for handler in handlers {
            handler();
        }

        loop {
            tokio::select! {
                _ = token.cancelled() => return false,
                frame = inbound.recv() => match frame {
                    Some(text) => self.dispatch(&text),
                    None => break,
                },
            }
        }

        let live = self.with_live(token, |shared| {
            shared.outbound = None;
        });
        if live.is_none() {
            return false;
        }
        warn!(url = %self.inner.url, "connection closed");
        true
    }

    /// Decode one inbound frame and hand it to the subscribers of its type.
    pub(crate) fn dispatch(&self, text: &str) {
        let frame = match RawFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "dropping malformed frame");
                return;
            }
        };
        let Some(kind) = frame.event_kind() else {
            debug!(kind = %frame.kind, "dropping frame of unknown type");
            return;
        };

        let handlers = self
            .shared()
            .subscribers
            .get(&kind)
            .cloned()
            .unwrap_or_default();
        if handlers.is_empty() {
            return;
        }

        let event = match ChatEvent::decode(kind, frame.payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(%kind, error = %e, "dropping frame with undecodable payload");
                return;
            }
        };
        for handler in handlers {
            handler(&event);
        }
    }
}

impl Outbox for Transport {
    fn send(&self, event: &ChatEvent) -> Result<(), SendError> {
        Transport::send(self, event)
    }
}
