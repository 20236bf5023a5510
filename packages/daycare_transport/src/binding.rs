//! Scoped subscriptions.
//!
//! A [`Binding`] subscribes a consumer's handler set for as long as the
//! binding lives and removes exactly those subscriptions when dropped.

use std::sync::Arc;

use daycare_chat::{ChatEvent, EventKind, SendError};

use crate::transport::{EventHandler, Transport};

/// Declared `(kind, handler)` pairs, in declaration order.
#[derive(Clone, Default)]
pub struct Handlers {
    pairs: Vec<(EventKind, EventHandler)>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(self, kind: EventKind, handler: F) -> Self
    where
        F: Fn(&ChatEvent) + Send + Sync + 'static,
    {
        self.with(kind, Arc::new(handler))
    }

    /// Add an already shared handler, keeping its identity.
    pub fn with(mut self, kind: EventKind, handler: EventHandler) -> Self {
        self.pairs.push((kind, handler));
        self
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.pairs.iter().map(|(kind, _)| kind))
            .finish()
    }
}

/// Subscriptions held for the binding's lifetime.
///
/// The transport keeps one subscription per `(kind, handler)` pair, matched by
/// `Arc` identity. Two bindings declaring the same `Arc` for the same kind
/// share that subscription, and dropping either one removes it. Give each
/// binding its own handler (for example via [`Handlers::on`]) when their
/// lifetimes differ.
#[derive(Debug)]
pub struct Binding {
    transport: Transport,
    bound: Handlers,
}

impl Transport {
    /// Connect (if needed) and subscribe every handler in `handlers`.
    pub fn bind(&self, handlers: Handlers) -> Binding {
        self.connect();
        for (kind, handler) in &handlers.pairs {
            self.subscribe(*kind, handler.clone());
        }
        Binding {
            transport: self.clone(),
            bound: handlers,
        }
    }
}

impl Binding {
    pub fn send_message(&self, event: &ChatEvent) -> Result<(), SendError> {
        self.transport.send(event)
    }

    /// Swap the handler set: old pairs out, new pairs in.
    pub fn rebind(&mut self, handlers: Handlers) {
        self.release();
        for (kind, handler) in &handlers.pairs {
            self.transport.subscribe(*kind, handler.clone());
        }
        self.bound = handlers;
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    fn release(&mut self) {
        for (kind, handler) in self.bound.pairs.drain(..) {
            self.transport.unsubscribe(kind, &handler);
        }
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.release();
    }
}
