//! Reconnecting transport for the daycare messaging client.
//!
//! [`Transport`] owns one duplex channel to the messaging server, reconnects
//! on abnormal closes with a fixed delay and cap, and fans inbound frames out
//! to subscribers keyed by [`daycare_chat::EventKind`]. [`Binding`] ties a
//! handler set to a scope.

mod binding;
mod connector;
mod error;
mod transport;

pub use binding::{Binding, Handlers};
pub use connector::{Channel, Connector, WsConnector};
pub use error::TransportError;
pub use transport::{ConnectHandler, ConnectionState, EventHandler, ReconnectPolicy, Transport};
