//! Shared real-time connection.
//!
//! [`ConnectionManager`] owns the socket, the listener registry it feeds and
//! the typed emit helpers for the battle protocol. [`transport`] holds the
//! seam to the network so the manager can be driven without a server.

mod manager;
#[cfg(test)]
pub(crate) mod mock;
pub mod transport;

pub use manager::ConnectionManager;
pub use transport::{Connector, Inbound, Link, Outbound, WebSocketConnector};

use std::time::Duration;

/// Where and how to reach the battle server.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub url: String,
    pub connect_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:5000/battle".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}
