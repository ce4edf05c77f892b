//! Error types for the battle client.
//!
//! Categorizes failures the way the UI has to react to them: missing
//! credentials lead to a login prompt, transport failures are retryable, and
//! local precondition failures are reported back to the caller.

use clash_events::{EventError, MatchStatus};

/// Enumeration of possible client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No usable token: the caller must ask the user to log in
    #[error("Not authenticated: please log in")]
    NotAuthenticated,

    /// An emit was attempted without a live connection
    #[error("Not connected to the battle server")]
    NotConnected,

    /// The real-time handshake failed or timed out
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// The underlying socket failed after the handshake
    #[error("Transport error: {0}")]
    Transport(String),

    /// Matchmaking was requested while a match is attached
    #[error("A match is already active (status: {0})")]
    MatchAlreadyActive(MatchStatus),

    /// Reading or writing persisted client state failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Encoding or decoding a wire event failed
    #[error(transparent)]
    Event(#[from] EventError),

    /// Persisted state could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// True when the only way forward is a fresh login.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::NotAuthenticated)
    }

    /// True for failures that a plain retry may fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Handshake(_) | Self::Transport(_))
    }
}
