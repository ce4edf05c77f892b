//! # Event Traits and Battle Events
//!
//! This module defines the event infrastructure used on both sides of the
//! battle socket: the [`Event`] trait, handler abstractions, the JSON wire
//! envelope, and every payload the client sends or receives.
//!
//! ## Event Categories
//!
//! ### Server-pushed events
//! Matchmaking results, game start, incremental player updates, completion,
//! and the error family (`match_error`, `game_error`, `auth_error`, ...).
//!
//! ### Client-originated events
//! Matchmaking join/leave, room join, and `code_update` notifications.
//!
//! ### Local events
//! `connect`, `connect_error` and `disconnect` are produced by the connection
//! manager itself, never by the server.

use crate::types::{Language, MatchId, PlayerId, PlayerState, PlayerSummary, Problem, ProblemId, SolvedProblem};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;

// ============================================================================
// Event names
// ============================================================================

/// Names of every event that crosses the socket.
pub mod names {
    pub const CONNECT: &str = "connect";
    pub const CONNECT_ERROR: &str = "connect_error";
    pub const DISCONNECT: &str = "disconnect";

    pub const MATCH_FOUND: &str = "match_found";
    pub const MATCH_ERROR: &str = "match_error";
    pub const MATCH_ABORTED: &str = "match_aborted";
    pub const MATCHMAKING_ERROR: &str = "matchmaking_error";
    pub const MATCHMAKING_TIMEOUT: &str = "matchmaking_timeout";
    pub const GAME_ERROR: &str = "game_error";
    pub const AUTH_ERROR: &str = "auth_error";
    pub const GAME_START: &str = "game_start";
    pub const STATE_UPDATE: &str = "state_update";
    pub const MATCH_COMPLETED: &str = "match_completed";
    pub const CODE_UPDATE: &str = "code_update";

    pub const JOIN_MATCHMAKING: &str = "join_matchmaking";
    pub const LEAVE_MATCHMAKING: &str = "leave_matchmaking";
    pub const JOIN_ROOM: &str = "join_room";
}

// ============================================================================
// Event Traits and Core Infrastructure
// ============================================================================

/// Core trait that all events must implement.
///
/// Most types get it through the blanket implementation below: anything that
/// is `Serialize + DeserializeOwned + Send + Sync + Debug` is an event and is
/// carried as JSON.
pub trait Event: Send + Sync + Any + Debug {
    /// Returns the type name of this event for debugging.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// Converts the event into the JSON value placed in the envelope's `data`.
    fn to_value(&self) -> Result<serde_json::Value, EventError>;

    /// Rebuilds an event from an envelope's `data`.
    fn from_value(data: &serde_json::Value) -> Result<Self, EventError>
    where
        Self: Sized;
}

impl<T> Event for T
where
    T: Serialize + DeserializeOwned + Send + Sync + Any + Debug + 'static,
{
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn to_value(&self) -> Result<serde_json::Value, EventError> {
        serde_json::to_value(self).map_err(|e| {
            tracing::error!(
                "🔴 Event serialization failed for type '{}': {} (event debug: {:?})",
                Self::type_name(),
                e,
                self
            );
            EventError::Serialization(e)
        })
    }

    fn from_value(data: &serde_json::Value) -> Result<Self, EventError> {
        T::deserialize(data).map_err(EventError::Deserialization)
    }
}

/// Handler trait for processing delivered events.
///
/// Handlers run on the connection's dispatch task in transport order. They
/// must be cheap; anything heavier should be forwarded to a channel.
pub trait EventHandler: Send + Sync + Debug + 'static {
    /// Handles the `data` part of an envelope.
    fn handle(&self, data: &serde_json::Value) -> Result<(), EventError>;

    /// Returns a human-readable name for this handler for debugging.
    fn handler_name(&self) -> &str;
}

/// Type-safe wrapper turning a closure over `T` into an [`EventHandler`].
///
/// Payloads that do not deserialize into `T` are logged and skipped rather
/// than failing the dispatch.
pub struct TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T, F> Debug for TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedEventHandler")
            .field("name", &self.name)
            .finish()
    }
}

impl<T, F> TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    /// Creates a new typed event handler.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            handler,
            name: name.into(),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T, F> EventHandler for TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
{
    fn handle(&self, data: &serde_json::Value) -> Result<(), EventError> {
        match T::from_value(data) {
            Ok(event) => (self.handler)(event),
            Err(e) => {
                tracing::warn!(
                    "🟡 EventHandler '{}' (expects type '{}'): payload skipped - {}",
                    self.name,
                    T::type_name(),
                    e
                );
                Ok(())
            }
        }
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Wire envelope
// ============================================================================

/// A single text frame on the battle socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl WireMessage {
    /// Builds an envelope for `event` carrying `payload`.
    pub fn new<T: Event>(event: &str, payload: &T) -> Result<Self, EventError> {
        Ok(Self {
            event: event.to_string(),
            data: payload.to_value()?,
        })
    }

    pub fn encode(&self) -> Result<String, EventError> {
        serde_json::to_string(self).map_err(EventError::Serialization)
    }

    pub fn decode(frame: &str) -> Result<Self, EventError> {
        serde_json::from_str(frame).map_err(EventError::Deserialization)
    }
}

// ============================================================================
// Server-pushed payloads
// ============================================================================

/// `match_found`: an opponent was paired and a room allocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFoundEvent {
    #[serde(alias = "roomId")]
    pub match_id: MatchId,
    #[serde(default)]
    pub players: Vec<PlayerSummary>,
}

/// `game_start`: problems and initial player states for the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartEvent {
    #[serde(default, alias = "roomId")]
    pub match_id: Option<MatchId>,
    pub problems: Vec<Problem>,
    #[serde(default)]
    pub players: Vec<PlayerState>,
}

/// `state_update`: incremental change to one player's in-match data.
///
/// Absent fields are left untouched on merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPatch {
    pub player_id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problems_solved: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solved: Option<HashMap<ProblemId, SolvedProblem>>,
}

impl PlayerPatch {
    pub fn for_player(player_id: impl Into<PlayerId>) -> Self {
        Self {
            player_id: player_id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: i64) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}

/// One entry of the final scoreboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalScore {
    pub player_id: PlayerId,
    pub score: i64,
}

/// `match_completed`: the match is over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCompletedEvent {
    #[serde(default, alias = "roomId")]
    pub match_id: Option<MatchId>,
    #[serde(default)]
    pub final_scores: Vec<FinalScore>,
    #[serde(default)]
    pub winner: Option<PlayerId>,
}

/// Payload shared by the whole error family and by `connect_error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    #[serde(default = "default_error_message")]
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

fn default_error_message() -> String {
    "Something went wrong".to_string()
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }
}

/// `disconnect`: the socket closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisconnectEvent {
    pub reason: String,
}

// ============================================================================
// Client-originated payloads
// ============================================================================

/// `join_matchmaking`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinMatchmakingRequest {
    pub mode: String,
}

/// `leave_matchmaking`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaveMatchmakingRequest {}

/// `join_room`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_id: MatchId,
}

/// `code_update`, both emitted and echoed back.
///
/// The echo carries the originating player so the peer's language can be
/// tracked; the client omits it when sending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeUpdateEvent {
    #[serde(alias = "roomId")]
    pub match_id: MatchId,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while encoding, decoding or delivering events.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Serialization failed when converting an event to JSON
    #[error("Serialization error: {0}")]
    Serialization(serde_json::Error),
    /// Deserialization failed when converting JSON to an event
    #[error("Deserialization error: {0}")]
    Deserialization(serde_json::Error),
    /// A listener returned an error
    #[error("Handler execution error: {0}")]
    HandlerExecution(String),
}
