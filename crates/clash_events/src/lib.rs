//! # CodeClash Events
//!
//! Shared vocabulary of the CodeClash battle client: domain types, the JSON
//! wire envelope, every event payload that crosses the battle socket, and the
//! listener registry the connection manager dispatches into.
//!
//! ## Overview
//!
//! - [`types`] - identifiers, problems, players and the match lifecycle
//! - [`events`] - the [`Event`] trait, handlers, envelope and payloads
//! - [`registry`] - event name → listeners, with [`Subscription`] handles
//!
//! ## Quick Start
//!
//! ```rust
//! use clash_events::*;
//!
//! let registry = EventRegistry::shared();
//! let subscription = registry.on_typed(names::MATCH_FOUND, |event: MatchFoundEvent| {
//!     println!("matched into room {}", event.match_id);
//!     Ok(())
//! });
//!
//! let frame = r#"{"event":"match_found","data":{"matchId":"room-1","players":[]}}"#;
//! let message = WireMessage::decode(frame).unwrap();
//! assert_eq!(registry.dispatch_message(&message), 1);
//!
//! subscription.unsubscribe();
//! ```

pub mod events;
pub mod registry;
pub mod types;

pub use events::{
    names, CodeUpdateEvent, DisconnectEvent, ErrorEvent, Event, EventError, EventHandler,
    FinalScore, GameStartEvent, JoinMatchmakingRequest, JoinRoomRequest, LeaveMatchmakingRequest,
    MatchCompletedEvent, MatchFoundEvent, PlayerPatch, TypedEventHandler, WireMessage,
};
pub use registry::{EventRegistry, EventRegistryStats, ListenerId, Subscription};
pub use types::{
    Difficulty, Language, MatchId, MatchStatus, PlayerId, PlayerState, PlayerSummary, Problem,
    ProblemId, SolvedProblem, TestCase, UserProfile,
};
