//! Listener side of the controller.
//!
//! Every listener the controller mounts does one thing: turn the payload into
//! a [`ServerEvent`] and push it into the controller's inbox. The store is
//! then only ever touched from the controller itself.

use crate::connection::ConnectionManager;
use clash_events::{
    names, CodeUpdateEvent, DisconnectEvent, ErrorEvent, Event, EventError, GameStartEvent,
    MatchCompletedEvent, MatchFoundEvent, PlayerPatch, Subscription,
};
use tokio::sync::mpsc::UnboundedSender;

/// Which server-side failure an [`ErrorEvent`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ConnectError,
    AuthError,
    MatchmakingError,
    MatchmakingTimeout,
    MatchAborted,
    MatchError,
    GameError,
}

impl FailureKind {
    pub fn event_name(self) -> &'static str {
        match self {
            Self::ConnectError => names::CONNECT_ERROR,
            Self::AuthError => names::AUTH_ERROR,
            Self::MatchmakingError => names::MATCHMAKING_ERROR,
            Self::MatchmakingTimeout => names::MATCHMAKING_TIMEOUT,
            Self::MatchAborted => names::MATCH_ABORTED,
            Self::MatchError => names::MATCH_ERROR,
            Self::GameError => names::GAME_ERROR,
        }
    }

    /// Message shown when the server sends no usable payload.
    fn fallback_message(self) -> &'static str {
        match self {
            Self::ConnectError => "Could not reach the battle server",
            Self::AuthError => "Your session has expired",
            Self::MatchmakingError => "Matchmaking failed",
            Self::MatchmakingTimeout => "No opponent found. Please try again",
            Self::MatchAborted => "The match was aborted",
            Self::MatchError => "Match error",
            Self::GameError => "Game error",
        }
    }

    const ALL: [FailureKind; 7] = [
        Self::ConnectError,
        Self::AuthError,
        Self::MatchmakingError,
        Self::MatchmakingTimeout,
        Self::MatchAborted,
        Self::MatchError,
        Self::GameError,
    ];
}

/// A server event queued for the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    MatchFound(MatchFoundEvent),
    GameStart(GameStartEvent),
    StateUpdate(PlayerPatch),
    MatchCompleted(MatchCompletedEvent),
    CodeUpdate(CodeUpdateEvent),
    Failure(FailureKind, ErrorEvent),
    Disconnected(DisconnectEvent),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MatchFound(_) => names::MATCH_FOUND,
            Self::GameStart(_) => names::GAME_START,
            Self::StateUpdate(_) => names::STATE_UPDATE,
            Self::MatchCompleted(_) => names::MATCH_COMPLETED,
            Self::CodeUpdate(_) => names::CODE_UPDATE,
            Self::Failure(kind, _) => kind.event_name(),
            Self::Disconnected(_) => names::DISCONNECT,
        }
    }
}

fn forward<T, F>(
    connection: &ConnectionManager,
    event_name: &str,
    inbox: &UnboundedSender<ServerEvent>,
    wrap: F,
) -> Subscription
where
    T: Event + 'static,
    F: Fn(T) -> ServerEvent + Send + Sync + 'static,
{
    let inbox = inbox.clone();
    connection.registry().on_typed(event_name, move |payload: T| {
        inbox
            .send(wrap(payload))
            .map_err(|_| EventError::HandlerExecution("battle controller inbox closed".to_string()))
    })
}

fn forward_failure(
    connection: &ConnectionManager,
    kind: FailureKind,
    inbox: &UnboundedSender<ServerEvent>,
) -> Subscription {
    forward(connection, kind.event_name(), inbox, move |payload: serde_json::Value| {
        let has_message = payload.get("message").is_some_and(|message| !message.is_null());
        let error = match ErrorEvent::from_value(&payload) {
            Ok(error) if has_message => error,
            Ok(error) => ErrorEvent {
                message: kind.fallback_message().to_string(),
                ..error
            },
            Err(_) => ErrorEvent::new(
                payload
                    .as_str()
                    .unwrap_or(kind.fallback_message())
                    .to_string(),
            ),
        };
        ServerEvent::Failure(kind, error)
    })
}

/// Registers every listener the battle controller needs.
pub(crate) fn mount_listeners(
    connection: &ConnectionManager,
    inbox: &UnboundedSender<ServerEvent>,
) -> Vec<Subscription> {
    let mut subscriptions = vec![
        forward(connection, names::MATCH_FOUND, inbox, ServerEvent::MatchFound),
        forward(connection, names::GAME_START, inbox, ServerEvent::GameStart),
        forward(connection, names::STATE_UPDATE, inbox, ServerEvent::StateUpdate),
        forward(connection, names::MATCH_COMPLETED, inbox, ServerEvent::MatchCompleted),
        forward(connection, names::CODE_UPDATE, inbox, ServerEvent::CodeUpdate),
        forward(connection, names::DISCONNECT, inbox, ServerEvent::Disconnected),
    ];
    subscriptions.extend(
        FailureKind::ALL
            .into_iter()
            .map(|kind| forward_failure(connection, kind, inbox)),
    );
    subscriptions
}
