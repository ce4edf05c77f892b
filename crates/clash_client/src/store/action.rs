//! Actions accepted by the battle store.

use clash_events::{
    FinalScore, GameStartEvent, Language, MatchCompletedEvent, MatchFoundEvent, MatchId,
    MatchStatus, PlayerId, PlayerPatch, PlayerState, PlayerSummary, Problem,
};

/// A single requested change to [`super::BattleState`].
#[derive(Debug, Clone, PartialEq)]
pub enum BattleAction {
    /// An opponent was paired. `Idle → Waiting`.
    MatchFound {
        match_id: MatchId,
        players: Vec<PlayerSummary>,
    },
    /// Problems and player states arrived. `Waiting → InProgress`.
    ///
    /// An empty `players` list keeps the roster from `MatchFound`.
    GameStart {
        match_id: Option<MatchId>,
        problems: Vec<Problem>,
        players: Vec<PlayerState>,
    },
    /// Merge of one player's in-match data.
    StateUpdate(PlayerPatch),
    /// The local player picked another language.
    LanguageChange(Language),
    /// The local player edited their code buffer.
    CodeChange(String),
    SelectProblem(usize),
    ToggleMaximized,
    /// The match is over. `InProgress → Completed`.
    MatchCompleted {
        match_id: Option<MatchId>,
        final_scores: Vec<FinalScore>,
        winner: Option<PlayerId>,
    },
    /// Back to no match from anywhere.
    Reset,
}

impl BattleAction {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MatchFound { .. } => "MATCH_FOUND",
            Self::GameStart { .. } => "GAME_START",
            Self::StateUpdate(_) => "STATE_UPDATE",
            Self::LanguageChange(_) => "LANGUAGE_CHANGE",
            Self::CodeChange(_) => "CODE_CHANGE",
            Self::SelectProblem(_) => "SELECT_PROBLEM",
            Self::ToggleMaximized => "TOGGLE_MAXIMIZED",
            Self::MatchCompleted { .. } => "MATCH_COMPLETED",
            Self::Reset => "RESET",
        }
    }
}

impl From<MatchFoundEvent> for BattleAction {
    fn from(event: MatchFoundEvent) -> Self {
        Self::MatchFound {
            match_id: event.match_id,
            players: event.players,
        }
    }
}

impl From<GameStartEvent> for BattleAction {
    fn from(event: GameStartEvent) -> Self {
        Self::GameStart {
            match_id: event.match_id,
            problems: event.problems,
            players: event.players,
        }
    }
}

impl From<PlayerPatch> for BattleAction {
    fn from(patch: PlayerPatch) -> Self {
        Self::StateUpdate(patch)
    }
}

impl From<MatchCompletedEvent> for BattleAction {
    fn from(event: MatchCompletedEvent) -> Self {
        Self::MatchCompleted {
            match_id: event.match_id,
            final_scores: event.final_scores,
            winner: event.winner,
        }
    }
}

/// Why the store refused an action.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("{action} is not allowed while {status}")]
    IllegalTransition {
        action: &'static str,
        status: MatchStatus,
    },

    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("No local player for this session")]
    NoLocalPlayer,

    #[error("Problem index {index} out of range ({len} problems)")]
    ProblemOutOfRange { index: usize, len: usize },

    #[error("Event for match {got} while attached to {expected}")]
    MatchMismatch { expected: MatchId, got: MatchId },
}
