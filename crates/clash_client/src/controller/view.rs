//! Derived view state of the battle screen.

use crate::store::BattleState;
use clash_events::{MatchId, MatchStatus, PlayerId, PlayerState, Problem};
use std::fmt;

/// What the user can do to get out of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Search for an opponent again.
    Retry,
    Relogin,
    ReturnToLobby,
    /// Dismiss and keep playing; the match is untouched.
    Continue,
    /// Reconnect, then rejoin the attached room.
    Rejoin,
}

impl fmt::Display for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Retry => "retry",
            Self::Relogin => "log in again",
            Self::ReturnToLobby => "return to lobby",
            Self::Continue => "continue",
            Self::Rejoin => "reconnect and rejoin",
        })
    }
}

/// Where an error notice came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Connection,
    Matchmaking,
    InMatch,
}

/// A dismissible error shown instead of the main view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub kind: NoticeKind,
    pub message: String,
    pub next_step: NextStep,
}

/// The problem screen of a running match.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemView {
    pub match_id: Option<MatchId>,
    pub index: usize,
    pub total: usize,
    pub problem: Problem,
    pub local: Option<PlayerState>,
    pub opponent: Option<PlayerState>,
    pub is_maximized: bool,
}

/// One line of the final scoreboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub player_id: PlayerId,
    pub display_name: String,
    pub score: i64,
    pub problems_solved: u32,
}

/// The result screen of a completed match.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub match_id: Option<MatchId>,
    pub winner: Option<PlayerId>,
    /// Highest score first.
    pub standings: Vec<Standing>,
    /// `None` on a draw or when the local player is unknown.
    pub local_won: Option<bool>,
}

/// Everything the battle screen can show.
#[derive(Debug, Clone, PartialEq)]
pub enum BattleView {
    /// Credentials are missing or were rejected.
    LoginRequired { message: String },
    Error { message: String, next_step: NextStep },
    Idle,
    Searching { mode: String },
    /// Matched, but no problem to show yet.
    Waiting { match_id: Option<MatchId> },
    Problem(Box<ProblemView>),
    Completed(ResultView),
}

impl BattleView {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LoginRequired { .. } => "login-required",
            Self::Error { .. } => "error",
            Self::Idle => "idle",
            Self::Searching { .. } => "searching",
            Self::Waiting { .. } => "waiting",
            Self::Problem(_) => "problem",
            Self::Completed(_) => "completed",
        }
    }
}

pub(crate) fn derive(
    state: &BattleState,
    searching: Option<&str>,
    notice: Option<&ErrorNotice>,
    login_message: Option<&str>,
) -> BattleView {
    if let Some(message) = login_message {
        return BattleView::LoginRequired {
            message: message.to_string(),
        };
    }
    if let Some(notice) = notice {
        return BattleView::Error {
            message: notice.message.clone(),
            next_step: notice.next_step,
        };
    }

    match state.status {
        MatchStatus::Idle => match searching {
            Some(mode) => BattleView::Searching {
                mode: mode.to_string(),
            },
            None => BattleView::Idle,
        },
        MatchStatus::Waiting | MatchStatus::InProgress => match state.current_problem() {
            Some(problem) => BattleView::Problem(Box::new(ProblemView {
                match_id: state.match_id.clone(),
                index: state.current_problem_index,
                total: state.problems.len(),
                problem: problem.clone(),
                local: state.local().cloned(),
                opponent: state.opponent().cloned(),
                is_maximized: state.is_maximized,
            })),
            None => BattleView::Waiting {
                match_id: state.match_id.clone(),
            },
        },
        MatchStatus::Completed => BattleView::Completed(results(state)),
    }
}

fn results(state: &BattleState) -> ResultView {
    let mut standings: Vec<Standing> = state
        .players
        .iter()
        .map(|player| Standing {
            player_id: player.id.clone(),
            display_name: player.display_name.clone(),
            score: player.score,
            problems_solved: player.problems_solved,
        })
        .collect();
    standings.sort_by(|a, b| b.score.cmp(&a.score));

    let local_won = match (&state.winner, &state.local_player) {
        (Some(winner), Some(local)) => Some(winner == local),
        _ => None,
    };

    ResultView {
        match_id: state.match_id.clone(),
        winner: state.winner.clone(),
        standings,
        local_won,
    }
}
