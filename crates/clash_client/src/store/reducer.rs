//! Pure transition function of the battle store.

use super::action::{BattleAction, TransitionError};
use super::state::BattleState;
use clash_events::{FinalScore, MatchId, MatchStatus, PlayerId, PlayerPatch, PlayerState};

/// Computes the state following `action`, or the reason it is refused.
///
/// The input is never modified. Status only moves forward along
/// `Idle → Waiting → InProgress → Completed`; `Reset` is the single way back.
pub fn reduce(state: &BattleState, action: &BattleAction) -> Result<BattleState, TransitionError> {
    match action {
        BattleAction::MatchFound { match_id, players } => {
            require(state, action, &[MatchStatus::Idle])?;
            Ok(BattleState {
                status: MatchStatus::Waiting,
                match_id: Some(match_id.clone()),
                players: players.iter().map(PlayerState::from_summary).collect(),
                ..state.cleared()
            })
        }

        BattleAction::GameStart {
            match_id,
            problems,
            players,
        } => {
            // InProgress accepts a fresh snapshot after rejoining the room.
            require(state, action, &[MatchStatus::Waiting, MatchStatus::InProgress])?;
            check_match(state, match_id.as_ref())?;

            let mut next = state.clone();
            next.status = MatchStatus::InProgress;
            if next.match_id.is_none() {
                next.match_id = match_id.clone();
            }
            next.problems = problems.clone();
            if state.status == MatchStatus::Waiting || next.current_problem_index >= problems.len() {
                next.current_problem_index = 0;
            }
            if !players.is_empty() {
                next.players = players.clone();
            }
            Ok(next)
        }

        BattleAction::StateUpdate(patch) => {
            require(state, action, &[MatchStatus::InProgress])?;
            let mut next = state.clone();
            let player = next
                .player_mut(&patch.player_id)
                .ok_or_else(|| TransitionError::UnknownPlayer(patch.player_id.clone()))?;
            merge(player, patch);
            Ok(next)
        }

        BattleAction::LanguageChange(language) => {
            require(state, action, &[MatchStatus::InProgress])?;
            let mut next = state.clone();
            local_mut(&mut next)?.language = *language;
            Ok(next)
        }

        BattleAction::CodeChange(code) => {
            require(state, action, &[MatchStatus::InProgress])?;
            let mut next = state.clone();
            local_mut(&mut next)?.code = code.clone();
            Ok(next)
        }

        BattleAction::SelectProblem(index) => {
            require(state, action, &[MatchStatus::InProgress])?;
            if *index >= state.problems.len() {
                return Err(TransitionError::ProblemOutOfRange {
                    index: *index,
                    len: state.problems.len(),
                });
            }
            Ok(BattleState {
                current_problem_index: *index,
                ..state.clone()
            })
        }

        BattleAction::ToggleMaximized => Ok(BattleState {
            is_maximized: !state.is_maximized,
            ..state.clone()
        }),

        BattleAction::MatchCompleted {
            match_id,
            final_scores,
            winner,
        } => {
            require(state, action, &[MatchStatus::InProgress])?;
            check_match(state, match_id.as_ref())?;

            let mut next = state.clone();
            next.status = MatchStatus::Completed;
            for entry in final_scores {
                if let Some(player) = next.player_mut(&entry.player_id) {
                    player.score = entry.score;
                }
            }
            next.winner = winner.clone().or_else(|| top_scorer(final_scores));
            Ok(next)
        }

        BattleAction::Reset => Ok(state.cleared()),
    }
}

fn require(
    state: &BattleState,
    action: &BattleAction,
    allowed: &[MatchStatus],
) -> Result<(), TransitionError> {
    if allowed.contains(&state.status) {
        Ok(())
    } else {
        Err(TransitionError::IllegalTransition {
            action: action.name(),
            status: state.status,
        })
    }
}

fn check_match(state: &BattleState, incoming: Option<&MatchId>) -> Result<(), TransitionError> {
    match (state.match_id.as_ref(), incoming) {
        (Some(expected), Some(got)) if expected != got => Err(TransitionError::MatchMismatch {
            expected: expected.clone(),
            got: got.clone(),
        }),
        _ => Ok(()),
    }
}

fn local_mut(state: &mut BattleState) -> Result<&mut PlayerState, TransitionError> {
    let id = state
        .local_player
        .clone()
        .ok_or(TransitionError::NoLocalPlayer)?;
    state
        .player_mut(&id)
        .ok_or(TransitionError::UnknownPlayer(id))
}

fn merge(player: &mut PlayerState, patch: &PlayerPatch) {
    if let Some(is_ready) = patch.is_ready {
        player.is_ready = is_ready;
    }
    if let Some(code) = &patch.code {
        player.code = code.clone();
    }
    if let Some(language) = patch.language {
        player.language = language;
    }
    if let Some(output) = &patch.output {
        player.output = Some(output.clone());
    }
    if let Some(error) = &patch.error {
        player.error = Some(error.clone());
    }
    if let Some(score) = patch.score {
        player.score = score;
    }
    if let Some(problems_solved) = patch.problems_solved {
        player.problems_solved = problems_solved;
    }
    if let Some(solved) = &patch.solved {
        player
            .solved
            .extend(solved.iter().map(|(id, entry)| (id.clone(), entry.clone())));
    }
}

/// Unique highest score, if any.
fn top_scorer(final_scores: &[FinalScore]) -> Option<PlayerId> {
    let best = final_scores.iter().map(|entry| entry.score).max()?;
    let mut leaders = final_scores.iter().filter(|entry| entry.score == best);
    let leader = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }
    Some(leader.player_id.clone())
}
