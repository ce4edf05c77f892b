//! Battle state held by the store.

use clash_events::{MatchId, MatchStatus, PlayerId, PlayerState, Problem};

/// Everything the client knows about the current match.
///
/// `status == Idle` means no match is attached; every other field is then at
/// its default except `local_player`, which belongs to the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BattleState {
    pub local_player: Option<PlayerId>,
    pub status: MatchStatus,
    pub match_id: Option<MatchId>,
    pub problems: Vec<Problem>,
    pub current_problem_index: usize,
    pub players: Vec<PlayerState>,
    pub winner: Option<PlayerId>,
    /// Transient editor flag, never persisted.
    pub is_maximized: bool,
}

impl BattleState {
    /// Idle state for the given local player.
    pub fn for_player(local_player: impl Into<PlayerId>) -> Self {
        Self {
            local_player: Some(local_player.into()),
            ..Self::default()
        }
    }

    /// Idle state keeping only the local player.
    pub fn cleared(&self) -> Self {
        Self {
            local_player: self.local_player.clone(),
            ..Self::default()
        }
    }

    pub fn current_problem(&self) -> Option<&Problem> {
        self.problems.get(self.current_problem_index)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|player| &player.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|player| &player.id == id)
    }

    /// The local player's in-match state.
    pub fn local(&self) -> Option<&PlayerState> {
        self.local_player.as_ref().and_then(|id| self.player(id))
    }

    /// The first player that is not the local one. `None` while the local
    /// player is unknown.
    pub fn opponent(&self) -> Option<&PlayerState> {
        let local = self.local_player.as_ref()?;
        self.players.iter().find(|player| &player.id != local)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
