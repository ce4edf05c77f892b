//! Battle state store.
//!
//! Holds the single [`BattleState`] of the client and applies
//! [`BattleAction`]s through the pure [`reduce`] function. Refused actions
//! are logged and leave the state untouched: a stale or out-of-order server
//! event must never crash the session.

mod action;
mod reducer;
mod state;
mod tests;

pub use action::{BattleAction, TransitionError};
pub use reducer::reduce;
pub use state::BattleState;

use clash_events::PlayerId;
use tracing::{debug, warn};

/// Owner of the battle state.
#[derive(Debug, Default)]
pub struct BattleStore {
    state: BattleState,
    revision: u64,
}

impl BattleStore {
    pub fn new(local_player: Option<PlayerId>) -> Self {
        Self::from_state(BattleState {
            local_player,
            ..BattleState::default()
        })
    }

    /// Starts from a previously restored state.
    pub fn from_state(state: BattleState) -> Self {
        Self { state, revision: 0 }
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// Bumped on every accepted action.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Applies `action`, returning the refusal instead of logging it.
    pub fn try_dispatch(&mut self, action: &BattleAction) -> Result<(), TransitionError> {
        self.state = reduce(&self.state, action)?;
        self.revision += 1;
        debug!(
            "🎯 {} → status {} (revision {})",
            action.name(),
            self.state.status,
            self.revision
        );
        Ok(())
    }

    /// Applies `action`; refused actions are logged and ignored.
    ///
    /// Returns `true` if the action was accepted.
    pub fn dispatch(&mut self, action: impl Into<BattleAction>) -> bool {
        let action = action.into();
        match self.try_dispatch(&action) {
            Ok(()) => true,
            Err(e) => {
                warn!("⚠️ Ignoring {}: {}", action.name(), e);
                false
            }
        }
    }
}
