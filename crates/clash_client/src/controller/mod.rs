//! Battle controller.
//!
//! Bridges the shared [`ConnectionManager`] and the [`BattleStore`] to the
//! battle screen. Listeners mounted by the controller only enqueue
//! [`ServerEvent`]s; [`BattleController::drain`] and
//! [`BattleController::next_event`] apply them, so every store mutation
//! happens in one place.
//!
//! The controller never closes the connection. Tearing it down releases its
//! own listeners and, when a search is still pending, leaves the queue.

mod inbox;
mod view;

pub use inbox::{FailureKind, ServerEvent};
pub use view::{BattleView, ErrorNotice, NextStep, NoticeKind, ProblemView, ResultView, Standing};

use crate::connection::ConnectionManager;
use crate::error::ClientError;
use crate::persist::PersistedBattle;
use crate::store::{BattleAction, BattleState, BattleStore};
use clash_events::{Language, MatchStatus, PlayerPatch, Subscription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Drives one battle screen.
#[derive(Debug)]
pub struct BattleController {
    connection: Arc<ConnectionManager>,
    store: BattleStore,
    inbox_tx: mpsc::UnboundedSender<ServerEvent>,
    inbox: mpsc::UnboundedReceiver<ServerEvent>,
    subscriptions: Vec<Subscription>,
    searching: Option<String>,
    notice: Option<ErrorNotice>,
    login_message: Option<String>,
}

impl BattleController {
    pub fn new(connection: Arc<ConnectionManager>, store: BattleStore) -> Self {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        Self {
            connection,
            store,
            inbox_tx,
            inbox,
            subscriptions: Vec::new(),
            searching: None,
            notice: None,
            login_message: None,
        }
    }

    /// Registers the controller's listeners. Mounting twice is a no-op.
    pub fn mount(&mut self) {
        if self.is_mounted() {
            return;
        }
        self.subscriptions = inbox::mount_listeners(&self.connection, &self.inbox_tx);
        info!("🧩 Battle controller mounted ({} listeners)", self.subscriptions.len());
    }

    pub fn is_mounted(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Releases every listener and leaves a pending search.
    ///
    /// Safe to call more than once; also runs on drop.
    pub fn unmount(&mut self) {
        if self.searching.take().is_some() && self.store.state().status == MatchStatus::Idle {
            match self.connection.leave_matchmaking() {
                Ok(()) => info!("🚪 Left matchmaking on teardown"),
                Err(e) => warn!("Could not leave matchmaking on teardown: {}", e),
            }
        }

        if self.subscriptions.is_empty() {
            return;
        }
        let released = self.subscriptions.len();
        self.subscriptions.clear();
        while self.inbox.try_recv().is_ok() {}
        info!("🧩 Battle controller unmounted ({} listeners released)", released);
    }

    pub fn state(&self) -> &BattleState {
        self.store.state()
    }

    pub fn store(&self) -> &BattleStore {
        &self.store
    }

    pub fn is_searching(&self) -> bool {
        self.searching.is_some()
    }

    pub fn notice(&self) -> Option<&ErrorNotice> {
        self.notice.as_ref()
    }

    /// The battle partition to persist for the current state.
    pub fn snapshot(&self) -> PersistedBattle {
        PersistedBattle::project(self.store.state())
    }

    /// Derived view of the current state.
    pub fn view(&self) -> BattleView {
        view::derive(
            self.store.state(),
            self.searching.as_deref(),
            self.notice.as_ref(),
            self.login_message.as_deref(),
        )
    }

    fn set_notice(&mut self, kind: NoticeKind, message: impl Into<String>, next_step: NextStep) {
        let message = message.into();
        warn!("🚧 {} (next step: {})", message, next_step);
        self.notice = Some(ErrorNotice {
            kind,
            message,
            next_step,
        });
    }

    fn require_login(&mut self, message: impl Into<String>) {
        self.searching = None;
        self.login_message = Some(message.into());
    }

    /// How to recover from a lost connection in the current state.
    fn reconnect_step(&self) -> NextStep {
        if self.store.state().is_active() {
            NextStep::Rejoin
        } else {
            NextStep::Retry
        }
    }

    fn surface(&mut self, error: &ClientError) {
        if error.requires_login() {
            self.require_login(error.to_string());
        } else if error.is_retryable() {
            let next_step = self.reconnect_step();
            self.set_notice(NoticeKind::Connection, error.to_string(), next_step);
        }
    }

    /// Asks the server for an opponent.
    ///
    /// Refused while a match is attached. A finished match is cleared first.
    pub fn start_matchmaking(&mut self, mode: &str) -> Result<(), ClientError> {
        let status = self.store.state().status;
        if status.is_active() {
            return Err(ClientError::MatchAlreadyActive(status));
        }
        if self.searching.is_some() {
            debug!("Already searching, ignoring start_matchmaking()");
            return Ok(());
        }
        if status == MatchStatus::Completed {
            self.store.dispatch(BattleAction::Reset);
        }

        if let Err(e) = self.connection.join_matchmaking(mode) {
            self.surface(&e);
            return Err(e);
        }
        info!("🔎 Searching for an opponent ({})", mode);
        self.notice = None;
        self.login_message = None;
        self.searching = Some(mode.to_string());
        Ok(())
    }

    /// Leaves the queue. Returns `false` if no search was pending.
    pub fn cancel_matchmaking(&mut self) -> bool {
        if self.searching.take().is_none() {
            return false;
        }
        if let Err(e) = self.connection.leave_matchmaking() {
            warn!("Could not leave matchmaking: {}", e);
        }
        self.store.dispatch(BattleAction::Reset);
        info!("🛑 Matchmaking cancelled");
        true
    }

    /// Carries out the next step of the current notice.
    ///
    /// Without a notice this searches in `mode`. [`NextStep::Rejoin`]
    /// expects the session to have reconnected first.
    pub fn retry(&mut self, mode: &str) -> Result<(), ClientError> {
        let Some(notice) = self.notice.take() else {
            return self.start_matchmaking(mode);
        };
        debug!("Retrying after '{}' ({})", notice.message, notice.next_step);
        match notice.next_step {
            NextStep::Retry => self.start_matchmaking(mode),
            NextStep::Continue => Ok(()),
            NextStep::ReturnToLobby => {
                self.return_to_lobby();
                Ok(())
            }
            NextStep::Rejoin => {
                if !self.resume()? {
                    info!("Match ended while offline, searching again");
                    return self.start_matchmaking(mode);
                }
                Ok(())
            }
            NextStep::Relogin => {
                self.require_login(notice.message);
                Err(ClientError::NotAuthenticated)
            }
        }
    }

    /// Detaches from the current match.
    pub fn return_to_lobby(&mut self) {
        self.notice = None;
        self.searching = None;
        self.store.dispatch(BattleAction::Reset);
    }

    pub fn dismiss_error(&mut self) {
        self.notice = None;
    }

    /// Switches the local language and tells the room.
    ///
    /// Returns `false` if the store refused the change.
    pub fn change_language(&mut self, language: Language) -> Result<bool, ClientError> {
        if !self.store.dispatch(BattleAction::LanguageChange(language)) {
            return Ok(false);
        }
        if let Some(match_id) = self.store.state().match_id.clone() {
            self.connection.send_code_update(&match_id, language)?;
        }
        Ok(true)
    }

    pub fn edit_code(&mut self, code: impl Into<String>) -> bool {
        self.store.dispatch(BattleAction::CodeChange(code.into()))
    }

    pub fn select_problem(&mut self, index: usize) -> bool {
        self.store.dispatch(BattleAction::SelectProblem(index))
    }

    pub fn toggle_maximized(&mut self) {
        self.store.dispatch(BattleAction::ToggleMaximized);
    }

    /// Rejoins the room of a restored match. Returns `false` if there is none.
    pub fn resume(&mut self) -> Result<bool, ClientError> {
        let state = self.store.state();
        let Some(match_id) = state.match_id.clone().filter(|_| state.is_active()) else {
            return Ok(false);
        };
        if let Err(e) = self.connection.join_room(&match_id) {
            self.surface(&e);
            return Err(e);
        }
        info!("↩️ Rejoining room {}", match_id);
        Ok(true)
    }

    /// Applies every queued server event. Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.inbox.try_recv() {
            self.handle(event);
            applied += 1;
        }
        applied
    }

    /// Waits for the next server event and applies it.
    pub async fn next_event(&mut self) -> Option<&'static str> {
        let event = self.inbox.recv().await?;
        let name = event.name();
        self.handle(event);
        Some(name)
    }

    /// Applies one server event.
    pub fn handle(&mut self, event: ServerEvent) {
        debug!("📥 Handling '{}'", event.name());
        match event {
            ServerEvent::MatchFound(found) => {
                let match_id = found.match_id.clone();
                if !self.store.dispatch(found) {
                    return;
                }
                self.searching = None;
                self.notice = None;
                info!("⚔️ Matched into room {}", match_id);
                if let Err(e) = self.connection.join_room(&match_id) {
                    self.surface(&e);
                }
            }
            ServerEvent::GameStart(start) => {
                if self.store.dispatch(start) {
                    self.searching = None;
                    info!("🏁 Game started with {} problems", self.store.state().problems.len());
                }
            }
            ServerEvent::StateUpdate(patch) => {
                self.store.dispatch(patch);
            }
            ServerEvent::MatchCompleted(completed) => {
                if self.store.dispatch(completed) {
                    info!("🏆 Match completed, winner: {:?}", self.store.state().winner);
                }
            }
            ServerEvent::CodeUpdate(update) => {
                let state = self.store.state();
                let Some(player_id) = update.player_id else {
                    return;
                };
                if Some(&player_id) == state.local_player.as_ref()
                    || state.match_id.as_ref() != Some(&update.match_id)
                {
                    return;
                }
                self.store
                    .dispatch(PlayerPatch::for_player(player_id).with_language(update.language));
            }
            ServerEvent::Failure(kind, error) => self.handle_failure(kind, error.message),
            ServerEvent::Disconnected(disconnect) => {
                if self.searching.take().is_some() || self.store.state().is_active() {
                    let next_step = self.reconnect_step();
                    self.set_notice(
                        NoticeKind::Connection,
                        format!("Connection lost: {}", disconnect.reason),
                        next_step,
                    );
                }
            }
        }
    }

    fn handle_failure(&mut self, kind: FailureKind, message: String) {
        match kind {
            FailureKind::AuthError => self.require_login(message),
            FailureKind::ConnectError => {
                self.searching = None;
                let next_step = self.reconnect_step();
                self.set_notice(NoticeKind::Connection, message, next_step);
            }
            FailureKind::MatchmakingError | FailureKind::MatchmakingTimeout => {
                self.searching = None;
                self.store.dispatch(BattleAction::Reset);
                self.set_notice(NoticeKind::Matchmaking, message, NextStep::Retry);
            }
            FailureKind::MatchAborted => {
                self.searching = None;
                self.store.dispatch(BattleAction::Reset);
                self.set_notice(NoticeKind::Matchmaking, message, NextStep::ReturnToLobby);
            }
            FailureKind::MatchError | FailureKind::GameError => {
                self.set_notice(NoticeKind::InMatch, message, NextStep::Continue);
            }
        }
    }
}

impl Drop for BattleController {
    fn drop(&mut self) {
        self.unmount();
    }
}
