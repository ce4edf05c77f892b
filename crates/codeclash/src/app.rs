//! Main application logic and lifecycle management.
//!
//! The `Application` owns one battle session from the command line: it
//! restores credentials and the persisted battle, connects, searches for an
//! opponent (or rejoins the persisted room), follows the match until it ends
//! and persists the battle after every change.

use crate::{cli::CliArgs, config::AppConfig, logging::display_banner, signals::shutdown_signal};
use clash_client::{
    BattleController, BattleStore, BattleView, ConnectionManager, FileStorage, NextStep, Session,
};
use clash_events::MatchStatus;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Reconnect attempts per run before a lost connection is reported.
const MAX_REJOINS: u32 = 3;

/// Main application struct.
#[derive(Debug)]
pub struct Application {
    config: AppConfig,
    token: Option<String>,
    mode: String,
    resume: bool,
}

/// What the main loop does after a view change.
#[derive(Debug, PartialEq)]
enum Step {
    Continue,
    Finished,
    Failed(String),
}

impl Application {
    /// Loads configuration, applies command-line overrides and validates the
    /// result.
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(url) = args.url {
            config.server.socket_url = url;
        }

        if let Some(storage_dir) = args.storage_dir {
            config.client.storage_dir = storage_dir;
        }

        if let Some(mode) = &args.mode {
            config.client.default_mode = mode.clone();
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        let mode = config.client.default_mode.clone();
        Ok(Self {
            config,
            token: args.token,
            mode,
            resume: args.resume,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs one battle session until it ends or a shutdown signal arrives.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        display_banner();
        info!(
            "🌐 Server: {} | Storage: {} | Mode: {}",
            self.config.server.socket_url,
            self.config.client.storage_dir.display(),
            self.mode
        );

        let storage = FileStorage::new(self.config.client.storage_dir.clone());
        let connection = Arc::new(ConnectionManager::websocket(self.config.to_connection_config()));
        let mut session = Session::restore(storage, connection.clone()).await?;

        if let Some(token) = &self.token {
            session.login(token, None).await?;
        }

        if let Err(e) = session.start().await {
            if e.requires_login() {
                error!("🔒 {} (pass --token or set CODECLASH_TOKEN)", e);
            }
            return Err(e.into());
        }

        let state = session.restore_battle().await?;
        let mut controller = BattleController::new(connection, BattleStore::from_state(state));
        controller.mount();

        let result = match self.enter(&mut controller) {
            Ok(()) => self.play(&session, &mut controller).await,
            Err(e) => Err(e),
        };

        controller.unmount();
        session.save_battle(controller.state()).await?;
        session.close();
        result
    }

    /// Rejoins the persisted room or starts a new search.
    fn enter(&self, controller: &mut BattleController) -> Result<(), Box<dyn std::error::Error>> {
        if self.resume {
            if controller.resume()? {
                return Ok(());
            }
            info!("Nothing to resume, searching for a new match");
        } else if controller.state().status.is_active() {
            warn!(
                "♻️ Discarding persisted match {:?} (use --resume to rejoin)",
                controller.state().match_id
            );
            controller.return_to_lobby();
        }

        controller.start_matchmaking(&self.mode)?;
        Ok(())
    }

    async fn play(
        &self,
        session: &Session,
        controller: &mut BattleController,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        let mut last = controller.view();
        let mut rejoins = 0;
        info!("🖥️ {}", describe(&last));

        loop {
            tokio::select! {
                handled = controller.next_event() => {
                    if handled.is_none() {
                        return Ok(());
                    }
                    session.save_battle(controller.state()).await?;

                    if let Some(notice) = controller.notice().cloned() {
                        match notice.next_step {
                            NextStep::Continue => {
                                warn!("⚠️ {}", notice.message);
                                controller.retry(&self.mode)?;
                            }
                            NextStep::Rejoin if rejoins < MAX_REJOINS => {
                                rejoins += 1;
                                warn!("🔌 {}, reconnecting ({}/{})", notice.message, rejoins, MAX_REJOINS);
                                session.start().await?;
                                controller.retry(&self.mode)?;
                            }
                            _ => {}
                        }
                    }

                    let view = controller.view();
                    if view != last {
                        info!("🖥️ {}", describe(&view));
                        last = view;
                    }

                    match step(&last) {
                        Step::Continue => {}
                        Step::Finished => return Ok(()),
                        Step::Failed(message) => return Err(message.into()),
                    }
                }
                signal = &mut shutdown => {
                    if let Err(e) = signal {
                        warn!("Signal handling failed: {}", e);
                    }
                    if controller.state().status == MatchStatus::InProgress {
                        info!("💾 Match saved, rejoin with --resume");
                    }
                    return Ok(());
                }
            }
        }
    }
}

fn step(view: &BattleView) -> Step {
    match view {
        BattleView::Completed(_) => Step::Finished,
        BattleView::LoginRequired { message } => Step::Failed(format!("Login required: {message}")),
        BattleView::Error { message, next_step } => {
            Step::Failed(format!("{message} (next step: {next_step})"))
        }
        _ => Step::Continue,
    }
}

/// One-line summary of a view for the log.
fn describe(view: &BattleView) -> String {
    match view {
        BattleView::LoginRequired { message } => format!("Login required: {message}"),
        BattleView::Error { message, next_step } => format!("Error: {message} (next step: {next_step})"),
        BattleView::Idle => "Idle".to_string(),
        BattleView::Searching { mode } => format!("Searching for an opponent ({mode})"),
        BattleView::Waiting { match_id } => match match_id {
            Some(match_id) => format!("Waiting for problems in room {match_id}"),
            None => "Waiting for problems".to_string(),
        },
        BattleView::Problem(problem) => {
            let score = |player: &Option<clash_events::PlayerState>| {
                player.as_ref().map_or(0, |player| player.score)
            };
            format!(
                "Problem {}/{}: {} [{}] | you {} - {} opponent",
                problem.index + 1,
                problem.total,
                problem.problem.title,
                problem.problem.difficulty,
                score(&problem.local),
                score(&problem.opponent)
            )
        }
        BattleView::Completed(result) => {
            let verdict = match (result.local_won, &result.winner) {
                (Some(true), _) => "You won".to_string(),
                (Some(false), _) => "You lost".to_string(),
                (None, Some(winner)) => {
                    let name = result
                        .standings
                        .iter()
                        .find(|standing| &standing.player_id == winner)
                        .map_or(winner.as_str(), |standing| standing.display_name.as_str());
                    format!("{name} won")
                }
                (None, None) => "Draw".to_string(),
            };
            let board = result
                .standings
                .iter()
                .map(|standing| format!("{} {}", standing.display_name, standing.score))
                .collect::<Vec<_>>()
                .join(", ");
            format!("Match over: {verdict} ({board})")
        }
    }
}
