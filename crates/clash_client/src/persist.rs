//! Client-side persisted state.
//!
//! The client keeps a few small partitions between runs: the bearer token,
//! the signed-in user, the attached battle and an unfinished contest draft.
//! [`FileStorage`] writes one JSON document per key into a directory.

use crate::error::ClientError;
use crate::store::BattleState;
use chrono::{DateTime, Utc};
use clash_events::{MatchId, MatchStatus, PlayerId, PlayerState, Problem, ProblemId, UserProfile};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const TOKEN_KEY: &str = "token";
pub const AUTH_KEY: &str = "auth";
pub const BATTLE_KEY: &str = "battle";
pub const CONTEST_DRAFT_KEY: &str = "contest_draft";

/// The persisted projection of [`BattleState`].
///
/// UI-only fields such as `is_maximized` are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedBattle {
    pub match_id: Option<MatchId>,
    pub status: MatchStatus,
    #[serde(default)]
    pub problems: Vec<Problem>,
    #[serde(default)]
    pub current_problem_index: usize,
    #[serde(default)]
    pub players: Vec<PlayerState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
}

impl PersistedBattle {
    pub fn project(state: &BattleState) -> Self {
        Self {
            match_id: state.match_id.clone(),
            status: state.status,
            problems: state.problems.clone(),
            current_problem_index: state.current_problem_index,
            players: state.players.clone(),
            winner: state.winner.clone(),
        }
    }

    /// Rebuilds a battle state for `base`'s session from this snapshot.
    pub fn restore_into(self, base: &BattleState) -> BattleState {
        let current_problem_index = if self.current_problem_index < self.problems.len() {
            self.current_problem_index
        } else {
            0
        };
        BattleState {
            match_id: self.match_id,
            status: self.status,
            problems: self.problems,
            current_problem_index,
            players: self.players,
            winner: self.winner,
            ..base.cleared()
        }
    }
}

/// The `auth` partition. The token is stored under its own key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPartition {
    pub user: UserProfile,
}

/// An unfinished contest being composed by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub problem_ids: Vec<ProblemId>,
}

/// Directory-backed key/value storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Reads `key`. Missing keys are `None`; unreadable documents are logged
    /// and treated as missing.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ClientError> {
        let path = self.path_for(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("🗃️ Discarding corrupt '{}' at {}: {}", key, path.display(), e);
                Ok(None)
            }
        }
    }

    /// Writes `key` atomically.
    pub async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ClientError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.path_for(key);
        let tmp = self.root.join(format!(".{key}.json.tmp"));
        let content = serde_json::to_string_pretty(value)?;

        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("💾 Saved '{}' to {}", key, path.display());
        Ok(())
    }

    /// Removes `key`. Returns `true` if it existed.
    pub async fn remove(&self, key: &str) -> Result<bool, ClientError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn load_token(&self) -> Result<Option<String>, ClientError> {
        Ok(self
            .load::<String>(TOKEN_KEY)
            .await?
            .filter(|token| !token.trim().is_empty()))
    }

    pub async fn save_token(&self, token: &str) -> Result<(), ClientError> {
        self.save(TOKEN_KEY, &token).await
    }

    pub async fn load_auth(&self) -> Result<Option<AuthPartition>, ClientError> {
        self.load(AUTH_KEY).await
    }

    pub async fn save_auth(&self, auth: &AuthPartition) -> Result<(), ClientError> {
        self.save(AUTH_KEY, auth).await
    }

    pub async fn load_battle(&self) -> Result<Option<PersistedBattle>, ClientError> {
        self.load(BATTLE_KEY).await
    }

    /// Persists the battle partition. An idle state clears it instead.
    pub async fn save_battle(&self, state: &BattleState) -> Result<(), ClientError> {
        if state.status == MatchStatus::Idle {
            self.clear_battle().await?;
            return Ok(());
        }
        self.save(BATTLE_KEY, &PersistedBattle::project(state)).await
    }

    pub async fn clear_battle(&self) -> Result<bool, ClientError> {
        self.remove(BATTLE_KEY).await
    }

    pub async fn load_contest_draft(&self) -> Result<Option<ContestDraft>, ClientError> {
        self.load(CONTEST_DRAFT_KEY).await
    }

    pub async fn save_contest_draft(&self, draft: &ContestDraft) -> Result<(), ClientError> {
        self.save(CONTEST_DRAFT_KEY, draft).await
    }

    pub async fn clear_contest_draft(&self) -> Result<bool, ClientError> {
        self.remove(CONTEST_DRAFT_KEY).await
    }

    /// Drops everything tied to the signed-in user.
    pub async fn clear_session(&self) -> Result<(), ClientError> {
        self.remove(TOKEN_KEY).await?;
        self.remove(AUTH_KEY).await?;
        self.clear_battle().await?;
        Ok(())
    }
}
