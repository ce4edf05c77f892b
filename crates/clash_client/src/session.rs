//! Session lifecycle.
//!
//! The session is the only owner allowed to close the shared connection. It
//! keeps the bearer token and the signed-in user in storage and hands out the
//! connection to whoever needs it.

use crate::connection::ConnectionManager;
use crate::error::ClientError;
use crate::persist::{AuthPartition, FileStorage, AUTH_KEY};
use crate::store::BattleState;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use clash_events::{MatchStatus, PlayerId, UserProfile};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The claims of a bearer token that identify its user.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenClaims {
    sub: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
    id: Option<String>,
    username: Option<String>,
    name: Option<String>,
    preferred_username: Option<String>,
    email: Option<String>,
}

/// Reads the user out of a JWT payload. The signature is the server's
/// business; opaque tokens yield `None`.
pub fn user_from_token(token: &str) -> Option<UserProfile> {
    let payload = token.split('.').nth(1)?;
    let bytes = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Token payload is not base64url: {}", e);
            return None;
        }
    };
    let claims: TokenClaims = match serde_json::from_slice(&bytes) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Token payload is not a claim set: {}", e);
            return None;
        }
    };

    let id = [claims.sub, claims.user_id, claims.id]
        .into_iter()
        .flatten()
        .find(|id| !id.trim().is_empty())?;
    let username = [claims.username, claims.preferred_username, claims.name]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| id.clone());
    Some(UserProfile {
        id: PlayerId::new(id),
        username,
        email: claims.email,
        rating: None,
    })
}

#[derive(Debug)]
pub struct Session {
    storage: FileStorage,
    connection: Arc<ConnectionManager>,
    token: Option<String>,
    user: Option<UserProfile>,
}

impl Session {
    pub fn new(storage: FileStorage, connection: Arc<ConnectionManager>) -> Self {
        Self {
            storage,
            connection,
            token: None,
            user: None,
        }
    }

    /// Loads token and user persisted by a previous run.
    pub async fn restore(storage: FileStorage, connection: Arc<ConnectionManager>) -> Result<Self, ClientError> {
        let token = storage.load_token().await?;
        let user = storage.load_auth().await?.map(|auth| auth.user);
        if let Some(user) = &user {
            info!("👤 Restored session for {}", user.username);
        }
        Ok(Self {
            storage,
            connection,
            token,
            user,
        })
    }

    /// Records fresh credentials.
    ///
    /// Without a profile the user is read from the token's claims. A token
    /// that names nobody drops the previous user, so a stale identity never
    /// outlives its token.
    pub async fn login(&mut self, token: &str, user: Option<UserProfile>) -> Result<(), ClientError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClientError::NotAuthenticated);
        }
        let user = user.or_else(|| user_from_token(token));
        self.storage.save_token(token).await?;
        match &user {
            Some(user) => {
                self.storage.save_auth(&AuthPartition { user: user.clone() }).await?;
                info!("👤 Signed in as {} ({})", user.username, user.id);
            }
            None => {
                self.storage.remove(AUTH_KEY).await?;
                warn!("👤 Token does not name a user; match results cannot be attributed");
            }
        }
        self.token = Some(token.to_string());
        self.user = user;
        Ok(())
    }

    /// Opens the shared connection with the stored token.
    pub async fn start(&self) -> Result<(), ClientError> {
        self.connection.connect(self.token.as_deref()).await
    }

    /// Closes the connection but keeps the credentials for the next run.
    pub fn close(&self) {
        self.connection.disconnect();
    }

    /// Closes the connection and forgets everything tied to the user.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        self.connection.disconnect();
        self.storage.clear_session().await?;
        self.token = None;
        if let Some(user) = self.user.take() {
            info!("👋 {} logged out", user.username);
        }
        Ok(())
    }

    /// The persisted battle for this user, or an idle state.
    pub async fn restore_battle(&self) -> Result<BattleState, ClientError> {
        let base = BattleState {
            local_player: self.player_id(),
            ..BattleState::default()
        };
        Ok(match self.storage.load_battle().await? {
            Some(snapshot) => {
                let state = snapshot.restore_into(&base);
                info!("♻️ Restored battle {:?} ({})", state.match_id, state.status);
                state
            }
            None => base,
        })
    }

    pub async fn save_battle(&self, state: &BattleState) -> Result<(), ClientError> {
        if self.token.is_none() && state.status != MatchStatus::Idle {
            warn!("Not persisting battle without a signed-in user");
            return Ok(());
        }
        self.storage.save_battle(state).await
    }

    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.user.as_ref().map(|user| user.id.clone())
    }
}
