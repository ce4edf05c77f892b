//! # CodeClash Client
//!
//! Real-time side of a CodeClash 1v1 battle.
//!
//! - [`connection`] - the shared socket, its listener registry and typed emits
//! - [`store`] - the battle state and its pure transition function
//! - [`controller`] - glue between the two, producing a [`BattleView`]
//! - [`persist`] - partitions kept between runs
//! - [`session`] - token lifecycle and ownership of the connection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clash_client::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let connection = Arc::new(ConnectionManager::websocket(ConnectionConfig::new(
//!     "ws://localhost:5000/battle",
//! )));
//! connection.connect(Some("jwt")).await?;
//!
//! let mut controller = BattleController::new(connection.clone(), BattleStore::new(None));
//! controller.mount();
//! controller.start_matchmaking("STANDARD")?;
//!
//! while controller.next_event().await.is_some() {
//!     println!("{:?}", controller.view());
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod controller;
pub mod error;
pub mod persist;
pub mod session;
pub mod store;

pub use connection::{ConnectionConfig, ConnectionManager, Connector, WebSocketConnector};
pub use controller::{
    BattleController, BattleView, ErrorNotice, FailureKind, NextStep, NoticeKind, ProblemView,
    ResultView, ServerEvent, Standing,
};
pub use error::ClientError;
pub use persist::{AuthPartition, ContestDraft, FileStorage, PersistedBattle};
pub use session::{user_from_token, Session};
pub use store::{reduce, BattleAction, BattleState, BattleStore, TransitionError};
