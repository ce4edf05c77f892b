//! Connection manager for the shared battle socket.
//!
//! One manager owns one real-time connection and the listener registry fed
//! by it. Components that need the socket receive an `Arc<ConnectionManager>`
//! and register their own listeners; only the session lifecycle closes it.

use super::transport::{Connector, Inbound, Outbound};
use super::ConnectionConfig;
use crate::error::ClientError;
use clash_events::{
    names, CodeUpdateEvent, DisconnectEvent, ErrorEvent, Event, EventHandler, EventRegistry,
    JoinMatchmakingRequest, JoinRoomRequest, Language, LeaveMatchmakingRequest, MatchId,
    Subscription, WireMessage,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug)]
struct LiveLink {
    id: Uuid,
    outbound: mpsc::UnboundedSender<Outbound>,
}

/// Central manager for the battle socket.
///
/// # Architecture
///
/// * Handshake goes through a pluggable [`Connector`]
/// * Inbound frames are decoded and dispatched in arrival order by one pump
///   task per connection
/// * Outbound frames go through an unbounded channel, so `emit` never blocks
/// * Listener bookkeeping lives in a shared [`EventRegistry`]
#[derive(Debug)]
pub struct ConnectionManager {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    registry: Arc<EventRegistry>,
    connected: Arc<AtomicBool>,
    link: Arc<Mutex<Option<LiveLink>>>,
    authenticated: AtomicBool,
    connect_lock: tokio::sync::Mutex<()>,
    frames_sent: AtomicU64,
}

impl ConnectionManager {
    /// Creates a disconnected manager.
    pub fn new(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            registry: EventRegistry::shared(),
            connected: Arc::new(AtomicBool::new(false)),
            link: Arc::new(Mutex::new(None)),
            authenticated: AtomicBool::new(false),
            connect_lock: tokio::sync::Mutex::new(()),
            frames_sent: AtomicU64::new(0),
        }
    }

    /// Creates a manager speaking WebSocket to `config.url`.
    pub fn websocket(config: ConnectionConfig) -> Self {
        Self::new(config, Arc::new(super::WebSocketConnector::new()))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The registry server events are dispatched into.
    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    fn live(&self) -> MutexGuard<'_, Option<LiveLink>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Establishes the connection authenticated with `token`.
    ///
    /// * Missing or blank token: [`ClientError::NotAuthenticated`], nothing is
    ///   attempted.
    /// * Already connected: no-op.
    /// * Handshake failure or timeout: a local `connect_error` event is
    ///   dispatched to listeners and the error is returned.
    /// * Success: a local `connect` event is dispatched.
    pub async fn connect(&self, token: Option<&str>) -> Result<(), ClientError> {
        let token = match token.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => {
                warn!("🔒 Refusing to connect without a token");
                return Err(ClientError::NotAuthenticated);
            }
        };

        let _guard = self.connect_lock.lock().await;
        if self.is_connected() {
            debug!("Already connected, ignoring connect()");
            return Ok(());
        }

        info!("🔌 Connecting to {}", self.config.url);
        let opened = tokio::time::timeout(
            self.config.connect_timeout,
            self.connector.open(&self.config.url, token),
        )
        .await;

        let link = match opened {
            Ok(Ok(link)) => link,
            Ok(Err(e)) => return Err(self.handshake_failed(e)),
            Err(_) => {
                return Err(self.handshake_failed(ClientError::Handshake(format!(
                    "timed out after {:?}",
                    self.config.connect_timeout
                ))))
            }
        };

        let id = Uuid::new_v4();
        *self.live() = Some(LiveLink {
            id,
            outbound: link.outbound,
        });
        self.connected.store(true, Ordering::Release);
        self.authenticated.store(true, Ordering::Release);
        self.spawn_pump(id, link.inbound);

        info!("✅ Connected to battle server (connection {})", id);
        self.registry
            .dispatch(names::CONNECT, &serde_json::json!({ "connectionId": id.to_string() }));
        Ok(())
    }

    fn handshake_failed(&self, error: ClientError) -> ClientError {
        warn!("❌ Battle server handshake failed: {}", error);
        if let Err(e) = self
            .registry
            .dispatch_event(names::CONNECT_ERROR, &ErrorEvent::new(error.to_string()))
        {
            warn!("Failed to report connect_error: {}", e);
        }
        error
    }

    fn spawn_pump(&self, id: Uuid, mut inbound: mpsc::UnboundedReceiver<Inbound>) {
        let registry = self.registry.clone();
        let connected = self.connected.clone();
        let link = self.link.clone();

        tokio::spawn(async move {
            let mut reason = "transport dropped".to_string();
            while let Some(item) = inbound.recv().await {
                match item {
                    Inbound::Frame(frame) => {
                        dispatch_frame(&registry, &frame);
                    }
                    Inbound::Closed(why) => {
                        reason = why;
                        break;
                    }
                }
            }

            // A newer connection or an explicit disconnect already took over.
            {
                let mut guard = link.lock().unwrap_or_else(PoisonError::into_inner);
                if guard.as_ref().map(|live| live.id) != Some(id) {
                    return;
                }
                *guard = None;
                connected.store(false, Ordering::Release);
            }

            warn!("🔌 Connection {} closed: {}", id, reason);
            let _ = registry.dispatch_event(names::DISCONNECT, &DisconnectEvent { reason });
        });
    }

    /// Pure query of the connection state.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Closes the connection. Only the session owner should call this.
    pub fn disconnect(&self) {
        let closed = self.live().take();
        let Some(live) = closed else {
            debug!("disconnect() without a live connection");
            return;
        };

        self.connected.store(false, Ordering::Release);
        self.authenticated.store(false, Ordering::Release);
        let _ = live.outbound.send(Outbound::Close);
        info!("👋 Disconnected from battle server (connection {})", live.id);
        let _ = self.registry.dispatch_event(
            names::DISCONNECT,
            &DisconnectEvent {
                reason: "client disconnect".to_string(),
            },
        );
    }

    /// Registers a listener for a server-pushed or local event.
    pub fn on(&self, event_name: &str, handler: Arc<dyn EventHandler>) -> Subscription {
        self.registry.on(event_name, handler)
    }

    /// Removes exactly `handler` from `event_name`.
    pub fn off(&self, event_name: &str, handler: &Arc<dyn EventHandler>) -> bool {
        self.registry.off(event_name, handler)
    }

    /// Decodes and dispatches one inbound frame. Returns the listener count.
    pub fn dispatch_frame(&self, frame: &str) -> usize {
        dispatch_frame(&self.registry, frame)
    }

    /// Sends a client-originated event. At-most-once, no acknowledgement.
    pub fn emit<T: Event>(&self, event_name: &str, payload: &T) -> Result<(), ClientError> {
        let frame = WireMessage::new(event_name, payload)?.encode()?;

        let guard = self.live();
        let Some(live) = guard.as_ref() else {
            return Err(if self.authenticated.load(Ordering::Acquire) {
                ClientError::NotConnected
            } else {
                ClientError::NotAuthenticated
            });
        };

        live.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| ClientError::Transport("outbound channel closed".to_string()))?;
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        debug!("📤 Emitted '{}' on connection {}", event_name, live.id);
        Ok(())
    }

    pub fn join_matchmaking(&self, mode: &str) -> Result<(), ClientError> {
        self.emit(
            names::JOIN_MATCHMAKING,
            &JoinMatchmakingRequest {
                mode: mode.to_string(),
            },
        )
    }

    pub fn leave_matchmaking(&self) -> Result<(), ClientError> {
        self.emit(names::LEAVE_MATCHMAKING, &LeaveMatchmakingRequest::default())
    }

    pub fn join_room(&self, match_id: &MatchId) -> Result<(), ClientError> {
        self.emit(
            names::JOIN_ROOM,
            &JoinRoomRequest {
                room_id: match_id.clone(),
            },
        )
    }

    pub fn send_code_update(&self, match_id: &MatchId, language: Language) -> Result<(), ClientError> {
        self.emit(
            names::CODE_UPDATE,
            &CodeUpdateEvent {
                match_id: match_id.clone(),
                language,
                player_id: None,
            },
        )
    }

    /// Number of frames handed to the transport since creation.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }
}

fn dispatch_frame(registry: &EventRegistry, frame: &str) -> usize {
    match WireMessage::decode(frame) {
        Ok(message) => registry.dispatch_message(&message),
        Err(e) => {
            warn!("⚠️ Dropping malformed frame: {}", e);
            0
        }
    }
}
