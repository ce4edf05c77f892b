//! In-memory [`Connector`] for tests.

use super::transport::{Connector, Inbound, Link, Outbound};
use crate::error::ClientError;
use async_trait::async_trait;
use clash_events::WireMessage;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct MockState {
    fail_with: Option<String>,
    opens: usize,
    tokens: Vec<String>,
    outbound: Option<mpsc::UnboundedReceiver<Outbound>>,
    inbound: Option<mpsc::UnboundedSender<Inbound>>,
    sent: Vec<WireMessage>,
    closed: bool,
}

/// Records everything the client sends and lets tests push server frames.
#[derive(Debug, Default, Clone)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent handshake fail with `message`.
    pub fn failing(message: &str) -> Self {
        let connector = Self::default();
        connector.state.lock().unwrap().fail_with = Some(message.to_string());
        connector
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub fn tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().tokens.clone()
    }

    /// Every frame sent so far, oldest first.
    pub fn sent(&self) -> Vec<WireMessage> {
        let mut state = self.state.lock().unwrap();
        let mut drained = Vec::new();
        let mut saw_close = false;
        if let Some(rx) = state.outbound.as_mut() {
            while let Ok(outbound) = rx.try_recv() {
                match outbound {
                    Outbound::Frame(frame) => drained.push(WireMessage::decode(&frame).unwrap()),
                    Outbound::Close => saw_close = true,
                }
            }
        }
        state.sent.extend(drained);
        state.closed |= saw_close;
        state.sent.clone()
    }

    /// Names of every event sent so far.
    pub fn sent_events(&self) -> Vec<String> {
        self.sent().into_iter().map(|message| message.event).collect()
    }

    pub fn was_closed(&self) -> bool {
        self.sent();
        self.state.lock().unwrap().closed
    }

    /// Pushes a server frame through the live link.
    pub fn push(&self, event: &str, data: serde_json::Value) {
        let frame = WireMessage { event: event.to_string(), data }.encode().unwrap();
        self.push_raw(Inbound::Frame(frame));
    }

    pub fn push_raw(&self, inbound: Inbound) {
        let state = self.state.lock().unwrap();
        state
            .inbound
            .as_ref()
            .expect("no open link")
            .send(inbound)
            .unwrap();
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, _url: &str, token: &str) -> Result<Link, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.opens += 1;
        state.tokens.push(token.to_string());
        if let Some(message) = &state.fail_with {
            return Err(ClientError::Handshake(message.clone()));
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        state.outbound = Some(outbound_rx);
        state.inbound = Some(inbound_tx);

        Ok(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
