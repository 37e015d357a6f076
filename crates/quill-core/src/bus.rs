use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::workflow::StageProgress;

/// User message received from a chat channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel: String,
    pub chat_id: String,
    pub content: String,
    pub timestamp: String,
}

impl InboundMessage {
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.channel, self.chat_id)
    }
}

/// Agent response (or turn failure) to deliver back to a channel, with
/// the workflow progress to render alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub chat_id: String,
    pub agent: Option<String>,
    pub content: String,
    pub progress: Vec<StageProgress>,
    /// True when this reports a failed turn rather than agent output.
    pub is_error: bool,
}

/// Async message bus connecting channels to the runner loop.
pub struct MessageBus {
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    pub inbound_rx: mpsc::Receiver<InboundMessage>,
    pub outbound_tx: broadcast::Sender<OutboundMessage>,
}

impl MessageBus {
    pub fn new(buffer: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer);
        let (outbound_tx, _) = broadcast::channel(buffer);
        Self {
            inbound_tx,
            inbound_rx,
            outbound_tx,
        }
    }
}
