//! Channel lifecycle and outbound dispatch for the gateway.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use quill_core::bus::{InboundMessage, OutboundMessage};

use crate::base::Channel;

/// Owns the registered channels: starts them, routes each outbound
/// message to the channel it names, stops everything on shutdown.
///
/// Registration happens before `start_all`; the channel set is fixed for
/// the life of the gateway.
pub struct ChannelManager {
    channels: HashMap<String, Arc<dyn Channel>>,
    outbound_rx: Option<broadcast::Receiver<OutboundMessage>>,
    dispatch_handle: Option<JoinHandle<()>>,
}

impl ChannelManager {
    pub fn new(outbound_rx: broadcast::Receiver<OutboundMessage>) -> Self {
        Self {
            channels: HashMap::new(),
            outbound_rx: Some(outbound_rx),
            dispatch_handle: None,
        }
    }

    pub fn register(&mut self, channel: Arc<dyn Channel>) {
        let name = channel.name().to_string();
        info!("Registered channel: {name}");
        self.channels.insert(name, channel);
    }

    /// Start every registered channel and the outbound dispatcher.
    pub async fn start_all(&mut self, inbound_tx: mpsc::Sender<InboundMessage>) -> Result<()> {
        for (name, channel) in &self.channels {
            let channel = channel.clone();
            let tx = inbound_tx.clone();
            let name = name.clone();
            tokio::spawn(async move {
                if let Err(e) = channel.start(tx).await {
                    error!("Channel {name} failed: {e}");
                }
            });
        }

        if let Some(outbound_rx) = self.outbound_rx.take() {
            let channels = self.channels.clone();
            self.dispatch_handle = Some(tokio::spawn(dispatch_outbound(outbound_rx, channels)));
        }

        Ok(())
    }

    /// Stop the dispatcher, then every channel.
    pub async fn stop_all(&mut self) -> Result<()> {
        if let Some(handle) = self.dispatch_handle.take() {
            handle.abort();
            info!("Stopped outbound dispatcher");
        }

        for (name, channel) in &self.channels {
            info!("Stopping channel: {name}");
            if let Err(e) = channel.stop().await {
                warn!("Error stopping channel {name}: {e}");
            }
        }
        Ok(())
    }
}

async fn dispatch_outbound(
    mut outbound_rx: broadcast::Receiver<OutboundMessage>,
    channels: HashMap<String, Arc<dyn Channel>>,
) {
    loop {
        match outbound_rx.recv().await {
            Ok(msg) => match channels.get(&msg.channel) {
                Some(channel) => {
                    if let Err(e) = channel.send(&msg).await {
                        error!("Failed to send via channel {}: {e}", msg.channel);
                    }
                }
                None => {
                    warn!("Outbound message for unknown channel: {}", msg.channel);
                }
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Outbound dispatcher lagged, dropped {n} messages");
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!("Outbound channel closed, dispatcher exiting");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct MockChannel {
        name: String,
        started: AtomicBool,
        stopped: AtomicBool,
        sent: Mutex<Vec<OutboundMessage>>,
    }

    impl MockChannel {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                started: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Channel for MockChannel {
        fn name(&self) -> &str {
            &self.name
        }

        async fn start(&self, _inbound_tx: mpsc::Sender<InboundMessage>) -> Result<()> {
            self.started.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn send(&self, msg: &OutboundMessage) -> Result<()> {
            self.sent.lock().unwrap().push(msg.clone());
            Ok(())
        }
    }

    fn outbound(channel: &str, content: &str) -> OutboundMessage {
        OutboundMessage {
            channel: channel.to_string(),
            chat_id: "c1".to_string(),
            agent: Some("ideate".to_string()),
            content: content.to_string(),
            progress: Vec::new(),
            is_error: false,
        }
    }

    #[tokio::test]
    async fn dispatches_outbound_to_the_named_channel() {
        let (outbound_tx, outbound_rx) = broadcast::channel(8);
        let (inbound_tx, _inbound_rx) = mpsc::channel(8);

        let web = MockChannel::new("web");
        let mut manager = ChannelManager::new(outbound_rx);
        manager.register(web.clone());
        manager.start_all(inbound_tx).await.unwrap();

        outbound_tx.send(outbound("web", "reply")).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(web.started.load(Ordering::SeqCst));
        let sent = web.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content, "reply");
    }

    #[tokio::test]
    async fn unknown_channel_messages_are_dropped() {
        let (outbound_tx, outbound_rx) = broadcast::channel(8);
        let (inbound_tx, _inbound_rx) = mpsc::channel(8);

        let web = MockChannel::new("web");
        let mut manager = ChannelManager::new(outbound_rx);
        manager.register(web.clone());
        manager.start_all(inbound_tx).await.unwrap();

        outbound_tx.send(outbound("telegram", "lost")).unwrap();
        outbound_tx.send(outbound("web", "kept")).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let sent = web.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content, "kept");
    }

    #[tokio::test]
    async fn stop_all_stops_registered_channels() {
        let (_outbound_tx, outbound_rx) = broadcast::channel(8);
        let (inbound_tx, _inbound_rx) = mpsc::channel(8);

        let web = MockChannel::new("web");
        let mut manager = ChannelManager::new(outbound_rx);
        manager.register(web.clone());
        manager.start_all(inbound_tx).await.unwrap();
        manager.stop_all().await.unwrap();

        assert!(web.stopped.load(Ordering::SeqCst));
    }
}
