use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use dashmap::DashMap;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use quill_config::GatewayConfig;
use quill_core::bus::InboundMessage;
use quill_core::session::{Role, SessionStore};
use quill_core::workflow::{self, StageProgress, WorkflowStep};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{error, info, warn};

use crate::base::Channel;
use crate::web_assets;

type WsSender = mpsc::UnboundedSender<Message>;

/// Browser chat channel: serves the embedded UI and bridges WebSocket
/// messages to the inbound bus. History and progress are answered from
/// session-store snapshots, never from internal state.
pub struct WebChannel {
    gateway: GatewayConfig,
    store: Arc<SessionStore>,
    /// Keyed by connection ID (UUID). The server is stateless about which
    /// chat is active — the client includes chatId in every message and
    /// filters inbound responses by chatId.
    connections: Arc<DashMap<String, WsSender>>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
}

#[derive(Clone)]
struct AppState {
    store: Arc<SessionStore>,
    connections: Arc<DashMap<String, WsSender>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
}

#[derive(Serialize)]
struct WsOutMsg {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "chatId")]
    chat_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    messages: Option<Vec<HistoryMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<Vec<StageProgress>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<WorkflowStep>,
}

impl WsOutMsg {
    fn empty(msg_type: &str) -> Self {
        Self {
            msg_type: msg_type.to_string(),
            content: None,
            agent: None,
            chat_id: None,
            timestamp: None,
            messages: None,
            progress: None,
            step: None,
        }
    }
}

#[derive(Serialize, Clone)]
struct HistoryMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent: Option<String>,
    content: String,
    timestamp: String,
}

#[derive(Deserialize)]
struct WsInMsg {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    #[serde(rename = "chatId")]
    chat_id: String,
}

impl WebChannel {
    pub fn new(gateway: GatewayConfig, store: Arc<SessionStore>) -> Self {
        Self {
            gateway,
            store,
            connections: Arc::new(DashMap::new()),
            shutdown_tx: Mutex::new(None),
        }
    }

    fn broadcast(&self, out: &WsOutMsg) -> Result<()> {
        let json = serde_json::to_string(out)?;
        for entry in self.connections.iter() {
            if entry
                .value()
                .send(Message::Text(json.clone().into()))
                .is_err()
            {
                warn!(
                    "WebSocket send failed for conn={}, will clean up on disconnect",
                    entry.key()
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Channel for WebChannel {
    fn name(&self) -> &str {
        "web"
    }

    async fn start(&self, inbound_tx: mpsc::Sender<InboundMessage>) -> Result<()> {
        let state = AppState {
            store: self.store.clone(),
            connections: self.connections.clone(),
            inbound_tx,
        };

        let router = Router::new()
            .route("/", get(serve_index))
            .route("/style.css", get(serve_css))
            .route("/app.js", get(serve_js))
            .route("/ws", get(ws_upgrade))
            .route("/api/sessions", get(api_list_sessions))
            .with_state(state);

        let addr: SocketAddr = format!("{}:{}", self.gateway.host, self.gateway.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid gateway listen address: {e}"))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Web channel listening on http://{addr}");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        *self.shutdown_tx.lock().await = Some(shutdown_tx);

        let connections = self.connections.clone();
        tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });

            if let Err(e) = server.await {
                error!("Web server error: {e}");
            }

            connections.clear();
        });

        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.lock().await.take() {
            let _ = tx.send(());
        }
        self.connections.clear();
        Ok(())
    }

    async fn send(&self, msg: &quill_core::bus::OutboundMessage) -> Result<()> {
        if self.connections.is_empty() {
            warn!(
                "No active WebSocket connections, message for chat_id={} saved to session only",
                msg.chat_id
            );
            return Ok(());
        }

        let mut out = WsOutMsg::empty(if msg.is_error { "error" } else { "message" });
        out.content = Some(msg.content.clone());
        out.agent = msg.agent.clone();
        out.chat_id = Some(msg.chat_id.clone());
        out.timestamp = Some(chrono::Local::now().to_rfc3339());
        out.progress = Some(msg.progress.clone());

        // Broadcast to all connections — each client filters by chatId
        self.broadcast(&out)
    }
}

// --- Axum Handlers ---

async fn serve_index() -> Html<&'static str> {
    Html(web_assets::INDEX_HTML)
}

async fn serve_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], web_assets::STYLE_CSS)
}

async fn serve_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        web_assets::APP_JS,
    )
}

async fn api_list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.store.list())
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
        .into_response()
}

async fn handle_ws(socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let short_conn = &conn_id[..8];
    info!("WebSocket connected: conn={short_conn}");

    let (ws_write, mut ws_read) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    state.connections.insert(conn_id.clone(), tx.clone());

    let write_conn_id = conn_id.clone();
    let write_handle = tokio::spawn(ws_write_loop(ws_write, rx, write_conn_id));

    send_json(&tx, &WsOutMsg::empty("connected"));

    while let Some(result) = ws_read.next().await {
        let msg = match result {
            Ok(m) => m,
            Err(e) => {
                warn!("WebSocket read error for conn={short_conn}: {e}");
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                let parsed: WsInMsg = match serde_json::from_str(&text) {
                    Ok(m) => m,
                    Err(_) => continue,
                };
                if parsed.chat_id.is_empty() {
                    continue;
                }

                match parsed.msg_type.as_str() {
                    "get_history" => {
                        send_json(&tx, &history_msg(&state.store, &parsed.chat_id));
                    }
                    "get_progress" => {
                        send_json(&tx, &progress_msg(&state.store, &parsed.chat_id));
                    }
                    "reset" => {
                        state.store.reset(&session_key(&parsed.chat_id));
                        send_json(&tx, &progress_msg(&state.store, &parsed.chat_id));
                    }
                    "message" => {
                        if parsed.content.trim().is_empty() {
                            continue;
                        }
                        let inbound = InboundMessage {
                            channel: "web".to_string(),
                            chat_id: parsed.chat_id,
                            content: parsed.content,
                            timestamp: chrono::Local::now().to_rfc3339(),
                        };
                        if let Err(e) = state.inbound_tx.send(inbound).await {
                            error!("Failed to send inbound message: {e}");
                            break;
                        }
                    }
                    _ => {}
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.connections.remove(&conn_id);
    write_handle.abort();
    info!("WebSocket disconnected: conn={short_conn}");
}

async fn ws_write_loop(
    mut ws_write: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    conn_id: String,
) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = ws_write.send(msg).await {
            warn!("WebSocket write error for conn={conn_id}: {e}");
            break;
        }
    }
}

fn send_json(tx: &WsSender, out: &WsOutMsg) {
    if let Ok(json) = serde_json::to_string(out) {
        let _ = tx.send(Message::Text(json.into()));
    }
}

/// Session key for a web chat, matching the gateway's bus convention.
fn session_key(chat_id: &str) -> String {
    format!("web:{chat_id}")
}

fn history_msg(store: &SessionStore, chat_id: &str) -> WsOutMsg {
    let snapshot = store.snapshot(&session_key(chat_id));
    let messages = snapshot
        .turns
        .iter()
        .map(|turn| HistoryMessage {
            role: match turn.role {
                Role::User => "user".to_string(),
                Role::Agent => "agent".to_string(),
            },
            agent: turn.agent.clone(),
            content: turn.text.clone(),
            timestamp: turn.timestamp.clone(),
        })
        .collect();

    let mut out = WsOutMsg::empty("history");
    out.chat_id = Some(chat_id.to_string());
    out.messages = Some(messages);
    out
}

fn progress_msg(store: &SessionStore, chat_id: &str) -> WsOutMsg {
    let snapshot = store.snapshot(&session_key(chat_id));
    let mut out = WsOutMsg::empty("progress");
    out.chat_id = Some(chat_id.to_string());
    out.progress = Some(workflow::progress_of(&snapshot));
    out.step = Some(workflow::current_step(&snapshot));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::session::Turn;
    use quill_core::slots::OutputSlot;

    #[test]
    fn ws_out_msg_skips_absent_fields() {
        let msg = WsOutMsg::empty("connected");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"connected"}"#);
    }

    #[test]
    fn ws_in_msg_deserialization() {
        let json = r#"{"type":"message","content":"hello","chatId":"abc-123"}"#;
        let msg: WsInMsg = serde_json::from_str(json).unwrap();
        assert_eq!(msg.msg_type, "message");
        assert_eq!(msg.content, "hello");
        assert_eq!(msg.chat_id, "abc-123");
    }

    #[test]
    fn ws_in_msg_missing_fields_default() {
        let msg: WsInMsg = serde_json::from_str(r#"{"type":"get_history"}"#).unwrap();
        assert_eq!(msg.content, "");
        assert_eq!(msg.chat_id, "");
    }

    #[test]
    fn history_built_from_store_snapshot() {
        let store = SessionStore::new();
        store.append_turn("web:c1", Turn::user("hello"));
        store.append_turn("web:c1", Turn::agent("ideate", "some ideas"));

        let out = history_msg(&store, "c1");
        let messages = out.messages.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert!(messages[0].agent.is_none());
        assert_eq!(messages[1].role, "agent");
        assert_eq!(messages[1].agent.as_deref(), Some("ideate"));
        assert_eq!(messages[1].content, "some ideas");
    }

    #[test]
    fn progress_msg_reflects_slots() {
        let store = SessionStore::new();
        store.write_slot("web:c1", OutputSlot::Ideas, "A, B");

        let out = progress_msg(&store, "c1");
        let progress = out.progress.unwrap();
        assert!(progress[0].complete);
        assert!(progress[1..].iter().all(|p| !p.complete));
        assert_eq!(out.step, Some(WorkflowStep::IdeasGenerated));
    }

    #[test]
    fn progress_serializes_stage_and_flag() {
        let store = SessionStore::new();
        store.write_slot("web:c1", OutputSlot::Draft, "text");
        let out = progress_msg(&store, "c1");
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains(r#"{"stage":"draft","complete":true}"#));
        assert!(json.contains(r#""step":"draft_completed""#));
    }
}
