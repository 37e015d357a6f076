//! Embedded static assets for the web channel. Kept as consts so the
//! binary ships self-contained with no asset directory to deploy.

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Quill</title>
<link rel="stylesheet" href="/style.css">
</head>
<body>
<div id="app">
  <aside id="sidebar">
    <div class="sidebar-header">
      <h1>Quill</h1>
      <button id="new-chat" title="New chat">+</button>
    </div>
    <ul id="session-list"></ul>
    <div class="sidebar-footer">
      <h2>Workflow</h2>
      <ul id="progress-list">
        <li data-stage="ideate">Ideas</li>
        <li data-stage="outline">Outline</li>
        <li data-stage="draft">Draft</li>
        <li data-stage="feedback">Feedback</li>
        <li data-stage="seo">SEO</li>
      </ul>
      <button id="reset-chat">Reset session</button>
    </div>
  </aside>
  <main id="chat">
    <div id="status" class="disconnected">connecting...</div>
    <div id="messages"></div>
    <form id="composer">
      <textarea id="input" rows="2" placeholder="Ask for ideas, an outline, a draft..."></textarea>
      <button type="submit">Send</button>
    </form>
  </main>
</div>
<script src="/app.js"></script>
</body>
</html>
"#;

pub const STYLE_CSS: &str = r#":root {
  --bg: #15161a;
  --panel: #1d1f26;
  --border: #2c2f3a;
  --text: #e7e9ee;
  --muted: #8b90a0;
  --accent: #7aa2f7;
  --done: #9ece6a;
  --error: #f7768e;
}
* { box-sizing: border-box; margin: 0; padding: 0; }
body { background: var(--bg); color: var(--text); font: 15px/1.5 system-ui, sans-serif; }
#app { display: flex; height: 100vh; }
#sidebar {
  width: 240px; background: var(--panel); border-right: 1px solid var(--border);
  display: flex; flex-direction: column; padding: 12px;
}
.sidebar-header { display: flex; align-items: center; justify-content: space-between; margin-bottom: 12px; }
.sidebar-header h1 { font-size: 18px; }
#new-chat {
  background: var(--accent); color: var(--bg); border: none; border-radius: 6px;
  width: 26px; height: 26px; font-size: 16px; cursor: pointer;
}
#session-list { flex: 1; overflow-y: auto; list-style: none; }
#session-list li {
  padding: 6px 8px; border-radius: 6px; cursor: pointer; color: var(--muted);
  white-space: nowrap; overflow: hidden; text-overflow: ellipsis;
}
#session-list li.active { background: var(--border); color: var(--text); }
.sidebar-footer h2 { font-size: 12px; text-transform: uppercase; color: var(--muted); margin: 10px 0 6px; }
#progress-list { list-style: none; margin-bottom: 10px; }
#progress-list li { color: var(--muted); padding: 2px 0; }
#progress-list li::before { content: "\25CB  "; }
#progress-list li.done { color: var(--done); }
#progress-list li.done::before { content: "\25CF  "; }
#reset-chat {
  width: 100%; background: none; border: 1px solid var(--border); color: var(--muted);
  border-radius: 6px; padding: 6px; cursor: pointer;
}
#reset-chat:hover { color: var(--error); border-color: var(--error); }
#chat { flex: 1; display: flex; flex-direction: column; }
#status { padding: 4px 16px; font-size: 12px; color: var(--muted); }
#status.disconnected { color: var(--error); }
#messages { flex: 1; overflow-y: auto; padding: 16px; display: flex; flex-direction: column; gap: 10px; }
.msg { max-width: 72%; padding: 10px 14px; border-radius: 10px; white-space: pre-wrap; }
.msg.user { align-self: flex-end; background: var(--accent); color: var(--bg); }
.msg.agent { align-self: flex-start; background: var(--panel); border: 1px solid var(--border); }
.msg.error { align-self: flex-start; background: var(--panel); border: 1px solid var(--error); color: var(--error); }
.msg .agent-name { font-size: 11px; color: var(--muted); margin-bottom: 4px; }
#composer { display: flex; gap: 8px; padding: 12px 16px; border-top: 1px solid var(--border); }
#input {
  flex: 1; background: var(--panel); color: var(--text); border: 1px solid var(--border);
  border-radius: 8px; padding: 8px 12px; resize: none; font: inherit;
}
#composer button {
  background: var(--accent); color: var(--bg); border: none; border-radius: 8px;
  padding: 0 18px; font: inherit; cursor: pointer;
}
"#;

pub const APP_JS: &str = r#"(() => {
  let chatId = localStorage.getItem("quill.chatId") || crypto.randomUUID();
  localStorage.setItem("quill.chatId", chatId);

  let ws = null;
  const statusEl = document.getElementById("status");
  const messagesEl = document.getElementById("messages");
  const inputEl = document.getElementById("input");
  const sessionListEl = document.getElementById("session-list");

  function connect() {
    const proto = location.protocol === "https:" ? "wss:" : "ws:";
    ws = new WebSocket(`${proto}//${location.host}/ws`);

    ws.onopen = () => {
      statusEl.textContent = "connected";
      statusEl.classList.remove("disconnected");
      request("get_history");
      request("get_progress");
      refreshSessions();
    };
    ws.onclose = () => {
      statusEl.textContent = "disconnected, retrying...";
      statusEl.classList.add("disconnected");
      setTimeout(connect, 2000);
    };
    ws.onmessage = (event) => {
      const msg = JSON.parse(event.data);
      if (msg.chatId && msg.chatId !== chatId) return;
      switch (msg.type) {
        case "message":
          addMessage("agent", msg.content, msg.agent);
          if (msg.progress) renderProgress(msg.progress);
          refreshSessions();
          break;
        case "error":
          addMessage("error", msg.content, msg.agent);
          break;
        case "history":
          messagesEl.innerHTML = "";
          for (const m of msg.messages) addMessage(m.role, m.content, m.agent);
          break;
        case "progress":
          renderProgress(msg.progress);
          break;
      }
    };
  }

  function request(type) {
    if (ws && ws.readyState === WebSocket.OPEN) {
      ws.send(JSON.stringify({ type, chatId }));
    }
  }

  function addMessage(role, content, agent) {
    const div = document.createElement("div");
    div.className = `msg ${role}`;
    if (agent && role !== "user") {
      const name = document.createElement("div");
      name.className = "agent-name";
      name.textContent = agent;
      div.appendChild(name);
    }
    div.appendChild(document.createTextNode(content));
    messagesEl.appendChild(div);
    messagesEl.scrollTop = messagesEl.scrollHeight;
  }

  function renderProgress(progress) {
    for (const item of progress) {
      const li = document.querySelector(`#progress-list li[data-stage="${item.stage}"]`);
      if (li) li.classList.toggle("done", item.complete);
    }
  }

  async function refreshSessions() {
    try {
      const res = await fetch("/api/sessions");
      const sessions = await res.json();
      sessionListEl.innerHTML = "";
      for (const s of sessions) {
        const li = document.createElement("li");
        li.textContent = s.title;
        const id = s.id.replace(/^web:/, "");
        if (id === chatId) li.classList.add("active");
        li.onclick = () => switchChat(id);
        sessionListEl.appendChild(li);
      }
    } catch (_) {}
  }

  function switchChat(id) {
    chatId = id;
    localStorage.setItem("quill.chatId", chatId);
    messagesEl.innerHTML = "";
    request("get_history");
    request("get_progress");
    refreshSessions();
  }

  document.getElementById("new-chat").onclick = () => switchChat(crypto.randomUUID());

  document.getElementById("reset-chat").onclick = () => {
    messagesEl.innerHTML = "";
    request("reset");
    refreshSessions();
  };

  document.getElementById("composer").onsubmit = (e) => {
    e.preventDefault();
    const content = inputEl.value.trim();
    if (!content || !ws || ws.readyState !== WebSocket.OPEN) return;
    addMessage("user", content);
    ws.send(JSON.stringify({ type: "message", content, chatId }));
    inputEl.value = "";
  };

  inputEl.addEventListener("keydown", (e) => {
    if (e.key === "Enter" && !e.shiftKey) {
      e.preventDefault();
      document.getElementById("composer").requestSubmit();
    }
  });

  connect();
})();
"#;
