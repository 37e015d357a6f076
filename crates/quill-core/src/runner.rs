use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::provider::{CompletionBackend, CompletionParams};
use crate::registry::{AgentRegistry, AgentSpec, ORCHESTRATOR};
use crate::router::{RouteDecision, Router};
use crate::session::{SessionStore, Turn};
use crate::workflow::{self, StageProgress};

/// Result of one processed user message.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub agent: String,
    pub text: String,
    pub progress: Vec<StageProgress>,
}

/// Drives one user message through the pipeline: append turn, route,
/// invoke the chosen agent with its prior-slot context, write the result
/// back into the session.
pub struct AgentRunner {
    store: Arc<SessionStore>,
    registry: AgentRegistry,
    router: Router,
    backend: Arc<dyn CompletionBackend>,
    temperature: f64,
    max_tokens: u64,
}

impl AgentRunner {
    pub fn new(
        store: Arc<SessionStore>,
        registry: AgentRegistry,
        backend: Arc<dyn CompletionBackend>,
        temperature: f64,
        max_tokens: u64,
    ) -> Result<Self> {
        registry.validate()?;
        Ok(Self {
            store,
            router: Router::new(backend.clone()),
            registry,
            backend,
            temperature,
            max_tokens,
        })
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Process a single user message.
    ///
    /// The user turn is appended up front and persists even when the
    /// invocation fails. Everything else — agent turn, slot write — only
    /// happens after the model call succeeds, so a failed or cancelled
    /// invocation leaves no partial state and the conversation stays
    /// usable.
    pub async fn process_message(&self, session_id: &str, user_text: &str) -> Result<TurnOutcome> {
        self.store.append_turn(session_id, Turn::user(user_text));

        let progress = workflow::progress(&self.store, session_id);
        let decision = self.router.route(&self.registry, &progress, user_text).await?;
        let agent = match &decision {
            RouteDecision::Specialist(name) => self
                .registry
                .get(name)
                .expect("router only returns registered names"),
            RouteDecision::Orchestrator => self
                .registry
                .get(ORCHESTRATOR)
                .expect("validated at construction"),
        };
        info!("Session '{session_id}': routing to agent '{}'", agent.name);

        let params = CompletionParams {
            preamble: agent.instruction.clone(),
            prompt: self.build_prompt(session_id, agent, user_text),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let reply = self.backend.complete(&params).await?;

        self.store
            .append_turn(session_id, Turn::agent(&agent.name, &reply));
        if let Some(slot) = agent.output_slot {
            self.store.write_slot(session_id, slot, reply.clone());
        }

        Ok(TurnOutcome {
            agent: agent.name.clone(),
            text: reply,
            progress: workflow::progress(&self.store, session_id),
        })
    }

    /// Context for one invocation: the agent's declared input slots (with
    /// absent ones marked, so the agent can degrade gracefully) followed
    /// by the user request.
    fn build_prompt(&self, session_id: &str, agent: &AgentSpec, user_text: &str) -> String {
        let mut parts = Vec::new();
        for &slot in &agent.reads {
            match self.store.read_slot(session_id, slot) {
                Some(value) => parts.push(format!("## Current {slot}\n{value}")),
                None => parts.push(format!("## Current {slot}\n(not yet available)")),
            }
        }
        parts.push(format!("## User request\n{user_text}"));
        parts.join("\n\n")
    }
}
