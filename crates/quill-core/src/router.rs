use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::provider::{CompletionBackend, CompletionParams};
use crate::registry::{AgentRegistry, ORCHESTRATOR};
use crate::workflow::StageProgress;

/// Which agent handles the next turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Specialist(String),
    Orchestrator,
}

/// Selects one agent per user message. Selection is delegated to the
/// hosted model; the only local logic is parsing the reply back into a
/// registered name. Total over reply content: anything unrecognized falls
/// back to the orchestrator.
pub struct Router {
    backend: Arc<dyn CompletionBackend>,
}

impl Router {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub async fn route(
        &self,
        registry: &AgentRegistry,
        progress: &[StageProgress],
        user_text: &str,
    ) -> Result<RouteDecision> {
        let params = CompletionParams {
            preamble: routing_preamble(registry),
            prompt: routing_prompt(progress, user_text),
            // Deterministic, single-word answer
            temperature: 0.0,
            max_tokens: 16,
        };
        let reply = self.backend.complete(&params).await?;
        let decision = parse_decision(registry, &reply);
        debug!("Router reply '{}' -> {decision:?}", reply.trim());
        Ok(decision)
    }
}

fn routing_preamble(registry: &AgentRegistry) -> String {
    let mut lines = vec![
        "You are the router of a content-creation assistant. Read the user \
         message and the workflow progress, then pick the single best agent \
         to handle it."
            .to_string(),
        String::new(),
        "Agents:".to_string(),
    ];
    for agent in registry.specialists() {
        lines.push(format!("- {}: {}", agent.name, agent.description));
    }
    lines.push(format!(
        "- {ORCHESTRATOR}: answer directly when no specialist clearly matches"
    ));
    lines.push(String::new());
    lines.push(
        "The usual progression is ideate, outline, draft, feedback, seo, but \
         the user may jump to any step. If the user asks to continue or for \
         the next step, pick the first incomplete stage. Reply with exactly \
         one agent name and nothing else."
            .to_string(),
    );
    lines.join("\n")
}

fn routing_prompt(progress: &[StageProgress], user_text: &str) -> String {
    let status: Vec<String> = progress
        .iter()
        .map(|p| {
            format!(
                "{}: {}",
                p.stage,
                if p.complete { "complete" } else { "incomplete" }
            )
        })
        .collect();
    format!(
        "Workflow progress: {}\n\nUser message: {user_text}",
        status.join(", ")
    )
}

/// Map a model reply to a registered agent. Exact name match first, then
/// substring containment for verbose replies, then orchestrator fallback.
fn parse_decision(registry: &AgentRegistry, reply: &str) -> RouteDecision {
    let normalized = reply.trim().to_lowercase();

    if normalized == ORCHESTRATOR {
        return RouteDecision::Orchestrator;
    }
    for agent in registry.specialists() {
        if normalized == agent.name {
            return RouteDecision::Specialist(agent.name.clone());
        }
    }
    for agent in registry.specialists() {
        if normalized.contains(&agent.name) {
            return RouteDecision::Specialist(agent.name.clone());
        }
    }
    RouteDecision::Orchestrator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::ScriptedBackend;

    fn registry() -> AgentRegistry {
        AgentRegistry::builtin("test-model")
    }

    async fn route_with(reply: &str, user_text: &str) -> RouteDecision {
        let backend = Arc::new(ScriptedBackend::new(&[Some(reply)]));
        let router = Router::new(backend);
        router.route(&registry(), &[], user_text).await.unwrap()
    }

    #[tokio::test]
    async fn exact_name_is_selected() {
        let decision = route_with("ideate", "give me blog ideas").await;
        assert_eq!(decision, RouteDecision::Specialist("ideate".into()));
    }

    #[tokio::test]
    async fn verbose_reply_still_resolves() {
        let decision = route_with("I would pick the `draft` agent.", "write it up").await;
        assert_eq!(decision, RouteDecision::Specialist("draft".into()));
    }

    #[tokio::test]
    async fn unrecognized_reply_falls_back_to_orchestrator() {
        let decision = route_with("the summarizer agent", "hello").await;
        assert_eq!(decision, RouteDecision::Orchestrator);
    }

    #[tokio::test]
    async fn orchestrator_reply_is_fallback() {
        let decision = route_with("Orchestrator", "what can you do?").await;
        assert_eq!(decision, RouteDecision::Orchestrator);
    }

    #[tokio::test]
    async fn prompt_carries_progress_and_agent_roster() {
        let backend = Arc::new(ScriptedBackend::new(&[Some("seo")]));
        let router = Router::new(backend.clone());
        let progress = vec![
            StageProgress {
                stage: crate::slots::Stage::Ideate,
                complete: true,
            },
            StageProgress {
                stage: crate::slots::Stage::Outline,
                complete: false,
            },
        ];
        router
            .route(&registry(), &progress, "optimize my post")
            .await
            .unwrap();

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].preamble.contains("- seo:"));
        assert!(calls[0].prompt.contains("ideate: complete"));
        assert!(calls[0].prompt.contains("outline: incomplete"));
        assert!(calls[0].prompt.contains("optimize my post"));
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let backend = Arc::new(ScriptedBackend::new(&[None]));
        let router = Router::new(backend);
        let err = router.route(&registry(), &[], "hi").await.unwrap_err();
        assert!(matches!(err, crate::error::Error::Invocation(_)));
    }
}
