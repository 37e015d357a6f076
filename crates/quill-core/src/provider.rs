use async_trait::async_trait;
#[allow(deprecated)]
use rig::client::completion::CompletionModelHandle;
use rig::completion::{CompletionModel, CompletionRequest, Message};
use rig::message::{AssistantContent, Text, UserContent};
use rig::OneOrMany;
use tracing::debug;

use crate::error::{Error, Result};

/// A single (instruction + context) -> text inference request.
#[derive(Debug, Clone)]
pub struct CompletionParams {
    pub preamble: String,
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u64,
}

/// The hosted-model invocation boundary. Opaque request/response of
/// (instruction + context text) -> text; pluggable so the surrounding
/// session and tracking logic can be tested with a deterministic stand-in.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, params: &CompletionParams) -> Result<String>;
}

/// Production backend over a rig completion model.
#[allow(deprecated)]
pub struct RigBackend {
    model: CompletionModelHandle<'static>,
    model_name: String,
}

#[allow(deprecated)]
impl RigBackend {
    pub fn new(model: CompletionModelHandle<'static>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }
}

#[allow(deprecated)]
#[async_trait]
impl CompletionBackend for RigBackend {
    async fn complete(&self, params: &CompletionParams) -> Result<String> {
        let request = CompletionRequest {
            preamble: Some(params.preamble.clone()),
            chat_history: OneOrMany::one(Message::User {
                content: OneOrMany::one(UserContent::Text(Text {
                    text: params.prompt.clone(),
                })),
            }),
            documents: Vec::new(),
            tools: Vec::new(),
            temperature: Some(params.temperature),
            max_tokens: Some(params.max_tokens),
            tool_choice: None,
            additional_params: None,
        };

        debug!(
            "LLM request to '{}': {} prompt chars, temp={}, max_tokens={}",
            self.model_name,
            params.prompt.len(),
            params.temperature,
            params.max_tokens
        );

        let start = std::time::Instant::now();
        let response = self
            .model
            .completion(request)
            .await
            .map_err(|e| Error::Invocation(format!("{e}")))?;

        let text: String = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect();

        debug!(
            "LLM response from '{}': {} chars in {:.1}s",
            self.model_name,
            text.len(),
            start.elapsed().as_secs_f64()
        );

        if text.trim().is_empty() {
            return Err(Error::Invocation(format!(
                "model '{}' returned no text",
                self.model_name
            )));
        }
        Ok(text)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Deterministic backend for tests. Pops one scripted entry per call:
    /// `Some(text)` succeeds, `None` fails with an invocation error.
    pub struct ScriptedBackend {
        replies: Mutex<VecDeque<Option<String>>>,
        pub calls: Mutex<Vec<CompletionParams>>,
    }

    impl ScriptedBackend {
        pub fn new(replies: &[Option<&str>]) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .iter()
                        .map(|r| r.map(|s| s.to_string()))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, params: &CompletionParams) -> Result<String> {
            self.calls.lock().unwrap().push(params.clone());
            match self.replies.lock().unwrap().pop_front() {
                Some(Some(text)) => Ok(text),
                Some(None) => Err(Error::Invocation("scripted failure".into())),
                None => Err(Error::Invocation("scripted backend exhausted".into())),
            }
        }
    }
}
