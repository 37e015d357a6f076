use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use quill_channels::manager::ChannelManager;
use quill_channels::web::WebChannel;
use quill_core::bus::{MessageBus, OutboundMessage};
use quill_core::provider::RigBackend;
use quill_core::session::SessionStore;
use quill_core::workflow;
use quill_core::{AgentRegistry, AgentRunner};
#[allow(deprecated)]
use rig::client::completion::CompletionModelHandle;
use rig::client::CompletionClient;
use rig::providers::{anthropic, gemini, openai};

#[derive(Parser)]
#[command(name = "quill", about = "Multi-agent content creation assistant", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web chat UI (default)
    Serve,
    /// Run one scripted conversation against the live provider
    SelfTest,
    /// Check that required environment variables are set
    CheckEnv,
    /// Show project information and usage
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let base_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        let debug = std::env::var("DEBUG_MODE")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        if debug { "debug".to_string() } else { "info".to_string() }
    });
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(base_filter))
        .init();

    let cli = Cli::parse();

    // No subcommand starts the web UI, matching the common case.
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Info => {
            print_info();
            Ok(())
        }
        Commands::CheckEnv => run_check_env(),
        Commands::SelfTest => run_self_test().await,
        Commands::Serve => run_serve().await,
    }
}

/// Create a completion model for the configured provider.
///
/// Errors clearly if the provider is unknown or has no API key.
#[allow(deprecated)]
fn create_model_for(config: &quill_config::Config) -> Result<CompletionModelHandle<'static>> {
    let provider = config.generation.provider.as_str();
    let model_name = config.generation.model.as_str();

    if model_name.is_empty() {
        anyhow::bail!("No model configured for provider '{provider}'. Set QUILL_MODEL.");
    }

    match provider {
        "gemini" => {
            let key = require_key(&config.providers.google_api_key, "GOOGLE_API_KEY")?;
            let client: gemini::Client = gemini::Client::new(key)
                .map_err(|e| anyhow::anyhow!("Failed to create Gemini client: {e}"))?;
            let model = client.completion_model(model_name);
            tracing::info!("Using Gemini provider with model '{model_name}'");
            Ok(CompletionModelHandle::new(Arc::new(model)))
        }
        "openai" => {
            let key = require_key(&config.providers.openai_api_key, "OPENAI_API_KEY")?;
            let client: openai::CompletionsClient = openai::CompletionsClient::builder()
                .api_key(&key)
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to create OpenAI client: {e}"))?;
            let model = client.completion_model(model_name);
            tracing::info!("Using OpenAI provider with model '{model_name}'");
            Ok(CompletionModelHandle::new(Arc::new(model)))
        }
        "anthropic" => {
            let key = require_key(&config.providers.anthropic_api_key, "ANTHROPIC_API_KEY")?;
            let client: anthropic::Client = anthropic::Client::builder()
                .api_key(&key)
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to create Anthropic client: {e}"))?;
            let model = client.completion_model(model_name);
            tracing::info!("Using Anthropic provider with model '{model_name}'");
            Ok(CompletionModelHandle::new(Arc::new(model)))
        }
        other => {
            anyhow::bail!("Unknown provider '{other}'. Valid providers: gemini, openai, anthropic")
        }
    }
}

fn require_key(key: &Option<String>, var: &str) -> Result<String> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("{var} is not set"))
}

/// Build the session store and agent runner from validated config.
fn build_runner(config: &quill_config::Config) -> Result<(Arc<SessionStore>, Arc<AgentRunner>)> {
    let handle = create_model_for(config)?;
    let backend = Arc::new(RigBackend::new(handle, config.generation.model.clone()));
    let registry = AgentRegistry::builtin(&config.generation.model);
    let store = Arc::new(SessionStore::new());
    let runner = AgentRunner::new(
        store.clone(),
        registry,
        backend,
        config.generation.temperature as f64,
        config.generation.max_tokens as u64,
    )?;
    Ok((store, Arc::new(runner)))
}

/// Check environment configuration and report the result.
fn run_check_env() -> Result<()> {
    println!("Checking environment configuration...");

    let config = quill_config::load_from_env()?;
    if let Err(e) = config.validate() {
        println!("Environment check failed: {e}");
        std::process::exit(1);
    }

    println!(
        "Environment looks good: provider '{}', model '{}', web UI on {}:{}",
        config.generation.provider,
        config.generation.model,
        config.gateway.host,
        config.gateway.port
    );
    Ok(())
}

/// Run one scripted conversation against the configured provider.
async fn run_self_test() -> Result<()> {
    println!("Testing the multi-agent system...");

    let config = quill_config::load_from_env()?;
    config.validate()?;
    let (store, runner) = build_runner(&config)?;

    let session_id = format!("selftest:{}", uuid::Uuid::new_v4());
    println!("Created test session: {session_id}");

    let message = "Give me some ideas for a blog post about artificial intelligence";
    println!("Sending test message: {message}");

    let outcome = runner.process_message(&session_id, message).await?;
    println!("Agent '{}' responded:\n{}", outcome.agent, outcome.text);

    let snapshot = store.snapshot(&session_id);
    let step = workflow::current_step(&snapshot);
    println!("Workflow step: {step:?}");
    for item in workflow::progress_of(&snapshot) {
        println!(
            "  {} {}",
            if item.complete { "[x]" } else { "[ ]" },
            item.stage
        );
    }

    Ok(())
}

fn print_info() {
    println!(
        "\
quill: multi-agent content creation assistant

Architecture:
  orchestrator  Routes requests and answers directly when no specialist fits
  ideate        Generates creative ideas
  outline       Creates structured content outlines
  draft         Writes complete content drafts
  feedback      Provides expert feedback and chat
  seo           Optimizes content for search engines

Features:
  In-memory session storage for conversation state
  Browser chat interface with workflow progress tracking
  LLM-delegated routing between agents

Usage:
  quill serve        Start the web chat UI (default)
  quill self-test    Run one conversation against the live provider
  quill check-env    Check environment configuration
  quill info         Show this information

Setup:
  1. Export GOOGLE_API_KEY (or select another provider via QUILL_PROVIDER)
  2. Run `quill serve` and open the printed URL"
    );
}

/// Run the gateway: web channel plus the inbound processing loop.
async fn run_serve() -> Result<()> {
    let config = quill_config::load_from_env()?;
    config.validate()?;

    let (store, runner) = build_runner(&config)?;
    let mut bus = MessageBus::new(128);

    let mut channel_manager = ChannelManager::new(bus.outbound_tx.subscribe());
    let web = WebChannel::new(config.gateway.clone(), store.clone());
    channel_manager.register(Arc::new(web));

    channel_manager.start_all(bus.inbound_tx.clone()).await?;
    tracing::info!(
        "Gateway running on http://{}:{}. Press Ctrl-C to stop.",
        config.gateway.host,
        config.gateway.port
    );

    loop {
        let msg = tokio::select! {
            msg = bus.inbound_rx.recv() => match msg {
                Some(m) => m,
                None => {
                    tracing::info!("Inbound channel closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down...");
                break;
            }
        };

        let session_key = msg.session_key();
        let outbound = match runner.process_message(&session_key, &msg.content).await {
            Ok(outcome) => OutboundMessage {
                channel: msg.channel,
                chat_id: msg.chat_id,
                agent: Some(outcome.agent),
                content: outcome.text,
                progress: outcome.progress,
                is_error: false,
            },
            Err(e) => {
                tracing::error!("Error processing message for '{session_key}': {e}");
                OutboundMessage {
                    channel: msg.channel,
                    chat_id: msg.chat_id,
                    agent: None,
                    content: format!("Sorry, I encountered an error: {e}"),
                    progress: workflow::progress(&store, &session_key),
                    is_error: true,
                }
            }
        };

        if let Err(e) = bus.outbound_tx.send(outbound) {
            tracing::warn!("Failed to publish outbound response to bus: {e}");
        }
    }

    channel_manager.stop_all().await?;
    tracing::info!("Gateway stopped");
    Ok(())
}
