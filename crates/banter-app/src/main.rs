//! Banter application binary - composition root.
//!
//! Ties together all Banter crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Open the conversation against the store API and prime the cache
//! 3. Build the streaming model client and chat session
//! 4. Wire the orchestrator, speech engine, and event renderer
//! 5. Run a line-oriented prompt loop on stdin
//!
//! The binary carries no platform recognizer; speech input arrives through
//! the `Recognizer` trait when an embedding application provides one. Typed
//! input always works.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::sync::broadcast;

use banter_core::config::BanterConfig;
use banter_core::events::PromptEvent;
use banter_core::logging::init_logging;
use banter_core::types::ConversationId;
use banter_llm::{ChatSession, GeminiClient, StreamModel};
use banter_prompt::{PromptOrchestrator, ReplayLedger};
use banter_speech::{InputSlot, SpeechEngine, SubmitSink};
use banter_store::{ConversationCache, HttpTurnStore, TurnStore};

mod cli;

use cli::CliArgs;

/// Render pipeline events to the terminal as they arrive.
async fn render_events(mut rx: broadcast::Receiver<PromptEvent>) {
    use std::io::Write;

    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event renderer lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            PromptEvent::QuestionPosted { text, .. } => {
                println!("\n> {}", text);
            }
            PromptEvent::AnswerAppended { delta, .. } => {
                print!("{}", delta);
                let _ = std::io::stdout().flush();
            }
            PromptEvent::TurnPersisted { .. } => {
                println!();
            }
            PromptEvent::AlertRaised { message, .. } => {
                eprintln!("! {}", message);
            }
            PromptEvent::ListeningStarted { .. } => {
                eprintln!("(listening)");
            }
            PromptEvent::ListeningStopped { .. } => {
                eprintln!("(stopped listening)");
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = BanterConfig::load_or_default(&config_file);
    config.store.base_url = args.resolve_base_url(&config.store.base_url);
    config.speech.locale = args.resolve_locale(&config.speech.locale);

    let log_level = args
        .resolve_log_level()
        .unwrap_or_else(|| config.general.log_level.clone());
    init_logging(&log_level);

    tracing::info!("Starting Banter v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let Some(chat_id) = args.resolve_chat_id() else {
        tracing::error!("No conversation id; pass --chat-id or set BANTER_CHAT_ID");
        return Err("missing conversation id".into());
    };
    let conversation_id = ConversationId::new(chat_id);

    // Store and cache.
    let store: Arc<dyn TurnStore> = Arc::new(HttpTurnStore::new(&config.store)?);
    let cache = Arc::new(ConversationCache::new(Arc::clone(&store)));

    let conversation = match cache.load(&conversation_id).await {
        Ok(conversation) => conversation,
        Err(e) => {
            tracing::error!(
                conversation_id = %conversation_id,
                url = %config.store.base_url,
                error = %e,
                "Failed to load conversation - is the chat service running?"
            );
            return Err(e.into());
        }
    };
    tracing::info!(
        conversation_id = %conversation_id,
        turns = conversation.history.len(),
        "Conversation loaded"
    );

    // Model session.
    let model: Arc<dyn StreamModel> = Arc::new(GeminiClient::new(&config.llm)?);
    tracing::info!(model = model.model_name(), "Streaming model client ready");
    let session = ChatSession::new(Arc::clone(&model), &conversation);

    // Shared prompt state.
    let slot = InputSlot::new();
    let ledger = ReplayLedger::new();
    let (events, _) = broadcast::channel(256);

    let orchestrator = Arc::new(PromptOrchestrator::new(
        conversation_id.clone(),
        session,
        store,
        Arc::clone(&cache),
        slot.clone(),
        ledger.clone(),
        events.clone(),
        Duration::from_secs(config.llm.fragment_timeout_secs),
    ));

    let mut engine = SpeechEngine::new(
        slot.clone(),
        config.speech.locale.clone(),
        Arc::clone(&orchestrator) as Arc<dyn SubmitSink>,
        events.clone(),
    );
    engine.set_enabled(config.speech.enabled);
    if !config.speech.enabled {
        tracing::info!("Speech capture disabled in config");
    }

    tokio::spawn(render_events(events.subscribe()));

    // A conversation holding only its opening user message gets that message
    // dispatched now, exactly once.
    if let Err(e) = orchestrator.replay_opening_message().await {
        tracing::warn!(error = %e, "Opening-message replay failed");
    }

    println!("Type a question and press Enter. Commands: :listen, :reload, :quit");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            ":quit" | ":q" => break,
            ":listen" => engine.toggle(),
            ":reload" => {
                ledger.clear();
                match cache.invalidate_and_reload(&conversation_id).await {
                    Ok(conversation) => {
                        println!("Reloaded; {} turns", conversation.history.len());
                    }
                    Err(e) => tracing::warn!(error = %e, "Reload failed"),
                }
                if let Err(e) = orchestrator.replay_opening_message().await {
                    tracing::warn!(error = %e, "Opening-message replay failed");
                }
            }
            "" => continue,
            text => {
                slot.set(text);
                if let Err(e) = orchestrator.submit_input().await {
                    // The alert surface already showed the user-facing message.
                    tracing::debug!(error = %e, "Submission failed");
                }
            }
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
