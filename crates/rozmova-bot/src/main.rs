//! Rozmova binary: wires the dialogue engine to the Telegram transport and
//! the OpenAI clients, then runs the polling loop.

use anyhow::Result;
use clap::Parser;
use rozmova_core::dialogue::{DialogueEngine, Dispatcher};
use rozmova_core::session::SessionStore;
use rozmova_infrastructure::FsContentStore;
use rozmova_interaction::{OpenAiChatClient, OpenAiVoiceClient, TelegramGateway};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rozmova")]
#[command(about = "Rozmova - menu-driven conversational Telegram bot", long_about = None)]
struct Cli {
    /// Resource directory holding messages/, prompts/ and images/
    #[arg(long, default_value = "resources")]
    resources: PathBuf,

    /// Override the chat completion model
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut chat = OpenAiChatClient::try_from_env()?;
    if let Some(model) = cli.model {
        chat = chat.with_model(model);
    }
    let voice = OpenAiVoiceClient::new(chat.api_key());
    let gateway = TelegramGateway::try_from_env()?;
    let content = FsContentStore::new(cli.resources);

    let engine = Arc::new(DialogueEngine::new(
        SessionStore::new(),
        Arc::new(chat),
        Arc::new(gateway),
        Arc::new(voice),
        Arc::new(content),
    ));

    tracing::info!("rozmova started, polling for updates");
    Dispatcher::new(engine).run().await?;
    Ok(())
}
