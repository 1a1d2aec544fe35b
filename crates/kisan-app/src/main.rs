mod cli;
mod terminal;

use std::ops::ControlFlow;
use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncBufReadExt;

use kisan_chat::{AttachmentFile, ChatError, ChatSurface, HttpBackend, TurnOrchestrator};
use kisan_core::KisanConfig;

use cli::CliArgs;
use terminal::{parse_command, Command, TerminalSurface, HELP};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = KisanConfig::load_or_default(&config_file);
    if let Some(dir) = args.resolve_data_dir() {
        config.general.data_dir = dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }
    if args.persist_history {
        config.history.persistence_enabled = true;
    }
    config.backend.base_url = args.resolve_backend_url(&config.backend.base_url);
    config.backend.api_key = args.resolve_api_key(config.backend.api_key.take());

    // Tracing.
    let default_level = config.general.log_level.clone();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    tracing::info!("Starting KisanGPT v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), backend = %config.backend.base_url, "Configuration loaded");

    let backend = Arc::new(HttpBackend::new(config.backend.base_url.clone()));
    let surface = Arc::new(TerminalSurface);
    let orchestrator = TurnOrchestrator::new(config, backend, surface.clone());

    let info = orchestrator.initialize().await?;
    println!(
        "{} {}: ask about crops, mandi prices, weather, pests or schemes. /help for commands.",
        info.app_name.as_deref().unwrap_or("KisanGPT"),
        info.app_version.as_deref().unwrap_or(env!("CARGO_PKG_VERSION")),
    );

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if run_command(&orchestrator, surface.as_ref(), parse_command(&line))
            .await
            .is_break()
        {
            break;
        }
    }

    tracing::info!("KisanGPT shutting down");
    Ok(())
}

async fn run_command(
    orchestrator: &TurnOrchestrator,
    surface: &dyn ChatSurface,
    command: Command,
) -> ControlFlow<()> {
    let result = match command {
        Command::Send(text) => match orchestrator.submit_turn(&text).await {
            // The finished turn re-enables the prompt itself.
            Ok(Some(_)) => return ControlFlow::Continue(()),
            Ok(None) => Ok(()),
            Err(e) => {
                tracing::debug!(error = %e, "Turn ended without a reply");
                return ControlFlow::Continue(());
            }
        },
        Command::Attach(path) => match AttachmentFile::from_path(&path).await {
            Ok(file) => orchestrator.attach(file).await,
            Err(e) => Err(e),
        },
        Command::Detach => orchestrator.remove_attachment(),
        Command::Location(location) => orchestrator.set_location(location),
        Command::Lang(language) => orchestrator.select_recognition_language(&language),
        Command::Speak => orchestrator.speak_last_reply().map(|_| ()),
        Command::Clear => orchestrator.clear_history(),
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Quit => return ControlFlow::Break(()),
        Command::Unknown(line) => {
            surface.show_notice(&format!("unknown command: {line} (try /help)"));
            Ok(())
        }
    };

    match result {
        Ok(()) => {}
        // Rejected attachments are already shown inline.
        Err(ChatError::InvalidAttachmentType(_)) | Err(ChatError::AttachmentTooLarge { .. }) => {}
        Err(e) => surface.show_notice(&e.to_string()),
    }
    surface.set_input_enabled(true);
    ControlFlow::Continue(())
}
