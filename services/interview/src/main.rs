use anyhow::{Context, Result};
use clap::Parser;
use gemini_client::GeminiClient;
use interview_core::{InterviewController, SessionSettings};
use interview_service::config::Config;
use interview_service::gemini_adapter::GeminiAdapter;
use interview_service::view::{self, Control};
use interview_service::{prompt_loader, runtime, speech_host};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "A spoken mock interview driven by Gemini")]
struct Cli {
    /// Begin an interview immediately instead of waiting for /start
    #[arg(long)]
    autostart: bool,
    /// Directory holding prompt overrides (system_instruction.md)
    #[arg(long, default_value = "prompts")]
    prompts: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // --- 1. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 2. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 3. Initialize Logging ---
    // Logs go to stderr so the readouts on stdout stay readable.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Configuration loaded successfully. Starting interview service...");

    // --- 4. Load Prompts ---
    let system_instruction = prompt_loader::system_instruction(&args.prompts)
        .context("Failed to load system instruction")?;

    // --- 5. Initialize API Client ---
    let client = GeminiClient::new(config.gemini_api_key, &config.gemini_model)
        .with_base_url(&config.gemini_base_url);
    let model = Arc::new(GeminiAdapter::new(client, system_instruction));

    // --- 6. Resolve Speech Capabilities ---
    let probed = speech_host::probe(&config.speech);
    tracing::debug!("Speech capabilities: {:?}", probed.capabilities);

    // --- 7. Application Setup ---
    let (view_tx, view_rx) = tokio::sync::mpsc::unbounded_channel();
    let (control_tx, mut control_rx) = tokio::sync::mpsc::channel::<Control>(16);

    let renderer = tokio::spawn(view::render(view_rx));
    view::spawn_terminal_reader(control_tx.clone(), probed.utterances, probed.listening)
        .context("Failed to start terminal reader")?;

    let ctrl_c_tx = control_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, shutting down...");
            let _ = ctrl_c_tx.send(Control::Quit).await;
        }
    });

    println!("{}", view::HELP);
    if args.autostart {
        control_tx
            .send(Control::Start)
            .await
            .context("Failed to queue autostart")?;
    }
    drop(control_tx);

    let settings = SessionSettings {
        listen_delay: config.listen_delay,
        ..SessionSettings::default()
    };
    let mut controller =
        InterviewController::new(probed.capabilities, model, settings, view_tx);

    runtime::run(&mut controller, &mut control_rx).await;

    // Dropping the controller closes the view channel so the renderer can finish.
    drop(controller);
    if let Err(e) = renderer.await {
        tracing::warn!("Renderer task failed: {:?}", e);
    }
    tracing::info!("Shutting down...");
    Ok(())
}
