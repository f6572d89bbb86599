use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sula_assistant::audio::CaptureConfig;
use sula_assistant::{
    create_router, AppState, AssistantSession, Config, HttpAnswerClient, HttpTranscriptionClient, Mode,
    Platform, SendOutcome, Services, WavFileMicrophone,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sula-assistant", version, about = "Conversational assistant session engine")]
struct Cli {
    /// Config file (TOML), loaded over the built-in defaults
    #[arg(long, global = true, default_value = "config/assistant")]
    config: String,

    /// Initial response mode
    #[arg(long, global = true)]
    mode: Option<Mode>,

    /// WAV file played back as the microphone for record-and-transcribe
    #[arg(long, global = true)]
    voice_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP control API
    Serve,
    /// Ask one question and print the revealed answer
    Ask { question: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Answer service: {}", cfg.answer.endpoint);
    info!(
        "Transcription service: {} (enabled: {})",
        cfg.transcription.endpoint, cfg.transcription.enabled
    );

    let services = Services {
        answers: Arc::new(HttpAnswerClient::new(cfg.answer.clone()).context("Failed to build answer client")?),
        transcriber: Arc::new(
            HttpTranscriptionClient::new(cfg.transcription.clone())
                .context("Failed to build transcription client")?,
        ),
    };

    let mut platform = Platform::headless();
    if let Some(path) = &cli.voice_file {
        info!("Using {} as the microphone", path.display());
        platform.microphone = Arc::new(WavFileMicrophone::new(path, CaptureConfig::default()));
    }

    let session = AssistantSession::new(&cfg, services, platform);
    if let Some(mode) = cli.mode {
        session.set_mode(mode);
    }

    match cli.command {
        Command::Serve => serve(&cfg, session).await,
        Command::Ask { question } => ask(session, &question.join(" ")).await,
    }
}

async fn serve(cfg: &Config, session: AssistantSession) -> Result<()> {
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    let app = create_router(AppState::new(session));
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

async fn ask(session: AssistantSession, question: &str) -> Result<()> {
    match session.send(question).await {
        SendOutcome::Dispatched(outcome) => match outcome.text() {
            Some(answer) => println!("{}", answer),
            None => anyhow::bail!("Question is empty"),
        },
        other => anyhow::bail!("Query not sent: {:?}", other),
    }
    Ok(())
}
