//! Narration Player (lectio-np) - Main entry point
//!
//! Text-to-speech narration microservice for Lectio: synthesizes text
//! passages through a remote voice service, decodes the PCM payload,
//! and plays it on the local audio device. Controlled over HTTP with
//! an SSE event stream.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectio_common::config::{
    resolve_required_setting, resolve_setting, FileConfig, DEFAULT_LANGUAGE, DEFAULT_VOICE,
};
use lectio_np::engine::NarrationEngine;
use lectio_np::playback::CpalSink;
use lectio_np::synthesis::HttpSynthesizer;
use lectio_np::{api, SharedState};

/// Command-line arguments for lectio-np
#[derive(Parser, Debug)]
#[command(name = "lectio-np")]
#[command(about = "Narration Player microservice for Lectio")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "LECTIO_NP_PORT")]
    port: u16,

    /// Path to a config file (overrides the platform search paths)
    #[arg(short, long, env = "LECTIO_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Voice synthesis endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// API key for the synthesis service
    #[arg(long)]
    api_key: Option<String>,

    /// Voice name to synthesize with
    #[arg(long)]
    voice: Option<String>,

    /// Default language tag for narration requests
    #[arg(long)]
    language: Option<String>,

    /// Audio output device name
    #[arg(long)]
    device: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lectio_np=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    info!("Starting Lectio Narration Player on port {}", args.port);

    // Layer settings: CLI over environment over config file over defaults
    let file_config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            FileConfig::from_toml_str(&content).context("Failed to parse config file")?
        }
        None => FileConfig::load().context("Failed to load config file")?,
    };

    let endpoint = resolve_required_setting(
        "endpoint",
        args.endpoint.as_deref(),
        "LECTIO_SYNTHESIS_ENDPOINT",
        file_config.synthesis.endpoint.as_deref(),
    )?;
    let api_key = resolve_required_setting(
        "api-key",
        args.api_key.as_deref(),
        "LECTIO_API_KEY",
        file_config.synthesis.api_key.as_deref(),
    )?;
    let voice = resolve_setting(
        args.voice.as_deref(),
        "LECTIO_VOICE",
        file_config.synthesis.voice.as_deref(),
    )
    .unwrap_or_else(|| DEFAULT_VOICE.to_string());
    let language = resolve_setting(
        args.language.as_deref(),
        "LECTIO_LANGUAGE",
        file_config.synthesis.language.as_deref(),
    )
    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let device = resolve_setting(
        args.device.as_deref(),
        "LECTIO_AUDIO_DEVICE",
        file_config.audio.device.as_deref(),
    );

    info!("Synthesis endpoint: {}", endpoint);
    info!("Voice: {}, default language: {}", voice, language);

    // Wire the pipeline: synthesizer -> engine -> sink
    let state = Arc::new(SharedState::new());
    let synthesizer = Arc::new(HttpSynthesizer::new(endpoint, api_key, voice));
    let (completion_tx, completion_rx) = mpsc::unbounded_channel();
    let mut sink = CpalSink::new(device, completion_tx);
    // Open the audio device now so the first narration request does
    // not wait on bring-up; a missing device stays a per-attempt error.
    if let Err(e) = sink.initialize() {
        warn!("Audio device not ready at startup, will retry on first use: {}", e);
    }

    let engine = Arc::new(NarrationEngine::new(
        Arc::clone(&state),
        synthesizer,
        Box::new(sink),
        completion_rx,
        language,
    ));
    engine
        .start()
        .context("Failed to start narration engine")?;
    info!("Narration engine initialized");

    // Build the application router
    let app_state = api::AppState {
        engine,
        state,
        port: args.port,
    };

    let app = api::create_router(app_state);

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
