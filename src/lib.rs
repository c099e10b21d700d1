//! SnapSolve — capture queue and analysis pipeline.
//!
//! This is the app shell that wires the domains together. No business
//! logic lives here — only module declarations, collaborator wiring and the
//! headless command loop.
//!
//! The headless boundary speaks newline-delimited JSON: one command per
//! line on stdin (see [`commands::Command`]), one JSON object per line on
//! stdout for command results (`{"ok": ...}` / `{"error": ...}`) and
//! pipeline events (`{"event": ..., "payload": ...}`).

pub mod capture;
pub mod commands;
pub mod error;
pub mod interpret;
pub mod llm;
pub mod ocr;
pub mod pipeline;
pub mod preprocess;
pub mod settings;

use capture::{default_capturer, CaptureStore, FsCaptureStore};
use ocr::{MissingRecognizer, TesseractRecognizer, TextRecognizer};
use pipeline::{ChannelSink, Collaborators, Coordinator};
use preprocess::ImagePreprocessor;
use settings::Settings;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

const SHUTDOWN_FLUSH: Duration = Duration::from_secs(1);

/// Entry point — called by the binary.
pub fn run() {
    load_env();
    env_logger::init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("[STARTUP] Failed to start async runtime: {}", e);
            return;
        }
    };

    if let Err(e) = runtime.block_on(serve()) {
        log::error!("[STARTUP] Command loop stopped: {}", e);
    }
}

/// Load .env.local → .env from the working directory, falling back to the
/// crate root. The first file found wins.
fn load_env() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let roots = [std::env::current_dir().ok(), Some(manifest_dir.to_path_buf())];

    for root in roots.iter().flatten() {
        for env_file in [".env.local", ".env"] {
            let path = root.join(env_file);
            if path.exists() {
                match dotenvy::from_path(&path) {
                    Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                    Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
                }
                return;
            }
        }
    }
}

/// Build the coordinator from settings and the detected collaborators.
fn build_coordinator(settings: &Settings) -> (Arc<Coordinator>, mpsc::UnboundedReceiver<pipeline::PipelineEvent>) {
    let (primary_dir, secondary_dir) = settings.capture_dirs();
    let store: Arc<dyn CaptureStore> = Arc::new(FsCaptureStore::new(primary_dir, secondary_dir));

    let recognizer: Arc<dyn TextRecognizer> =
        match TesseractRecognizer::detect(settings.recognition_level(), settings.recognition_timeout()) {
            Ok(recognizer) => Arc::new(recognizer),
            Err(e) => {
                log::warn!("[OCR] {} — initial runs will fail until it is installed", e);
                Arc::new(MissingRecognizer::new(e.to_string()))
            }
        };

    let provider = settings::resolve_provider(settings);
    log::info!("[STARTUP] Inference provider: {}", provider);

    let (sink, events) = ChannelSink::new();
    let coordinator = Coordinator::new(
        Collaborators {
            store,
            recognizer,
            inference: llm::client_for_provider(&provider),
            capturer: Arc::from(default_capturer()),
            sink: Arc::new(sink),
        },
        ImagePreprocessor::default(),
        settings.pipeline_config(),
    );
    (coordinator, events)
}

async fn serve() -> std::io::Result<()> {
    let settings = Settings::load();
    let (coordinator, mut events) = build_coordinator(&settings);

    // Single stdout writer so event and result lines never interleave.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = out_rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
                || stdout.flush().await.is_err()
            {
                break;
            }
        }
    });

    let event_tx = out_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => {
                    if event_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => log::error!("[PIPELINE] Failed to encode {} event: {}", event.name(), e),
            }
        }
    });

    log::info!("[STARTUP] Ready for commands on stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<commands::Command>(line) {
            Ok(command) => {
                log::debug!("[COMMAND] {:?}", command);
                commands::dispatch(&coordinator, command).await
            }
            Err(e) => Err(format!("Invalid command: {}", e)),
        };
        let reply = match reply {
            Ok(value) => serde_json::json!({ "ok": value }),
            Err(message) => serde_json::json!({ "error": message }),
        };
        if out_tx.send(reply.to_string()).is_err() {
            break;
        }
    }

    log::info!("[STARTUP] stdin closed — shutting down");
    drop(out_tx);
    drop(coordinator);
    // Runs still in flight keep the event channel open; only wait for the
    // queued lines to flush.
    let _ = tokio::time::timeout(SHUTDOWN_FLUSH, writer).await;
    Ok(())
}
