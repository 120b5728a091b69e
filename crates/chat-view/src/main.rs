//! Chat view replay tool
//!
//! Run with:
//! ```bash
//! cargo run -p chat-view -- events.jsonl
//! ```
//!
//! Reads one `MessageEvent` per line, feeds them to a chat view with the
//! reaction sweep running, then prints every message's reaction tally as JSON.
//! Configuration is loaded from environment variables.

use std::sync::Arc;

use chat_common::{
    try_init_tracing, try_init_tracing_with_config, AppConfig, AppError, AppResult, TracingConfig,
};
use chat_core::MessageEvent;
use chat_view::{ChatView, ReconciliationScheduler};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => {
            if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
                eprintln!("Warning: Failed to initialize tracing: {e}");
            }
            config
        }
        Err(e) => {
            if let Err(e) = try_init_tracing() {
                eprintln!("Warning: Failed to initialize tracing: {e}");
            }
            let err = AppError::from(e);
            error!(error = %err, "Failed to load configuration");
            std::process::exit(err.exit_code());
        }
    };

    if let Err(e) = run(config).await {
        error!(error = %e, code = e.error_code(), "Replay failed");
        std::process::exit(e.exit_code());
    }
}

async fn run(config: AppConfig) -> AppResult<()> {
    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| AppError::invalid_input("usage: chat-view <events.jsonl>"))?;

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        sweep_interval_ms = config.reactions.sweep_interval_ms,
        path = %path,
        "Starting replay"
    );

    let file = File::open(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::not_found(&path),
        _ => AppError::from(e),
    })?;

    let view = Arc::new(Mutex::new(ChatView::new(
        config.view.clone(),
        &config.reactions,
    )));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = ReconciliationScheduler::from_config(&config.reactions).spawn(view.clone(), shutdown_rx);

    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;
    let mut applied = 0usize;
    let mut skipped = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let event: MessageEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed event");
                skipped += 1;
                continue;
            }
        };
        match view.lock().await.apply(event).await {
            Ok(()) => applied += 1,
            Err(e) => {
                warn!(line = line_no, error = %e, code = e.code(), "Event rejected");
                skipped += 1;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    sweeper.await.map_err(|e| {
        AppError::internal(anyhow::Error::new(e).context("reaction sweep task failed"))
    })?;

    let mut view = view.lock().await;
    let report = view.sweep();

    let mut tallies = serde_json::Map::new();
    for (msgid, tally) in view.tallies() {
        tallies.insert(msgid.into_inner(), serde_json::to_value(tally)?);
    }
    println!("{}", serde_json::to_string_pretty(&tallies)?);

    info!(
        applied,
        skipped,
        pending_reactions = report.still_pending(),
        "Replay finished"
    );
    Ok(())
}
