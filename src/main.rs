mod db;
mod ipc;
mod model;
mod seating;
mod store;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Seating-chart sidecar. Reads one JSON request per line on stdin and writes
/// one JSON response per line on stdout.
#[derive(Parser, Debug)]
#[command(name = "seatingd", version)]
struct Cli {
    /// Workspace directory to open at startup.
    #[arg(long, env = "SEATINGD_WORKSPACE", conflicts_with = "ephemeral")]
    workspace: Option<PathBuf>,

    /// Keep every record in memory; nothing is written to disk.
    #[arg(long)]
    ephemeral: bool,
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // stdout carries the protocol, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging();

    let mut state = ipc::AppState::default();
    if cli.ephemeral {
        state.use_store(None, Box::new(store::MemoryStore::new()));
        info!("using in-memory store");
    } else if let Some(path) = cli.workspace {
        let store = db::SqliteStore::open(&path)
            .with_context(|| format!("failed to open workspace {}", path.to_string_lossy()))?;
        info!(workspace = %path.to_string_lossy(), "workspace opened");
        state.use_store(Some(path), Box::new(store));
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin closed with error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let resp = json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    info!("stdin closed, exiting");
    Ok(())
}
