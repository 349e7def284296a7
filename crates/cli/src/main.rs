//! `shotbridge` -- push editorial shot tables into the production tracker.
//!
//! Reads a JSON array of shot records, creates the matching sequences,
//! shots and tasks under a project, folder or sequence, and publishes
//! thumbnails and review videos. Also publishes single review versions,
//! browses projects for a parent, logs artist time and lists the artist's
//! active tasks.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default | Description                              |
//! |------------------------|----------|---------|------------------------------------------|
//! | `TRACKER_SERVER_URL`   | yes      | --      | Tracker base URL, e.g. `https://studio.ftrackapp.com` |
//! | `TRACKER_API_USER`     | yes      | --      | Username the session acts as             |
//! | `TRACKER_API_KEY`      | yes      | --      | API key for that user                    |
//! | `TRACKER_TIMEOUT_SECS` | no       | `30`    | Per-request timeout                      |
//! | `LOG_FORMAT`           | no       | text    | `json` for structured log lines          |
//! | `RUST_LOG`             | no       | `shotbridge=info` | Log filter                      |
//!
//! With `--mock`, no tracker is contacted: an in-memory store seeded with
//! the default statuses and task types stands in for it.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod args;
mod commands;

use args::Cli;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = commands::run(cli).await {
        tracing::error!(error = %err, "Command failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shotbridge=info,shotbridge_pipeline=info,shotbridge_store=info".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
