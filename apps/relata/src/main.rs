//! # Relata - Related Resources
//!
//! The command line binary for the Relata relation engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    apps/relata (THE BINARY)               │
//! │                                                           │
//! │  ┌──────────┐   ┌────────────────────┐   ┌────────────┐  │
//! │  │   CLI    │──▶│ presenter / batch  │──▶│   client   │──┼──▶ catalog
//! │  │  (clap)  │   │      (tokio)       │   │ (reqwest)  │  │
//! │  └──────────┘   └─────────┬──────────┘   └────────────┘  │
//! │                           ▼                               │
//! │                   ┌───────────────┐                       │
//! │                   │  relata-core  │                       │
//! │                   │  (THE LOGIC)  │                       │
//! │                   └───────────────┘                       │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! relata related 1234 --types "onlines" --filter "-protocol:OGC:.*"
//! relata batch --uuid a --uuid b --types children,services
//! relata table --input records.json --columns resourceTitle,link/OGC:WMS
//! ```

use clap::Parser;
use relata::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // RELATA_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("RELATA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "relata=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Relata banner on stderr, keeping stdout for command output.
fn print_banner() {
    eprintln!(
        r#"
  relata v{}
  related resources for metadata catalogs
"#,
        env!("CARGO_PKG_VERSION")
    );
}
