//! # Campus Desk CLI (`desk`)
//!
//! The `desk` binary is the primary interface for Campus Desk. It provides
//! commands for answering one-off questions, inspecting configured
//! backends, and starting the HTTP API server.
//!
//! ## Usage
//!
//! ```bash
//! desk --config ./config/desk.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `desk ask "<question>"` | Answer a single question and print the result |
//! | `desk check` | Show configured backends and their status |
//! | `desk serve` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! # Answer a question from the terminal
//! desk ask "who is the hod of cse" --config ./config/desk.toml
//!
//! # Same, with the pipeline diagnostics as JSON
//! desk ask "who teaches os" --debug
//!
//! # Verify store and LLM configuration before serving
//! STORE_SERVICE_KEY=... GEMINI_API_KEY=... desk check
//!
//! # Start the API
//! desk serve --config ./config/desk.toml
//! ```

mod alias;
mod config;
mod format;
mod gate;
mod intent;
mod llm;
mod media;
mod models;
mod normalize;
mod pipeline;
mod score;
mod server;
#[allow(dead_code)]
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use store::RecordStore;
use tracing_subscriber::EnvFilter;

/// Campus Desk CLI: a question-answering backend for a campus help
/// desk chatbot.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/desk.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "desk",
    about = "Campus Desk: a question-answering backend for a campus help desk chatbot",
    version,
    long_about = "Campus Desk answers natural-language questions about an institution's people \
    and programs. Questions are matched against records from a REST record store, fall through \
    to an LLM provider when no record match is confident, and to a static reply when neither \
    backend is available."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/desk.toml`. A missing file is not an error;
    /// built-in defaults apply. Credentials are read from the environment,
    /// never from this file.
    #[arg(long, global = true, default_value = "./config/desk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Answer a single question.
    ///
    /// Runs the full ask pipeline (normalize, expand, classify, fetch,
    /// score, gate) and prints the answer with its source tag. Works
    /// without any backend configured; the reply degrades accordingly.
    Ask {
        /// The question to answer.
        question: String,

        /// Print the full outcome as JSON, including pipeline diagnostics.
        #[arg(long)]
        debug: bool,
    },

    /// Show configured backends and their status.
    ///
    /// Reports the record store target, the LLM provider resolved from
    /// the environment, and the server bind address. Useful for verifying
    /// configuration before running `serve`.
    Check,

    /// Start the HTTP API server.
    ///
    /// Binds to the address in `[server].bind` and serves the ask and
    /// media endpoints until terminated.
    Serve,
}

/// Structured logging for the server path. `RUST_LOG` overrides the
/// default `info` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init: the global subscriber may already be set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ask { question, debug } => {
            let record_store: Arc<dyn RecordStore> =
                Arc::new(store::rest::RestStore::from_config(&cfg.store)?);
            let client = Arc::new(llm::LlmClient::from_config(&cfg)?);
            let desk = pipeline::Pipeline::new(record_store, client, Arc::new(cfg));
            let outcome = desk.ask(&question).await;
            if debug {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", outcome.answer);
                println!("(source: {})", outcome.source);
            }
        }
        Commands::Check => {
            let record_store = store::rest::RestStore::from_config(&cfg.store)?;
            let client = llm::LlmClient::from_config(&cfg)?;
            let llm_status = if client.is_configured() {
                format!("{} (model {})", client.provider_name(), cfg.llm.model)
            } else {
                "not configured (set GEMINI_API_KEY or OPENAI_API_KEY)".to_string()
            };
            println!("{:<10} {}", "BACKEND", "STATUS");
            println!("{:<10} {}", "store", record_store.describe());
            println!("{:<10} {}", "llm", llm_status);
            println!("{:<10} binds {}", "server", cfg.server.bind);
        }
        Commands::Serve => {
            init_logging();
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
