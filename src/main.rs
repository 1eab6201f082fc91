//! # Phone Match CLI (`pmatch`)
//!
//! Resolve phone numbers against the configured contact directories, using
//! the same cached matcher an embedding application would run.
//!
//! ## Usage
//!
//! ```bash
//! pmatch --config ./config/pmatch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pmatch sources` | List configured directories and their contact counts |
//! | `pmatch match <numbers..>` | Match numbers, reusing fresh cache entries |
//! | `pmatch match <numbers..> --force` | Match numbers, searching again even when cached |
//! | `pmatch cache` | Print the persisted match record |
//! | `pmatch purge` | Remove the persisted cache |
//! | `pmatch completions <shell>` | Print shell completions |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `warn`), e.g. `RUST_LOG=phone_match=debug pmatch match 555`.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use phone_match::{commands, config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Phone Match CLI: cached resolution of phone numbers into contacts.
#[derive(Parser)]
#[command(
    name = "pmatch",
    about = "Phone Match: cached resolution of phone numbers into contacts",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pmatch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured contact directories.
    Sources,

    /// Match phone numbers against every directory.
    Match {
        /// Phone numbers, in any formatting.
        #[arg(required = true)]
        numbers: Vec<String>,

        /// Search again even when a fresh cache entry exists.
        #[arg(long)]
        force: bool,
    },

    /// Show the persisted match record.
    Cache {
        /// Print the raw cache state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete the persisted cache.
    Purge,

    /// Generate shell completions.
    Completions {
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "pmatch", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sources => commands::list_sources(&cfg)?,
        Commands::Match { numbers, force } => commands::run_match(&cfg, &numbers, force).await?,
        Commands::Cache { json } => commands::show_cache(&cfg, json).await?,
        Commands::Purge => commands::purge_cache(&cfg)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
