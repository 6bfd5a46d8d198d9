//! # Reforge CLI (`reforge`)
//!
//! Command-line interface for the migration pipeline.
//!
//! ## Usage
//!
//! ```bash
//! reforge --config ./config/reforge.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `reforge init` | Create the SQLite database and run schema migrations |
//! | `reforge analyze <path>` | Analyze a legacy project directory or `.zip` |
//! | `reforge generate <id>` | Generate, validate, and package a target project |
//! | `reforge serve` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! reforge init --config ./config/reforge.toml
//!
//! # Analyze a legacy project
//! reforge analyze ./legacy-app --config ./config/reforge.toml
//!
//! # Generate with the stored architecture
//! reforge generate 6f9619ff-8b86-4d01-b42d-00cf4fc964ff
//!
//! # Generate with an architecture override, skipping validation
//! reforge generate 6f9619ff-8b86-4d01-b42d-00cf4fc964ff \
//!     --architecture ./arch.json --skip-validation
//!
//! # Start the HTTP server
//! reforge serve --config ./config/reforge.toml
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use reforge::analyze::run_analyze;
use reforge::generate::{run_generate, GenerateStatus};
use reforge::pipeline::Pipeline;
use reforge::{config, db, server};

/// Reforge — a retrieval-augmented pipeline for migrating legacy
/// codebases.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/reforge.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "reforge",
    about = "Reforge — a retrieval-augmented pipeline for migrating legacy codebases",
    version,
    long_about = "Reforge analyzes a legacy project file by file, proposes a target \
    architecture, generates each target artifact with retrieval-augmented generation, \
    validates the result with a real build, and packages it as a zip archive."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/reforge.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the analyses table. This
    /// command is idempotent — running it multiple times is safe.
    Init,

    /// Analyze a legacy project and propose a target architecture.
    ///
    /// Scans the given directory or `.zip` archive, analyzes each file,
    /// stores the result under a fresh analysis id, and indexes the
    /// analysis for later retrieval.
    Analyze {
        /// Path to the legacy project directory or `.zip` archive.
        path: PathBuf,
    },

    /// Generate, validate, and package a target project.
    ///
    /// Materializes every file in the stored (or overridden)
    /// architecture, runs the build/refine loop unless validation is
    /// skipped, and writes a zip archive under the exports directory.
    Generate {
        /// Analysis id returned by `reforge analyze`.
        analysis_id: String,

        /// Path to a JSON file replacing the stored architecture for
        /// this run. Used as-is, never merged or persisted.
        #[arg(long)]
        architecture: Option<PathBuf>,

        /// Skip build validation and package the output unchecked.
        #[arg(long)]
        skip_validation: bool,
    },

    /// Start the HTTP API server.
    ///
    /// Binds to the address configured in `[server].bind` and exposes
    /// `POST /analyze`, `POST /generate`, and `GET /health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg.storage.db_path()).await?;
            db::run_migrations(&pool).await?;
            println!("Database initialized successfully.");
        }
        Commands::Analyze { path } => {
            let pipeline = Pipeline::from_config(&cfg).await?;
            let outcome = run_analyze(&pipeline, &path).await?;

            println!("Analysis id: {}", outcome.analysis_id);
            if !outcome.skipped.is_empty() {
                println!("Skipped files: {}", outcome.skipped.join(", "));
            }
            println!(
                "Proposed architecture:\n{}",
                serde_json::to_string_pretty(&outcome.architecture)?
            );
        }
        Commands::Generate {
            analysis_id,
            architecture,
            skip_validation,
        } => {
            let override_value = match architecture {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("read architecture file: {}", path.display()))?;
                    Some(
                        serde_json::from_str(&raw)
                            .with_context(|| format!("parse architecture file: {}", path.display()))?,
                    )
                }
                None => None,
            };

            let pipeline = Pipeline::from_config(&cfg).await?;
            let outcome = run_generate(
                &pipeline,
                &analysis_id,
                override_value,
                skip_validation.then_some(true),
            )
            .await?;

            match outcome.status {
                GenerateStatus::Validated => println!("Build validation passed."),
                GenerateStatus::Unvalidated => println!("Validation skipped; output is unchecked."),
            }
            if !outcome.skipped.is_empty() {
                println!("Skipped target files: {}", outcome.skipped.join(", "));
            }
            println!("Archive: {}", outcome.archive_path.display());
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
