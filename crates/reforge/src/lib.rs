//! # Reforge
//!
//! **A retrieval-augmented pipeline for migrating legacy codebases.**
//!
//! Reforge converts a legacy project (VB6 in the shipped collaborators)
//! into a target-language project through a multi-stage pipeline: scan
//! the source, analyze each file, propose a target architecture,
//! materialize every target artifact via retrieval-augmented generation,
//! validate the result with a real build, and iteratively repair it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌──────────────┐
//! │  Scanner  │──▶│ Analyzer  │──▶│ Architect  │──▶│ SQLite + Vec  │
//! │ dir/zip  │   │ per file │   │ lean view │   │ stores        │
//! └──────────┘   └──────────┘   └───────────┘   └──────┬───────┘
//!                                                      │
//!                   ┌──────────────────────────────────┤
//!                   ▼                                  ▼
//!             ┌───────────┐   ┌─────────┐   ┌────────────────┐
//!             │ Retrieval  │──▶│ Generate │──▶│ Build → Refine  │──▶ zip
//!             │ top-k ctx │   │ + cache │   │ bounded loop   │
//!             └───────────┘   └─────────┘   └────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. The **scanner** ([`source`]) walks a directory or zip archive and
//!    produces typed source records with extracted declaration features.
//! 2. The **analyze stage** ([`analyze`]) summarizes oversized files,
//!    runs the per-file analyzer, aggregates an analysis summary, and
//!    asks the architect for a target layout from the lean projection.
//! 3. The summary and architecture are persisted
//!    ([`analysis_store`]) and indexed as embedding chunks
//!    ([`vector_store`]).
//! 4. The **generate stage** ([`generate`]) walks the architecture:
//!    static templates first, otherwise retrieval-augmented generation
//!    with a deterministic cache, then a bounded build/refine loop
//!    ([`builder`]) and zip packaging ([`package`]).
//! 5. Both stages are reachable from the **CLI** (`reforge`) and the
//!    **HTTP server** ([`server`]).
//!
//! ## Quick Start
//!
//! ```bash
//! reforge init                              # create database
//! reforge analyze ./legacy-app              # analyze a project
//! reforge generate <analysis-id>            # generate + validate + package
//! reforge serve                             # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode, schema migrations |
//! | [`analysis_store`] | Durable analysis_id → (summary, architecture) map |
//! | [`vector_store`] | File-backed nearest-neighbor index over embedded chunks |
//! | [`embedding`] | Embedder implementations (OpenAI, disabled) |
//! | [`retrieval`] | Top-k similarity retrieval into context strings |
//! | [`llm`] | Chat client and LLM-backed collaborators |
//! | [`source`] | Legacy project scanning (directory or zip) |
//! | [`analyze`] | Analyze stage orchestration |
//! | [`generate`] | Generate stage, validate/refine loop |
//! | [`builder`] | Build validation via an external command |
//! | [`package`] | Zip packaging of generated projects |
//! | [`pipeline`] | Collaborator wiring and settings |
//! | [`server`] | HTTP API (Axum) with CORS |
//! | [`error`] | Pipeline error taxonomy |
//!
//! ## Configuration
//!
//! Reforge is configured via a TOML file (default:
//! `config/reforge.toml`). See [`config::load_config`] for validation
//! rules and `config/reforge.example.toml` for a full example.

pub mod analysis_store;
pub mod analyze;
pub mod builder;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod generate;
pub mod llm;
pub mod package;
pub mod pipeline;
pub mod retrieval;
pub mod server;
pub mod source;
pub mod vector_store;

pub use error::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, PipelineSettings};
