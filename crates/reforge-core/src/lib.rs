//! # Reforge Core
//!
//! Shared logic for Reforge: migration data models, collaborator traits,
//! vector math, the generation cache, and static artifact templates.
//!
//! This crate contains no tokio runtime, no filesystem I/O, and no HTTP
//! clients. Concrete stores, providers, and the pipeline orchestrator
//! live in the `reforge` app crate.

pub mod cache;
pub mod models;
pub mod templates;
pub mod traits;
pub mod vector;
