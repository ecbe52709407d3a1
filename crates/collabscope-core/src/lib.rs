//! Core types, configuration, and error handling for Collabscope.
//!
//! This crate provides the shared foundation used by the engine and store
//! crates:
//! - [`CollabError`] — unified error type using `thiserror`
//! - [`CollabConfig`] — configuration loaded from `.collabscope.toml`
//! - Shared types: [`ScoreWeights`], [`Classification`], [`ExportFormat`]

mod config;
mod error;
mod types;

pub use config::{AnalysisConfig, CollabConfig, ExportConfig, DEFAULT_MAX_OUTPUT_BYTES};
pub use error::CollabError;
pub use types::{Classification, ExportFormat, ScoreWeights};

/// A convenience `Result` type for Collabscope operations.
pub type Result<T> = std::result::Result<T, CollabError>;
