//! Git collaboration analysis: attribution, scoring, and classification.
//!
//! Reconstructs commit history by invoking the `git` tool, resolves raw
//! author and trailer identities into canonical contributor records, splits
//! credit across multi-author commits, and produces normalized weighted
//! collaboration scores plus repository-level aggregates.
//!
//! The pipeline is strictly one-directional:
//! extraction → identity resolution → bot classification → attribution →
//! scoring → classification → export. Each analysis run owns its own
//! contributor map; nothing is shared across runs.

pub mod aggregate;
pub mod analysis;
pub mod bots;
pub mod classify;
pub mod export;
pub mod extract;
pub mod identity;
pub mod score;

pub use analysis::{analyze, analyze_commits, AnalysisResult, AnalyzeOptions};
