//! Result serialization to JSON and CSV.
//!
//! Export is a read-only view over an [`AnalysisResult`]; it never reorders
//! or mutates the result. JSON always carries the complete result including
//! bot entries, so downstream consumers can apply their own filtering. The
//! CSV view honors [`ExportOptions::include_bots`].

use collabscope_core::{CollabError, ExportFormat, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::analysis::{AnalysisResult, ContributorDetail};

/// Knobs for rendering a result.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Include bot rows in tabular output. JSON output is unaffected.
    pub include_bots: bool,
    /// Indent width for pretty JSON; `None` renders compact JSON.
    pub pretty: Option<usize>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_bots: true,
            pretty: Some(2),
        }
    }
}

/// Render `result` in the named format (`"json"` or `"csv"`).
///
/// # Errors
///
/// Returns [`CollabError::UnsupportedExportFormat`] for an unknown format
/// name and [`CollabError::Serialization`] if JSON encoding fails.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use collabscope_engine::{analyze, AnalyzeOptions};
/// use collabscope_engine::export::{render, ExportOptions};
///
/// let result = analyze(Path::new("."), &AnalyzeOptions::default()).unwrap();
/// let csv = render(&result, "csv", &ExportOptions::default()).unwrap();
/// assert!(csv.starts_with("Name,Email,Type"));
/// ```
pub fn render(result: &AnalysisResult, format: &str, options: &ExportOptions) -> Result<String> {
    let format: ExportFormat = format
        .parse()
        .map_err(|_| CollabError::UnsupportedExportFormat(format.to_string()))?;
    match format {
        ExportFormat::Json => to_json(result, options.pretty),
        ExportFormat::Csv => Ok(to_csv(result, options.include_bots)),
    }
}

/// Serialize the full result as JSON.
///
/// # Errors
///
/// Returns [`CollabError::Serialization`] if encoding fails.
pub fn to_json(result: &AnalysisResult, pretty: Option<usize>) -> Result<String> {
    let bytes = match pretty {
        Some(indent) => {
            let mut buf = Vec::new();
            let indent_bytes = vec![b' '; indent];
            let formatter = PrettyFormatter::with_indent(&indent_bytes);
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            result.serialize(&mut serializer)?;
            buf
        }
        None => serde_json::to_vec(result)?,
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

const CSV_HEADER: &str = "Name,Email,Type,Commits Authored,Commit Participation,\
Weighted Commits,Shared Commit Ratio,Lines Added,Lines Deleted,Lines Changed,\
Files Changed (approx),Reviews,Score (weighted),Score (normalized)";

/// Render the detailed contributor table as CSV.
///
/// Column order is fixed; floating-point columns use four decimal places.
pub fn to_csv(result: &AnalysisResult, include_bots: bool) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for detail in result
        .contributors_detailed
        .iter()
        .filter(|d| include_bots || !d.is_bot)
    {
        out.push_str(&csv_row(detail));
        out.push('\n');
    }
    out
}

fn csv_row(detail: &ContributorDetail) -> String {
    let m = &detail.metrics;
    let s = &detail.scores;
    let fields = [
        csv_field(detail.name.as_deref().unwrap_or("")),
        csv_field(detail.email.as_deref().unwrap_or("")),
        (if detail.is_bot { "bot" } else { "human" }).to_string(),
        m.commits_authored.to_string(),
        m.commit_participation.to_string(),
        format!("{:.4}", m.commit_weighted),
        format!("{:.4}", m.shared_commit_ratio()),
        format!("{:.4}", m.lines_added),
        format!("{:.4}", m.lines_deleted),
        format!("{:.4}", m.lines_changed()),
        format!("{:.4}", m.files_changed),
        m.review_count.to_string(),
        format!("{:.4}", s.weighted),
        format!("{:.4}", s.normalized),
    ];
    fields.join(",")
}

/// Quote a field when it contains a comma, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
