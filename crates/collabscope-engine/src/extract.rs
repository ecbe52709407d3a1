//! Commit history extraction via the `git` tool.
//!
//! Runs `git log` with a control-character-delimited pretty format plus
//! `--numstat` and parses the captured stream into [`Commit`] records. The
//! subprocess runs synchronously; its whole output is captured, checked
//! against a size ceiling, then parsed. Empty repositories are detected from
//! git's known "no commits" stderr signatures and yield an empty commit list
//! rather than an error.

use std::path::Path;
use std::process::Command;

use chrono::DateTime;
use collabscope_core::{CollabError, Result, DEFAULT_MAX_OUTPUT_BYTES};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

// Record / field / value separators used in the pretty format below.
const RECORD_SEP: char = '\u{1e}';
const FIELD_SEP: char = '\u{1f}';
const VALUE_SEP: char = '\u{1}';

// hash, parents, author name, author email, author timestamp, subject,
// co-author trailers, reviewer trailers.
const LOG_FORMAT: &str = "%x1e%H%x1f%P%x1f%an%x1f%ae%x1f%at%x1f%s%x1f\
%(trailers:key=Co-authored-by,valueonly,separator=%x01)%x1f\
%(trailers:key=Reviewed-by,valueonly,separator=%x01)";

// Stderr fragments git emits when a repository has no commits yet. Any of
// these downgrades the failure to a valid zero-commit result.
const EMPTY_REPO_SIGNATURES: &[&str] = &[
    "does not have any commits yet",
    "bad default revision",
    "bad revision 'head'",
    "unknown revision or path not in the working tree",
];

/// A single extracted commit. Immutable once parsed.
///
/// # Examples
///
/// ```
/// use collabscope_engine::extract::Commit;
///
/// let commit = Commit::default();
/// assert!(!commit.is_merge());
/// assert!(commit.files.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Full commit hash.
    pub hash: String,
    /// Parent hashes; more than one means a merge commit.
    pub parents: Vec<String>,
    /// Author identity as recorded on the commit.
    pub author: Identity,
    /// Author timestamp in seconds since the epoch, if parseable.
    pub timestamp: Option<i64>,
    /// Subject line.
    pub subject: String,
    /// Identities from `Co-authored-by` trailers.
    pub co_authors: Vec<Identity>,
    /// Identities from `Reviewed-by` trailers.
    pub reviewers: Vec<Identity>,
    /// Total lines added across all files.
    pub lines_added: u64,
    /// Total lines deleted across all files.
    pub lines_deleted: u64,
    /// Per-file line churn.
    pub files: Vec<FileStat>,
}

impl Commit {
    /// Merge commits have more than one parent and carry no file churn.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Per-file churn from `--numstat`. Binary files report 0/0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    /// Path relative to the repository root.
    pub path: String,
    /// Lines added.
    pub added: u64,
    /// Lines deleted.
    pub deleted: u64,
}

/// Options for history extraction.
///
/// # Examples
///
/// ```
/// use collabscope_engine::extract::ExtractOptions;
///
/// let opts = ExtractOptions::default();
/// assert!(!opts.all_branches);
/// assert_eq!(opts.max_output_bytes, 10 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Walk history reachable from all branches instead of HEAD only.
    pub all_branches: bool,
    /// Only include commits at or after this epoch timestamp.
    pub since: Option<i64>,
    /// Only include commits at or before this epoch timestamp.
    pub until: Option<i64>,
    /// Fail if captured output exceeds this many bytes.
    pub max_output_bytes: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            all_branches: false,
            since: None,
            until: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// Extract the commit history of the repository at `repo_path`.
///
/// # Errors
///
/// - [`CollabError::RepositoryPathMissing`] if the path does not exist.
/// - [`CollabError::NotAGitRepository`] if it is not a git working tree.
/// - [`CollabError::HistoryExtraction`] if the git invocation fails for any
///   reason other than an empty repository, or if output exceeds the ceiling.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use collabscope_engine::extract::{extract_history, ExtractOptions};
///
/// let commits = extract_history(Path::new("."), &ExtractOptions::default()).unwrap();
/// for c in &commits {
///     println!("{} {}", &c.hash[..7.min(c.hash.len())], c.subject);
/// }
/// ```
pub fn extract_history(repo_path: &Path, options: &ExtractOptions) -> Result<Vec<Commit>> {
    if !repo_path.exists() {
        return Err(CollabError::RepositoryPathMissing(repo_path.to_path_buf()));
    }
    assert_git_repository(repo_path)?;

    let mut args: Vec<String> = vec![
        "-C".into(),
        repo_path.to_string_lossy().into_owned(),
        "log".into(),
        format!("--pretty=format:{LOG_FORMAT}"),
        "--numstat".into(),
    ];
    if options.all_branches {
        args.push("--all".into());
    }
    if let Some(since) = options.since {
        if let Some(date) = DateTime::from_timestamp(since, 0) {
            args.push(format!("--since={}", date.to_rfc3339()));
        }
    }
    if let Some(until) = options.until {
        if let Some(date) = DateTime::from_timestamp(until, 0) {
            args.push(format!("--until={}", date.to_rfc3339()));
        }
    }
    args.push("HEAD".into());

    tracing::debug!(repo = %repo_path.display(), all_branches = options.all_branches, "running git log");

    let output = Command::new("git")
        .args(&args)
        .output()
        .map_err(|e| CollabError::HistoryExtraction(format!("failed to invoke git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_empty_repo_stderr(&stderr) {
            tracing::debug!(repo = %repo_path.display(), "repository has no commits yet");
            return Ok(Vec::new());
        }
        return Err(CollabError::HistoryExtraction(format!(
            "git log failed for {}: {}",
            repo_path.display(),
            stderr.trim()
        )));
    }

    if output.stdout.len() > options.max_output_bytes {
        return Err(CollabError::HistoryExtraction(format!(
            "git log output for {} exceeded {} bytes",
            repo_path.display(),
            options.max_output_bytes
        )));
    }

    let commits = parse_log(&String::from_utf8_lossy(&output.stdout));
    tracing::debug!(commits = commits.len(), "extracted history");
    Ok(commits)
}

/// Verify the path is inside a git working tree.
fn assert_git_repository(repo_path: &Path) -> Result<()> {
    let status = Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .args(["rev-parse", "--is-inside-work-tree"])
        .output()
        .map_err(|e| CollabError::HistoryExtraction(format!("failed to invoke git: {e}")))?;
    if status.status.success() {
        Ok(())
    } else {
        Err(CollabError::NotAGitRepository(repo_path.to_path_buf()))
    }
}

/// Whether stderr output matches one of git's "no commits yet" signatures.
pub fn is_empty_repo_stderr(stderr: &str) -> bool {
    let lowered = stderr.to_lowercase();
    EMPTY_REPO_SIGNATURES.iter().any(|sig| lowered.contains(sig))
}

/// Parse a delimited `git log --numstat` stream into commits.
///
/// Pure function, exercised directly by unit tests; malformed lines are
/// skipped rather than failing the run.
pub fn parse_log(stream: &str) -> Vec<Commit> {
    let mut commits = Vec::new();

    for record in stream.split(RECORD_SEP) {
        if record.trim().is_empty() {
            continue;
        }
        let mut lines = record.lines();
        let Some(header) = lines.next() else {
            continue;
        };
        let fields: Vec<&str> = header.split(FIELD_SEP).collect();
        if fields.len() < 8 {
            continue;
        }

        let mut commit = Commit {
            hash: fields[0].trim().to_string(),
            parents: fields[1].split_whitespace().map(str::to_string).collect(),
            author: Identity::new(fields[2], fields[3]),
            timestamp: fields[4].trim().parse::<i64>().ok(),
            subject: fields[5].trim().to_string(),
            co_authors: parse_trailer_values(fields[6]),
            reviewers: parse_trailer_values(fields[7]),
            ..Commit::default()
        };

        for line in lines {
            if let Some(stat) = parse_numstat_line(line) {
                commit.lines_added += stat.added;
                commit.lines_deleted += stat.deleted;
                commit.files.push(stat);
            }
        }

        commits.push(commit);
    }

    commits
}

fn parse_trailer_values(field: &str) -> Vec<Identity> {
    field
        .split(VALUE_SEP)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(Identity::parse)
        .filter(|id| !id.is_anonymous())
        .collect()
}

fn parse_numstat_line(line: &str) -> Option<FileStat> {
    let mut parts = line.splitn(3, '\t');
    let added = parts.next()?.trim();
    let deleted = parts.next()?.trim();
    let path = parts.next()?.trim();
    if path.is_empty() {
        return None;
    }
    // Binary files show "-" for both columns; report them as zero churn.
    let added = if added == "-" { 0 } else { added.parse().ok()? };
    let deleted = if deleted == "-" { 0 } else { deleted.parse().ok()? };
    Some(FileStat {
        path: path.to_string(),
        added,
        deleted,
    })
}
