//! Pipeline orchestration and the [`AnalysisResult`] output value.
//!
//! [`analyze`] drives extraction → identity resolution → bot classification
//! → aggregation → scoring → classification and assembles the single
//! immutable result value consumed by persistence, export, and
//! skills-inference downstream. [`analyze_commits`] is the pure tail of the
//! pipeline, used directly by unit tests.

use std::path::Path;

use chrono::Utc;
use collabscope_core::{Classification, Result, ScoreWeights, DEFAULT_MAX_OUTPUT_BYTES};
use serde::{Deserialize, Serialize};

use crate::aggregate::{ContributorLedger, ContributorMetrics, RepoTotals};
use crate::bots::BotDetector;
use crate::classify::{classify, detect_shared_accounts, is_shared_account, SharedAccountFlag};
use crate::extract::{extract_history, Commit, ExtractOptions};
use crate::score::{compute_scores, select_main_author, ContributorScores, MainAuthor};

/// Caller-supplied knobs for one analysis run.
///
/// # Examples
///
/// ```
/// use collabscope_engine::AnalyzeOptions;
///
/// let opts = AnalyzeOptions::default();
/// assert!(opts.preferred_emails.is_empty());
/// assert!(opts.weights.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Walk history reachable from all branches instead of HEAD only.
    pub all_branches: bool,
    /// Preferred main-author email addresses, in priority order.
    pub preferred_emails: Vec<String>,
    /// Extra bot-name patterns (case-insensitive regular expressions).
    pub bot_patterns: Vec<String>,
    /// Scoring weight overrides; `None` uses the default split.
    pub weights: Option<ScoreWeights>,
    /// Only include commits at or after this epoch timestamp.
    pub since: Option<i64>,
    /// Only include commits at or before this epoch timestamp.
    pub until: Option<i64>,
    /// Ceiling for captured git output, in bytes.
    pub max_output_bytes: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            all_branches: false,
            preferred_emails: Vec::new(),
            bot_patterns: Vec::new(),
            weights: None,
            since: None,
            until: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// All names and emails ever observed under one contributor key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasSet {
    /// Distinct names, sorted.
    pub names: Vec<String>,
    /// Distinct emails, sorted.
    pub emails: Vec<String>,
}

/// Heuristic flags attached to a detailed contributor entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorFlags {
    /// Whether the shared-account heuristics fired for this key.
    pub is_shared_account: bool,
}

/// Full per-contributor entry: aliases, raw metrics, and computed scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorDetail {
    /// Canonical contributor key (`email:…`, `name:…`, or `anon:…`).
    pub key: String,
    /// Displayed name.
    pub name: Option<String>,
    /// Displayed email.
    pub email: Option<String>,
    /// Whether this record is classified as an automation account.
    pub is_bot: bool,
    /// Accumulated aliases.
    pub aliases: AliasSet,
    /// Raw counters.
    pub metrics: ContributorMetrics,
    /// Computed shares and scores.
    pub scores: ContributorScores,
    /// Heuristic flags.
    pub flags: ContributorFlags,
}

/// Compact contributor entry for listing UIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorSummary {
    /// Displayed name.
    pub name: Option<String>,
    /// Displayed email.
    pub email: Option<String>,
    /// Commits authored as primary author.
    pub commits: u32,
    /// Whether this record is classified as an automation account.
    pub is_bot: bool,
    /// Authored commits over all commits.
    pub share_of_total: f64,
    /// Authored commits over human commits; `None` for bots or when no
    /// human commits exist.
    pub share_of_human: Option<f64>,
}

/// First/last commit timestamps and the span between them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeframe {
    /// Earliest commit timestamp, seconds since epoch.
    pub first_commit_at: Option<i64>,
    /// Latest commit timestamp, seconds since epoch.
    pub last_commit_at: Option<i64>,
    /// Fractional days between first and last commit.
    pub duration_days: Option<f64>,
}

impl Timeframe {
    fn from_commits(commits: &[Commit]) -> Self {
        let mut first: Option<i64> = None;
        let mut last: Option<i64> = None;
        for ts in commits.iter().filter_map(|c| c.timestamp) {
            first = Some(first.map_or(ts, |f: i64| f.min(ts)));
            last = Some(last.map_or(ts, |l: i64| l.max(ts)));
        }
        let duration_days = match (first, last) {
            (Some(f), Some(l)) => Some((l - f) as f64 / 86_400.0),
            _ => None,
        };
        Self {
            first_commit_at: first,
            last_commit_at: last,
            duration_days,
        }
    }
}

/// The engine's single output value; immutable after construction.
///
/// Serialized shape is stable camelCase JSON. Skills inference reads only
/// `contributorsDetailed[].metrics.linesByExt` and `.scores.normalized`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Path the analysis ran against.
    pub repo_path: String,
    /// Version-control system tag; always `"git"`.
    pub repo_type: String,
    /// Repository collaboration classification.
    pub classification: Classification,
    /// Repository-level totals, human/bot split.
    pub totals: RepoTotals,
    /// Human contributor record count.
    pub human_contributor_count: usize,
    /// Bot contributor record count.
    pub bot_contributor_count: usize,
    /// Compact contributor list.
    pub contributors: Vec<ContributorSummary>,
    /// Full detailed contributor list, highest weighted score first.
    pub contributors_detailed: Vec<ContributorDetail>,
    /// Selected primary human owner, if any human exists.
    pub main_author: Option<MainAuthor>,
    /// Commit timestamp span.
    pub timeframe: Timeframe,
    /// The resolved weights actually used for scoring.
    pub weights: ScoreWeights,
    /// Contributors flagged as likely shared accounts.
    pub shared_accounts: Vec<SharedAccountFlag>,
    /// When this analysis ran, seconds since epoch.
    pub analyzed_at: i64,
}

/// Analyze the repository at `repo_path`.
///
/// # Errors
///
/// Propagates extraction errors ([`collabscope_core::CollabError`]) and
/// configuration errors from invalid bot patterns. An empty repository is
/// not an error: it yields an unclassified zero-total result.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use collabscope_engine::{analyze, AnalyzeOptions};
///
/// let result = analyze(Path::new("."), &AnalyzeOptions::default()).unwrap();
/// println!("{} ({})", result.classification, result.totals.total_commits);
/// ```
pub fn analyze(repo_path: &Path, options: &AnalyzeOptions) -> Result<AnalysisResult> {
    let commits = extract_history(
        repo_path,
        &ExtractOptions {
            all_branches: options.all_branches,
            since: options.since,
            until: options.until,
            max_output_bytes: options.max_output_bytes,
        },
    )?;
    analyze_commits(repo_path, &commits, options)
}

/// The pure tail of the pipeline: aggregate, score, classify, assemble.
///
/// # Errors
///
/// Returns [`collabscope_core::CollabError::Config`] if a caller-supplied
/// bot pattern is not a valid regular expression.
pub fn analyze_commits(
    repo_path: &Path,
    commits: &[Commit],
    options: &AnalyzeOptions,
) -> Result<AnalysisResult> {
    let detector = BotDetector::new(&options.bot_patterns)?;
    let mut ledger = ContributorLedger::new(detector);
    for commit in commits {
        ledger.ingest(commit);
    }

    let totals = ledger.totals();
    let records = ledger.into_records();
    let weights = options.weights.unwrap_or_default().resolve();
    let scores = compute_scores(&records, &totals, weights);

    // Order by weighted score, then raw commit credit, then name, so output
    // is deterministic across runs.
    let mut entries: Vec<(crate::aggregate::ContributorRecord, ContributorScores)> =
        records.into_iter().zip(scores).collect();
    entries.sort_by(|(ra, sa), (rb, sb)| {
        sb.weighted
            .partial_cmp(&sa.weighted)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                rb.metrics
                    .commit_weighted
                    .partial_cmp(&ra.metrics.commit_weighted)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then_with(|| ra.name.cmp(&rb.name))
    });
    let (records, scores): (Vec<_>, Vec<_>) = entries.into_iter().unzip();

    let classification = classify(&records);
    let shared_accounts = detect_shared_accounts(&records);
    let main_author = select_main_author(&records, &scores, &totals, &options.preferred_emails);
    let timeframe = Timeframe::from_commits(commits);

    let human_contributor_count = records.iter().filter(|r| !r.is_bot).count();
    let bot_contributor_count = records.len() - human_contributor_count;

    let contributors = records
        .iter()
        .map(|record| {
            let commits_authored = record.metrics.commits_authored;
            let share_of_total = if totals.total_commits > 0 {
                f64::from(commits_authored) / f64::from(totals.total_commits)
            } else {
                0.0
            };
            let share_of_human = if !record.is_bot && totals.total_human_commits > 0 {
                Some(f64::from(commits_authored) / f64::from(totals.total_human_commits))
            } else {
                None
            };
            ContributorSummary {
                name: record.name.clone(),
                email: record.email.clone(),
                commits: commits_authored,
                is_bot: record.is_bot,
                share_of_total,
                share_of_human,
            }
        })
        .collect();

    let contributors_detailed = records
        .iter()
        .zip(&scores)
        .map(|(record, score)| ContributorDetail {
            key: record.key.to_string(),
            name: record.name.clone(),
            email: record.email.clone(),
            is_bot: record.is_bot,
            aliases: AliasSet {
                names: record.name_aliases.iter().cloned().collect(),
                emails: record.email_aliases.iter().cloned().collect(),
            },
            metrics: record.metrics.clone(),
            scores: *score,
            flags: ContributorFlags {
                is_shared_account: is_shared_account(record),
            },
        })
        .collect();

    Ok(AnalysisResult {
        repo_path: repo_path.to_string_lossy().into_owned(),
        repo_type: "git".to_string(),
        classification,
        totals,
        human_contributor_count,
        bot_contributor_count,
        contributors,
        contributors_detailed,
        main_author,
        timeframe,
        weights,
        shared_accounts,
        analyzed_at: Utc::now().timestamp(),
    })
}
