//! Attribution and metrics aggregation.
//!
//! Walks non-merge commits and splits credit among participants (the author
//! plus co-author trailers, deduplicated by canonical key): each participant
//! receives a 1/n share of the commit's line churn and file count, so the
//! fractional credit assigned for a single commit always sums to 1.0.
//! Reviewers are tracked separately and never receive line or commit credit.
//!
//! The [`ContributorLedger`] owns the per-run contributor map; it is
//! constructed for one analysis and discarded afterwards, never shared.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bots::BotDetector;
use crate::extract::Commit;
use crate::identity::{ContributorKey, Identity, IdentityResolver};

/// Sentinel extension-histogram key for files without an extension.
pub const NO_EXTENSION: &str = "(none)";

/// Raw per-contributor counters accumulated during aggregation.
///
/// Line and file counts are fractional: multi-participant commits split them
/// by the 1/n share rule. "Files changed" is therefore a share-weighted
/// approximation, not an exact distinct-file count.
///
/// # Examples
///
/// ```
/// use collabscope_engine::aggregate::ContributorMetrics;
///
/// let m = ContributorMetrics::default();
/// assert_eq!(m.commits_authored, 0);
/// assert_eq!(m.commit_weighted, 0.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorMetrics {
    /// Commits where this contributor is the listed author.
    pub commits_authored: u32,
    /// Commits where this contributor is author or co-author.
    pub commit_participation: u32,
    /// Fractional commit credit (1/n per participated commit).
    pub commit_weighted: f64,
    /// Fractional credit earned on multi-participant commits.
    pub shared_commit_units: f64,
    /// Number of multi-participant commits participated in.
    pub shared_commit_events: u32,
    /// Commits where this contributor appears only via a co-author trailer.
    pub coauthored_commits: u32,
    /// Share-weighted lines added.
    pub lines_added: f64,
    /// Share-weighted lines deleted.
    pub lines_deleted: f64,
    /// Share-weighted count of files touched.
    pub files_changed: f64,
    /// Share-weighted line churn per lowercased file extension.
    pub lines_by_ext: BTreeMap<String, f64>,
    /// Commits where this contributor appears in a `Reviewed-by` trailer.
    pub review_count: u32,
}

impl ContributorMetrics {
    /// Total share-weighted line churn.
    pub fn lines_changed(&self) -> f64 {
        self.lines_added + self.lines_deleted
    }

    /// Fraction of weighted credit earned on multi-participant commits.
    pub fn shared_commit_ratio(&self) -> f64 {
        if self.commit_weighted > 0.0 {
            self.shared_commit_units / self.commit_weighted
        } else {
            0.0
        }
    }
}

/// The per-person aggregation unit, keyed by canonical contributor key.
///
/// Created lazily the first time an identity resolves to a new key; mutated
/// once per commit or trailer encountered; never deleted within a run.
#[derive(Debug, Clone)]
pub struct ContributorRecord {
    /// Canonical key this record accumulates under.
    pub key: ContributorKey,
    /// Displayed name: first one seen.
    pub name: Option<String>,
    /// Displayed email: first one seen (an email sticks once known).
    pub email: Option<String>,
    /// Every name ever observed under this key.
    pub name_aliases: BTreeSet<String>,
    /// Every email ever observed under this key.
    pub email_aliases: BTreeSet<String>,
    /// Monotonic automation flag: once true, stays true.
    pub is_bot: bool,
    /// Accumulated counters.
    pub metrics: ContributorMetrics,
}

impl ContributorRecord {
    fn new(key: ContributorKey) -> Self {
        Self {
            key,
            name: None,
            email: None,
            name_aliases: BTreeSet::new(),
            email_aliases: BTreeSet::new(),
            is_bot: false,
            metrics: ContributorMetrics::default(),
        }
    }

    /// Fold one raw identity into the record: accumulate aliases, settle the
    /// displayed name/email, and re-evaluate the bot heuristic.
    fn observe(&mut self, identity: &Identity, bots: &BotDetector) {
        if let Some(name) = &identity.name {
            self.name_aliases.insert(name.clone());
            if self.name.is_none() {
                self.name = Some(name.clone());
            }
        }
        if let Some(email) = &identity.email {
            self.email_aliases.insert(email.clone());
            if self.email.is_none() {
                self.email = Some(email.clone());
            }
        }
        if !self.is_bot {
            let name = identity.name.as_deref().unwrap_or("");
            let email = identity.email.as_deref().unwrap_or("");
            if bots.is_bot(name, email) {
                self.is_bot = true;
            }
        }
    }
}

/// Repository-level totals, split into human and bot subtotals based on the
/// contributor record's bot flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoTotals {
    /// Non-merge commits analyzed.
    pub total_commits: u32,
    /// Commits authored by human records.
    pub total_human_commits: u32,
    /// Commits authored by bot records.
    pub total_bot_commits: u32,
    /// Sum of fractional commit credit (equals `total_commits` when whole).
    pub total_weighted_commits: f64,
    /// Fractional credit held by human records.
    pub total_human_weighted_commits: f64,
    /// Fractional credit held by bot records.
    pub total_bot_weighted_commits: f64,
    /// Share-weighted lines added across all records.
    pub total_lines_added: f64,
    /// Share-weighted lines deleted across all records.
    pub total_lines_deleted: f64,
    /// Added + deleted.
    pub total_lines_changed: f64,
    /// Line churn held by human records.
    pub total_human_lines_changed: f64,
    /// Line churn held by bot records.
    pub total_bot_lines_changed: f64,
    /// Review trailer count across all records.
    pub total_reviews: u32,
    /// Reviews credited to human records.
    pub total_human_reviews: u32,
    /// Reviews credited to bot records.
    pub total_bot_reviews: u32,
}

/// Owns the contributor map for one analysis run.
///
/// # Examples
///
/// ```
/// use collabscope_engine::aggregate::ContributorLedger;
/// use collabscope_engine::bots::BotDetector;
/// use collabscope_engine::extract::Commit;
/// use collabscope_engine::identity::Identity;
///
/// let mut ledger = ContributorLedger::new(BotDetector::new(&[]).unwrap());
/// ledger.ingest(&Commit {
///     hash: "abc".into(),
///     author: Identity::new("Alice", "a@x.com"),
///     ..Commit::default()
/// });
/// assert_eq!(ledger.len(), 1);
/// assert_eq!(ledger.totals().total_commits, 1);
/// ```
#[derive(Debug)]
pub struct ContributorLedger {
    records: HashMap<ContributorKey, ContributorRecord>,
    order: Vec<ContributorKey>,
    resolver: IdentityResolver,
    bots: BotDetector,
}

impl ContributorLedger {
    /// Create an empty ledger using the given bot detector.
    pub fn new(bots: BotDetector) -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
            resolver: IdentityResolver::default(),
            bots,
        }
    }

    /// Number of contributor records created so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no identity has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve an identity, creating its record if needed, and fold the raw
    /// identity into it. Returns the canonical key.
    fn touch(&mut self, identity: &Identity) -> ContributorKey {
        let key = self.resolver.resolve(identity);
        if !self.records.contains_key(&key) {
            self.records
                .insert(key.clone(), ContributorRecord::new(key.clone()));
            self.order.push(key.clone());
        }
        if let Some(record) = self.records.get_mut(&key) {
            record.observe(identity, &self.bots);
        }
        key
    }

    /// Fold one commit into the ledger.
    ///
    /// Merge commits are excluded from the participant and metrics pipeline
    /// entirely. Reviewers only gain `review_count`.
    pub fn ingest(&mut self, commit: &Commit) {
        if commit.is_merge() {
            return;
        }

        for reviewer in &commit.reviewers {
            let key = self.touch(reviewer);
            if let Some(record) = self.records.get_mut(&key) {
                record.metrics.review_count += 1;
            }
        }

        // Participants: the author plus co-author trailers, deduplicated by
        // canonical key with the author first.
        let mut participants: Vec<ContributorKey> = Vec::new();
        for identity in std::iter::once(&commit.author).chain(commit.co_authors.iter()) {
            let key = self.touch(identity);
            if !participants.contains(&key) {
                participants.push(key);
            }
        }

        let n = participants.len();
        let share = 1.0 / n as f64;
        for (i, key) in participants.iter().enumerate() {
            let Some(record) = self.records.get_mut(key) else {
                continue;
            };
            let m = &mut record.metrics;
            if i == 0 {
                m.commits_authored += 1;
            } else {
                m.coauthored_commits += 1;
            }
            m.commit_participation += 1;
            m.commit_weighted += share;
            if n > 1 {
                m.shared_commit_units += share;
                m.shared_commit_events += 1;
            }
            m.lines_added += share * commit.lines_added as f64;
            m.lines_deleted += share * commit.lines_deleted as f64;
            m.files_changed += share * commit.files.len() as f64;
            for file in &commit.files {
                let churn = (file.added + file.deleted) as f64;
                *m.lines_by_ext.entry(extension_key(&file.path)).or_insert(0.0) +=
                    share * churn;
            }
        }
    }

    /// Records in first-seen order.
    pub fn records(&self) -> Vec<&ContributorRecord> {
        self.order
            .iter()
            .filter_map(|key| self.records.get(key))
            .collect()
    }

    /// Consume the ledger, yielding records in first-seen order.
    pub fn into_records(mut self) -> Vec<ContributorRecord> {
        self.order
            .iter()
            .filter_map(|key| self.records.remove(key))
            .collect()
    }

    /// Derive repository-level totals from the accumulated records.
    pub fn totals(&self) -> RepoTotals {
        let mut totals = RepoTotals::default();
        for record in self.records.values() {
            let m = &record.metrics;
            totals.total_commits += m.commits_authored;
            totals.total_weighted_commits += m.commit_weighted;
            totals.total_lines_added += m.lines_added;
            totals.total_lines_deleted += m.lines_deleted;
            totals.total_reviews += m.review_count;
            if record.is_bot {
                totals.total_bot_commits += m.commits_authored;
                totals.total_bot_weighted_commits += m.commit_weighted;
                totals.total_bot_lines_changed += m.lines_changed();
                totals.total_bot_reviews += m.review_count;
            } else {
                totals.total_human_commits += m.commits_authored;
                totals.total_human_weighted_commits += m.commit_weighted;
                totals.total_human_lines_changed += m.lines_changed();
                totals.total_human_reviews += m.review_count;
            }
        }
        totals.total_lines_changed = totals.total_lines_added + totals.total_lines_deleted;
        totals
    }
}

/// Lowercased file extension, or the [`NO_EXTENSION`] sentinel.
pub fn extension_key(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| NO_EXTENSION.to_string())
}
