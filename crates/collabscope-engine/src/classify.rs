//! Repository classification and shared-account detection.
//!
//! Both detectors are heuristic proxies surfaced for human review; nothing
//! here merges, splits, or otherwise mutates contributor records.

use collabscope_core::Classification;
use serde::{Deserialize, Serialize};

use crate::aggregate::ContributorRecord;

/// A contributor key suspected of representing more than one physical person.
///
/// # Examples
///
/// ```
/// use collabscope_engine::classify::SharedAccountFlag;
///
/// let flag = SharedAccountFlag {
///     key: "email:shared@x.com".into(),
///     name: Some("Shared Account".into()),
///     email: Some("shared@x.com".into()),
///     reasons: vec!["multiple name aliases".into()],
/// };
/// assert_eq!(flag.reasons.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedAccountFlag {
    /// Canonical contributor key.
    pub key: String,
    /// Displayed name.
    pub name: Option<String>,
    /// Displayed email.
    pub email: Option<String>,
    /// Which heuristics fired.
    pub reasons: Vec<String>,
}

/// Classify the repository from its contributor records.
///
/// `unclassified` when no human commits exist, `individual` when exactly one
/// human contributor holds nonzero weighted commits, `collaborative`
/// otherwise.
///
/// # Examples
///
/// ```
/// use collabscope_core::Classification;
/// use collabscope_engine::classify::classify;
///
/// assert_eq!(classify(&[]), Classification::Unclassified);
/// ```
pub fn classify(records: &[ContributorRecord]) -> Classification {
    let active_humans = records
        .iter()
        .filter(|r| !r.is_bot && r.metrics.commit_weighted > 0.0)
        .count();
    match active_humans {
        0 => Classification::Unclassified,
        1 => Classification::Individual,
        _ => Classification::Collaborative,
    }
}

/// Whether a single record looks like a shared account.
///
/// Fires on multiple distinct name or email aliases under one key, or on
/// co-author-only participation (shared-commit events without ever being the
/// primary author).
pub fn is_shared_account(record: &ContributorRecord) -> bool {
    if record.name_aliases.len() > 1 || record.email_aliases.len() > 1 {
        return true;
    }
    let m = &record.metrics;
    m.shared_commit_events > 0 && m.commits_authored == 0 && m.commit_participation > 0
}

/// Collect shared-account flags, with the reasons that fired, for reporting.
pub fn detect_shared_accounts(records: &[ContributorRecord]) -> Vec<SharedAccountFlag> {
    records
        .iter()
        .filter_map(|record| {
            let mut reasons = Vec::new();
            if record.name_aliases.len() > 1 {
                reasons.push("multiple name aliases".to_string());
            }
            if record.email_aliases.len() > 1 {
                reasons.push("multiple email aliases".to_string());
            }
            let m = &record.metrics;
            if m.shared_commit_events > 0 && m.commits_authored == 0 && m.commit_participation > 0
            {
                reasons.push("co-author-only participation".to_string());
            }
            if reasons.is_empty() {
                None
            } else {
                Some(SharedAccountFlag {
                    key: record.key.to_string(),
                    name: record.name.clone(),
                    email: record.email.clone(),
                    reasons,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ContributorLedger;
    use crate::bots::BotDetector;
    use crate::extract::Commit;
    use crate::identity::Identity;

    fn records_from(commits: Vec<Commit>) -> Vec<ContributorRecord> {
        let mut ledger = ContributorLedger::new(BotDetector::new(&[]).unwrap());
        for c in &commits {
            ledger.ingest(c);
        }
        ledger.into_records()
    }

    fn commit(name: &str, email: &str) -> Commit {
        Commit {
            hash: "h".into(),
            author: Identity::new(name, email),
            ..Commit::default()
        }
    }

    #[test]
    fn empty_is_unclassified() {
        assert_eq!(classify(&[]), Classification::Unclassified);
    }

    #[test]
    fn bot_only_is_unclassified() {
        let records = records_from(vec![commit("renovate[bot]", "bot@x.com")]);
        assert_eq!(classify(&records), Classification::Unclassified);
    }

    #[test]
    fn single_human_with_bot_is_individual() {
        let records = records_from(vec![
            commit("Alice", "a@x.com"),
            commit("dependabot[bot]", "bot@x.com"),
        ]);
        assert_eq!(classify(&records), Classification::Individual);
    }

    #[test]
    fn two_humans_is_collaborative() {
        let records = records_from(vec![
            commit("Alice", "a@x.com"),
            commit("Bob", "b@x.com"),
        ]);
        assert_eq!(classify(&records), Classification::Collaborative);
    }

    #[test]
    fn alias_accumulation_flags_shared_account() {
        let records = records_from(vec![
            commit("Shared Account", "shared@x.com"),
            commit("Shared Alias", "shared@x.com"),
        ]);
        assert_eq!(records.len(), 1);
        assert!(is_shared_account(&records[0]));
        let flags = detect_shared_accounts(&records);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].reasons, vec!["multiple name aliases"]);
    }

    #[test]
    fn coauthor_only_participation_flags_shared_account() {
        let mut c = commit("Bob", "b@x.com");
        c.co_authors = vec![Identity::new("Pair Partner", "pair@x.com")];
        let records = records_from(vec![c]);
        let pair = records
            .iter()
            .find(|r| r.email.as_deref() == Some("pair@x.com"))
            .unwrap();
        assert!(is_shared_account(pair));
        let flags = detect_shared_accounts(&records);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].reasons, vec!["co-author-only participation"]);
    }

    #[test]
    fn plain_single_author_is_not_flagged() {
        let records = records_from(vec![commit("Alice", "a@x.com")]);
        assert!(!is_shared_account(&records[0]));
        assert!(detect_shared_accounts(&records).is_empty());
    }
}
