//! Heuristic automation-account detection.
//!
//! A contributor is classified as a bot when the lowercased concatenation of
//! name and email matches any pattern in the baseline set or any
//! caller-supplied pattern. This is a heuristic, not a guarantee: it catches
//! the common dependency-update, CI, and release-automation accounts, and
//! callers can extend it per repository.

use collabscope_core::{CollabError, Result};
use regex::{Regex, RegexBuilder};

/// Baseline patterns used to recognize common automation accounts.
pub const DEFAULT_BOT_PATTERNS: &[&str] = &[
    r"\[bot\]",
    r"\bbot\b",
    r"dependabot",
    r"github-actions",
    r"semantic-release",
    r"renovate",
];

/// Compiled bot-detection predicate.
///
/// # Examples
///
/// ```
/// use collabscope_engine::bots::BotDetector;
///
/// let detector = BotDetector::new(&[]).unwrap();
/// assert!(detector.is_bot("dependabot[bot]", "49699333+dependabot[bot]@users.noreply.github.com"));
/// assert!(!detector.is_bot("Alice", "alice@example.com"));
/// ```
#[derive(Debug)]
pub struct BotDetector {
    patterns: Vec<Regex>,
}

impl BotDetector {
    /// Build a detector from the baseline set unioned with `extra` patterns.
    ///
    /// Extra patterns are compiled as case-insensitive regular expressions.
    ///
    /// # Errors
    ///
    /// Returns [`CollabError::Config`] if an extra pattern is not a valid
    /// regular expression.
    pub fn new(extra: &[String]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(DEFAULT_BOT_PATTERNS.len() + extra.len());
        for pattern in DEFAULT_BOT_PATTERNS
            .iter()
            .copied()
            .chain(extra.iter().map(String::as_str))
        {
            let compiled = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| CollabError::Config(format!("invalid bot pattern '{pattern}': {e}")))?;
            patterns.push(compiled);
        }
        Ok(Self { patterns })
    }

    /// Decide whether a (name, email) pair looks like an automation account.
    ///
    /// # Examples
    ///
    /// ```
    /// use collabscope_engine::bots::BotDetector;
    ///
    /// let detector = BotDetector::new(&["internal-ci".into()]).unwrap();
    /// assert!(detector.is_bot("Internal-CI runner", ""));
    /// ```
    pub fn is_bot(&self, name: &str, email: &str) -> bool {
        let haystack = format!("{name} {email}").to_lowercase();
        self.patterns.iter().any(|p| p.is_match(&haystack))
    }
}
