use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CollabError;
use crate::types::ScoreWeights;

/// Default ceiling for captured `git log` output (10 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Top-level configuration loaded from `.collabscope.toml`.
///
/// CLI flags override config values, which override the built-in defaults.
///
/// # Examples
///
/// ```
/// use collabscope_core::CollabConfig;
///
/// let config = CollabConfig::default();
/// assert_eq!(config.analysis.weights.commits, 0.4);
/// assert!(!config.export.include_bots);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollabConfig {
    /// Analysis pipeline settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Export serializer settings.
    #[serde(default)]
    pub export: ExportConfig,
}

impl CollabConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CollabError::Io`] if the file cannot be read, or
    /// [`CollabError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use collabscope_core::CollabConfig;
    /// use std::path::Path;
    ///
    /// let config = CollabConfig::from_file(Path::new(".collabscope.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, CollabError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CollabError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use collabscope_core::CollabConfig;
    ///
    /// let toml = r#"
    /// [analysis]
    /// all_branches = true
    /// "#;
    /// let config = CollabConfig::from_toml(toml).unwrap();
    /// assert!(config.analysis.all_branches);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CollabError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Analysis pipeline configuration.
///
/// # Examples
///
/// ```
/// use collabscope_core::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert!(config.bot_patterns.is_empty());
/// assert_eq!(config.max_output_bytes, 10 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Scoring weights before normalization.
    #[serde(default)]
    pub weights: ScoreWeights,
    /// Extra bot-name patterns (case-insensitive regular expressions)
    /// unioned with the built-in set.
    #[serde(default)]
    pub bot_patterns: Vec<String>,
    /// Preferred main-author email addresses, in priority order.
    #[serde(default)]
    pub main_author_emails: Vec<String>,
    /// Walk history reachable from all branches instead of HEAD only.
    #[serde(default)]
    pub all_branches: bool,
    /// Ceiling for captured git output, in bytes (default: 10 MiB).
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            bot_patterns: Vec::new(),
            main_author_emails: Vec::new(),
            all_branches: false,
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

/// Export serializer configuration.
///
/// # Examples
///
/// ```
/// use collabscope_core::ExportConfig;
///
/// let config = ExportConfig::default();
/// assert_eq!(config.pretty, Some(2));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Include bot contributors in exported payloads (default: false).
    #[serde(default)]
    pub include_bots: bool,
    /// JSON indent width; `None` emits compact output (default: 2).
    #[serde(default = "default_pretty")]
    pub pretty: Option<usize>,
}

fn default_pretty() -> Option<usize> {
    Some(2)
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_bots: false,
            pretty: default_pretty(),
        }
    }
}
