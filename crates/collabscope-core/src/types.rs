use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Relative weights for the collaboration score components.
///
/// Callers may supply any non-negative values; [`ScoreWeights::resolve`]
/// normalizes them so the three components sum to exactly 1.0. If the sum is
/// not positive the fixed default split (0.4 / 0.4 / 0.2) is used instead.
///
/// # Examples
///
/// ```
/// use collabscope_core::ScoreWeights;
///
/// let resolved = ScoreWeights { commits: 2.0, lines_changed: 1.0, reviews: 1.0 }.resolve();
/// assert!((resolved.commits + resolved.lines_changed + resolved.reviews - 1.0).abs() < 1e-12);
/// assert!(resolved.commits > resolved.lines_changed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreWeights {
    /// Weight of the fractional commit share.
    pub commits: f64,
    /// Weight of the lines-changed share.
    pub lines_changed: f64,
    /// Weight of the review share.
    pub reviews: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            commits: 0.4,
            lines_changed: 0.4,
            reviews: 0.2,
        }
    }
}

impl ScoreWeights {
    /// Normalize the weights to sum to exactly 1.0.
    ///
    /// Negative components are treated as invalid input and clamped to zero
    /// before the sum check, so a degenerate set falls back to the default
    /// split rather than producing negative shares.
    ///
    /// # Examples
    ///
    /// ```
    /// use collabscope_core::ScoreWeights;
    ///
    /// let fallback = ScoreWeights { commits: 0.0, lines_changed: 0.0, reviews: 0.0 }.resolve();
    /// assert_eq!(fallback, ScoreWeights::default());
    /// ```
    pub fn resolve(self) -> Self {
        let commits = self.commits.max(0.0);
        let lines_changed = self.lines_changed.max(0.0);
        let reviews = self.reviews.max(0.0);
        let sum = commits + lines_changed + reviews;
        if sum <= 0.0 {
            return Self::default();
        }
        Self {
            commits: commits / sum,
            lines_changed: lines_changed / sum,
            reviews: reviews / sum,
        }
    }
}

/// Repository-level collaboration classification.
///
/// # Examples
///
/// ```
/// use collabscope_core::Classification;
///
/// let c: Classification = serde_json::from_str("\"collaborative\"").unwrap();
/// assert_eq!(c, Classification::Collaborative);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// No human commits exist.
    #[default]
    Unclassified,
    /// Exactly one human contributor has nonzero weighted commits.
    Individual,
    /// More than one human contributor has nonzero weighted commits.
    Collaborative,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Unclassified => write!(f, "unclassified"),
            Classification::Individual => write!(f, "individual"),
            Classification::Collaborative => write!(f, "collaborative"),
        }
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unclassified" => Ok(Classification::Unclassified),
            "individual" => Ok(Classification::Individual),
            "collaborative" => Ok(Classification::Collaborative),
            other => Err(format!("unknown classification: {other}")),
        }
    }
}

/// Output format for the export serializer.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument
/// parsing; unrecognized names are rejected at the export boundary.
///
/// # Examples
///
/// ```
/// use collabscope_core::ExportFormat;
///
/// let fmt: ExportFormat = "csv".parse().unwrap();
/// assert_eq!(fmt, ExportFormat::Csv);
/// assert!("xml".parse::<ExportFormat>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Machine-readable JSON with camelCase keys.
    #[default]
    Json,
    /// Spreadsheet-friendly CSV with a fixed header row.
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let w = ScoreWeights::default();
        assert!((w.commits + w.lines_changed + w.reviews - 1.0).abs() < f64::EPSILON);
        assert_eq!(w.commits, 0.4);
        assert_eq!(w.reviews, 0.2);
    }

    #[test]
    fn resolve_normalizes_custom_weights() {
        let w = ScoreWeights {
            commits: 2.0,
            lines_changed: 1.0,
            reviews: 1.0,
        }
        .resolve();
        assert!((w.commits - 0.5).abs() < 1e-12);
        assert!((w.lines_changed - 0.25).abs() < 1e-12);
        assert!((w.reviews - 0.25).abs() < 1e-12);
    }

    #[test]
    fn resolve_falls_back_on_zero_sum() {
        let w = ScoreWeights {
            commits: 0.0,
            lines_changed: 0.0,
            reviews: 0.0,
        }
        .resolve();
        assert_eq!(w, ScoreWeights::default());
    }

    #[test]
    fn resolve_clamps_negative_components() {
        let w = ScoreWeights {
            commits: -1.0,
            lines_changed: 0.0,
            reviews: 0.0,
        }
        .resolve();
        assert_eq!(w, ScoreWeights::default());

        let w = ScoreWeights {
            commits: -1.0,
            lines_changed: 3.0,
            reviews: 1.0,
        }
        .resolve();
        assert_eq!(w.commits, 0.0);
        assert!((w.lines_changed - 0.75).abs() < 1e-12);
    }

    #[test]
    fn classification_serializes_lowercase() {
        let json = serde_json::to_string(&Classification::Individual).unwrap();
        assert_eq!(json, "\"individual\"");
        assert_eq!(
            "collaborative".parse::<Classification>().unwrap(),
            Classification::Collaborative
        );
        assert!("team".parse::<Classification>().is_err());
    }

    #[test]
    fn export_format_from_str() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("yaml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn classification_default_is_unclassified() {
        assert_eq!(Classification::default(), Classification::Unclassified);
        assert_eq!(Classification::Unclassified.to_string(), "unclassified");
    }
}
