//! Failure detection
//!
//! Classifies log text (and an optional status token) into a ranked list of
//! candidate failure types.

use crate::patterns::PatternLibrary;
use kubeheal_core::FailureType;
use std::sync::Arc;

/// Score given to a type named by the status token but absent from the logs
pub const STATUS_ONLY_SCORE: f64 = 90.0;

/// Boost given to a type named by the status token and seen in the logs
pub const STATUS_BOOST: f64 = 10.0;

/// Scored candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Candidate failure type
    pub failure_type: FailureType,
    /// Score, 0-100
    pub score: f64,
}

/// Classifies failure evidence
#[derive(Debug, Clone)]
pub struct FailureDetector {
    library: Arc<PatternLibrary>,
}

impl Default for FailureDetector {
    fn default() -> Self {
        Self::new(PatternLibrary::standard())
    }
}

impl FailureDetector {
    /// Create detector over a pattern library
    #[inline]
    #[must_use]
    pub fn new(library: Arc<PatternLibrary>) -> Self {
        Self { library }
    }

    /// Ranked failure types, most likely first; `[Unknown]` when nothing matches
    #[must_use]
    pub fn detect(&self, log_text: &str, status_text: Option<&str>) -> Vec<FailureType> {
        let ranked: Vec<FailureType> = self
            .score(log_text, status_text)
            .into_iter()
            .map(|d| d.failure_type)
            .collect();

        if ranked.is_empty() {
            tracing::debug!("no failure pattern matched");
            vec![FailureType::Unknown]
        } else {
            tracing::debug!(?ranked, "ranked failure types");
            ranked
        }
    }

    /// Scored candidates, highest first; ties keep declaration order
    #[must_use]
    pub fn score(&self, log_text: &str, status_text: Option<&str>) -> Vec<Detection> {
        let status = status_text.map(normalize_status);

        let mut detections: Vec<Detection> = self
            .library
            .patterns()
            .iter()
            .filter_map(|pattern| {
                let total = pattern.signatures.len();
                let matched = pattern.match_count(log_text);
                let mut score = (matched > 0).then(|| 100.0 * matched as f64 / total as f64);

                if status
                    .as_deref()
                    .is_some_and(|s| s.contains(&normalize_status(pattern.failure_type.as_str())))
                {
                    score = Some(match score {
                        None => STATUS_ONLY_SCORE,
                        Some(s) => (s + STATUS_BOOST).min(100.0),
                    });
                }

                score.map(|score| Detection {
                    failure_type: pattern.failure_type,
                    score,
                })
            })
            .collect();

        // Stable sort, so equal scores keep the library's declaration order.
        detections.sort_by(|a, b| b.score.total_cmp(&a.score));
        detections
    }

    /// Underlying pattern library
    #[inline]
    #[must_use]
    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }
}

/// Lowercase and drop separators so `OOM Killed`, `oom_killed` and `OOMKilled` compare equal
fn normalize_status(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}
