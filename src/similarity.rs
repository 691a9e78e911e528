//! # Similarity Scoring Module
//!
//! ## Purpose
//! Tokenization and pairwise text similarity scoring for legal case matching,
//! plus the match tier labels derived from score thresholds.
//!
//! ## Input/Output Specification
//! - **Input**: Query text, candidate comparison text, scoring strategy
//! - **Output**: Jaccard token-set scores in [0, 100], match tier labels
//! - **Properties**: Scores are symmetric, bounded, and 100 for identical
//!   non-empty texts
//!
//! ## Scoring
//! Both texts are lowercased, Unicode-normalized, and split on non-word
//! character runs into unique token sets; the score is the Jaccard index of
//! the two sets scaled to [0, 100]. The default strategy discards short
//! tokens (length below the configured minimum); the `TokenOverlap` strategy
//! keeps every token but uses the same formula — the Jaccard index is the
//! single source of truth for both.

use crate::config::RankerConfig;
use crate::errors::{MatchError, Result};
use crate::CaseRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Named scoring strategies callers can pick between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringStrategy {
    /// Jaccard over token sets with the short-token filter applied
    #[default]
    Jaccard,
    /// Jaccard over unfiltered token sets
    TokenOverlap,
}

/// Display label for a scored match, derived from score thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    ExactMatch,
    StrongMatch,
    RelevantCase,
}

impl MatchTier {
    /// Map a score onto a tier using the configured thresholds.
    pub fn from_score(score: f64, config: &RankerConfig) -> MatchTier {
        if score > config.exact_match_threshold {
            MatchTier::ExactMatch
        } else if score > config.strong_match_threshold {
            MatchTier::StrongMatch
        } else {
            MatchTier::RelevantCase
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchTier::ExactMatch => "Exact Match",
            MatchTier::StrongMatch => "Strong Match",
            MatchTier::RelevantCase => "Relevant Case",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for MatchTier {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Text similarity scorer
pub struct SimilarityScorer {
    word_regex: Regex,
    min_token_len: usize,
    fulltext_prefix_chars: usize,
}

impl SimilarityScorer {
    /// Create a scorer from ranker configuration
    pub fn new(config: &RankerConfig) -> Result<Self> {
        let word_regex = Regex::new(r"\w+").map_err(|e| MatchError::Internal {
            message: format!("Invalid token regex: {}", e),
        })?;

        Ok(Self {
            word_regex,
            min_token_len: config.min_token_len,
            fulltext_prefix_chars: config.fulltext_prefix_chars,
        })
    }

    /// Tokenize text into a unique token set under the given strategy
    pub fn tokenize(&self, text: &str, strategy: ScoringStrategy) -> HashSet<String> {
        let min_len = match strategy {
            ScoringStrategy::Jaccard => self.min_token_len,
            ScoringStrategy::TokenOverlap => 0,
        };

        let normalized: String = text.nfc().collect::<String>().to_lowercase();

        self.word_regex
            .find_iter(&normalized)
            .map(|m| m.as_str().to_string())
            .filter(|t| t.chars().count() > min_len)
            .collect()
    }

    /// Score two texts in [0, 100]. Returns 0 when the token union is empty.
    pub fn score(&self, a: &str, b: &str, strategy: ScoringStrategy) -> f64 {
        let tokens_a = self.tokenize(a, strategy);
        let tokens_b = self.tokenize(b, strategy);

        let union = tokens_a.union(&tokens_b).count();
        if union == 0 {
            return 0.0;
        }

        let intersection = tokens_a.intersection(&tokens_b).count();
        intersection as f64 / union as f64 * 100.0
    }

    /// Build the bounded comparison text for a stored candidate.
    ///
    /// Only the first `fulltext_prefix_chars` characters of the full text
    /// take part in scoring, bounding per-request cost on large documents.
    pub fn comparison_text(&self, record: &CaseRecord) -> String {
        let prefix: String = record
            .full_text
            .chars()
            .take(self.fulltext_prefix_chars)
            .collect();
        format!("{} {} {}", record.title, record.summary, prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::Utc;
    use uuid::Uuid;

    fn scorer() -> SimilarityScorer {
        SimilarityScorer::new(&Config::default().ranker).unwrap()
    }

    fn record(title: &str, summary: &str, full_text: &str) -> CaseRecord {
        CaseRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            case_type: crate::CaseType::Civil,
            court: String::new(),
            year: None,
            outcome: String::new(),
            summary: summary.to_string(),
            full_text: full_text.to_string(),
            relevant_laws: vec![],
            cited_cases: vec![],
            key_points: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn score_is_symmetric() {
        let s = scorer();
        let pairs = [
            ("contract dispute breach", "employment wage dismissal"),
            ("freedom of speech", "speech restrictions and freedom"),
            ("", "some words here"),
        ];
        for (a, b) in pairs {
            for strategy in [ScoringStrategy::Jaccard, ScoringStrategy::TokenOverlap] {
                assert_eq!(s.score(a, b, strategy), s.score(b, a, strategy));
            }
        }
    }

    #[test]
    fn identical_text_scores_one_hundred() {
        let s = scorer();
        let text = "the appellant challenged the dismissal order before the tribunal";
        assert_eq!(s.score(text, text, ScoringStrategy::Jaccard), 100.0);
    }

    #[test]
    fn disjoint_texts_score_zero() {
        let s = scorer();
        let score = s.score(
            "pollution effluent discharge",
            "custody maintenance alimony",
            ScoringStrategy::Jaccard,
        );
        assert_eq!(score, 0.0);
    }

    #[test]
    fn scores_are_bounded() {
        let s = scorer();
        let samples = [
            ("contract dispute", "contract dispute breach"),
            ("a b c", "a b c"),
            ("wage theft case", "unrelated gardening topics"),
        ];
        for (a, b) in samples {
            let score = s.score(a, b, ScoringStrategy::Jaccard);
            assert!((0.0..=100.0).contains(&score), "score {score} out of range");
        }
    }

    #[test]
    fn empty_union_scores_zero() {
        let s = scorer();
        assert_eq!(s.score("", "", ScoringStrategy::Jaccard), 0.0);
        // Only short tokens: the filtered union is empty too.
        assert_eq!(s.score("a an of", "to in at", ScoringStrategy::Jaccard), 0.0);
    }

    #[test]
    fn two_thirds_overlap_scores_as_expected() {
        let s = scorer();
        // query {contract, dispute} vs candidate {contract, dispute, breach}
        let score = s.score(
            "contract dispute",
            "contract dispute breach",
            ScoringStrategy::Jaccard,
        );
        assert!((score - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn default_strategy_drops_short_tokens() {
        let s = scorer();
        let tokens = s.tokenize("an ox ran to the court", ScoringStrategy::Jaccard);
        assert!(tokens.contains("court"));
        assert!(tokens.contains("ran"));
        assert!(!tokens.contains("an"));
        assert!(!tokens.contains("ox"));
        assert!(!tokens.contains("to"));
    }

    #[test]
    fn token_overlap_strategy_keeps_short_tokens() {
        let s = scorer();
        let tokens = s.tokenize("an ox ran", ScoringStrategy::TokenOverlap);
        assert!(tokens.contains("an"));
        assert!(tokens.contains("ox"));
    }

    #[test]
    fn tokenization_splits_on_punctuation_and_lowercases() {
        let s = scorer();
        let tokens = s.tokenize("Breach—of-Contract! (Damages?)", ScoringStrategy::Jaccard);
        assert!(tokens.contains("breach"));
        assert!(tokens.contains("contract"));
        assert!(tokens.contains("damages"));
    }

    #[test]
    fn comparison_text_caps_full_text() {
        let s = scorer();
        let long_text = "x".repeat(5000);
        let r = record("Title", "Summary", &long_text);
        let text = s.comparison_text(&r);
        // "Title Summary " plus the 1000-char prefix.
        assert_eq!(text.chars().count(), "Title Summary ".chars().count() + 1000);
    }

    #[test]
    fn tier_boundaries_are_strict() {
        let config = Config::default().ranker;
        assert_eq!(MatchTier::from_score(70.1, &config), MatchTier::ExactMatch);
        assert_eq!(MatchTier::from_score(70.0, &config), MatchTier::StrongMatch);
        assert_eq!(
            MatchTier::from_score(200.0 / 3.0, &config),
            MatchTier::StrongMatch
        );
        assert_eq!(MatchTier::from_score(50.0, &config), MatchTier::RelevantCase);
        assert_eq!(MatchTier::from_score(0.0, &config), MatchTier::RelevantCase);
    }
}
