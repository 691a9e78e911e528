//! # Similarity Ranker Module
//!
//! ## Purpose
//! Scores a query text against a candidate pool of stored cases and returns a
//! ranked, paginated result page with aggregate statistics.
//!
//! ## Input/Output Specification
//! - **Input**: Query text, candidate pool (or a case type to fetch one), page
//!   offset/limit, scoring strategy
//! - **Output**: Ranked page of matches with tiers, total count, highest and
//!   average score, has-more flag
//!
//! ## Candidate pool policy
//! Up to 100 same-type records are fetched; when the same-type pool holds
//! fewer than 20 records, up to 50 records of other types are appended, so
//! cross-category matches are only considered when the primary category is
//! sparse. Pool sizes stay capped to keep single-threaded scoring fast
//! enough for interactive use.

use crate::config::RankerConfig;
use crate::errors::Result;
use crate::similarity::{MatchTier, ScoringStrategy, SimilarityScorer};
use crate::storage::CaseStore;
use crate::{CaseRecord, CaseType};
use serde::Serialize;

/// One scored candidate. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityMatch {
    /// The matched case
    #[serde(rename = "case")]
    pub record: CaseRecord,
    /// Similarity score in [0, 100]
    pub score: f64,
    /// Display tier derived from the score
    pub match_tier: MatchTier,
}

/// A ranked, paginated result page.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMatches {
    /// The requested page, in descending score order
    pub matches: Vec<SimilarityMatch>,
    /// Total candidates scored (the whole sorted list, not the page)
    pub total_found: usize,
    /// Best score in the full sorted list, independent of pagination
    pub highest_match: f64,
    /// Mean score of the returned page, rounded to 2 decimals
    pub average_match: f64,
    /// Whether more results exist past this page
    pub has_more: bool,
}

impl RankedMatches {
    fn empty() -> Self {
        Self {
            matches: Vec::new(),
            total_found: 0,
            highest_match: 0.0,
            average_match: 0.0,
            has_more: false,
        }
    }
}

/// Similarity ranker over the document store
pub struct SimilarityRanker {
    scorer: SimilarityScorer,
    config: RankerConfig,
}

impl SimilarityRanker {
    /// Create a ranker from configuration
    pub fn new(config: RankerConfig) -> Result<Self> {
        let scorer = SimilarityScorer::new(&config)?;
        Ok(Self { scorer, config })
    }

    /// Fetch the candidate pool for a case type from the store.
    ///
    /// Same-type records come first; other types are appended only when the
    /// same-type pool is below the sparse threshold.
    pub fn select_pool(&self, store: &CaseStore, case_type: CaseType) -> Result<Vec<CaseRecord>> {
        let mut pool = store.find_by_type(case_type, self.config.same_type_cap)?;

        if pool.len() < self.config.sparse_pool_threshold {
            let extra = store.find_excluding_type(case_type, self.config.cross_type_cap)?;
            tracing::debug!(
                same_type = pool.len(),
                cross_type = extra.len(),
                "Sparse pool for {}, widening to other categories",
                case_type
            );
            pool.extend(extra);
        }

        Ok(pool)
    }

    /// Score, rank, and paginate a candidate pool against a query text.
    ///
    /// Pure over its inputs: an empty pool yields an empty page with zeroed
    /// aggregates, not an error. Ties in score preserve pool order.
    pub fn find_similar(
        &self,
        query_text: &str,
        pool: &[CaseRecord],
        offset: usize,
        limit: usize,
        strategy: ScoringStrategy,
    ) -> RankedMatches {
        if pool.is_empty() {
            return RankedMatches::empty();
        }

        let mut scored: Vec<SimilarityMatch> = pool
            .iter()
            .map(|record| {
                let candidate_text = self.scorer.comparison_text(record);
                let score = self.scorer.score(query_text, &candidate_text, strategy);
                SimilarityMatch {
                    record: record.clone(),
                    score,
                    match_tier: MatchTier::from_score(score, &self.config),
                }
            })
            .collect();

        // Stable sort: equal scores keep pool order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let total_found = scored.len();
        let highest_match = scored.first().map(|m| m.score).unwrap_or(0.0);

        let page: Vec<SimilarityMatch> = scored
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect();

        let average_match = if page.is_empty() {
            0.0
        } else {
            let sum: f64 = page.iter().map(|m| m.score).sum();
            (sum / page.len() as f64 * 100.0).round() / 100.0
        };

        RankedMatches {
            has_more: offset.saturating_add(limit) < total_found,
            matches: page,
            total_found,
            highest_match,
            average_match,
        }
    }

    /// Default page size when the caller does not supply one
    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }
}
