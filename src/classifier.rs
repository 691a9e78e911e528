//! # Case Type Classifier Module
//!
//! ## Purpose
//! Maps free-form legal text to one of the fixed case categories using weighted
//! keyword matching, producing a label, confidence score, and match count.
//!
//! ## Input/Output Specification
//! - **Input**: Raw case text, configured category keyword map
//! - **Output**: Detected category with confidence in [0, 1] and keyword hit count
//! - **Reject option**: Upload/validation flows can refuse non-legal input
//!
//! ## Algorithm
//! The input is lowercased once. Each category's score is the number of its
//! keywords that occur anywhere in the text as substrings, counting each
//! keyword at most once. The strictly highest score wins; ties keep the
//! category that appears earliest in the configured map, so the map order is
//! part of the contract. Zero hits everywhere falls back to the catch-all
//! category. Confidence scales linearly with the hit count and saturates at
//! the configured number of distinct hits.

use crate::config::ClassifierConfig;
use crate::errors::{MatchError, Result};
use crate::CaseType;
use serde::{Deserialize, Serialize};

/// Keyword-based case type classifier
pub struct CaseTypeClassifier {
    config: ClassifierConfig,
}

/// Outcome of classifying one text. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Best-matching category
    pub detected_type: CaseType,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Number of distinct keywords that matched for the winning category
    pub match_count: usize,
}

impl CaseTypeClassifier {
    /// Create a classifier over the configured category keyword map
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify text into the best-matching category.
    ///
    /// Never fails: unmatched or empty text yields the catch-all category
    /// with zero confidence.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let lowered = text.to_lowercase();

        let mut best_label: Option<&str> = None;
        let mut best_count = 0usize;

        for category in &self.config.categories {
            let count = category
                .keywords
                .iter()
                .filter(|kw| !kw.is_empty() && lowered.contains(kw.as_str()))
                .count();

            // Strict comparison keeps the first-seen category on ties.
            if count > best_count {
                best_count = count;
                best_label = Some(&category.label);
            }
        }

        let (detected_type, match_count) = match best_label {
            Some(label) if best_count > 0 => (CaseType::from_label(label), best_count),
            _ => (CaseType::Civil, 0),
        };

        let confidence = self.confidence_for(match_count);

        tracing::debug!(
            detected = %detected_type,
            match_count,
            confidence,
            "Classified text ({} chars)",
            text.len()
        );

        ClassificationResult {
            detected_type,
            confidence,
            match_count,
        }
    }

    /// Classify with the legal-document reject policy applied.
    ///
    /// Used by upload and validation flows only; plain classification never
    /// rejects. Returns `NotALegalDocument` carrying the computed confidence
    /// and match count so the caller can explain the rejection.
    pub fn validate_legal_document(&self, text: &str) -> Result<ClassificationResult> {
        let result = self.classify(text);

        if result.confidence < self.config.reject_min_confidence
            || result.match_count < self.config.reject_min_matches
        {
            return Err(MatchError::NotALegalDocument {
                confidence: result.confidence,
                match_count: result.match_count,
            });
        }

        Ok(result)
    }

    fn confidence_for(&self, match_count: usize) -> f32 {
        (match_count as f32 / self.config.confidence_saturation as f32).min(1.0)
    }
}
