//! # Legal Case Matching Engine
//!
//! ## Overview
//! This library implements a classification and similarity matching engine for
//! legal case documents: raw case text is classified into a fixed set of case
//! categories by weighted keyword matching, and ranked against a stored corpus
//! of cases using token-set Jaccard similarity.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `classifier`: Keyword-based case type detection with confidence scoring
//! - `similarity`: Tokenization and Jaccard token-set similarity scoring
//! - `ranker`: Candidate pool selection, ranking, and pagination
//! - `storage`: Persistent case record storage and retrieval
//! - `extract`: Plain-text extraction from uploaded documents
//! - `api`: REST API endpoints
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Legal case text (pasted or extracted from uploads), stored case records
//! - **Output**: Detected case categories with confidence, ranked similar-case pages
//! - **Performance**: Bounded candidate pools and full-text prefixes keep scoring
//!   fast enough for interactive, single-threaded-per-request use
//!
//! ## Usage
//! ```rust,no_run
//! use legal_case_matcher::{classifier::CaseTypeClassifier, config::Config};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let classifier = CaseTypeClassifier::new(config.classifier.clone());
//!     let result = classifier.classify("employment contract wage dispute");
//!     println!("Detected: {} ({:.2})", result.detected_type, result.confidence);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod extract;
pub mod ranker;
pub mod similarity;
pub mod storage;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use classifier::{CaseTypeClassifier, ClassificationResult};
pub use config::Config;
pub use errors::{MatchError, Result};
pub use ranker::{RankedMatches, SimilarityMatch, SimilarityRanker};

// Core types used throughout the system
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for stored cases
pub type CaseId = Uuid;

/// The closed set of case categories.
///
/// `Civil` is the catch-all: parsing an unknown label yields `Civil` rather
/// than failing, and the classifier falls back to it when no keywords match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseType {
    Civil,
    Criminal,
    Labour,
    Family,
    Financial,
    Drug,
    Environmental,
    Asset,
    ContemptOfCourt,
    SexualCases,
    Sports,
    Tax,
    Terrorism,
}

impl CaseType {
    /// All categories, in display order.
    pub const ALL: [CaseType; 13] = [
        CaseType::Civil,
        CaseType::Criminal,
        CaseType::Labour,
        CaseType::Family,
        CaseType::Financial,
        CaseType::Drug,
        CaseType::Environmental,
        CaseType::Asset,
        CaseType::ContemptOfCourt,
        CaseType::SexualCases,
        CaseType::Sports,
        CaseType::Tax,
        CaseType::Terrorism,
    ];

    /// Human-readable label, as stored and served.
    pub fn label(&self) -> &'static str {
        match self {
            CaseType::Civil => "Civil",
            CaseType::Criminal => "Criminal",
            CaseType::Labour => "Labour",
            CaseType::Family => "Family",
            CaseType::Financial => "Financial",
            CaseType::Drug => "Drug",
            CaseType::Environmental => "Environmental",
            CaseType::Asset => "Asset",
            CaseType::ContemptOfCourt => "Contempt of Court",
            CaseType::SexualCases => "Sexual Cases",
            CaseType::Sports => "Sports",
            CaseType::Tax => "Tax",
            CaseType::Terrorism => "Terrorism",
        }
    }

    /// Parse a label, defaulting to the catch-all category for unknown input.
    pub fn from_label(label: &str) -> CaseType {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(label.trim()))
            .unwrap_or(CaseType::Civil)
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for CaseType {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for CaseType {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(CaseType::from_label(&label))
    }
}

/// A stored legal case document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Unique identifier, assigned at creation
    pub id: CaseId,
    /// Short human label
    pub title: String,
    /// Case category
    pub case_type: CaseType,
    /// Court that decided the case
    #[serde(default)]
    pub court: String,
    /// Decision year
    #[serde(default)]
    pub year: Option<i32>,
    /// Case outcome
    #[serde(default)]
    pub outcome: String,
    /// Short text excerpt, derived from the full text when not supplied
    #[serde(default)]
    pub summary: String,
    /// Complete case text; immutable once stored
    pub full_text: String,
    /// Statutes and provisions relied on, in display order
    #[serde(default)]
    pub relevant_laws: Vec<String>,
    /// Precedents cited, in display order
    #[serde(default)]
    pub cited_cases: Vec<String>,
    /// Key argument points, in display order
    #[serde(default)]
    pub key_points: Vec<String>,
    /// Creation timestamp, set once
    pub created_at: DateTime<Utc>,
}

/// Application state shared across components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub classifier: Arc<classifier::CaseTypeClassifier>,
    pub ranker: Arc<ranker::SimilarityRanker>,
    pub store: Arc<storage::CaseStore>,
}
