//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the case matching engine, supporting
//! TOML files and environment variable overrides with validation and type-safe
//! access to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation, threshold ordering
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (highest priority)
//! 2. Configuration files
//! 3. Default values (lowest priority)
//!
//! All algorithm tuning lives here: the category keyword map (whose order is
//! the classifier tie-break), candidate pool caps, the token length filter,
//! the full-text comparison prefix, and the match tier thresholds.

use crate::errors::{MatchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Case type classifier configuration
    pub classifier: ClassifierConfig,
    /// Similarity ranker configuration
    pub ranker: RankerConfig,
    /// Storage and database settings
    pub storage: StorageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable CORS for web frontends
    pub enable_cors: bool,
    /// Maximum request payload size in MB (covers document uploads)
    pub max_payload_size_mb: usize,
}

/// One category with its ordered keyword list.
///
/// The position of the category in `ClassifierConfig::categories` is
/// significant: classification ties keep the earliest category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryKeywords {
    /// Category label
    pub label: String,
    /// Lowercase keyword stems matched as substrings
    pub keywords: Vec<String>,
}

/// Case type classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Ordered category keyword map; order is the tie-break
    pub categories: Vec<CategoryKeywords>,
    /// Distinct keyword hits at which confidence saturates at 1.0
    pub confidence_saturation: usize,
    /// Upload validation: minimum confidence to accept a document
    pub reject_min_confidence: f32,
    /// Upload validation: minimum distinct keyword hits to accept a document
    pub reject_min_matches: usize,
}

/// Similarity ranker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Tokens of this length or shorter are discarded by the default strategy
    pub min_token_len: usize,
    /// Characters of full text included in the comparison text
    pub fulltext_prefix_chars: usize,
    /// Maximum same-type records fetched for the candidate pool
    pub same_type_cap: usize,
    /// Below this many same-type records, other types are pulled in as well
    pub sparse_pool_threshold: usize,
    /// Maximum other-type records appended to a sparse pool
    pub cross_type_cap: usize,
    /// Scores strictly above this are labelled "Exact Match"
    pub exact_match_threshold: f64,
    /// Scores strictly above this (and not exact) are labelled "Strong Match"
    pub strong_match_threshold: f64,
    /// Default page size when the caller does not specify a limit
    pub default_limit: usize,
}

/// Storage and database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file path
    pub db_path: PathBuf,
    /// Enable gzip compression of stored full text
    pub enable_compression: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| MatchError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| MatchError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("CASE_MATCH_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("CASE_MATCH_PORT") {
            self.server.port = port.parse().map_err(|_| MatchError::Config {
                message: "Invalid port number in CASE_MATCH_PORT".to_string(),
            })?;
        }
        if let Ok(db_path) = std::env::var("CASE_MATCH_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }
        if let Ok(level) = std::env::var("CASE_MATCH_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(MatchError::ValidationFailed {
                field: "server.port".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }

        if self.classifier.confidence_saturation == 0 {
            return Err(MatchError::ValidationFailed {
                field: "classifier.confidence_saturation".to_string(),
                reason: "Saturation point must be greater than zero".to_string(),
            });
        }

        if self.ranker.fulltext_prefix_chars == 0 {
            return Err(MatchError::ValidationFailed {
                field: "ranker.fulltext_prefix_chars".to_string(),
                reason: "Full text prefix must be greater than zero".to_string(),
            });
        }

        if self.ranker.strong_match_threshold >= self.ranker.exact_match_threshold {
            return Err(MatchError::ValidationFailed {
                field: "ranker.strong_match_threshold".to_string(),
                reason: "Strong match threshold must be below the exact match threshold"
                    .to_string(),
            });
        }

        if self.ranker.default_limit == 0 {
            return Err(MatchError::ValidationFailed {
                field: "ranker.default_limit".to_string(),
                reason: "Default page size must be greater than zero".to_string(),
            });
        }

        // Every configured label must name a known case type; unknown labels
        // would otherwise be parsed as the Civil catch-all and silently merge
        // their keywords into it.
        let mut seen = std::collections::HashSet::new();
        for cat in &self.classifier.categories {
            let parsed = crate::CaseType::from_label(&cat.label);
            if !parsed.label().eq_ignore_ascii_case(cat.label.trim()) {
                return Err(MatchError::ValidationFailed {
                    field: "classifier.categories".to_string(),
                    reason: format!("Unknown category label '{}'", cat.label),
                });
            }
            if !seen.insert(parsed) {
                return Err(MatchError::ValidationFailed {
                    field: "classifier.categories".to_string(),
                    reason: format!("Duplicate category label '{}'", cat.label),
                });
            }
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MatchError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn category(label: &str, keywords: &[&str]) -> CategoryKeywords {
    CategoryKeywords {
        label: label.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

/// Default category keyword map.
///
/// Civil comes first so the catch-all also wins classification ties.
pub fn default_categories() -> Vec<CategoryKeywords> {
    vec![
        category(
            "Civil",
            &[
                "contract", "damages", "negligence", "breach", "liability", "injunction",
                "plaintiff", "tort", "specific performance",
            ],
        ),
        category(
            "Criminal",
            &[
                "murder", "theft", "robbery", "assault", "prosecution", "accused", "offence",
                "conviction", "bail", "culpable homicide",
            ],
        ),
        category(
            "Labour",
            &[
                "employment", "wage", "dismissal", "workman", "industrial dispute", "union",
                "retrenchment", "gratuity", "termination of service",
            ],
        ),
        category(
            "Family",
            &[
                "divorce", "custody", "marriage", "maintenance", "adoption", "alimony",
                "guardianship", "matrimonial",
            ],
        ),
        category(
            "Financial",
            &[
                "fraud", "embezzlement", "money laundering", "banking", "insolvency",
                "securities", "debt recovery", "cheque dishonour",
            ],
        ),
        category(
            "Drug",
            &[
                "narcotic", "drug", "trafficking", "psychotropic", "contraband", "possession of",
                "cannabis", "seizure of substance",
            ],
        ),
        category(
            "Environmental",
            &[
                "pollution", "environment", "forest", "wildlife", "emission", "hazardous waste",
                "ecological", "effluent",
            ],
        ),
        category(
            "Asset",
            &[
                "property", "asset", "confiscation", "benami", "attachment",
                "disproportionate assets", "partition", "title deed",
            ],
        ),
        category(
            "Contempt of Court",
            &[
                "contempt", "disobedience", "scandalising", "wilful default",
                "undermining the authority",
            ],
        ),
        category(
            "Sexual Cases",
            &[
                "sexual", "rape", "harassment", "molestation", "outraging the modesty",
                "consent", "stalking",
            ],
        ),
        category(
            "Sports",
            &[
                "doping", "match fixing", "athlete", "tournament", "sports federation",
                "anti-doping",
            ],
        ),
        category(
            "Tax",
            &[
                "income tax", "tax evasion", "gst", "assessment year", "customs", "excise",
                "duty", "taxable",
            ],
        ),
        category(
            "Terrorism",
            &[
                "terrorism", "terrorist", "militant", "unlawful activities", "explosives",
                "conspiracy against the state", "sedition",
            ],
        ),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                enable_cors: true,
                max_payload_size_mb: 25,
            },
            classifier: ClassifierConfig {
                categories: default_categories(),
                confidence_saturation: 5,
                reject_min_confidence: 0.2,
                reject_min_matches: 2,
            },
            ranker: RankerConfig {
                min_token_len: 2,
                fulltext_prefix_chars: 1000,
                same_type_cap: 100,
                sparse_pool_threshold: 20,
                cross_type_cap: 50,
                exact_match_threshold: 70.0,
                strong_match_threshold: 50.0,
                default_limit: 10,
            },
            storage: StorageConfig {
                db_path: PathBuf::from("./data/case_matcher.db"),
                enable_compression: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}
