//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the case matching engine, providing structured
//! error types and conversion utilities for all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from various system components
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Input validation, classification, extraction, storage, API
//!
//! ## Key Features
//! - Hierarchical error types with detailed context
//! - Automatic error conversion and chaining
//! - User-friendly error messages for API responses
//! - Structured logging integration

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, MatchError>;

/// Error types for the case matching engine
#[derive(Debug, Error)]
pub enum MatchError {
    /// A required input field is missing or empty
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// Upload validation: text does not look like a legal document
    #[error(
        "Document does not appear to be a legal document \
         (confidence {confidence:.2}, {match_count} keyword matches)"
    )]
    NotALegalDocument { confidence: f32, match_count: usize },

    /// File extraction cannot handle the given extension
    #[error("Unsupported file format: '{extension}'")]
    UnsupportedFormat { extension: String },

    /// File extraction failed for a supported format
    #[error("Failed to extract text from '{filename}': {details}")]
    ExtractionFailed { filename: String, details: String },

    /// Requested case does not exist
    #[error("Case not found: {id}")]
    CaseNotFound { id: String },

    /// The document store could not be opened or reached
    #[error("Store unavailable at '{db_path}': {reason}")]
    StoreUnavailable { db_path: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Binary serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl MatchError {
    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            MatchError::InvalidInput { .. } | MatchError::ValidationFailed { .. } => "input",
            MatchError::NotALegalDocument { .. } => "classification",
            MatchError::UnsupportedFormat { .. } | MatchError::ExtractionFailed { .. } => {
                "extraction"
            }
            MatchError::CaseNotFound { .. }
            | MatchError::StoreUnavailable { .. }
            | MatchError::Database(_)
            | MatchError::Serialization(_) => "storage",
            MatchError::Config { .. } | MatchError::Toml(_) => "configuration",
            MatchError::Json(_) | MatchError::Io(_) | MatchError::Internal { .. } => "generic",
        }
    }

    /// Whether the condition is a client-side problem rather than a system fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MatchError::InvalidInput { .. }
                | MatchError::NotALegalDocument { .. }
                | MatchError::UnsupportedFormat { .. }
                | MatchError::CaseNotFound { .. }
                | MatchError::ValidationFailed { .. }
        )
    }
}

// Helper macros for common error patterns
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::errors::MatchError::Internal {
            message: $msg.to_string(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::MatchError::Internal {
            message: format!($fmt, $($arg)*),
        }
    };
}

#[macro_export]
macro_rules! invalid_input {
    ($field:expr, $reason:expr) => {
        $crate::errors::MatchError::InvalidInput {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
}
