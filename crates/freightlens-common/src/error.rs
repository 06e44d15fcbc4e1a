//! Error types for the Freightlens engine
//!
//! Provides a unified error type and domain-specific error variants

use thiserror::Error;

/// Result type alias using FreightlensError
pub type Result<T> = std::result::Result<T, FreightlensError>;

/// Unified error type for Freightlens operations
#[derive(Debug, Error)]
pub enum FreightlensError {
    // Rating errors
    #[error("Rating error: {0}")]
    Rating(#[from] RatingError),

    // Storage errors (shipment/tariff stores supplied by the caller)
    #[error("Storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Rating and rerate pipeline errors
#[derive(Debug, Error)]
pub enum RatingError {
    #[error("no tariffs available for re-rating")]
    NoTariffsAvailable,

    #[error("tariff cache build failed: {0}")]
    CacheBuild(String),

    #[error("audit run not found: {0}")]
    AuditRunNotFound(uuid::Uuid),
}

// Implement From for common external error types
impl From<serde_json::Error> for FreightlensError {
    fn from(err: serde_json::Error) -> Self {
        FreightlensError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for FreightlensError {
    fn from(err: std::io::Error) -> Self {
        FreightlensError::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for FreightlensError {
    fn from(err: anyhow::Error) -> Self {
        FreightlensError::Internal(err.to_string())
    }
}
