//! Error taxonomy for the matching and ledger core.

use crate::storage::PersistenceError;

/// Errors surfaced by the recommendation and supply services.
///
/// `NotFound` and `Validation` describe bad input and are never retried.
/// `ModelUnavailable` lets the supply path fall back to manual input.
/// `Persistence` aborts offer creation with nothing left visible.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}

impl MarketError {
    /// Stable machine-readable code used in API error envelopes.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
