use rust_decimal::Decimal;
use thiserror::Error;

use millops_core::{DomainError, StockRecordId};

use crate::store::StoreError;

/// Failure surfaced by the engine services.
///
/// Domain and store failures are flattened into one taxonomy so callers can
/// tell business-rule rejections (`Validation`, `InsufficientStock`,
/// `Unauthorized`, `NotFound`) apart from system faults (`Store`).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("insufficient stock on {stock_id}: need {needed}, have {available}")]
    InsufficientStock {
        stock_id: StockRecordId,
        needed: Decimal,
        available: Decimal,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Store(StoreError),
}

impl EngineError {
    /// Business-rule rejection as opposed to a storage fault.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, EngineError::Store(_))
    }
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::InvalidId(msg) => EngineError::Validation(msg),
            DomainError::InvariantViolation(msg) => EngineError::InvariantViolation(msg),
            DomainError::InsufficientStock {
                stock_id,
                needed,
                available,
            } => EngineError::InsufficientStock {
                stock_id,
                needed,
                available,
            },
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => EngineError::Conflict(msg),
            other => EngineError::Store(other),
        }
    }
}

impl From<millops_auth::AuthzError> for EngineError {
    fn from(value: millops_auth::AuthzError) -> Self {
        EngineError::Unauthorized(value.to_string())
    }
}
