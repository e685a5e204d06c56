//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::StockRecordId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, stock shortfalls). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A decrease would drive a stock record below zero.
    #[error("insufficient stock on {stock_id}: need {needed}, have {available}")]
    InsufficientStock {
        stock_id: StockRecordId,
        needed: Decimal,
        available: Decimal,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn insufficient_stock(stock_id: StockRecordId, needed: Decimal, available: Decimal) -> Self {
        Self::InsufficientStock {
            stock_id,
            needed,
            available,
        }
    }
}
