//! Stock adjustments driven by step-result deltas.
//!
//! A resubmitted step result only ever moves stock by the difference between
//! the newly reported quantity and the previously recorded one, which makes
//! resubmission idempotent. The decision is pure; the infra layer applies it
//! to each stock record while holding that record's lock.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use millops_core::{DomainError, DomainResult, StockRecordId};

use crate::classifier::InventoryMode;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockDirection {
    Increase,
    Decrease,
}

/// Signed difference between two reports of the same assignment.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StepDelta {
    value: Decimal,
    mode: InventoryMode,
}

impl StepDelta {
    /// Absent quantities count as 0.
    pub fn between(previous: Option<Decimal>, reported: Option<Decimal>, mode: InventoryMode) -> Self {
        let value = reported.unwrap_or(Decimal::ZERO) - previous.unwrap_or(Decimal::ZERO);
        Self { value, mode }
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn mode(&self) -> InventoryMode {
        self.mode
    }

    /// Which way stock moves, or `None` when nothing moves.
    ///
    /// ISSUE: more reported → decrease; a correction downwards gives stock back.
    /// RECEIVE: the polarity is inverted.
    pub fn direction(&self) -> Option<StockDirection> {
        if self.value.is_zero() {
            return None;
        }
        let positive = self.value.is_sign_positive();
        match self.mode {
            InventoryMode::Issue if positive => Some(StockDirection::Decrease),
            InventoryMode::Issue => Some(StockDirection::Increase),
            InventoryMode::Receive if positive => Some(StockDirection::Increase),
            InventoryMode::Receive => Some(StockDirection::Decrease),
            InventoryMode::NoEffect => None,
        }
    }

    /// Amount moved per referenced stock record.
    ///
    /// Bill-of-materials multipliers and the planned repeat count are not
    /// applied here; only the raw reported delta is deducted.
    pub fn need(&self) -> Decimal {
        self.value.abs()
    }

    /// Apply this delta to one stock record whose locked quantity is `current`.
    ///
    /// Returns `Ok(None)` when the delta moves nothing. A decrease below zero
    /// is rejected with [`DomainError::InsufficientStock`]; an increase past
    /// the representable range is an invariant violation.
    pub fn apply_to(&self, stock_id: StockRecordId, current: Decimal) -> DomainResult<Option<InventoryChange>> {
        let Some(direction) = self.direction() else {
            return Ok(None);
        };
        let need = self.need();
        let change = match direction {
            StockDirection::Increase => InventoryChange {
                stock_id,
                delta: need,
                resulting_quantity: current.checked_add(need).ok_or_else(|| {
                    DomainError::invariant(format!(
                        "stock record {stock_id} overflows: {current} + {need}"
                    ))
                })?,
            },
            StockDirection::Decrease => {
                if current < need {
                    return Err(DomainError::insufficient_stock(stock_id, need, current));
                }
                InventoryChange {
                    stock_id,
                    delta: -need,
                    resulting_quantity: current - need,
                }
            }
        };
        Ok(Some(change))
    }
}

/// One applied stock mutation: signed amount and the quantity left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryChange {
    pub stock_id: StockRecordId,
    pub delta: Decimal,
    pub resulting_quantity: Decimal,
}

/// Reject negative reports. Absent stays absent.
pub fn validate_reported_quantity(reported: Option<Decimal>) -> DomainResult<Option<Decimal>> {
    match reported {
        Some(q) if q.is_sign_negative() && !q.is_zero() => Err(DomainError::validation(format!(
            "reported quantity must not be negative, got {q}"
        ))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn issue_polarity() {
        let up = StepDelta::between(Some(d(2)), Some(d(5)), InventoryMode::Issue);
        assert_eq!(up.direction(), Some(StockDirection::Decrease));
        assert_eq!(up.need(), d(3));

        let down = StepDelta::between(Some(d(5)), Some(d(2)), InventoryMode::Issue);
        assert_eq!(down.direction(), Some(StockDirection::Increase));
        assert_eq!(down.need(), d(3));
    }

    #[test]
    fn receive_polarity_is_inverted() {
        let up = StepDelta::between(None, Some(d(4)), InventoryMode::Receive);
        assert_eq!(up.direction(), Some(StockDirection::Increase));

        let down = StepDelta::between(Some(d(4)), Some(d(1)), InventoryMode::Receive);
        assert_eq!(down.direction(), Some(StockDirection::Decrease));
    }

    #[test]
    fn no_movement_without_delta_or_mode() {
        assert_eq!(
            StepDelta::between(Some(d(3)), Some(d(3)), InventoryMode::Issue).direction(),
            None
        );
        assert_eq!(
            StepDelta::between(None, Some(d(3)), InventoryMode::NoEffect).direction(),
            None
        );
        assert_eq!(StepDelta::between(None, None, InventoryMode::Issue).direction(), None);
    }

    #[test]
    fn decrease_checks_available_stock() {
        let id = StockRecordId::new();
        let delta = StepDelta::between(None, Some(d(6)), InventoryMode::Issue);

        let err = delta.apply_to(id, d(5)).unwrap_err();
        assert_eq!(err, DomainError::insufficient_stock(id, d(6), d(5)));

        let change = delta.apply_to(id, d(6)).unwrap().unwrap();
        assert_eq!(change.delta, d(-6));
        assert_eq!(change.resulting_quantity, Decimal::ZERO);
    }

    #[test]
    fn increase_is_unconditional() {
        let id = StockRecordId::new();
        let delta = StepDelta::between(Some(d(10)), Some(d(4)), InventoryMode::Issue);
        let change = delta.apply_to(id, Decimal::ZERO).unwrap().unwrap();
        assert_eq!(change.delta, d(6));
        assert_eq!(change.resulting_quantity, d(6));
    }

    #[test]
    fn increase_past_decimal_range_is_rejected() {
        let id = StockRecordId::new();
        let delta = StepDelta::between(None, Some(Decimal::MAX), InventoryMode::Receive);
        assert!(matches!(
            delta.apply_to(id, Decimal::ONE),
            Err(DomainError::InvariantViolation(_))
        ));

        let change = delta.apply_to(id, Decimal::ZERO).unwrap().unwrap();
        assert_eq!(change.resulting_quantity, Decimal::MAX);
    }

    #[test]
    fn reported_quantity_validation() {
        assert_eq!(validate_reported_quantity(None), Ok(None));
        assert_eq!(validate_reported_quantity(Some(d(0))), Ok(Some(d(0))));
        assert!(matches!(
            validate_reported_quantity(Some(d(-1))),
            Err(DomainError::Validation(_))
        ));
    }

    proptest! {
        #[test]
        fn resubmitting_the_same_quantity_moves_nothing(q in 0i64..10_000, current in 0i64..10_000) {
            for mode in [InventoryMode::Issue, InventoryMode::Receive, InventoryMode::NoEffect] {
                let delta = StepDelta::between(Some(d(q)), Some(d(q)), mode);
                prop_assert_eq!(delta.apply_to(StockRecordId::new(), d(current)), Ok(None));
            }
        }

        #[test]
        fn issue_then_correction_restores_stock(stock in 0i64..1_000, first in 0i64..1_000) {
            prop_assume!(first <= stock);
            let id = StockRecordId::new();
            let issued = StepDelta::between(None, Some(d(first)), InventoryMode::Issue)
                .apply_to(id, d(stock))
                .unwrap()
                .map(|c| c.resulting_quantity)
                .unwrap_or(d(stock));
            let restored = StepDelta::between(Some(d(first)), Some(Decimal::ZERO), InventoryMode::Issue)
                .apply_to(id, issued)
                .unwrap()
                .map(|c| c.resulting_quantity)
                .unwrap_or(issued);
            prop_assert_eq!(restored, d(stock));
        }
    }
}
