//! Partial relocation of stock between locations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use millops_core::{DomainError, DomainResult, StockRecordId};

use crate::stock::{Location, NewStockRecord, StockRecord};

/// Where the moved quantity lands when the source is split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveTarget {
    /// Add to a compatible record already at the target location.
    Merge {
        record_id: StockRecordId,
        quantity_after: Decimal,
    },
    /// No compatible record exists; create one.
    Create(NewStockRecord),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MovePlan {
    /// The whole source moves; its location is updated in place.
    Full { location: Location },
    Split {
        source_remaining: Decimal,
        target: MoveTarget,
    },
}

impl MovePlan {
    pub fn is_full(&self) -> bool {
        matches!(self, MovePlan::Full { .. })
    }
}

pub fn validate_move_quantity(quantity: Decimal) -> DomainResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "move quantity must be positive, got {quantity}"
        )));
    }
    Ok(())
}

/// Decide how `quantity` of `source` reaches `target`.
///
/// `candidates` are records at the target location that may absorb the moved
/// quantity; the first compatible one (lowest id) wins. `source` must be the
/// just-locked current state.
pub fn plan_move(
    source: &StockRecord,
    target: Location,
    quantity: Decimal,
    candidates: &[StockRecord],
) -> DomainResult<MovePlan> {
    validate_move_quantity(quantity)?;

    if target == source.location {
        return Err(DomainError::validation(
            "target location equals the source location",
        ));
    }
    if quantity > source.quantity {
        return Err(DomainError::insufficient_stock(
            source.id,
            quantity,
            source.quantity,
        ));
    }
    if quantity == source.quantity {
        return Ok(MovePlan::Full { location: target });
    }

    let merge_into = candidates
        .iter()
        .filter(|c| c.id != source.id && c.location == target && c.is_compatible_with(source))
        .min_by_key(|c| c.id);

    let target = match merge_into {
        Some(existing) => MoveTarget::Merge {
            record_id: existing.id,
            quantity_after: existing.quantity.checked_add(quantity).ok_or_else(|| {
                DomainError::invariant(format!(
                    "stock record {} overflows: {} + {quantity}",
                    existing.id, existing.quantity
                ))
            })?,
        },
        None => MoveTarget::Create(NewStockRecord::split_from(source, target, quantity)),
    };

    Ok(MovePlan::Split {
        source_remaining: source.quantity - quantity,
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::Attribute;
    use millops_core::{ItemKindId, ShelfId, WarehouseId};
    use proptest::prelude::*;

    fn location() -> Location {
        Location::new(WarehouseId::new(), ShelfId::new())
    }

    fn record(kind: ItemKindId, quantity: i64, at: Location) -> StockRecord {
        StockRecord {
            id: StockRecordId::new(),
            item_kind: kind,
            name: "Доска".into(),
            attributes: vec![Attribute::new("Размер", "50x100x3000")],
            quantity: Decimal::from(quantity),
            location: at,
        }
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let source = record(ItemKindId::new(), 5, location());
        for q in [Decimal::ZERO, Decimal::from(-1)] {
            assert!(matches!(
                plan_move(&source, location(), q, &[]),
                Err(DomainError::Validation(_))
            ));
        }
    }

    #[test]
    fn rejects_more_than_available() {
        let source = record(ItemKindId::new(), 5, location());
        let err = plan_move(&source, location(), Decimal::from(6), &[]).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock { .. }));
    }

    #[test]
    fn rejects_moving_in_place() {
        let source = record(ItemKindId::new(), 5, location());
        assert!(matches!(
            plan_move(&source, source.location, Decimal::ONE, &[]),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn entire_quantity_is_a_full_move() {
        let source = record(ItemKindId::new(), 5, location());
        let target = location();
        let plan = plan_move(&source, target, Decimal::from(5), &[]).unwrap();
        assert_eq!(plan, MovePlan::Full { location: target });
        assert!(plan.is_full());
    }

    #[test]
    fn merges_into_compatible_record() {
        let kind = ItemKindId::new();
        let source = record(kind, 10, location());
        let target = location();
        let other_kind = record(ItemKindId::new(), 1, target);
        let compatible = record(kind, 7, target);

        let plan = plan_move(&source, target, Decimal::from(4), &[other_kind, compatible.clone()]).unwrap();
        assert_eq!(
            plan,
            MovePlan::Split {
                source_remaining: Decimal::from(6),
                target: MoveTarget::Merge {
                    record_id: compatible.id,
                    quantity_after: Decimal::from(11),
                },
            }
        );
    }

    #[test]
    fn merge_past_decimal_range_is_rejected() {
        let kind = ItemKindId::new();
        let source = record(kind, 10, location());
        let target = location();
        let mut full = record(kind, 0, target);
        full.quantity = Decimal::MAX;

        assert!(matches!(
            plan_move(&source, target, Decimal::from(4), &[full]),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn creates_a_copy_when_nothing_matches() {
        let kind = ItemKindId::new();
        let source = record(kind, 10, location());
        let target = location();
        let mut different = record(kind, 3, target);
        different.attributes.push(Attribute::new("сорт", "2"));

        let plan = plan_move(&source, target, Decimal::from(4), &[different]).unwrap();
        let MovePlan::Split {
            target: MoveTarget::Create(created),
            source_remaining,
        } = plan
        else {
            panic!("expected a new record, got {plan:?}");
        };
        assert_eq!(source_remaining, Decimal::from(6));
        assert_eq!(created.quantity, Decimal::from(4));
        assert_eq!(created.location, target);
        assert_eq!(created.attributes, source.attributes);
        assert_eq!(created.item_kind, kind);
    }

    proptest! {
        #[test]
        fn split_conserves_quantity(total in 2i64..10_000, moved in 1i64..10_000, existing in 0i64..1_000, merge in any::<bool>()) {
            prop_assume!(moved < total);
            let kind = ItemKindId::new();
            let source = record(kind, total, location());
            let target = location();
            let candidates = if merge { vec![record(kind, existing, target)] } else { vec![] };

            let plan = plan_move(&source, target, Decimal::from(moved), &candidates).unwrap();
            let MovePlan::Split { source_remaining, target } = plan else {
                return Err(TestCaseError::fail("expected a split"));
            };
            let received = match target {
                MoveTarget::Merge { quantity_after, .. } => quantity_after - Decimal::from(existing),
                MoveTarget::Create(created) => created.quantity,
            };
            prop_assert_eq!(received, Decimal::from(moved));
            prop_assert_eq!(source_remaining + received, Decimal::from(total));
        }
    }
}
