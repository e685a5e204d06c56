//! Moving part (or all) of a stock record to another location.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

use millops_core::StockRecordId;
use millops_inventory::{
    Location, MovePlan, MoveTarget, StockRecord, plan_move, validate_move_quantity,
};

use crate::error::EngineError;
use crate::store::{InventoryStore, InventoryTx};

/// Both sides of a move after commit. On a full move `source` and `target`
/// are the same record at its new location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub source: StockRecord,
    pub target: StockRecord,
    pub full_move: bool,
}

pub struct PartialMoveEngine<S> {
    store: S,
}

impl<S> PartialMoveEngine<S>
where
    S: InventoryStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(
        skip(self, target),
        fields(
            source_id = %source_id,
            warehouse_id = %target.warehouse_id,
            shelf_id = %target.shelf_id,
            quantity = %quantity
        ),
        err
    )]
    pub async fn move_partial(
        &self,
        source_id: StockRecordId,
        target: Location,
        quantity: Decimal,
    ) -> Result<MoveOutcome, EngineError> {
        validate_move_quantity(quantity)?;

        let mut tx = self.store.begin().await?;
        check_location(&mut tx, target).await?;

        let source = tx
            .lock_stock(source_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("stock record {source_id}")))?;
        let candidates = tx.lock_stock_at(target, source.item_kind).await?;

        let plan = plan_move(&source, target, quantity, &candidates).inspect_err(|err| {
            warn!(error = %err, available = %source.quantity, "move rejected");
        })?;

        let outcome = match plan {
            MovePlan::Full { location } => {
                tx.set_location(source.id, location).await?;
                let moved = StockRecord { location, ..source };
                MoveOutcome {
                    source: moved.clone(),
                    target: moved,
                    full_move: true,
                }
            }
            MovePlan::Split {
                source_remaining,
                target: landing,
            } => {
                tx.set_quantity(source.id, source_remaining).await?;
                let target = match landing {
                    MoveTarget::Merge {
                        record_id,
                        quantity_after,
                    } => {
                        tx.set_quantity(record_id, quantity_after).await?;
                        let existing = candidates
                            .into_iter()
                            .find(|c| c.id == record_id)
                            .ok_or_else(|| {
                                EngineError::InvariantViolation(format!(
                                    "merge target {record_id} is not among the locked candidates"
                                ))
                            })?;
                        StockRecord {
                            quantity: quantity_after,
                            ..existing
                        }
                    }
                    MoveTarget::Create(new_record) => tx.insert_stock(new_record).await?,
                };
                MoveOutcome {
                    source: StockRecord {
                        quantity: source_remaining,
                        ..source
                    },
                    target,
                    full_move: false,
                }
            }
        };

        tx.commit().await?;
        info!(
            target_id = %outcome.target.id,
            full_move = outcome.full_move,
            "stock moved"
        );
        Ok(outcome)
    }
}

/// The shelf must exist and belong to the named warehouse.
async fn check_location<T>(tx: &mut T, target: Location) -> Result<(), EngineError>
where
    T: InventoryTx,
{
    match tx.shelf_warehouse(target.shelf_id).await? {
        None => Err(EngineError::NotFound(format!("shelf {}", target.shelf_id))),
        Some(owner) if owner != target.warehouse_id => Err(EngineError::Validation(format!(
            "location mismatch: shelf {} belongs to warehouse {owner}, not {}",
            target.shelf_id, target.warehouse_id
        ))),
        Some(_) => Ok(()),
    }
}
