use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use millops_core::{ItemKindId, ShelfId, StepAssignmentId, StockRecordId, WarehouseId};
use millops_inventory::{Location, NewStockRecord, StepResult, StockRecord, TaskStepAssignment};

/// Storage operation error.
///
/// These are **infrastructure errors** as opposed to domain errors; the one
/// exception is `Conflict`, raised when the backend rejects a write on a
/// uniqueness rule.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage conflict: {0}")]
    Conflict(String),

    /// A row the transaction already locked disappeared or failed to decode.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Transactional boundary for stock and step-result state.
///
/// Implementations must:
/// - serialize transactions touching the same rows (row locks or stronger)
/// - make every write of a transaction visible atomically on `commit`
/// - discard every write of a transaction dropped without `commit`
#[async_trait]
pub trait InventoryStore: Send + Sync {
    type Tx: InventoryTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// One open unit of work.
///
/// Lock-taking reads (`*_for_update`, `lock_*`) hold their rows until the
/// transaction ends. Callers lock the assignment first and stock records in
/// ascending id order.
#[async_trait]
pub trait InventoryTx: Send {
    async fn load_assignment_for_update(
        &mut self,
        id: StepAssignmentId,
    ) -> Result<Option<TaskStepAssignment>, StoreError>;

    async fn load_step_result(
        &mut self,
        assignment_id: StepAssignmentId,
    ) -> Result<Option<StepResult>, StoreError>;

    /// Insert or replace the single result of `result.assignment_id`.
    async fn upsert_step_result(&mut self, result: &StepResult) -> Result<(), StoreError>;

    async fn lock_stock(&mut self, id: StockRecordId) -> Result<Option<StockRecord>, StoreError>;

    /// Records of `item_kind` at `location`, locked, ascending by id.
    async fn lock_stock_at(
        &mut self,
        location: Location,
        item_kind: ItemKindId,
    ) -> Result<Vec<StockRecord>, StoreError>;

    async fn set_quantity(&mut self, id: StockRecordId, quantity: Decimal) -> Result<(), StoreError>;

    async fn set_location(&mut self, id: StockRecordId, location: Location) -> Result<(), StoreError>;

    async fn insert_stock(&mut self, record: NewStockRecord) -> Result<StockRecord, StoreError>;

    /// Warehouse owning `shelf`, if the shelf exists.
    async fn shelf_warehouse(&mut self, shelf: ShelfId) -> Result<Option<WarehouseId>, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    type Tx = S::Tx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        (**self).begin().await
    }
}
