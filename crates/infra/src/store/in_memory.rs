use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use millops_core::{ItemKindId, ShelfId, StepAssignmentId, StockRecordId, WarehouseId};
use millops_inventory::{Location, NewStockRecord, StepResult, StockRecord, TaskStepAssignment};

use super::r#trait::{InventoryStore, InventoryTx, StoreError};

#[derive(Debug, Clone, Default)]
struct State {
    assignments: HashMap<StepAssignmentId, TaskStepAssignment>,
    results: HashMap<StepAssignmentId, StepResult>,
    stock: BTreeMap<StockRecordId, StockRecord>,
    shelves: HashMap<ShelfId, WarehouseId>,
}

/// In-memory inventory store.
///
/// Intended for tests/dev. One transaction runs at a time; it works on a
/// private copy of the state that replaces the shared state on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_shelf(&self, shelf: ShelfId, warehouse: WarehouseId) {
        self.state.lock().await.shelves.insert(shelf, warehouse);
    }

    pub async fn put_assignment(&self, assignment: TaskStepAssignment) {
        self.state
            .lock()
            .await
            .assignments
            .insert(assignment.id, assignment);
    }

    pub async fn put_stock(&self, record: StockRecord) {
        self.state.lock().await.stock.insert(record.id, record);
    }

    pub async fn stock(&self, id: StockRecordId) -> Option<StockRecord> {
        self.state.lock().await.stock.get(&id).cloned()
    }

    /// Every record, ascending by id.
    pub async fn all_stock(&self) -> Vec<StockRecord> {
        self.state.lock().await.stock.values().cloned().collect()
    }

    pub async fn step_result(&self, assignment_id: StepAssignmentId) -> Option<StepResult> {
        self.state.lock().await.results.get(&assignment_id).cloned()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTx { guard, working })
    }
}

/// Holds the store lock for its whole lifetime; dropping it without
/// `commit` discards `working`.
pub struct InMemoryTx {
    guard: OwnedMutexGuard<State>,
    working: State,
}

impl InMemoryTx {
    fn stock_mut(&mut self, id: StockRecordId) -> Result<&mut StockRecord, StoreError> {
        self.working
            .stock
            .get_mut(&id)
            .ok_or_else(|| StoreError::Corrupt(format!("stock record {id} vanished")))
    }
}

#[async_trait]
impl InventoryTx for InMemoryTx {
    async fn load_assignment_for_update(
        &mut self,
        id: StepAssignmentId,
    ) -> Result<Option<TaskStepAssignment>, StoreError> {
        Ok(self.working.assignments.get(&id).cloned())
    }

    async fn load_step_result(
        &mut self,
        assignment_id: StepAssignmentId,
    ) -> Result<Option<StepResult>, StoreError> {
        Ok(self.working.results.get(&assignment_id).cloned())
    }

    async fn upsert_step_result(&mut self, result: &StepResult) -> Result<(), StoreError> {
        if let Some(existing) = self.working.results.get(&result.assignment_id) {
            if existing.id != result.id {
                return Err(StoreError::Conflict(format!(
                    "assignment {} already has result {}",
                    result.assignment_id, existing.id
                )));
            }
        }
        self.working
            .results
            .insert(result.assignment_id, result.clone());
        Ok(())
    }

    async fn lock_stock(&mut self, id: StockRecordId) -> Result<Option<StockRecord>, StoreError> {
        Ok(self.working.stock.get(&id).cloned())
    }

    async fn lock_stock_at(
        &mut self,
        location: Location,
        item_kind: ItemKindId,
    ) -> Result<Vec<StockRecord>, StoreError> {
        Ok(self
            .working
            .stock
            .values()
            .filter(|r| r.location == location && r.item_kind == item_kind)
            .cloned()
            .collect())
    }

    async fn set_quantity(&mut self, id: StockRecordId, quantity: Decimal) -> Result<(), StoreError> {
        if quantity.is_sign_negative() && !quantity.is_zero() {
            return Err(StoreError::Backend(format!(
                "negative quantity {quantity} for stock record {id}"
            )));
        }
        self.stock_mut(id)?.quantity = quantity;
        Ok(())
    }

    async fn set_location(&mut self, id: StockRecordId, location: Location) -> Result<(), StoreError> {
        self.stock_mut(id)?.location = location;
        Ok(())
    }

    async fn insert_stock(&mut self, record: NewStockRecord) -> Result<StockRecord, StoreError> {
        let record = record.with_id(StockRecordId::new());
        self.working.stock.insert(record.id, record.clone());
        Ok(record)
    }

    async fn shelf_warehouse(&mut self, shelf: ShelfId) -> Result<Option<WarehouseId>, StoreError> {
        Ok(self.working.shelves.get(&shelf).copied())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        *self.guard = self.working;
        Ok(())
    }
}
