//! Postgres-backed inventory store.
//!
//! Every lock-taking read is a `SELECT ... FOR UPDATE` inside the open
//! transaction, so two engine calls touching the same stock record serialize
//! and the second one sees the first one's committed quantity. The schema
//! lives in `migrations/0001_inventory.sql`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (deadlock detected) | `40P01` | `Conflict` |
//! | Database (serialization failure) | `40001` | `Conflict` |
//! | Database (check violation, e.g. negative quantity) | `23514` | `Backend` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Io / Tls / other | N/A | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use millops_core::{
    ItemKindId, ShelfId, StepAssignmentId, StepResultId, StockRecordId, TaskId, UserId,
    WarehouseId,
};
use millops_inventory::{
    Attribute, Location, NewStockRecord, StepDefinition, StepResult, StockRecord,
    TaskStepAssignment,
};

use super::r#trait::{InventoryStore, InventoryTx, StoreError};

/// Postgres-backed inventory store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; each engine call
/// checks out one connection for the lifetime of its transaction.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect a fresh pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    type Tx = PostgresInventoryTx;

    async fn begin(&self) -> Result<PostgresInventoryTx, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PostgresInventoryTx { tx })
    }
}

/// An open Postgres transaction; sqlx rolls it back when dropped uncommitted.
pub struct PostgresInventoryTx {
    tx: Transaction<'static, Postgres>,
}

const STOCK_COLUMNS: &str =
    "id, item_kind_id, name, attributes, quantity, warehouse_id, shelf_id";

#[async_trait]
impl InventoryTx for PostgresInventoryTx {
    #[instrument(skip_all, fields(assignment_id = %id), err)]
    async fn load_assignment_for_update(
        &mut self,
        id: StepAssignmentId,
    ) -> Result<Option<TaskStepAssignment>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, task_id, step, planned_quantity, workers
            FROM step_assignments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("load_assignment_for_update", e))?;

        row.map(|row| {
            AssignmentRow::from_row(&row)
                .map(Into::into)
                .map_err(|e| StoreError::Corrupt(format!("failed to decode assignment row: {e}")))
        })
        .transpose()
    }

    #[instrument(skip_all, fields(assignment_id = %assignment_id), err)]
    async fn load_step_result(
        &mut self,
        assignment_id: StepAssignmentId,
    ) -> Result<Option<StepResult>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, assignment_id, quantity, notes, recorded_at, updated_at
            FROM step_results
            WHERE assignment_id = $1
            "#,
        )
        .bind(assignment_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("load_step_result", e))?;

        row.map(|row| {
            StepResultRow::from_row(&row)
                .map(Into::into)
                .map_err(|e| StoreError::Corrupt(format!("failed to decode step result row: {e}")))
        })
        .transpose()
    }

    #[instrument(skip_all, fields(assignment_id = %result.assignment_id), err)]
    async fn upsert_step_result(&mut self, result: &StepResult) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO step_results (id, assignment_id, quantity, notes, recorded_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (assignment_id) DO UPDATE
            SET quantity = EXCLUDED.quantity,
                notes = EXCLUDED.notes,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(result.id.as_uuid())
        .bind(result.assignment_id.as_uuid())
        .bind(result.quantity)
        .bind(&result.notes)
        .bind(result.recorded_at)
        .bind(result.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_step_result", e))?;
        Ok(())
    }

    #[instrument(skip_all, fields(stock_id = %id), err)]
    async fn lock_stock(&mut self, id: StockRecordId) -> Result<Option<StockRecord>, StoreError> {
        let sql = format!("SELECT {STOCK_COLUMNS} FROM stock_records WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_stock", e))?;

        row.map(|row| decode_stock(&row)).transpose()
    }

    #[instrument(skip_all, fields(shelf_id = %location.shelf_id, item_kind = %item_kind), err)]
    async fn lock_stock_at(
        &mut self,
        location: Location,
        item_kind: ItemKindId,
    ) -> Result<Vec<StockRecord>, StoreError> {
        let sql = format!(
            "SELECT {STOCK_COLUMNS} FROM stock_records \
             WHERE warehouse_id = $1 AND shelf_id = $2 AND item_kind_id = $3 \
             ORDER BY id ASC FOR UPDATE"
        );
        let rows = sqlx::query(&sql)
            .bind(location.warehouse_id.as_uuid())
            .bind(location.shelf_id.as_uuid())
            .bind(item_kind.as_uuid())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_stock_at", e))?;

        rows.iter().map(decode_stock).collect()
    }

    #[instrument(skip_all, fields(stock_id = %id, quantity = %quantity), err)]
    async fn set_quantity(&mut self, id: StockRecordId, quantity: Decimal) -> Result<(), StoreError> {
        let done = sqlx::query("UPDATE stock_records SET quantity = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(quantity)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("set_quantity", e))?;
        expect_one_row(done.rows_affected(), id)
    }

    #[instrument(skip_all, fields(stock_id = %id, shelf_id = %location.shelf_id), err)]
    async fn set_location(&mut self, id: StockRecordId, location: Location) -> Result<(), StoreError> {
        let done = sqlx::query(
            "UPDATE stock_records SET warehouse_id = $2, shelf_id = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(location.warehouse_id.as_uuid())
        .bind(location.shelf_id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("set_location", e))?;
        expect_one_row(done.rows_affected(), id)
    }

    #[instrument(skip_all, fields(shelf_id = %record.location.shelf_id), err)]
    async fn insert_stock(&mut self, record: NewStockRecord) -> Result<StockRecord, StoreError> {
        let record = record.with_id(StockRecordId::new());
        sqlx::query(
            r#"
            INSERT INTO stock_records (id, item_kind_id, name, attributes, quantity, warehouse_id, shelf_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.item_kind.as_uuid())
        .bind(&record.name)
        .bind(Json(&record.attributes))
        .bind(record.quantity)
        .bind(record.location.warehouse_id.as_uuid())
        .bind(record.location.shelf_id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_stock", e))?;
        Ok(record)
    }

    #[instrument(skip_all, fields(shelf_id = %shelf), err)]
    async fn shelf_warehouse(&mut self, shelf: ShelfId) -> Result<Option<WarehouseId>, StoreError> {
        let row = sqlx::query("SELECT warehouse_id FROM shelves WHERE id = $1")
            .bind(shelf.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("shelf_warehouse", e))?;

        row.map(|row| {
            row.try_get::<Uuid, _>("warehouse_id")
                .map(WarehouseId::from_uuid)
                .map_err(|e| StoreError::Corrupt(format!("failed to decode shelf row: {e}")))
        })
        .transpose()
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

fn expect_one_row(affected: u64, id: StockRecordId) -> Result<(), StoreError> {
    if affected == 1 {
        Ok(())
    } else {
        Err(StoreError::Corrupt(format!(
            "stock record {id}: expected one row updated, got {affected}"
        )))
    }
}

fn decode_stock(row: &sqlx::postgres::PgRow) -> Result<StockRecord, StoreError> {
    StockRow::from_row(row)
        .map(Into::into)
        .map_err(|e| StoreError::Corrupt(format!("failed to decode stock row: {e}")))
}

/// Map a SQLx error to a `StoreError`, naming the failed operation.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some(code) if is_conflict_code(code) => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Codes where retrying the whole call can succeed: unique violation,
/// deadlock abort and serialization failure.
fn is_conflict_code(code: &str) -> bool {
    matches!(code, "23505" | "40P01" | "40001")
}

// SQLx row types

#[derive(Debug)]
struct StockRow {
    id: Uuid,
    item_kind_id: Uuid,
    name: String,
    attributes: Json<Vec<Attribute>>,
    quantity: Decimal,
    warehouse_id: Uuid,
    shelf_id: Uuid,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for StockRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StockRow {
            id: row.try_get("id")?,
            item_kind_id: row.try_get("item_kind_id")?,
            name: row.try_get("name")?,
            attributes: row.try_get("attributes")?,
            quantity: row.try_get("quantity")?,
            warehouse_id: row.try_get("warehouse_id")?,
            shelf_id: row.try_get("shelf_id")?,
        })
    }
}

impl From<StockRow> for StockRecord {
    fn from(row: StockRow) -> Self {
        StockRecord {
            id: StockRecordId::from_uuid(row.id),
            item_kind: ItemKindId::from_uuid(row.item_kind_id),
            name: row.name,
            attributes: row.attributes.0,
            quantity: row.quantity,
            location: Location::new(
                WarehouseId::from_uuid(row.warehouse_id),
                ShelfId::from_uuid(row.shelf_id),
            ),
        }
    }
}

#[derive(Debug)]
struct AssignmentRow {
    id: Uuid,
    task_id: Uuid,
    step: Json<StepDefinition>,
    planned_quantity: Decimal,
    workers: Vec<Uuid>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for AssignmentRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(AssignmentRow {
            id: row.try_get("id")?,
            task_id: row.try_get("task_id")?,
            step: row.try_get("step")?,
            planned_quantity: row.try_get("planned_quantity")?,
            workers: row.try_get("workers")?,
        })
    }
}

impl From<AssignmentRow> for TaskStepAssignment {
    fn from(row: AssignmentRow) -> Self {
        TaskStepAssignment {
            id: StepAssignmentId::from_uuid(row.id),
            task_id: TaskId::from_uuid(row.task_id),
            step: row.step.0,
            planned_quantity: row.planned_quantity,
            workers: row.workers.into_iter().map(UserId::from_uuid).collect(),
        }
    }
}

#[derive(Debug)]
struct StepResultRow {
    id: Uuid,
    assignment_id: Uuid,
    quantity: Option<Decimal>,
    notes: Option<String>,
    recorded_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for StepResultRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StepResultRow {
            id: row.try_get("id")?,
            assignment_id: row.try_get("assignment_id")?,
            quantity: row.try_get("quantity")?,
            notes: row.try_get("notes")?,
            recorded_at: row.try_get("recorded_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<StepResultRow> for StepResult {
    fn from(row: StepResultRow) -> Self {
        StepResult {
            id: StepResultId::from_uuid(row.id),
            assignment_id: StepAssignmentId::from_uuid(row.assignment_id),
            quantity: row.quantity,
            notes: row.notes,
            recorded_at: row.recorded_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_database_codes_are_conflicts() {
        for code in ["23505", "40P01", "40001"] {
            assert!(is_conflict_code(code), "{code}");
        }
        for code in ["23514", "23503", "08006"] {
            assert!(!is_conflict_code(code), "{code}");
        }
    }

    #[test]
    fn closed_pool_is_a_backend_fault() {
        let err = map_sqlx_error("begin_transaction", sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Backend(msg) if msg.contains("begin_transaction")));
    }
}
