//! Step-result submission with transactional stock adjustment.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{Span, debug, field, info, instrument, warn};

use millops_auth::{Actor, Permission, RolePolicy};
use millops_core::{StepAssignmentId, StockRecordId};
use millops_inventory::{
    InventoryChange, InventoryMode, StepClassifier, StepDefinition, StepDelta, StepResult,
    TaskStepAssignment, validate_reported_quantity,
};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::{InventoryStore, InventoryTx};

/// What one submission stored and which stock records it moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResultOutcome {
    pub result: StepResult,
    pub mode: InventoryMode,
    pub changes: Vec<InventoryChange>,
}

/// Records step results and applies the resulting stock delta atomically.
///
/// Only the difference between the new report and the stored one moves
/// stock, so resubmitting the same quantity is a no-op on inventory.
pub struct InventoryDeltaEngine<S> {
    store: S,
    classifier: StepClassifier,
    policy: RolePolicy,
}

impl<S> InventoryDeltaEngine<S>
where
    S: InventoryStore,
{
    pub fn new(store: S, classifier: StepClassifier, policy: RolePolicy) -> Self {
        Self {
            store,
            classifier,
            policy,
        }
    }

    pub fn from_config(store: S, config: &EngineConfig) -> Self {
        Self::new(store, config.classifier(), config.role_policy())
    }

    /// Record `reported` for the assignment and move stock by the delta.
    ///
    /// Actors without `inventory.adjust` still get their result recorded;
    /// stock is left untouched for them.
    #[instrument(
        skip(self, actor, reported, notes),
        fields(
            assignment_id = %assignment_id,
            user_id = %actor.user_id,
            role = %actor.role,
            mode = field::Empty,
            delta = field::Empty
        ),
        err
    )]
    pub async fn apply_step_result(
        &self,
        actor: &Actor,
        assignment_id: StepAssignmentId,
        reported: Option<Decimal>,
        notes: Option<String>,
    ) -> Result<StepResultOutcome, EngineError> {
        let reported = validate_reported_quantity(reported)?;

        let mut tx = self.store.begin().await?;
        let assignment = lock_assignment(&mut tx, assignment_id).await?;
        self.record(tx, actor, assignment, reported, notes).await
    }

    /// Warehouse shortcut: report the planned quantity of an ISSUE step.
    #[instrument(
        skip(self, actor, notes),
        fields(
            assignment_id = %assignment_id,
            user_id = %actor.user_id,
            role = %actor.role,
            mode = field::Empty,
            delta = field::Empty
        ),
        err
    )]
    pub async fn issue_planned(
        &self,
        actor: &Actor,
        assignment_id: StepAssignmentId,
        notes: Option<String>,
    ) -> Result<StepResultOutcome, EngineError> {
        let mut tx = self.store.begin().await?;
        let assignment = lock_assignment(&mut tx, assignment_id).await?;
        ensure_assigned(actor, &assignment)?;
        self.policy
            .authorize(&actor.role, &Permission::INVENTORY_ADJUST)?;

        if assignment.step.inventory_mode(&self.classifier) != InventoryMode::Issue {
            return Err(EngineError::Validation(format!(
                "step '{}' is not an issue step",
                assignment.step.name
            )));
        }

        let planned = validate_reported_quantity(Some(assignment.planned_quantity))?;
        let notes = notes
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Auto-issue {}", assignment.planned_quantity));
        self.record(tx, actor, assignment, planned, Some(notes)).await
    }

    async fn record(
        &self,
        mut tx: S::Tx,
        actor: &Actor,
        assignment: TaskStepAssignment,
        reported: Option<Decimal>,
        notes: Option<String>,
    ) -> Result<StepResultOutcome, EngineError> {
        ensure_assigned(actor, &assignment)?;

        let previous = tx.load_step_result(assignment.id).await?;
        let mode = assignment.step.inventory_mode(&self.classifier);
        let delta = StepDelta::between(previous.as_ref().and_then(|r| r.quantity), reported, mode);

        let span = Span::current();
        span.record("mode", field::debug(mode));
        span.record("delta", field::display(delta.value()));

        let changes = if delta.direction().is_none() {
            debug!("no stock movement for this submission");
            Vec::new()
        } else if !self.policy.allows(&actor.role, &Permission::INVENTORY_ADJUST) {
            debug!("actor may not adjust inventory; recording result only");
            Vec::new()
        } else {
            adjust_stock(&mut tx, &assignment.step, &delta).await?
        };

        let now = Utc::now();
        let result = match &previous {
            Some(existing) => existing.revised(reported, notes, now),
            None => StepResult::first(assignment.id, reported, notes, now),
        };
        tx.upsert_step_result(&result).await?;
        tx.commit().await?;

        info!(
            result_id = %result.id,
            stock_changes = changes.len(),
            "step result recorded"
        );
        Ok(StepResultOutcome {
            result,
            mode,
            changes,
        })
    }
}

async fn lock_assignment<T>(tx: &mut T, id: StepAssignmentId) -> Result<TaskStepAssignment, EngineError>
where
    T: InventoryTx,
{
    tx.load_assignment_for_update(id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("step assignment {id}")))
}

fn ensure_assigned(actor: &Actor, assignment: &TaskStepAssignment) -> Result<(), EngineError> {
    if assignment.is_assigned(actor.user_id) {
        return Ok(());
    }
    warn!("actor is not assigned to this step");
    Err(EngineError::Unauthorized(format!(
        "user {} is not assigned to step assignment {}",
        actor.user_id, assignment.id
    )))
}

/// Lock every referenced record (ascending id), then apply the delta once per
/// bill-of-materials line against the running locked quantity.
async fn adjust_stock<T>(
    tx: &mut T,
    step: &StepDefinition,
    delta: &StepDelta,
) -> Result<Vec<InventoryChange>, EngineError>
where
    T: InventoryTx,
{
    let lines = step.stock_references();
    if lines.is_empty() {
        debug!("step has no stock-backed materials");
        return Ok(Vec::new());
    }

    let mut lock_order: Vec<StockRecordId> = lines.clone();
    lock_order.sort();
    lock_order.dedup();

    let mut current: HashMap<StockRecordId, Decimal> = HashMap::with_capacity(lock_order.len());
    for id in lock_order {
        match tx.lock_stock(id).await? {
            Some(record) => {
                current.insert(id, record.quantity);
            }
            None => debug!(stock_id = %id, "referenced stock record missing; line skipped"),
        }
    }

    let mut changes = Vec::with_capacity(lines.len());
    for id in lines {
        let Some(quantity) = current.get_mut(&id) else {
            continue;
        };
        let change = delta.apply_to(id, *quantity).inspect_err(|err| {
            warn!(stock_id = %id, error = %err, "stock adjustment rejected");
        })?;
        if let Some(change) = change {
            *quantity = change.resulting_quantity;
            tx.set_quantity(id, change.resulting_quantity).await?;
            changes.push(change);
        }
    }
    Ok(changes)
}
