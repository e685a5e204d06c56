use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use millops_core::{StepAssignmentId, StockRecordId, TaskId};

use crate::classifier::{InventoryMode, StepClassifier};
use crate::materials::{EnrichedMaterial, enrich_material};
use crate::step::TaskStepAssignment;
use crate::stock::StockRecord;

/// Printable content for one step of a task: header fields plus every
/// material line with resolved names and size metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepWorksheet {
    pub assignment_id: StepAssignmentId,
    pub task_id: TaskId,
    pub order: i32,
    pub step_name: String,
    pub operation: Option<String>,
    pub planned_quantity: Decimal,
    pub inventory_mode: InventoryMode,
    pub materials: Vec<EnrichedMaterial>,
}

impl StepWorksheet {
    pub fn build(
        assignment: &TaskStepAssignment,
        classifier: &StepClassifier,
        stock: &HashMap<StockRecordId, StockRecord>,
    ) -> Self {
        let step = &assignment.step;
        let materials = step
            .materials
            .iter()
            .map(|line| {
                let record = line.stock_id().and_then(|id| stock.get(&id));
                enrich_material(line, record, assignment.planned_quantity)
            })
            .collect();

        Self {
            assignment_id: assignment.id,
            task_id: assignment.task_id,
            order: step.order,
            step_name: step.name.clone(),
            operation: step.operation.clone(),
            planned_quantity: assignment.planned_quantity,
            inventory_mode: step.inventory_mode(classifier),
            materials,
        }
    }
}
