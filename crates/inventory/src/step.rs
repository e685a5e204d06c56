//! Workflow step definitions, their task-level instances and recorded results.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use millops_core::{
    BomLineId, CatalogEntryId, StepAssignmentId, StepId, StepResultId, StockRecordId, TaskId,
    UserId,
};

use crate::classifier::{InventoryMode, StepClassifier};

/// What a bill-of-materials line refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialSource {
    /// A concrete stock record; the only kind that inventory adjustments touch.
    Stock { stock_id: StockRecordId },
    /// An abstract catalog entry (no stock attached).
    Catalog { id: CatalogEntryId, name: String },
    Unspecified,
}

/// One ingredient/tool reference inside a workflow step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillOfMaterialLine {
    pub id: BomLineId,
    pub source: MaterialSource,
    /// Quantity per repeat of the step; absent means 1.
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
}

impl BillOfMaterialLine {
    pub fn stock(stock_id: StockRecordId) -> Self {
        Self {
            id: BomLineId::new(),
            source: MaterialSource::Stock { stock_id },
            quantity: None,
            unit: None,
        }
    }

    pub fn catalog(id: CatalogEntryId, name: impl Into<String>) -> Self {
        Self {
            id: BomLineId::new(),
            source: MaterialSource::Catalog {
                id,
                name: name.into(),
            },
            quantity: None,
            unit: None,
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal, unit: Option<&str>) -> Self {
        self.quantity = Some(quantity);
        self.unit = unit.map(str::to_string);
        self
    }

    pub fn quantity_per_repeat(&self) -> Decimal {
        self.quantity.unwrap_or(Decimal::ONE)
    }

    pub fn stock_id(&self) -> Option<StockRecordId> {
        match self.source {
            MaterialSource::Stock { stock_id } => Some(stock_id),
            _ => None,
        }
    }
}

/// A workflow step as defined on a tech card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: StepId,
    pub order: i32,
    pub name: String,
    /// Name of the linked operation, if any.
    pub operation: Option<String>,
    pub materials: Vec<BillOfMaterialLine>,
}

impl StepDefinition {
    pub fn inventory_mode(&self, classifier: &StepClassifier) -> InventoryMode {
        classifier.classify(&self.name, self.operation.as_deref())
    }

    /// Stock record referenced by each stock-backed line, in line order.
    pub fn stock_references(&self) -> Vec<StockRecordId> {
        self.materials
            .iter()
            .filter_map(BillOfMaterialLine::stock_id)
            .collect()
    }
}

/// The step instance within a concrete task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStepAssignment {
    pub id: StepAssignmentId,
    pub task_id: TaskId,
    pub step: StepDefinition,
    /// Planned repeat count.
    pub planned_quantity: Decimal,
    /// Workers allowed to report on this step.
    pub workers: Vec<UserId>,
}

impl TaskStepAssignment {
    pub fn is_assigned(&self, user_id: UserId) -> bool {
        self.workers.contains(&user_id)
    }
}

/// The single recorded report for one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub id: StepResultId,
    pub assignment_id: StepAssignmentId,
    pub quantity: Option<Decimal>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StepResult {
    pub fn first(
        assignment_id: StepAssignmentId,
        quantity: Option<Decimal>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StepResultId::new(),
            assignment_id,
            quantity,
            notes,
            recorded_at: now,
            updated_at: now,
        }
    }

    /// Resubmission: the quantity is replaced, notes only when provided.
    pub fn revised(&self, quantity: Option<Decimal>, notes: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            quantity,
            notes: notes.or_else(|| self.notes.clone()),
            updated_at: now,
            ..self.clone()
        }
    }

    /// Quantity the next delta is computed against (absent counts as 0).
    pub fn effective_quantity(&self) -> Decimal {
        self.quantity.unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_keeps_identity_and_previous_notes() {
        let t0 = Utc::now();
        let first = StepResult::first(
            StepAssignmentId::new(),
            Some(Decimal::from(3)),
            Some("ok".into()),
            t0,
        );

        let revised = first.revised(Some(Decimal::from(5)), None, t0 + chrono::Duration::seconds(5));
        assert_eq!(revised.id, first.id);
        assert_eq!(revised.recorded_at, t0);
        assert_eq!(revised.quantity, Some(Decimal::from(5)));
        assert_eq!(revised.notes.as_deref(), Some("ok"));

        let renoted = revised.revised(None, Some("fixed".into()), t0);
        assert_eq!(renoted.notes.as_deref(), Some("fixed"));
        assert_eq!(renoted.effective_quantity(), Decimal::ZERO);
    }

    #[test]
    fn only_stock_lines_are_referenced() {
        let stock_id = StockRecordId::new();
        let step = StepDefinition {
            id: StepId::new(),
            order: 1,
            name: "Выдать со склада".into(),
            operation: None,
            materials: vec![
                BillOfMaterialLine::catalog(CatalogEntryId::new(), "Клей"),
                BillOfMaterialLine::stock(stock_id),
            ],
        };
        assert_eq!(step.stock_references(), vec![stock_id]);
        assert_eq!(step.inventory_mode(&StepClassifier::default()), InventoryMode::Issue);
    }
}
