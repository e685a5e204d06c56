//! Inventory-aware task execution domain.
//!
//! This crate contains the business rules behind step reports and stock
//! relocation, implemented purely as deterministic domain logic (no IO, no
//! storage): size-string parsing, step classification, bill-of-materials
//! enrichment and the decisions that the infrastructure layer applies inside
//! a transaction.

pub mod adjustment;
pub mod classifier;
pub mod dimensions;
pub mod materials;
pub mod relocation;
pub mod step;
pub mod stock;
pub mod worksheet;

pub use adjustment::{InventoryChange, StepDelta, StockDirection, validate_reported_quantity};
pub use classifier::{InventoryMode, StepClassifier, StepVocabulary, classify_step};
pub use dimensions::{DimensionSpec, Metrics, derive_metrics, metrics_for_size, parse_dimensions, round3};
pub use materials::{EnrichedMaterial, StockSummary, enrich_material};
pub use relocation::{MovePlan, MoveTarget, plan_move, validate_move_quantity};
pub use step::{BillOfMaterialLine, MaterialSource, StepDefinition, StepResult, TaskStepAssignment};
pub use stock::{Attribute, Location, NewStockRecord, StockRecord};
pub use worksheet::StepWorksheet;
