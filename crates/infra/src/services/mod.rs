//! Engine services: the only code paths that mutate stock records.

pub mod partial_move;
pub mod step_results;

pub use partial_move::{MoveOutcome, PartialMoveEngine};
pub use step_results::{InventoryDeltaEngine, StepResultOutcome};
