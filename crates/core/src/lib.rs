//! `millops-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{
    BomLineId, CatalogEntryId, ItemKindId, ShelfId, StepAssignmentId, StepId, StepResultId,
    StockRecordId, TaskId, UserId, WarehouseId,
};
