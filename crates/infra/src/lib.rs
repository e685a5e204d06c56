//! Infrastructure layer: transactional stores, engine services, config.

pub mod config;
pub mod error;
pub mod services;
pub mod store;


pub use config::{ConfigError, EngineConfig};
pub use error::EngineError;
pub use services::{InventoryDeltaEngine, MoveOutcome, PartialMoveEngine, StepResultOutcome};
pub use store::{InMemoryInventoryStore, InventoryStore, InventoryTx, PostgresInventoryStore, StoreError};
