//! Transactional storage boundary for stock records and step results.
//!
//! Services only talk to [`InventoryStore`] / [`InventoryTx`]; the in-memory
//! store backs tests and local runs, the Postgres store backs production.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;
pub use r#trait::{InventoryStore, InventoryTx, StoreError};
