//! Storage Layer
//!
//! Two interchangeable backends behind the same repository contracts:
//! - **SQLite**: durable, values persisted as text and decoded on read
//! - **Memory**: in-process tables, values coerced on read
//!
//! # Components
//!
//! - [`ServiceStore`] / [`MetricStore`] / [`EventStore`]: repository contracts
//! - [`SqliteStore`]: durable implementation over [`db::SqlitePool`]
//! - [`MemoryStore`]: in-memory implementation
//! - [`StorageBuilder`] / [`StorageHandles`]: initialization and lifecycle management

mod builder;
pub mod db;
mod error;
mod memory;
mod schema;
mod sqlite;
mod traits;

pub use builder::{StorageBuilder, StorageHandles};
pub use error::{Missing, StorageError, StorageResult};
pub use memory::MemoryStore;
pub use schema::init_schema;
pub use sqlite::SqliteStore;
pub use traits::{EventStore, MetricStore, ServiceStore};
