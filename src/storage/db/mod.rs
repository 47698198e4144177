//! Database connection layer.
//!
//! - `SqlitePool`: Connection pool wrapper for SQLite
//!
//! # Example
//!
//! ```ignore
//! let pool = SqlitePool::connect("sqlite:data/tally.db?mode=rwc").await?;
//! let row = sqlx::query("SELECT 1").fetch_one(pool.inner()).await?;
//! ```

mod sqlite;

pub use sqlite::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_CONNECTIONS, SqlitePool};
