//! Storage builder and handles.
//!
//! Provides a builder pattern for constructing the storage layer
//! and a handles struct for accessing the warehouse built on top of it.

use std::path::Path;
use std::time::Duration;

use crate::storage::db::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_CONNECTIONS, SqlitePool};
use crate::storage::{MemoryStore, SqliteStore, StorageError};
use crate::warehouse::Warehouse;

#[derive(Debug, Clone)]
enum Backend {
    Sqlite(String),
    Memory,
}

/// Builder for constructing the storage layer.
#[derive(Debug, Clone)]
pub struct StorageBuilder {
    backend: Backend,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl StorageBuilder {
    /// Durable storage at the given sqlx SQLite URL, e.g.
    /// `sqlite:data/tally.db?mode=rwc`.
    pub fn sqlite(url: impl Into<String>) -> Self {
        Self::with_backend(Backend::Sqlite(url.into()))
    }

    /// Ephemeral storage that lives as long as the process.
    pub fn memory() -> Self {
        Self::with_backend(Backend::Memory)
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the maximum pool size. Ignored by the memory backend.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set how long to wait for a pooled connection.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Build the storage layer and return handles.
    pub async fn build(self) -> Result<StorageHandles, StorageError> {
        match self.backend {
            Backend::Memory => {
                tracing::info!("Using in-memory storage");
                Ok(StorageHandles {
                    warehouse: Warehouse::from_store(MemoryStore::new()),
                    pool: None,
                })
            }
            Backend::Sqlite(url) => {
                create_parent_dir(&url)?;

                let pool =
                    SqlitePool::connect_with(&url, self.max_connections, self.acquire_timeout)
                        .await?;
                let store = SqliteStore::open(pool.clone()).await?;
                tracing::info!(url = %url, "Using SQLite storage");

                Ok(StorageHandles {
                    warehouse: Warehouse::from_store(store),
                    pool: Some(pool),
                })
            }
        }
    }
}

/// Create the directory holding a file-backed database if it doesn't exist.
fn create_parent_dir(url: &str) -> Result<(), StorageError> {
    let Some(path) = file_path(url) else {
        return Ok(());
    };

    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            StorageError::Internal(format!(
                "Failed to create database directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Filesystem path of a `sqlite:` URL, or `None` for in-memory databases.
fn file_path(url: &str) -> Option<&str> {
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" || rest.contains("mode=memory") {
        return None;
    }
    Some(path)
}

/// Handles to the storage layer.
pub struct StorageHandles {
    /// Orchestration facade over the configured backend.
    pub warehouse: Warehouse,
    pool: Option<SqlitePool>,
}

impl StorageHandles {
    /// Gracefully shutdown the storage layer.
    ///
    /// Closes the connection pool, waiting for checked-out connections to be
    /// returned.
    pub async fn shutdown(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
            tracing::info!("Storage closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Service;
    use tempfile::tempdir;

    #[test]
    fn test_file_path() {
        assert_eq!(file_path("sqlite:data/tally.db?mode=rwc"), Some("data/tally.db"));
        assert_eq!(file_path("sqlite:///tmp/tally.db"), Some("/tmp/tally.db"));
        assert_eq!(file_path("sqlite::memory:"), None);
        assert_eq!(file_path("sqlite:file:x?mode=memory&cache=shared"), None);
        assert_eq!(file_path("postgres://localhost/db"), None);
    }

    #[tokio::test]
    async fn test_build_memory() {
        let handles = StorageBuilder::memory().build().await.unwrap();
        let service = handles
            .warehouse
            .create_service(Service::new("note book", "notes"))
            .await
            .unwrap();
        assert_eq!(service.service_id, 1);
        handles.shutdown().await;
    }

    #[tokio::test]
    async fn test_build_sqlite_creates_directory() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("tally.db");
        let url = format!("sqlite:{}?mode=rwc", db_path.display());

        let handles = StorageBuilder::sqlite(&url)
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .build()
            .await
            .unwrap();

        handles
            .warehouse
            .create_service(Service::new("NOTE_BOOK", "notes"))
            .await
            .unwrap();
        handles.shutdown().await;

        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_build_sqlite_reopens_existing_data() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("tally.db").display());

        let handles = StorageBuilder::sqlite(&url).build().await.unwrap();
        handles
            .warehouse
            .create_service(Service::new("NOTE_BOOK", "notes"))
            .await
            .unwrap();
        handles.shutdown().await;

        let handles = StorageBuilder::sqlite(&url).build().await.unwrap();
        let found = handles.warehouse.find_service(1).await.unwrap();
        assert_eq!(found.slug, "NOTE_BOOK");
        handles.shutdown().await;
    }
}
