//! Database schema definitions.

use crate::storage::StorageError;
use crate::storage::db::SqlitePool;

/// SQL statement for creating the services table.
pub const SERVICES_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS services (
    service_id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug       TEXT NOT NULL,
    details    TEXT NOT NULL
);
"#;

/// SQL statement for creating the metrics table.
///
/// `metric_type` is plain text so out-of-band rows can carry any name.
pub const METRICS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS metrics (
    metric_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    slug        TEXT NOT NULL,
    metric_type TEXT NOT NULL,
    details     TEXT NOT NULL
);
"#;

/// SQL statement for creating the events table.
///
/// `time_stamp` holds UTC microseconds since the Unix epoch.
pub const EVENTS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    event_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    time_stamp INTEGER NOT NULL,
    service_id INTEGER NOT NULL REFERENCES services (service_id)
);
"#;

/// Index backing range queries.
pub const EVENTS_INDEX_DDL: &str = r#"
CREATE INDEX IF NOT EXISTS events_service_time_idx ON events (service_id, time_stamp);
"#;

/// SQL statement for creating the event/metric association table.
///
/// Values are stored as text regardless of the metric's declared type.
pub const EVENTS_WITH_METRICS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS events_with_metrics (
    event_id     INTEGER NOT NULL REFERENCES events (event_id),
    metric_id    INTEGER NOT NULL REFERENCES metrics (metric_id),
    metric_value TEXT NOT NULL,
    PRIMARY KEY (event_id, metric_id)
);
"#;

/// Initialize the database schema.
///
/// Creates all necessary tables and indexes if they don't exist.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    for ddl in [
        SERVICES_TABLE_DDL,
        METRICS_TABLE_DDL,
        EVENTS_TABLE_DDL,
        EVENTS_INDEX_DDL,
        EVENTS_WITH_METRICS_TABLE_DDL,
    ] {
        sqlx::query(ddl).execute(pool.inner()).await?;
    }

    tracing::info!("Database schema initialized");
    Ok(())
}
