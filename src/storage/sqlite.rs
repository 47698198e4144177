//! Durable store backed by SQLite.
//!
//! Measurement values are written as their canonical text form and decoded
//! against the metric's declared type on read.

use async_trait::async_trait;

use crate::entity::{
    Event, Measurement, Metric, MetricRow, Service, TimeRange, Timestamp, TypedValue,
};
use crate::storage::db::SqlitePool;
use crate::storage::schema::init_schema;
use crate::storage::{EventStore, MetricStore, Missing, ServiceStore, StorageError, StorageResult};
use crate::validation::Validate;

/// Repository over a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Wrap an existing pool. The schema must already exist.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect with default pool settings and create the schema.
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let pool = SqlitePool::connect(url).await?;
        Self::open(pool).await
    }

    /// Create the schema on `pool` and wrap it.
    pub async fn open(pool: SqlitePool) -> StorageResult<Self> {
        init_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ServiceStore for SqliteStore {
    async fn create_service(&self, service: &mut Service) -> StorageResult<()> {
        service.validate()?;

        let result = sqlx::query("INSERT INTO services (slug, details) VALUES (?, ?)")
            .bind(&service.slug)
            .bind(&service.details)
            .execute(self.pool.inner())
            .await?;

        service.service_id = result.last_insert_rowid();
        tracing::debug!(service_id = service.service_id, slug = %service.slug, "Service created");
        Ok(())
    }

    async fn find_service(&self, service_id: i64) -> StorageResult<Service> {
        let row: Option<(i64, String, String)> =
            sqlx::query_as("SELECT service_id, slug, details FROM services WHERE service_id = ?")
                .bind(service_id)
                .fetch_optional(self.pool.inner())
                .await?;

        let (service_id, slug, details) =
            row.ok_or(StorageError::NotFound(Missing::Service(service_id)))?;
        Ok(Service {
            service_id,
            slug,
            details,
        })
    }
}

#[async_trait]
impl MetricStore for SqliteStore {
    async fn create_metric(&self, metric: &mut Metric) -> StorageResult<()> {
        metric.validate()?;

        let result =
            sqlx::query("INSERT INTO metrics (slug, metric_type, details) VALUES (?, ?, ?)")
                .bind(&metric.slug)
                .bind(&metric.metric_type)
                .bind(&metric.details)
                .execute(self.pool.inner())
                .await?;

        metric.metric_id = result.last_insert_rowid();
        tracing::debug!(
            metric_id = metric.metric_id,
            slug = %metric.slug,
            metric_type = %metric.metric_type,
            "Metric created"
        );
        Ok(())
    }

    async fn find_metric(&self, metric_id: i64) -> StorageResult<Metric> {
        let row: Option<(i64, String, String, String)> = sqlx::query_as(
            "SELECT metric_id, slug, metric_type, details FROM metrics WHERE metric_id = ?",
        )
        .bind(metric_id)
        .fetch_optional(self.pool.inner())
        .await?;

        let (metric_id, slug, metric_type, details) =
            row.ok_or(StorageError::NotFound(Missing::Metric(metric_id)))?;
        Ok(Metric {
            metric_id,
            slug,
            metric_type,
            details,
        })
    }
}

#[async_trait]
impl EventStore for SqliteStore {
    async fn create_event(&self, event: &mut Event) -> StorageResult<()> {
        event.time_stamp = event.time_stamp.normalized();
        let result = sqlx::query("INSERT INTO events (time_stamp, service_id) VALUES (?, ?)")
            .bind(event.time_stamp.as_micros())
            .bind(event.service_id)
            .execute(self.pool.inner())
            .await
            .map_err(|e| StorageError::from_sqlx_ref(e, Missing::Service(event.service_id)))?;

        event.event_id = result.last_insert_rowid();
        tracing::debug!(
            event_id = event.event_id,
            service_id = event.service_id,
            time_stamp = %event.time_stamp,
            "Event created"
        );
        Ok(())
    }

    async fn attach_measurements(
        &self,
        event_id: i64,
        measurements: &[Measurement],
    ) -> StorageResult<()> {
        let mut tx = self.pool.inner().begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT event_id FROM events WHERE event_id = ?")
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StorageError::NotFound(Missing::Event(event_id)));
        }

        for m in measurements {
            sqlx::query(
                "INSERT INTO events_with_metrics (event_id, metric_id, metric_value)
                 VALUES (?, ?, ?)
                 ON CONFLICT (event_id, metric_id) DO UPDATE SET
                     metric_value = excluded.metric_value",
            )
            .bind(event_id)
            .bind(m.metric_id)
            .bind(m.metric_value.encode())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::from_sqlx_ref(e, Missing::Metric(m.metric_id)))?;
        }

        tx.commit().await?;
        tracing::debug!(event_id, count = measurements.len(), "Measurements attached");
        Ok(())
    }

    async fn query_range(
        &self,
        service_id: i64,
        range: TimeRange,
        metric: &Metric,
    ) -> StorageResult<Vec<MetricRow>> {
        let kind = metric.kind()?;
        let range = range.normalized();

        let rows: Vec<(i64, String)> = sqlx::query_as(
            "SELECT e.time_stamp, ewm.metric_value
             FROM events e
             JOIN events_with_metrics ewm ON ewm.event_id = e.event_id
             WHERE e.service_id = ?
               AND ewm.metric_id = ?
               AND e.time_stamp >= ?
               AND e.time_stamp < ?
             ORDER BY e.event_id",
        )
        .bind(service_id)
        .bind(metric.metric_id)
        .bind(range.start.as_micros())
        .bind(range.end.as_micros())
        .fetch_all(self.pool.inner())
        .await?;

        let values = rows
            .into_iter()
            .map(|(micros, text)| {
                let time_stamp = Timestamp::from_micros(micros).ok_or_else(|| {
                    StorageError::InvalidData(format!("event timestamp out of range: {micros}"))
                })?;
                let value = TypedValue::decode(kind, &text)?;
                Ok(MetricRow { time_stamp, value })
            })
            .collect::<StorageResult<Vec<_>>>()?;

        if values.is_empty() {
            tracing::debug!(service_id, metric_id = metric.metric_id, "No metric values in range");
            return Err(StorageError::NotFound(Missing::Rows));
        }

        Ok(values)
    }
}
