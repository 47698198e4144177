//! Repository contracts shared by every backend.
//!
//! Both [`SqliteStore`](super::SqliteStore) and
//! [`MemoryStore`](super::MemoryStore) implement all three traits with the
//! same observable behavior; `tests/store_conformance.rs` runs one suite
//! against both.

use async_trait::async_trait;

use crate::entity::{Event, Measurement, Metric, MetricRow, Service, TimeRange};
use crate::storage::StorageResult;

/// Service lookup and creation.
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Validate, assign `service_id` and persist.
    ///
    /// The slug is normalized in place even when validation fails.
    async fn create_service(&self, service: &mut Service) -> StorageResult<()>;

    /// Fetch a service, or `NotFound`.
    async fn find_service(&self, service_id: i64) -> StorageResult<Service>;
}

/// Metric lookup and creation.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Validate, assign `metric_id` and persist.
    async fn create_metric(&self, metric: &mut Metric) -> StorageResult<()>;

    /// Fetch a metric, or `NotFound`.
    async fn find_metric(&self, metric_id: i64) -> StorageResult<Metric>;
}

/// Event creation, measurement attachment and time-range retrieval.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Assign `event_id` and persist. Fails with `NotFound` for an unknown
    /// service.
    async fn create_event(&self, event: &mut Event) -> StorageResult<()>;

    /// Store every measurement for the event, replacing earlier values for the
    /// same metric. Nothing is written when the event or any metric is
    /// unknown.
    async fn attach_measurements(
        &self,
        event_id: i64,
        measurements: &[Measurement],
    ) -> StorageResult<()>;

    /// Values of `metric` for the service's events with
    /// `range.start <= time_stamp < range.end`, coerced to the metric's
    /// declared type, in event creation order.
    ///
    /// # Errors
    ///
    /// - `UnknownMetricType` when the metric's type is outside the supported set
    /// - `Coercion` when a stored value does not parse as that type
    /// - `NotFound` when no event in range carries the metric
    async fn query_range(
        &self,
        service_id: i64,
        range: TimeRange,
        metric: &Metric,
    ) -> StorageResult<Vec<MetricRow>>;
}
