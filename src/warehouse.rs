//! Orchestration seam between the transport and the stores.
//!
//! Every method forwards to exactly one repository call. Validation, id
//! assignment and coercion all live in the stores.

use std::sync::Arc;

use crate::entity::{Event, Measurement, Metric, MetricRow, Service, TimeRange};
use crate::storage::{EventStore, MetricStore, ServiceStore, StorageResult};

/// Pass-through coordinator over the three repository contracts.
#[derive(Clone)]
pub struct Warehouse {
    services: Arc<dyn ServiceStore>,
    metrics: Arc<dyn MetricStore>,
    events: Arc<dyn EventStore>,
}

impl Warehouse {
    pub fn new(
        services: Arc<dyn ServiceStore>,
        metrics: Arc<dyn MetricStore>,
        events: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            services,
            metrics,
            events,
        }
    }

    /// Use one store for all three contracts.
    pub fn from_store<S>(store: S) -> Self
    where
        S: ServiceStore + MetricStore + EventStore + 'static,
    {
        let store = Arc::new(store);
        Self::new(store.clone(), store.clone(), store)
    }

    /// Validate and persist a service, returning it with its assigned id.
    pub async fn create_service(&self, mut service: Service) -> StorageResult<Service> {
        self.services.create_service(&mut service).await?;
        Ok(service)
    }

    pub async fn find_service(&self, service_id: i64) -> StorageResult<Service> {
        self.services.find_service(service_id).await
    }

    /// Validate and persist a metric, returning it with its assigned id.
    pub async fn create_metric(&self, mut metric: Metric) -> StorageResult<Metric> {
        self.metrics.create_metric(&mut metric).await?;
        Ok(metric)
    }

    pub async fn find_metric(&self, metric_id: i64) -> StorageResult<Metric> {
        self.metrics.find_metric(metric_id).await
    }

    pub async fn create_event(&self, mut event: Event) -> StorageResult<Event> {
        self.events.create_event(&mut event).await?;
        Ok(event)
    }

    pub async fn attach_measurements(
        &self,
        event_id: i64,
        measurements: &[Measurement],
    ) -> StorageResult<()> {
        self.events
            .attach_measurements(event_id, measurements)
            .await
    }

    pub async fn query_range(
        &self,
        service_id: i64,
        range: TimeRange,
        metric: &Metric,
    ) -> StorageResult<Vec<MetricRow>> {
        self.events.query_range(service_id, range, metric).await
    }
}

impl std::fmt::Debug for Warehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Warehouse").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{MetricType, Timestamp};
    use crate::storage::{MemoryStore, Missing, StorageError};
    use chrono::Duration;

    #[tokio::test]
    async fn test_forwards_to_store() {
        let store = MemoryStore::new();
        let warehouse = Warehouse::from_store(store.clone());

        let service = warehouse
            .create_service(Service::new("note book", "notes"))
            .await
            .unwrap();
        assert_eq!(service.slug, "NOTE_BOOK");

        // Writes through the warehouse are visible on the store itself.
        assert_eq!(store.find_service(service.service_id).await.unwrap(), service);
    }

    #[tokio::test]
    async fn test_separate_stores_per_contract() {
        let services = Arc::new(MemoryStore::new());
        let metrics = Arc::new(MemoryStore::new());
        let warehouse = Warehouse::new(services.clone(), metrics.clone(), services.clone());

        warehouse
            .create_metric(Metric::new("PAGES", MetricType::Int, "pages read"))
            .await
            .unwrap();

        assert!(metrics.find_metric(1).await.is_ok());
        assert!(matches!(
            services.find_metric(1).await,
            Err(StorageError::NotFound(Missing::Metric(1)))
        ));
    }

    #[tokio::test]
    async fn test_errors_pass_through_unchanged() {
        let warehouse = Warehouse::from_store(MemoryStore::new());

        let err = warehouse
            .create_event(Event::new(42))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(Missing::Service(42))));

        let now = Timestamp::now();
        let mut metric = Metric::new("PAGES", MetricType::Int, "pages read");
        metric.metric_type = "PAGE_COUNT".to_string();
        let err = warehouse
            .query_range(1, TimeRange::new(now - Duration::hours(1), now), &metric)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownMetricType(_)));
    }
}
