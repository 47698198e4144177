//! In-memory store for tests and ephemeral runs.
//!
//! Identifiers are assigned as `len + 1` of the owning table, so they start at
//! 1 and grow by one per insert, matching the durable backend.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::entity::{Event, Measurement, Metric, MetricRow, Service, TimeRange, TypedValue};
use crate::storage::{EventStore, MetricStore, Missing, ServiceStore, StorageError, StorageResult};
use crate::validation::Validate;

#[derive(Debug, Default)]
struct Tables {
    services: Vec<Service>,
    metrics: Vec<Metric>,
    events: Vec<Event>,
    measurements: HashMap<(i64, i64), TypedValue>,
}

impl Tables {
    fn service(&self, service_id: i64) -> Option<&Service> {
        self.services.get(slot(service_id)?)
    }

    fn metric(&self, metric_id: i64) -> Option<&Metric> {
        self.metrics.get(slot(metric_id)?)
    }

    fn event(&self, event_id: i64) -> Option<&Event> {
        self.events.get(slot(event_id)?)
    }
}

/// Index of the row holding `id`; ids are `index + 1`.
fn slot(id: i64) -> Option<usize> {
    usize::try_from(id).ok()?.checked_sub(1)
}

/// Store keeping every table in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(poisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(poisoned)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::Internal("memory store lock poisoned".to_string())
}

#[async_trait]
impl ServiceStore for MemoryStore {
    async fn create_service(&self, service: &mut Service) -> StorageResult<()> {
        service.validate()?;

        let mut tables = self.write()?;
        service.service_id = tables.services.len() as i64 + 1;
        tables.services.push(service.clone());
        tracing::debug!(service_id = service.service_id, slug = %service.slug, "Service created");
        Ok(())
    }

    async fn find_service(&self, service_id: i64) -> StorageResult<Service> {
        self.read()?
            .service(service_id)
            .cloned()
            .ok_or(StorageError::NotFound(Missing::Service(service_id)))
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    async fn create_metric(&self, metric: &mut Metric) -> StorageResult<()> {
        metric.validate()?;

        let mut tables = self.write()?;
        metric.metric_id = tables.metrics.len() as i64 + 1;
        tables.metrics.push(metric.clone());
        tracing::debug!(metric_id = metric.metric_id, slug = %metric.slug, "Metric created");
        Ok(())
    }

    async fn find_metric(&self, metric_id: i64) -> StorageResult<Metric> {
        self.read()?
            .metric(metric_id)
            .cloned()
            .ok_or(StorageError::NotFound(Missing::Metric(metric_id)))
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_event(&self, event: &mut Event) -> StorageResult<()> {
        let mut tables = self.write()?;
        if tables.service(event.service_id).is_none() {
            return Err(StorageError::NotFound(Missing::Service(event.service_id)));
        }

        event.time_stamp = event.time_stamp.normalized();
        event.event_id = tables.events.len() as i64 + 1;
        tables.events.push(event.clone());
        tracing::debug!(
            event_id = event.event_id,
            service_id = event.service_id,
            "Event created"
        );
        Ok(())
    }

    async fn attach_measurements(
        &self,
        event_id: i64,
        measurements: &[Measurement],
    ) -> StorageResult<()> {
        let mut tables = self.write()?;
        if tables.event(event_id).is_none() {
            return Err(StorageError::NotFound(Missing::Event(event_id)));
        }
        if let Some(m) = measurements.iter().find(|m| tables.metric(m.metric_id).is_none()) {
            return Err(StorageError::NotFound(Missing::Metric(m.metric_id)));
        }

        for m in measurements {
            tables
                .measurements
                .insert((event_id, m.metric_id), m.metric_value.clone());
        }
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
        let tables = self.read()?;

        let mut rows = Vec::new();
        for event in tables
            .events
            .iter()
            .filter(|e| e.service_id == service_id && range.contains(&e.time_stamp))
        {
            if let Some(value) = tables.measurements.get(&(event.event_id, metric.metric_id)) {
                rows.push(MetricRow {
                    time_stamp: event.time_stamp,
                    value: value.coerce_to(kind)?,
                });
            }
        }

        if rows.is_empty() {
            return Err(StorageError::NotFound(Missing::Rows));
        }
        Ok(rows)
    }
}
