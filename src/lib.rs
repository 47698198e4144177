//! Tally - Typed Event-Metric Warehouse
//!
//! Services raise timestamped events; each event carries measurements for
//! registered metrics. Every metric declares its value type up front, values
//! are stored type-erased as text, and reads coerce them back to the declared
//! type.
//!
//! # Architecture
//!
//! - **Entity**: services, metrics, events and typed values
//! - **Validation**: slug normalization and field rules
//! - **Storage**: repository contracts with SQLite and in-memory backends
//! - **Warehouse**: the single seam the transport talks to
//! - **Server**: JSON HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use tally::{Event, Measurement, Metric, MetricType, Service, StorageBuilder};
//!
//! # async fn run() -> Result<(), tally::StorageError> {
//! let handles = StorageBuilder::sqlite("sqlite:data/tally.db?mode=rwc").build().await?;
//! let warehouse = &handles.warehouse;
//!
//! let service = warehouse.create_service(Service::new("note book", "notes")).await?;
//! let metric = warehouse
//!     .create_metric(Metric::new("reading time", MetricType::Duration, "time to read"))
//!     .await?;
//!
//! let event = warehouse.create_event(Event::new(service.service_id)).await?;
//! warehouse
//!     .attach_measurements(event.event_id, &[Measurement::new(metric.metric_id, "10s")])
//!     .await?;
//!
//! handles.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entity;
pub mod server;
pub mod storage;
pub mod validation;
pub mod warehouse;

pub use entity::{
    CoercionError, Event, Measurement, Metric, MetricRow, MetricType, Service, TimeRange,
    Timestamp, TypedValue,
};
pub use storage::{
    EventStore, MemoryStore, MetricStore, Missing, ServiceStore, SqliteStore, StorageBuilder,
    StorageError, StorageHandles, StorageResult,
};
pub use validation::{Validate, ValidationError};
pub use warehouse::Warehouse;
