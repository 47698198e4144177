//! Entity model.
//!
//! - [`Service`], [`Metric`], [`Event`]: the three persisted entities
//! - [`Measurement`]: a (metric, value) pair attached to an event
//! - [`TypedValue`] / [`MetricType`]: typed values and their declared kinds
//! - [`Timestamp`] / [`TimeRange`]: points in time and half-open intervals
//! - [`MetricRow`]: one row of a range query

mod event;
mod metric;
mod service;
mod timestamp;
mod value;

pub use event::{Event, Measurement, MetricRow, TimeRange};
pub use metric::Metric;
pub use service::Service;
pub use timestamp::Timestamp;
pub use value::{CoercionError, MetricType, TypedValue};
