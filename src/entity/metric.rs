use serde::{Deserialize, Serialize};

use super::MetricType;
use crate::storage::StorageError;

/// A named, typed measurement kind.
///
/// `metric_type` keeps the raw declared name. Creation validates it against
/// [`MetricType`]; rows inserted out of band may still carry anything, which
/// [`Metric::kind`] reports as [`StorageError::UnknownMetricType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Assigned by the store on creation (0 until then).
    #[serde(default)]
    pub metric_id: i64,
    /// Normalized upper-case identifier, e.g. `READING_TIME`.
    pub slug: String,
    /// Declared value type name, e.g. `DURATION`.
    pub metric_type: String,
    /// Free-text description.
    pub details: String,
}

impl Metric {
    /// Create an unsaved metric.
    pub fn new(slug: impl Into<String>, metric_type: MetricType, details: impl Into<String>) -> Self {
        Self {
            metric_id: 0,
            slug: slug.into(),
            metric_type: metric_type.to_string(),
            details: details.into(),
        }
    }

    /// Parse the declared type.
    pub fn kind(&self) -> Result<MetricType, StorageError> {
        self.metric_type
            .parse()
            .map_err(|_| StorageError::UnknownMetricType(self.metric_type.clone()))
    }
}
