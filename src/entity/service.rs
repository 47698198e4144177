use serde::{Deserialize, Serialize};

/// A named producer of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Assigned by the store on creation (0 until then).
    #[serde(default)]
    pub service_id: i64,
    /// Normalized upper-case identifier, e.g. `NOTE_BOOK`.
    pub slug: String,
    /// Free-text description.
    pub details: String,
}

impl Service {
    /// Create an unsaved service.
    pub fn new(slug: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            service_id: 0,
            slug: slug.into(),
            details: details.into(),
        }
    }
}
