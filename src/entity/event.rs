use serde::{Deserialize, Serialize};

use super::{Timestamp, TypedValue};

/// A timestamped occurrence owned by one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Assigned by the store on creation (0 until then).
    #[serde(default)]
    pub event_id: i64,
    pub time_stamp: Timestamp,
    pub service_id: i64,
}

impl Event {
    /// Create an unsaved event stamped with the current time.
    pub fn new(service_id: i64) -> Self {
        Self::at(service_id, Timestamp::now())
    }

    /// Create an unsaved event at the given time.
    pub fn at(service_id: i64, time_stamp: Timestamp) -> Self {
        Self {
            event_id: 0,
            time_stamp,
            service_id,
        }
    }
}

/// One (metric, value) pair attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub metric_id: i64,
    pub metric_value: TypedValue,
}

impl Measurement {
    pub fn new(metric_id: i64, metric_value: impl Into<TypedValue>) -> Self {
        Self {
            metric_id,
            metric_value: metric_value.into(),
        }
    }
}

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Whether `ts` falls inside the range (start inclusive, end exclusive).
    pub fn contains(&self, ts: &Timestamp) -> bool {
        self.start <= *ts && *ts < self.end
    }

    /// Both bounds at the resolution stores compare event times with.
    pub fn normalized(&self) -> Self {
        Self::new(self.start.normalized(), self.end.normalized())
    }

    /// True when no instant can satisfy the range.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// One result of a range query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub time_stamp: Timestamp,
    pub value: TypedValue,
}
