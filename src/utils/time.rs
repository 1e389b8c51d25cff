//! Clock helpers for batch runs.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::{Duration, Instant};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// RFC 3339 with millisecond precision, as written to batch logs.
pub fn log_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether `budget` has run out since `started`. No budget never runs out.
pub fn budget_exhausted(started: Instant, budget: Option<Duration>) -> bool {
    budget.map_or(false, |budget| started.elapsed() >= budget)
}
