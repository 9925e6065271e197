use serde::{Deserialize, Serialize};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use shared_models::Provider;

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// A single date-bound interval during which a provider sees patients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub provider: Provider,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl AvailabilityWindow {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }

    /// True when a slot of `slot_duration` starting at `time` fits inside the window.
    pub fn covers(&self, time: NaiveTime, slot_duration: Duration) -> bool {
        let start = self.date.and_time(time);
        start >= self.starts_at() && start + slot_duration <= self.ends_at()
    }
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// Identity used for booking exclusivity: one live appointment per
/// provider per start instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub provider_id: String,
    pub start: NaiveDateTime,
}

impl SlotKey {
    pub fn new(provider_id: impl Into<String>, start: NaiveDateTime) -> Self {
        Self {
            provider_id: provider_id.into(),
            start,
        }
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.provider_id, self.start.format("%Y-%m-%d %H:%M"))
    }
}

/// A fixed-duration sub-interval of an availability window. Pure value: who
/// holds it is answered by the booking coordinator and the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub provider: Provider,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Slot {
    pub fn new(provider: Provider, start: NaiveDateTime, duration: Duration) -> Self {
        let end = start + duration;
        Self {
            id: format!("{}-{}-{}", provider.id, start.format("%Y%m%d"), start.format("%H%M")),
            provider,
            date: start.date(),
            start_time: start.time(),
            end_time: end.time(),
        }
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.provider.id.clone(), self.starts_at())
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub provider_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableProvidersResponse {
    pub date: NaiveDate,
    pub providers: Vec<Provider>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AvailabilityError {
    #[error("End time {end} must be after start time {start}")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },

    #[error("Cannot set availability for past date {0}")]
    PastDate(NaiveDate),

    #[error("Cannot set availability starting in the past ({start} on {date})")]
    PastStartTime { date: NaiveDate, start: NaiveTime },
}

impl From<AvailabilityError> for shared_models::AppError {
    fn from(err: AvailabilityError) -> Self {
        shared_models::AppError::ValidationError(err.to_string())
    }
}
