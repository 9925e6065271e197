use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use dashmap::DashMap;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::Provider;
use shared_utils::Clock;

use crate::models::{AvailabilityError, AvailabilityWindow};

type WindowKey = (String, NaiveDate);

/// In-process store of provider availability windows, one per
/// (provider, date).
pub struct AvailabilityStore {
    windows: DashMap<WindowKey, AvailabilityWindow>,
    clock: Arc<dyn Clock>,
    slot_duration: Duration,
}

impl AvailabilityStore {
    pub fn new(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
            slot_duration: Duration::minutes(i64::from(config.slot_duration_minutes)),
        }
    }

    /// Declare availability for a provider on a date, replacing any window
    /// already set for that date. Nothing is written when validation fails.
    pub fn set_availability(
        &self,
        provider: Provider,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<AvailabilityWindow, AvailabilityError> {
        debug!("Setting availability for provider {} on {}: {}-{}", provider.id, date, start_time, end_time);

        self.validate_window(date, start_time, end_time)?;

        let window = AvailabilityWindow {
            provider,
            date,
            start_time,
            end_time,
        };

        let replaced = self
            .windows
            .insert((window.provider.id.clone(), date), window.clone());

        if replaced.is_some() {
            info!("Replaced availability for provider {} on {}", window.provider.id, date);
        } else {
            info!("Created availability for provider {} on {}", window.provider.id, date);
        }

        Ok(window)
    }

    /// Replace an existing window. `Ok(false)` when the provider has no
    /// window on that date.
    pub fn update_availability(
        &self,
        provider: Provider,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<bool, AvailabilityError> {
        if !self.windows.contains_key(&(provider.id.clone(), date)) {
            debug!("No availability to update for provider {} on {}", provider.id, date);
            return Ok(false);
        }

        self.set_availability(provider, date, start_time, end_time)?;
        Ok(true)
    }

    pub fn remove_availability(&self, provider_id: &str, date: NaiveDate) -> bool {
        let removed = self.windows.remove(&(provider_id.to_string(), date)).is_some();
        if removed {
            info!("Removed availability for provider {} on {}", provider_id, date);
        }
        removed
    }

    pub fn get_window(&self, provider_id: &str, date: NaiveDate) -> Option<AvailabilityWindow> {
        self.windows
            .get(&(provider_id.to_string(), date))
            .map(|entry| entry.value().clone())
    }

    pub fn list_by_provider(&self, provider_id: &str) -> Vec<AvailabilityWindow> {
        let mut windows: Vec<AvailabilityWindow> = self
            .windows
            .iter()
            .filter(|entry| entry.key().0 == provider_id)
            .map(|entry| entry.value().clone())
            .collect();

        windows.sort_by_key(|window| window.date);
        windows
    }

    pub fn list_by_date(&self, date: NaiveDate) -> Vec<AvailabilityWindow> {
        let mut windows: Vec<AvailabilityWindow> = self
            .windows
            .iter()
            .filter(|entry| entry.key().1 == date)
            .map(|entry| entry.value().clone())
            .collect();

        windows.sort_by(|a, b| {
            a.provider
                .name
                .cmp(&b.provider.name)
                .then_with(|| a.provider.id.cmp(&b.provider.id))
        });
        windows
    }

    /// Providers with a window on `date`, sorted by name then id. For today,
    /// windows that have already ended are skipped.
    pub fn list_available_providers(&self, date: NaiveDate) -> Vec<Provider> {
        let now = self.clock.now();

        self.list_by_date(date)
            .into_iter()
            .filter(|window| window.date != now.date() || window.end_time > now.time())
            .map(|window| window.provider)
            .collect()
    }

    /// Whether a slot starting at `time` fits inside the provider's window.
    pub fn is_provider_available(&self, provider_id: &str, date: NaiveDate, time: NaiveTime) -> bool {
        self.get_window(provider_id, date)
            .map(|window| window.covers(time, self.slot_duration))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn validate_window(
        &self,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<(), AvailabilityError> {
        if end_time <= start_time {
            warn!("Rejected availability: end {} not after start {}", end_time, start_time);
            return Err(AvailabilityError::InvalidTimeRange {
                start: start_time,
                end: end_time,
            });
        }

        let now = self.clock.now();
        if date < now.date() {
            warn!("Rejected availability for past date {}", date);
            return Err(AvailabilityError::PastDate(date));
        }

        if date == now.date() && start_time < now.time() {
            warn!("Rejected availability starting in the past: {} {}", date, start_time);
            return Err(AvailabilityError::PastStartTime {
                date,
                start: start_time,
            });
        }

        Ok(())
    }
}
