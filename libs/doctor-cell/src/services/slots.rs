use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

use shared_config::AppConfig;
use shared_models::Provider;

use crate::models::{AvailabilityWindow, Slot};

/// Expands availability windows into fixed-duration slots.
#[derive(Debug, Clone, Copy)]
pub struct SlotGenerator {
    slot_duration: Duration,
}

impl SlotGenerator {
    pub fn new(slot_duration_minutes: u32) -> Self {
        Self {
            slot_duration: Duration::minutes(i64::from(slot_duration_minutes.max(1))),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.slot_duration_minutes)
    }

    pub fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    /// Lazily yields the slots of `window`. When the window is for the date
    /// of `now` and already started, the first slot starts at `now` rounded
    /// up to the next slot boundary. A missing window yields nothing.
    pub fn generate(&self, window: Option<&AvailabilityWindow>, now: NaiveDateTime) -> SlotIter {
        let Some(window) = window else {
            return SlotIter::empty(self.slot_duration);
        };

        let mut next = window.starts_at();
        if window.date == now.date() && next < now {
            next = round_up(now, self.slot_duration);
        }

        SlotIter {
            provider: Some(window.provider.clone()),
            next,
            end: window.ends_at(),
            slot_duration: self.slot_duration,
        }
    }

    /// The generated slot starting exactly at `time`, if any.
    pub fn slot_at(
        &self,
        window: Option<&AvailabilityWindow>,
        time: NaiveTime,
        now: NaiveDateTime,
    ) -> Option<Slot> {
        self.generate(window, now).find(|slot| slot.start_time == time)
    }
}

/// Finite, restartable slot sequence; clone it to iterate again.
#[derive(Debug, Clone)]
pub struct SlotIter {
    provider: Option<Provider>,
    next: NaiveDateTime,
    end: NaiveDateTime,
    slot_duration: Duration,
}

impl SlotIter {
    fn empty(slot_duration: Duration) -> Self {
        Self {
            provider: None,
            next: NaiveDateTime::MIN,
            end: NaiveDateTime::MIN,
            slot_duration,
        }
    }
}

impl Iterator for SlotIter {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        let provider = self.provider.as_ref()?;
        let slot_end = self.next + self.slot_duration;
        if slot_end > self.end {
            return None;
        }

        let slot = Slot::new(provider.clone(), self.next, self.slot_duration);
        self.next = slot_end;
        Some(slot)
    }
}

/// Rounds up to the next multiple of `step` counted from midnight. Instants
/// already on a boundary are kept.
fn round_up(now: NaiveDateTime, step: Duration) -> NaiveDateTime {
    let midnight = now.date().and_time(NaiveTime::MIN);
    let elapsed = i64::from(now.time().num_seconds_from_midnight());
    let step_secs = step.num_seconds().max(1);
    let remainder = elapsed % step_secs;

    if remainder == 0 && now.time().nanosecond() == 0 {
        return now;
    }
    midnight + Duration::seconds(elapsed - remainder + step_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn round_up_moves_to_next_boundary() {
        let step = Duration::minutes(30);
        assert_eq!(round_up(at(10, 7, 0), step), at(10, 30, 0));
        assert_eq!(round_up(at(10, 30, 0), step), at(10, 30, 0));
        assert_eq!(round_up(at(10, 30, 1), step), at(11, 0, 0));
        assert_eq!(round_up(at(10, 59, 59), step), at(11, 0, 0));
    }

    #[test]
    fn round_up_crosses_midnight_without_wrapping() {
        let rounded = round_up(at(23, 45, 0), Duration::minutes(30));
        assert_eq!(rounded, NaiveDate::from_ymd_opt(2025, 6, 11).unwrap().and_hms_opt(0, 0, 0).unwrap());
    }
}
