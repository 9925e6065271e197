// libs/appointment-cell/src/services/registry.rs
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use tracing::{debug, info};

use crate::models::{Appointment, AppointmentError, AppointmentId, AppointmentStatus};

const ID_PREFIX: &str = "A";

/// In-process appointment store. Records are replaced whole, never patched,
/// so a reader always sees a complete record.
pub struct AppointmentRegistry {
    appointments: DashMap<AppointmentId, Appointment>,
    next_number: AtomicU64,
}

impl Default for AppointmentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentRegistry {
    pub fn new() -> Self {
        Self {
            appointments: DashMap::new(),
            next_number: AtomicU64::new(1),
        }
    }

    /// Reserve the next sequential identifier (`A00001`, `A00002`, ...),
    /// skipping any identifier already stored.
    pub fn next_id(&self) -> AppointmentId {
        loop {
            let number = self.next_number.fetch_add(1, Ordering::SeqCst);
            let id = format!("{}{:05}", ID_PREFIX, number);
            if !self.appointments.contains_key(&id) {
                return id;
            }
        }
    }

    /// Insert or fully replace a record, assigning an identifier on first save.
    pub fn save(&self, mut appointment: Appointment) -> Appointment {
        let id = match &appointment.id {
            Some(id) => id.clone(),
            None => {
                let id = self.next_id();
                appointment.id = Some(id.clone());
                id
            }
        };

        debug!("Saving appointment {} ({})", id, appointment.status);
        self.appointments.insert(id, appointment.clone());
        appointment
    }

    /// Read-modify-write of one record under its entry lock. The change is
    /// committed only when `apply` succeeds. `apply` must not call back into
    /// the registry.
    pub fn update<T, F>(&self, id: &str, apply: F) -> Result<T, AppointmentError>
    where
        F: FnOnce(&mut Appointment) -> Result<T, AppointmentError>,
    {
        let mut entry = self
            .appointments
            .get_mut(id)
            .ok_or_else(|| AppointmentError::NotFound(id.to_string()))?;

        let mut draft = entry.value().clone();
        let result = apply(&mut draft)?;
        *entry.value_mut() = draft;

        Ok(result)
    }

    pub fn find_by_id(&self, id: &str) -> Option<Appointment> {
        self.appointments.get(id).map(|entry| entry.value().clone())
    }

    pub fn exists(&self, id: &str) -> bool {
        self.appointments.contains_key(id)
    }

    pub fn find_all(&self) -> Vec<Appointment> {
        self.collect_sorted(|_| true)
    }

    pub fn find_by_provider(&self, provider_id: &str) -> Vec<Appointment> {
        self.collect_sorted(|apt| apt.provider.id == provider_id)
    }

    pub fn find_by_patient(&self, patient_id: &str) -> Vec<Appointment> {
        self.collect_sorted(|apt| apt.patient.id == patient_id)
    }

    pub fn find_by_status(&self, status: AppointmentStatus) -> Vec<Appointment> {
        self.collect_sorted(|apt| apt.status == status)
    }

    pub fn find_by_date(&self, date: NaiveDate) -> Vec<Appointment> {
        self.collect_sorted(|apt| apt.date() == date)
    }

    /// Appointments dated within `[start, end]`, both ends inclusive.
    pub fn find_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Appointment> {
        self.collect_sorted(|apt| apt.date() >= start && apt.date() <= end)
    }

    pub fn find_future_by_provider(&self, provider_id: &str, now: NaiveDateTime) -> Vec<Appointment> {
        self.collect_sorted(|apt| apt.provider.id == provider_id && apt.date_time > now)
    }

    pub fn find_future_by_patient(&self, patient_id: &str, now: NaiveDateTime) -> Vec<Appointment> {
        self.collect_sorted(|apt| apt.patient.id == patient_id && apt.date_time > now)
    }

    /// Most recent first.
    pub fn find_past_by_provider(&self, provider_id: &str, now: NaiveDateTime) -> Vec<Appointment> {
        let mut past = self.collect_sorted(|apt| apt.provider.id == provider_id && apt.date_time < now);
        past.reverse();
        past
    }

    /// Most recent first.
    pub fn find_past_by_patient(&self, patient_id: &str, now: NaiveDateTime) -> Vec<Appointment> {
        let mut past = self.collect_sorted(|apt| apt.patient.id == patient_id && apt.date_time < now);
        past.reverse();
        past
    }

    /// Earliest confirmed appointment after `now`.
    pub fn find_next_for_provider(&self, provider_id: &str, now: NaiveDateTime) -> Option<Appointment> {
        self.find_future_by_provider(provider_id, now)
            .into_iter()
            .find(|apt| apt.status == AppointmentStatus::Confirmed)
    }

    pub fn find_next_for_patient(&self, patient_id: &str, now: NaiveDateTime) -> Option<Appointment> {
        self.find_future_by_patient(patient_id, now)
            .into_iter()
            .find(|apt| apt.status == AppointmentStatus::Confirmed)
    }

    /// The live appointment occupying (provider, date-time), if any.
    pub fn find_live_at(&self, provider_id: &str, date_time: NaiveDateTime) -> Option<Appointment> {
        self.appointments
            .iter()
            .find(|entry| {
                let apt = entry.value();
                apt.is_live() && apt.provider.id == provider_id && apt.date_time == date_time
            })
            .map(|entry| entry.value().clone())
    }

    pub fn is_slot_free(&self, provider_id: &str, date_time: NaiveDateTime) -> bool {
        self.find_live_at(provider_id, date_time).is_none()
    }

    pub fn count_by_status_for_provider(&self, provider_id: &str) -> HashMap<AppointmentStatus, usize> {
        let mut counts = HashMap::new();
        for entry in self.appointments.iter() {
            if entry.value().provider.id == provider_id {
                *counts.entry(entry.value().status).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Remove a record outright. Retention use only; cancelling is a status.
    pub fn delete(&self, id: &str) -> bool {
        self.appointments.remove(id).is_some()
    }

    /// Drop cancelled appointments dated before `cutoff`; returns how many went.
    pub fn purge_cancelled_before(&self, cutoff: NaiveDate) -> usize {
        let mut purged = 0;
        self.appointments.retain(|_, apt| {
            let expired = apt.status == AppointmentStatus::Cancelled && apt.date() < cutoff;
            if expired {
                purged += 1;
            }
            !expired
        });

        if purged > 0 {
            info!("Purged {} cancelled appointments dated before {}", purged, cutoff);
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn clear(&self) {
        self.appointments.clear();
    }

    fn collect_sorted<P>(&self, predicate: P) -> Vec<Appointment>
    where
        P: Fn(&Appointment) -> bool,
    {
        let mut matches: Vec<Appointment> = self
            .appointments
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        matches.sort_by(|a, b| a.date_time.cmp(&b.date_time).then_with(|| a.id.cmp(&b.id)));
        matches
    }
}
