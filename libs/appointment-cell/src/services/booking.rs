// libs/appointment-cell/src/services/booking.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info, instrument, warn};

use doctor_cell::models::Slot;
use doctor_cell::services::{AvailabilityStore, SlotGenerator};
use shared_config::AppConfig;
use shared_models::{Patient, Prescription, Provider};
use shared_utils::Clock;

use crate::models::{
    Appointment, AppointmentError, AppointmentOutcomeRecord, AppointmentSearchQuery, AppointmentStatus,
};
use crate::services::consistency::SlotBookingCoordinator;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::registry::AppointmentRegistry;

/// Entry point for every scheduling operation. Slot lists handed out are
/// snapshots; booking re-validates against the live window and claim table.
pub struct AppointmentBookingService {
    availability: Arc<AvailabilityStore>,
    registry: Arc<AppointmentRegistry>,
    coordinator: Arc<SlotBookingCoordinator>,
    lifecycle_service: AppointmentLifecycleService,
    slot_generator: SlotGenerator,
    clock: Arc<dyn Clock>,
    lookahead_days: u32,
    retention_days: u32,
}

impl AppointmentBookingService {
    pub fn new(
        config: &AppConfig,
        availability: Arc<AvailabilityStore>,
        registry: Arc<AppointmentRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let coordinator = Arc::new(SlotBookingCoordinator::new());
        coordinator.rebuild_from(&registry);

        Self {
            availability,
            registry,
            lifecycle_service: AppointmentLifecycleService::new(Arc::clone(&coordinator)),
            coordinator,
            slot_generator: SlotGenerator::from_config(config),
            clock,
            lookahead_days: config.next_slot_lookahead_days,
            retention_days: config.cancelled_retention_days,
        }
    }

    pub fn coordinator(&self) -> &SlotBookingCoordinator {
        &self.coordinator
    }

    pub fn registry(&self) -> &AppointmentRegistry {
        &self.registry
    }

    // ==============================================================================
    // SLOT QUERIES
    // ==============================================================================

    /// Free slots of the provider's window on `date`, in start order. Empty
    /// when there is no window or everything is taken.
    pub fn get_available_slots(&self, date: NaiveDate, provider_id: &str) -> Vec<Slot> {
        let window = self.availability.get_window(provider_id, date);
        let taken: HashSet<NaiveDateTime> = self
            .registry
            .find_by_date(date)
            .into_iter()
            .filter(|apt| apt.is_live() && apt.provider.id == provider_id)
            .map(|apt| apt.date_time)
            .collect();

        let slots: Vec<Slot> = self
            .slot_generator
            .generate(window.as_ref(), self.clock.now())
            .filter(|slot| !taken.contains(&slot.starts_at()) && !self.coordinator.is_claimed(&slot.key()))
            .collect();

        debug!("{} free slots for provider {} on {}", slots.len(), provider_id, date);
        slots
    }

    /// The currently offered slot starting at `start_time`, free or not.
    pub fn find_slot(&self, provider_id: &str, date: NaiveDate, start_time: NaiveTime) -> Option<Slot> {
        let window = self.availability.get_window(provider_id, date);
        self.slot_generator
            .slot_at(window.as_ref(), start_time, self.clock.now())
    }

    /// First free slot from today through the configured lookahead.
    pub fn get_next_available_slot(&self, provider_id: &str) -> Option<Slot> {
        let today = self.clock.today();
        (0..=i64::from(self.lookahead_days))
            .map(|offset| today + Duration::days(offset))
            .find_map(|date| self.get_available_slots(date, provider_id).into_iter().next())
    }

    // ==============================================================================
    // BOOKING OPERATIONS
    // ==============================================================================

    #[instrument(skip(self, patient, provider, slot), fields(slot = %slot.id, patient = %patient.id))]
    pub fn schedule_appointment(
        &self,
        patient: Patient,
        provider: Provider,
        slot: &Slot,
    ) -> Result<Appointment, AppointmentError> {
        if slot.provider != provider {
            return Err(AppointmentError::ValidationError(format!(
                "Slot {} does not belong to provider {}",
                slot.id, provider.id
            )));
        }
        self.ensure_offered(slot)?;

        let key = slot.key();
        if !self.registry.is_slot_free(&provider.id, key.start) {
            return Err(AppointmentError::SlotNotAvailable(key));
        }

        let token = self
            .coordinator
            .try_reserve(&key)
            .ok_or_else(|| AppointmentError::SlotNotAvailable(key.clone()))?;

        if let Some(existing) = self.registry.find_live_at(&provider.id, key.start) {
            self.coordinator.release_if_held_by(&key, &token);
            warn!(
                "Registry already holds live appointment {:?} at {} without a claim",
                existing.id, key
            );
            return Err(AppointmentError::ConflictDetected(format!(
                "slot {} already booked by appointment {}",
                key,
                existing.id.unwrap_or_default()
            )));
        }

        // Rejected bookings never draw an id.
        let id = self.registry.next_id();
        if !self.coordinator.assign(&key, &token, &id) {
            self.coordinator.release_if_held_by(&key, &token);
            return Err(AppointmentError::Internal(format!("reservation on {} was lost", key)));
        }

        let mut appointment = Appointment::new(patient, provider, slot.starts_at());
        appointment.id = Some(id);
        let appointment = self.registry.save(appointment);

        info!(
            "Appointment {} booked for patient {} with provider {} at {}",
            appointment.id.as_deref().unwrap_or_default(),
            appointment.patient.id,
            appointment.provider.id,
            appointment.date_time
        );
        Ok(appointment)
    }

    #[instrument(skip(self, new_slot), fields(slot = %new_slot.id))]
    pub fn reschedule_appointment(&self, id: &str, new_slot: &Slot) -> Result<Appointment, AppointmentError> {
        self.ensure_offered(new_slot)?;

        if let Some(existing) = self.registry.find_live_at(&new_slot.provider.id, new_slot.starts_at()) {
            if existing.id.as_deref() != Some(id) {
                return Err(AppointmentError::SlotNotAvailable(new_slot.key()));
            }
        }

        self.registry.update(id, |appointment| {
            self.lifecycle_service.reschedule(appointment, new_slot)?;
            Ok(appointment.clone())
        })
    }

    #[instrument(skip(self))]
    pub fn cancel_appointment(&self, id: &str) -> Result<Appointment, AppointmentError> {
        self.update_appointment_status(id, AppointmentStatus::Cancelled)
    }

    #[instrument(skip(self))]
    pub fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        self.registry.update(id, |appointment| {
            self.lifecycle_service.request_transition(appointment, status)?;
            Ok(appointment.clone())
        })
    }

    /// Complete a confirmed appointment with its outcome. Prescriptions are
    /// recorded as pending regardless of the status they arrive with.
    #[instrument(skip(self, prescriptions, notes))]
    pub fn record_appointment_outcome(
        &self,
        id: &str,
        service_type: &str,
        prescriptions: Vec<Prescription>,
        notes: &str,
    ) -> Result<Appointment, AppointmentError> {
        let outcome = AppointmentOutcomeRecord {
            date: self.clock.today(),
            service_type: service_type.to_string(),
            prescriptions: prescriptions
                .into_iter()
                .map(|mut prescription| {
                    prescription.mark_pending();
                    prescription
                })
                .collect(),
            consultation_notes: notes.to_string(),
        };

        self.registry.update(id, |appointment| {
            self.lifecycle_service.complete_with_outcome(appointment, outcome)?;
            Ok(appointment.clone())
        })
    }

    // ==============================================================================
    // APPOINTMENT QUERIES
    // ==============================================================================

    pub fn get_appointment(&self, id: &str) -> Result<Appointment, AppointmentError> {
        self.registry
            .find_by_id(id)
            .ok_or_else(|| AppointmentError::NotFound(id.to_string()))
    }

    pub fn get_all_appointments(&self) -> Vec<Appointment> {
        self.registry.find_all()
    }

    pub fn get_appointments_by_date(&self, date: NaiveDate) -> Vec<Appointment> {
        self.registry.find_by_date(date)
    }

    pub fn get_appointments_by_status(&self, status: AppointmentStatus) -> Vec<Appointment> {
        self.registry.find_by_status(status)
    }

    pub fn get_provider_appointments(&self, provider_id: &str) -> Vec<Appointment> {
        self.registry.find_by_provider(provider_id)
    }

    pub fn get_patient_appointments(&self, patient_id: &str) -> Vec<Appointment> {
        self.registry.find_by_patient(patient_id)
    }

    /// The patient's future appointments that are still on.
    pub fn get_scheduled_appointments(&self, patient_id: &str) -> Vec<Appointment> {
        self.registry
            .find_future_by_patient(patient_id, self.clock.now())
            .into_iter()
            .filter(|apt| apt.status != AppointmentStatus::Cancelled)
            .collect()
    }

    /// The provider's future appointments awaiting or holding confirmation.
    pub fn get_upcoming_appointments(&self, provider_id: &str) -> Vec<Appointment> {
        self.registry
            .find_future_by_provider(provider_id, self.clock.now())
            .into_iter()
            .filter(|apt| {
                matches!(
                    apt.status,
                    AppointmentStatus::PendingApproval | AppointmentStatus::Confirmed
                )
            })
            .collect()
    }

    pub fn get_pending_appointments(&self, provider_id: &str) -> Vec<Appointment> {
        self.registry
            .find_by_provider(provider_id)
            .into_iter()
            .filter(|apt| apt.status == AppointmentStatus::PendingApproval)
            .collect()
    }

    pub fn search_appointments(&self, query: &AppointmentSearchQuery) -> Vec<Appointment> {
        self.registry
            .find_all()
            .into_iter()
            .filter(|apt| query.provider_id.as_ref().map_or(true, |id| &apt.provider.id == id))
            .filter(|apt| query.patient_id.as_ref().map_or(true, |id| &apt.patient.id == id))
            .filter(|apt| query.status.map_or(true, |status| apt.status == status))
            .filter(|apt| query.date.map_or(true, |date| apt.date() == date))
            .collect()
    }

    // ==============================================================================
    // RETENTION
    // ==============================================================================

    pub fn purge_cancelled_before(&self, cutoff: NaiveDate) -> usize {
        self.registry.purge_cancelled_before(cutoff)
    }

    /// Drop cancellations older than the configured retention period.
    pub fn purge_expired_cancellations(&self) -> usize {
        let cutoff = self.clock.today() - Duration::days(i64::from(self.retention_days));
        self.purge_cancelled_before(cutoff)
    }

    /// The slot must still be generated from the provider's current window
    /// with the same bounds.
    fn ensure_offered(&self, slot: &Slot) -> Result<(), AppointmentError> {
        match self.find_slot(&slot.provider.id, slot.date, slot.start_time) {
            Some(current) if current.end_time == slot.end_time => Ok(()),
            _ => {
                warn!("Rejecting stale slot {}", slot.id);
                Err(AppointmentError::StaleSlot(slot.id.clone()))
            }
        }
    }
}
