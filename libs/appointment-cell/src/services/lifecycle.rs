// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use tracing::{debug, info, warn};

use doctor_cell::models::Slot;

use crate::models::{Appointment, AppointmentError, AppointmentOutcomeRecord, AppointmentStatus};
use crate::services::consistency::SlotBookingCoordinator;

/// Appointment state machine. Every method leaves the appointment untouched
/// when it returns an error.
pub struct AppointmentLifecycleService {
    coordinator: Arc<SlotBookingCoordinator>,
}

impl AppointmentLifecycleService {
    pub fn new(coordinator: Arc<SlotBookingCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Validate that a status transition is allowed
    pub fn validate_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn valid_transitions(&self, current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::PendingApproval => &[
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => &[
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => &[],
            AppointmentStatus::Cancelled => &[],
        }
    }

    /// Move `appointment` to `new_status`. Cancelling frees its slot;
    /// completing needs an outcome and goes through `complete_with_outcome`.
    pub fn request_transition(
        &self,
        appointment: &mut Appointment,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        self.validate_transition(appointment.status, new_status)?;

        match new_status {
            AppointmentStatus::Completed => return Err(AppointmentError::OutcomeRequired),
            AppointmentStatus::Cancelled => self.release_slot(appointment),
            AppointmentStatus::PendingApproval | AppointmentStatus::Confirmed => {}
        }

        info!(
            "Appointment {} transitioned {} -> {}",
            appointment.id.as_deref().unwrap_or("<unsaved>"),
            appointment.status,
            new_status
        );
        appointment.status = new_status;
        Ok(())
    }

    /// Attach the outcome and mark the appointment completed. Only confirmed
    /// appointments can complete.
    pub fn complete_with_outcome(
        &self,
        appointment: &mut Appointment,
        outcome: AppointmentOutcomeRecord,
    ) -> Result<(), AppointmentError> {
        if appointment.status != AppointmentStatus::Confirmed {
            warn!("Outcome rejected for appointment in status {}", appointment.status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: appointment.status,
                to: AppointmentStatus::Completed,
            });
        }

        appointment.outcome = Some(outcome);
        appointment.status = AppointmentStatus::Completed;
        info!(
            "Appointment {} completed with outcome",
            appointment.id.as_deref().unwrap_or("<unsaved>")
        );
        Ok(())
    }

    /// Move the appointment to `new_slot` and send it back for approval. The
    /// new slot is claimed before the old one is released; if the claim fails
    /// nothing changes.
    pub fn reschedule(&self, appointment: &mut Appointment, new_slot: &Slot) -> Result<(), AppointmentError> {
        if appointment.status.is_terminal() {
            return Err(AppointmentError::CannotReschedule(appointment.status));
        }

        if new_slot.provider != appointment.provider {
            return Err(AppointmentError::ValidationError(format!(
                "Slot {} belongs to provider {}, not {}",
                new_slot.id, new_slot.provider.id, appointment.provider.id
            )));
        }

        let id = appointment
            .id
            .clone()
            .ok_or_else(|| AppointmentError::Internal("cannot reschedule an unsaved appointment".to_string()))?;

        let old_key = appointment.slot_key();
        let new_key = new_slot.key();

        if new_key != old_key {
            if !self.coordinator.try_book(&new_key, &id) {
                return Err(AppointmentError::SlotNotAvailable(new_key));
            }
            self.coordinator.release_if_held_by(&old_key, &id);
        }

        info!("Appointment {} rescheduled {} -> {}", id, old_key, new_key);
        appointment.date_time = new_slot.starts_at();
        appointment.status = AppointmentStatus::PendingApproval;
        Ok(())
    }

    fn release_slot(&self, appointment: &Appointment) {
        let key = appointment.slot_key();
        match appointment.id.as_deref() {
            Some(id) => {
                self.coordinator.release_if_held_by(&key, id);
            }
            None => {
                self.coordinator.release(&key);
            }
        }
    }
}
