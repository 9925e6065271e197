// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

use doctor_cell::models::SlotKey;
use shared_models::{AppError, Patient, Prescription, Provider};

pub type AppointmentId = String;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Option<AppointmentId>,
    pub patient: Patient,
    pub provider: Provider,
    pub date_time: NaiveDateTime,
    pub status: AppointmentStatus,
    pub outcome: Option<AppointmentOutcomeRecord>,
}

impl Appointment {
    /// A fresh, unsaved request awaiting approval.
    pub fn new(patient: Patient, provider: Provider, date_time: NaiveDateTime) -> Self {
        Self {
            id: None,
            patient,
            provider,
            date_time,
            status: AppointmentStatus::PendingApproval,
            outcome: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date_time.date()
    }

    pub fn slot_key(&self) -> SlotKey {
        SlotKey::new(self.provider.id.clone(), self.date_time)
    }

    /// Live appointments hold their slot for booking-conflict purposes.
    pub fn is_live(&self) -> bool {
        self.status.occupies_slot()
    }

    pub fn has_valid_outcome_record(&self) -> bool {
        self.outcome.is_some() && self.status == AppointmentStatus::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    PendingApproval,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::PendingApproval => write!(f, "PENDING_APPROVAL"),
            AppointmentStatus::Confirmed => write!(f, "CONFIRMED"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Summary attached once, when the appointment completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentOutcomeRecord {
    pub date: NaiveDate,
    pub service_type: String,
    pub prescriptions: Vec<Prescription>,
    pub consultation_notes: String,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient: Patient,
    pub provider_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcomeRequest {
    pub service_type: String,
    #[serde(default)]
    pub prescriptions: Vec<Prescription>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotQuery {
    pub provider_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub provider_id: Option<String>,
    pub patient_id: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment {0} not found")]
    NotFound(AppointmentId),

    #[error("Appointment slot {0} not available")]
    SlotNotAvailable(SlotKey),

    #[error("Slot {0} is no longer offered by the provider")]
    StaleSlot(String),

    #[error("Conflict detected: {0}")]
    ConflictDetected(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("An outcome record is required to complete an appointment")]
    OutcomeRequired,

    #[error("Appointment cannot be rescheduled in status {0}")]
    CannotReschedule(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        let message = err.to_string();
        match err {
            AppointmentError::NotFound(_) => AppError::NotFound(message),
            AppointmentError::SlotNotAvailable(_)
            | AppointmentError::StaleSlot(_)
            | AppointmentError::ConflictDetected(_)
            | AppointmentError::InvalidStatusTransition { .. }
            | AppointmentError::OutcomeRequired
            | AppointmentError::CannotReschedule(_) => AppError::Conflict(message),
            AppointmentError::ValidationError(_) => AppError::ValidationError(message),
            AppointmentError::Internal(_) => AppError::Internal(message),
        }
    }
}
