use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionStatus {
    Pending,
    Dispensed,
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrescriptionStatus::Pending => write!(f, "PENDING"),
            PrescriptionStatus::Dispensed => write!(f, "DISPENSED"),
        }
    }
}

/// Medicine reference plus quantity, owned by the dispensing side. Stock is
/// never checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub medicine: String,
    pub quantity: u32,
    #[serde(default = "default_status")]
    pub status: PrescriptionStatus,
}

fn default_status() -> PrescriptionStatus {
    PrescriptionStatus::Pending
}

impl Prescription {
    pub fn new(medicine: impl Into<String>, quantity: u32) -> Self {
        Self {
            medicine: medicine.into(),
            quantity,
            status: PrescriptionStatus::Pending,
        }
    }

    pub fn mark_pending(&mut self) {
        self.status = PrescriptionStatus::Pending;
    }
}
