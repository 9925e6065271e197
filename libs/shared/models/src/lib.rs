pub mod error;
pub mod prescription;
pub mod users;

pub use error::AppError;
pub use prescription::{Prescription, PrescriptionStatus};
pub use users::{Patient, Provider, Role, User};
