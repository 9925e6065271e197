pub mod availability;
pub mod slots;

pub use availability::AvailabilityStore;
pub use slots::{SlotGenerator, SlotIter};
