pub mod booking;
pub mod consistency;
pub mod lifecycle;
pub mod registry;

pub use booking::AppointmentBookingService;
pub use consistency::SlotBookingCoordinator;
pub use lifecycle::AppointmentLifecycleService;
pub use registry::AppointmentRegistry;
