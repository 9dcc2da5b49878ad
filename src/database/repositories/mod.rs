pub mod appointment;
pub mod availability;
pub mod directory;
pub mod leave;
pub mod shift;

pub use appointment::{AppointmentFilter, AppointmentRepository};
pub use availability::AvailabilityRepository;
pub use directory::DirectoryRepository;
pub use leave::{LeaveFilter, LeaveRepository};
pub use shift::ShiftRepository;
