pub mod appointments;
pub mod availability;
pub mod leave;
pub mod shared;
pub mod shifts;
