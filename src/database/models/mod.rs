pub mod appointment;
pub mod availability;
pub mod directory;
pub mod leave;
pub(crate) mod macros;
pub mod shift;

pub use appointment::*;
pub use availability::*;
pub use directory::*;
pub use leave::*;
pub use shift::*;
