//! Domain models for the pharmacy system.

mod appointment;
mod contract;
mod leave;
mod patient;
mod pharmacy;
mod reservation;

pub use appointment::*;
pub use contract::*;
pub use leave::*;
pub use patient::*;
pub use pharmacy::*;
pub use reservation::*;

/// Fresh identifier for a new record.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
