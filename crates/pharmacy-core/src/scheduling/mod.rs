//! Staff scheduling: contracts, appointment slots and leave days.
//!
//! Flow: Contract (working windows) → Available slot → Booked → Took place.
//! An approved leave request cancels every open slot it overlaps.

mod appointments;
mod contracts;
mod leave;

pub use appointments::*;
pub use contracts::*;
pub use leave::*;
