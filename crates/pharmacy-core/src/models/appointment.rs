//! Bookable appointment slots.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::new_id;
use crate::interval::overlaps;

/// Appointment lifecycle.
///
/// `Available → Booked → TookPlace`, and `Available | Booked → Cancelled`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    /// Open slot, bookable by a patient
    Available,
    /// Reserved by a patient
    Booked,
    /// Finished, report attached
    TookPlace,
    /// Cancelled because of approved leave (terminal)
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Available => "available",
            AppointmentStatus::Booked => "booked",
            AppointmentStatus::TookPlace => "took_place",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(AppointmentStatus::Available),
            "booked" => Ok(AppointmentStatus::Booked),
            "took_place" => Ok(AppointmentStatus::TookPlace),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(format!("Unknown appointment status: {}", s)),
        }
    }
}

/// A time slot of one employment contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub contract_id: String,
    /// Set once booked
    pub patient_id: Option<String>,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub price: f64,
    pub status: AppointmentStatus,
    /// Filled only when the appointment took place
    pub report: Option<String>,
}

impl Appointment {
    /// A new open slot.
    pub fn available(contract_id: String, from: NaiveDateTime, to: NaiveDateTime, price: f64) -> Self {
        Self {
            id: new_id(),
            contract_id,
            patient_id: None,
            from,
            to,
            price,
            status: AppointmentStatus::Available,
            report: None,
        }
    }

    /// Cancelled slots no longer occupy their interval.
    pub fn occupies_time(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    /// Available or booked, i.e. still in the future part of its lifecycle.
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            AppointmentStatus::Available | AppointmentStatus::Booked
        )
    }

    pub fn overlaps(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        overlaps(self.from, self.to, from, to)
    }
}
