//! Medicine reservations and purchase records.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::new_id;

/// Reservation lifecycle: `Reserved → Issued | Expired`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Reserved,
    Expired,
    Issued,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::Expired => "expired",
            ReservationStatus::Issued => "issued",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(ReservationStatus::Reserved),
            "expired" => Ok(ReservationStatus::Expired),
            "issued" => Ok(ReservationStatus::Issued),
            _ => Err(format!("Unknown reservation status: {}", s)),
        }
    }
}

/// Requested medicine and quantity, before pricing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationRequestItem {
    pub medicine_id: String,
    pub quantity: u32,
}

/// One priced line of a reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationItem {
    pub medicine_id: String,
    /// Medicine name at reservation time (for messages)
    pub medicine_name: String,
    pub quantity: u32,
    /// Unit price after the loyalty discount
    pub price: f64,
}

impl ReservationItem {
    pub fn line_total(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }
}

/// A patient's hold on pharmacy stock pending pickup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineReservation {
    pub id: String,
    pub pharmacy_id: String,
    pub patient_id: String,
    /// Always the sum of the item line totals
    pub price: f64,
    pub reserved_at: NaiveDateTime,
    pub deadline: NaiveDateTime,
    pub status: ReservationStatus,
    pub items: Vec<ReservationItem>,
}

impl MedicineReservation {
    pub fn new(
        pharmacy_id: String,
        patient_id: String,
        items: Vec<ReservationItem>,
        reserved_at: NaiveDateTime,
        deadline: NaiveDateTime,
    ) -> Self {
        Self {
            id: new_id(),
            pharmacy_id,
            patient_id,
            price: total_price(&items),
            reserved_at,
            deadline,
            status: ReservationStatus::Reserved,
            items,
        }
    }

    /// Reserved but past its pickup deadline.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        self.status == ReservationStatus::Reserved && self.deadline <= now
    }
}

/// Sum of `quantity × price` over all items.
pub fn total_price(items: &[ReservationItem]) -> f64 {
    items.iter().map(ReservationItem::line_total).sum()
}

/// Sale record written once per issued reservation item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicinePurchase {
    pub id: String,
    pub pharmacy_id: String,
    pub medicine_id: String,
    pub patient_id: String,
    pub reservation_id: String,
    pub quantity: u32,
    pub price: f64,
    pub purchased_on: NaiveDate,
}

impl MedicinePurchase {
    pub fn from_item(reservation: &MedicineReservation, item: &ReservationItem, purchased_on: NaiveDate) -> Self {
        Self {
            id: new_id(),
            pharmacy_id: reservation.pharmacy_id.clone(),
            medicine_id: item.medicine_id.clone(),
            patient_id: reservation.patient_id.clone(),
            reservation_id: reservation.id.clone(),
            quantity: item.quantity,
            price: item.price,
            purchased_on,
        }
    }
}
