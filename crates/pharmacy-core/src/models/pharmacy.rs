//! Pharmacies, medicines and per-pharmacy stock.

use serde::{Deserialize, Serialize};

use super::new_id;

/// A pharmacy (tenant).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pharmacy {
    pub id: String,
    pub name: String,
}

impl Pharmacy {
    pub fn new(name: String) -> Self {
        Self { id: new_id(), name }
    }
}

/// A medicine from the shared catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    pub id: String,
    /// Catalog code, unique across the system
    pub code: String,
    pub name: String,
    /// Loyalty points awarded per issued unit
    pub points: i64,
}

impl Medicine {
    pub fn new(code: String, name: String, points: i64) -> Self {
        Self {
            id: new_id(),
            code,
            name,
            points,
        }
    }
}

/// Quantity and current price tag of one medicine in one pharmacy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineStock {
    pub pharmacy_id: String,
    pub medicine_id: String,
    pub quantity: u32,
    /// Unit price before any loyalty discount
    pub price: f64,
}
