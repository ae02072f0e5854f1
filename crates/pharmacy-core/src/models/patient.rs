//! Patients and loyalty categories.

use serde::{Deserialize, Serialize};

use super::new_id;

/// Identifier of the zero-threshold category seeded with the schema.
pub const DEFAULT_CATEGORY_ID: &str = "default";

/// A patient with loyalty state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Accumulated loyalty points
    pub num_points: i64,
    /// Expired reservations and other penalties
    pub num_penalties: u32,
    /// Cached result of the last category evaluation
    pub category_id: String,
}

impl Patient {
    pub fn new(first_name: String, last_name: String, email: String) -> Self {
        Self {
            id: new_id(),
            first_name,
            last_name,
            email,
            num_points: 0,
            num_penalties: 0,
            category_id: DEFAULT_CATEGORY_ID.to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A loyalty tier reached at `points` accumulated points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientCategory {
    pub id: String,
    pub name: String,
    /// Point threshold
    pub points: i64,
    /// Discount in percent on reserved medicines
    pub discount: u32,
    /// Display color (e.g. "#eba502")
    pub color: String,
}

impl PatientCategory {
    pub fn new(name: String, points: i64, discount: u32, color: String) -> Self {
        Self {
            id: new_id(),
            name,
            points,
            discount,
            color,
        }
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_CATEGORY_ID
    }
}
