//! Employees and employment contracts.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::new_id;
use crate::interval::{contains, day_span, open_day_span, overlaps};

/// Kind of pharmacy employee. Determines appointment type and points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Pharmacist,
    Dermatologist,
}

impl EmployeeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeRole::Pharmacist => "pharmacist",
            EmployeeRole::Dermatologist => "dermatologist",
        }
    }

    /// Human label used in messages ("Pharmacist", "Dermatologist").
    pub fn title(&self) -> &'static str {
        match self {
            EmployeeRole::Pharmacist => "Pharmacist",
            EmployeeRole::Dermatologist => "Dermatologist",
        }
    }
}

impl fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pharmacist" => Ok(EmployeeRole::Pharmacist),
            "dermatologist" => Ok(EmployeeRole::Dermatologist),
            _ => Err(format!("Unknown employee role: {}", s)),
        }
    }
}

/// A pharmacist or dermatologist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: EmployeeRole,
}

impl Employee {
    pub fn new(first_name: String, last_name: String, email: String, role: EmployeeRole) -> Self {
        Self {
            id: new_id(),
            first_name,
            last_name,
            email,
            role,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Weekly availability: every `day` from `start` until `end`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingWindow {
    pub day: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkingWindow {
    pub fn new(day: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self { day, start, end }
    }

    /// `true` when the slot `[from, to)` sits inside this window on a single day.
    pub fn covers(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        from.weekday() == self.day
            && from.date() == to.date()
            && contains(self.start, self.end, from.time())
            && to.time() <= self.end
    }
}

/// Assignment of an employee to a pharmacy for a period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmploymentContract {
    pub id: String,
    pub employee_id: String,
    pub pharmacy_id: String,
    pub valid_from: NaiveDate,
    /// `None` while the contract is still running
    pub valid_to: Option<NaiveDate>,
    pub working_hours: Vec<WorkingWindow>,
}

impl EmploymentContract {
    pub fn new(
        employee_id: String,
        pharmacy_id: String,
        valid_from: NaiveDate,
        working_hours: Vec<WorkingWindow>,
    ) -> Self {
        Self {
            id: new_id(),
            employee_id,
            pharmacy_id,
            valid_from,
            valid_to: None,
            working_hours,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.valid_to.is_some()
    }

    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        let (start, end) = open_day_span(self.valid_from, self.valid_to);
        contains(start, end, day.and_time(NaiveTime::MIN))
    }

    /// `true` when the validity period intersects the closed day range `[from, to]`.
    pub fn overlaps_days(&self, from: NaiveDate, to: NaiveDate) -> bool {
        let (start, end) = open_day_span(self.valid_from, self.valid_to);
        let (leave_start, leave_end) = day_span(from, to);
        overlaps(start, end, leave_start, leave_end)
    }

    /// `true` when the slot falls inside the validity period and one working window.
    pub fn covers_slot(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        let (start, end) = open_day_span(self.valid_from, self.valid_to);
        start <= from
            && to <= end
            && self.working_hours.iter().any(|w| w.covers(from, to))
    }
}
