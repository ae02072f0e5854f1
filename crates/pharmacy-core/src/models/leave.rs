//! Leave-day requests.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::new_id;
use crate::interval::{day_span, overlaps};

/// Reason stored by the daily sweep.
pub const AUTO_REJECTION_REASON: &str = "Request was not approved before leave start date";

/// Leave request lifecycle: `Pending → Approved | Rejected`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LeaveStatus::Pending),
            "approved" => Ok(LeaveStatus::Approved),
            "rejected" => Ok(LeaveStatus::Rejected),
            _ => Err(format!("Unknown leave status: {}", s)),
        }
    }
}

/// Employee request for the closed day range `[from, to]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaveDaysRequest {
    pub id: String,
    pub employee_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub status: LeaveStatus,
    /// Non-blank exactly when `status == Rejected`
    pub rejection_reason: Option<String>,
    pub created_at: NaiveDateTime,
}

impl LeaveDaysRequest {
    pub fn new(employee_id: String, from: NaiveDate, to: NaiveDate, created_at: NaiveDateTime) -> Self {
        Self {
            id: new_id(),
            employee_id,
            from,
            to,
            status: LeaveStatus::Pending,
            rejection_reason: None,
            created_at,
        }
    }

    /// Pending or approved requests block the days they cover.
    pub fn is_live(&self) -> bool {
        self.status != LeaveStatus::Rejected
    }

    pub fn overlaps_days(&self, from: NaiveDate, to: NaiveDate) -> bool {
        let (a_from, a_to) = day_span(self.from, self.to);
        let (b_from, b_to) = day_span(from, to);
        overlaps(a_from, a_to, b_from, b_to)
    }

    /// `true` when the request covers any part of `[from, to)`.
    pub fn covers(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        let (start, end) = day_span(self.from, self.to);
        overlaps(start, end, from, to)
    }
}
