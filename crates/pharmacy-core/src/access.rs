//! Permission check performed once at the service boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Role of an authenticated caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Patient,
    Pharmacist,
    Dermatologist,
    PharmacyAdmin,
    SystemAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Pharmacist => "pharmacist",
            Role::Dermatologist => "dermatologist",
            Role::PharmacyAdmin => "pharmacy_admin",
            Role::SystemAdmin => "system_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Role::Patient),
            "pharmacist" => Ok(Role::Pharmacist),
            "dermatologist" => Ok(Role::Dermatologist),
            "pharmacy_admin" => Ok(Role::PharmacyAdmin),
            "system_admin" => Ok(Role::SystemAdmin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Identity supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}

/// Operations guarded by [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageRegistry,
    ManageStock,
    ManageContracts,
    ScheduleAppointment,
    BookAppointment,
    CompleteAppointment,
    RequestLeave,
    RespondToLeave,
    ReserveMedicine,
    IssueReservation,
    ManageCategories,
    ManageSettings,
    RunMaintenance,
}

impl Action {
    fn allows(&self, role: Role) -> bool {
        use Role::*;
        match self {
            Action::ManageStock
            | Action::ManageContracts
            | Action::ScheduleAppointment
            | Action::RespondToLeave => role == PharmacyAdmin,
            Action::BookAppointment | Action::ReserveMedicine => role == Patient,
            Action::CompleteAppointment | Action::RequestLeave => {
                matches!(role, Pharmacist | Dermatologist)
            }
            Action::IssueReservation => role == Pharmacist,
            Action::ManageRegistry
            | Action::ManageCategories
            | Action::ManageSettings
            | Action::RunMaintenance => role == SystemAdmin,
        }
    }
}

/// Fail with `Forbidden` unless `principal` may perform `action`.
pub fn authorize(principal: &Principal, action: Action) -> ServiceResult<()> {
    if action.allows(principal.role) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "{} may not perform {:?}",
            principal.role, action
        )))
    }
}
