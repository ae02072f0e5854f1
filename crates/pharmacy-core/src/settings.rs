//! Administrator-controlled business configuration.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::EmployeeRole;

/// Longest accepted pickup window: one year.
pub const MAX_RESERVATION_HORIZON_HOURS: i64 = 24 * 365;

/// Single-row system configuration.
///
/// Read once per operation, inside that operation's transaction, and passed
/// down explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemSettings {
    /// Points credited for a completed dermatologist appointment
    pub dermatologist_appointment_points: i64,
    /// Points credited for a completed pharmacist consultation
    pub pharmacist_appointment_points: i64,
    /// Pickup window of a medicine reservation
    pub reservation_horizon_hours: i64,
    /// Patients with this many penalties can no longer book or reserve
    pub max_penalties: u32,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            dermatologist_appointment_points: 3,
            pharmacist_appointment_points: 2,
            reservation_horizon_hours: 48,
            max_penalties: 3,
        }
    }
}

impl SystemSettings {
    pub fn appointment_points(&self, role: EmployeeRole) -> i64 {
        match role {
            EmployeeRole::Dermatologist => self.dermatologist_appointment_points,
            EmployeeRole::Pharmacist => self.pharmacist_appointment_points,
        }
    }

    /// `None` when the horizon does not fit the calendar.
    pub fn reservation_deadline(&self, reserved_at: NaiveDateTime) -> Option<NaiveDateTime> {
        Duration::try_hours(self.reservation_horizon_hours)
            .and_then(|horizon| reserved_at.checked_add_signed(horizon))
    }

    /// Check value ranges before an update is stored.
    pub fn validate(&self) -> Result<(), String> {
        if self.dermatologist_appointment_points < 0 || self.pharmacist_appointment_points < 0 {
            return Err("Appointment points cannot be negative".into());
        }
        if self.reservation_horizon_hours <= 0 {
            return Err("Reservation horizon must be positive".into());
        }
        if self.reservation_horizon_hours > MAX_RESERVATION_HORIZON_HOURS {
            return Err(format!(
                "Reservation horizon cannot exceed {} hours",
                MAX_RESERVATION_HORIZON_HOURS
            ));
        }
        if self.max_penalties == 0 {
            return Err("Penalty limit must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_points_by_role() {
        let settings = SystemSettings::default();
        assert_eq!(settings.appointment_points(EmployeeRole::Dermatologist), 3);
        assert_eq!(settings.appointment_points(EmployeeRole::Pharmacist), 2);
    }

    #[test]
    fn test_reservation_deadline() {
        let settings = SystemSettings::default();
        let at = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            settings.reservation_deadline(at),
            NaiveDate::from_ymd_opt(2021, 6, 3).unwrap().and_hms_opt(10, 0, 0)
        );
    }

    #[test]
    fn test_reservation_deadline_out_of_range() {
        let settings = SystemSettings {
            reservation_horizon_hours: 1_000_000_000_000,
            ..SystemSettings::default()
        };
        let at = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(settings.reservation_deadline(at), None);
        assert_eq!(
            SystemSettings {
                reservation_horizon_hours: i64::MAX,
                ..SystemSettings::default()
            }
            .reservation_deadline(at),
            None
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = SystemSettings::default();
        settings.pharmacist_appointment_points = -1;
        assert!(settings.validate().is_err());

        let mut settings = SystemSettings::default();
        settings.reservation_horizon_hours = 0;
        assert!(settings.validate().is_err());

        settings.reservation_horizon_hours = MAX_RESERVATION_HORIZON_HOURS + 1;
        assert!(settings.validate().is_err());
        settings.reservation_horizon_hours = MAX_RESERVATION_HORIZON_HOURS;
        assert!(settings.validate().is_ok());

        assert!(SystemSettings::default().validate().is_ok());
    }
}
