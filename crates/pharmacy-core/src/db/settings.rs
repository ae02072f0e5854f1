//! System settings persistence.

use rusqlite::params;

use super::{Database, DbResult};
use crate::settings::SystemSettings;

impl Database {
    /// Read the settings row seeded by the schema.
    pub fn get_settings(&self) -> DbResult<SystemSettings> {
        self.conn
            .query_row(
                r#"
                SELECT dermatologist_appointment_points, pharmacist_appointment_points,
                       reservation_horizon_hours, max_penalties
                FROM system_settings WHERE id = 1
                "#,
                [],
                |row| {
                    Ok(SystemSettings {
                        dermatologist_appointment_points: row.get(0)?,
                        pharmacist_appointment_points: row.get(1)?,
                        reservation_horizon_hours: row.get(2)?,
                        max_penalties: row.get(3)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    pub fn update_settings(&self, settings: &SystemSettings) -> DbResult<()> {
        self.conn.execute(
            r#"
            UPDATE system_settings
            SET dermatologist_appointment_points = ?1,
                pharmacist_appointment_points = ?2,
                reservation_horizon_hours = ?3,
                max_penalties = ?4
            WHERE id = 1
            "#,
            params![
                settings.dermatologist_appointment_points,
                settings.pharmacist_appointment_points,
                settings.reservation_horizon_hours,
                settings.max_penalties,
            ],
        )?;
        Ok(())
    }
}
