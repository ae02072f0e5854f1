//! Appointment database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Appointment, AppointmentStatus};

const APPOINTMENT_COLUMNS: &str =
    "id, contract_id, patient_id, from_time, to_time, price, status, report";

fn read_appointment(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        contract_id: row.get(1)?,
        patient_id: row.get(2)?,
        from: row.get(3)?,
        to: row.get(4)?,
        price: row.get(5)?,
        status: row.get(6)?,
        report: row.get(7)?,
    })
}

impl Database {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                id, contract_id, patient_id, from_time, to_time, price, status, report
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                appointment.id,
                appointment.contract_id,
                appointment.patient_id,
                appointment.from,
                appointment.to,
                appointment.price,
                appointment.status,
                appointment.report,
            ],
        )?;
        Ok(())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?"),
                [id],
                read_appointment,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All appointments of a contract, in start order, whatever their status.
    pub fn list_appointments_for_contract(&self, contract_id: &str) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE contract_id = ? ORDER BY from_time"
        ))?;
        let rows = stmt.query_map([contract_id], read_appointment)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// All appointments ever booked by a patient, in start order.
    pub fn list_appointments_for_patient(&self, patient_id: &str) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE patient_id = ? ORDER BY from_time"
        ))?;
        let rows = stmt.query_map([patient_id], read_appointment)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Assign a patient to a slot that is still available.
    pub fn book_appointment_slot(&self, id: &str, patient_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET status = ?3, patient_id = ?2
            WHERE id = ?1 AND status = ?4
            "#,
            params![
                id,
                patient_id,
                AppointmentStatus::Booked,
                AppointmentStatus::Available,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Attach the report to a booked appointment and mark it as took place.
    pub fn complete_appointment_slot(&self, id: &str, report: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET status = ?3, report = ?2
            WHERE id = ?1 AND status = ?4
            "#,
            params![
                id,
                report,
                AppointmentStatus::TookPlace,
                AppointmentStatus::Booked,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Move an appointment to `next` only if it is still in `expected`.
    pub fn transition_appointment(
        &self,
        id: &str,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointments SET status = ?3 WHERE id = ?1 AND status = ?2",
            params![id, expected, next],
        )?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, EmployeeRole, EmploymentContract, Patient, Pharmacy};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 6, 7)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn setup_db() -> (Database, EmploymentContract, Patient) {
        let db = Database::open_in_memory().unwrap();
        let employee = Employee::new(
            "Marko".into(),
            "Markovic".into(),
            "marko@example.com".into(),
            EmployeeRole::Dermatologist,
        );
        let pharmacy = Pharmacy::new("Benu".into());
        let patient = Patient::new("Pera".into(), "Peric".into(), "pera@example.com".into());
        db.insert_employee(&employee).unwrap();
        db.insert_pharmacy(&pharmacy).unwrap();
        db.insert_patient(&patient).unwrap();

        let contract = EmploymentContract::new(
            employee.id.clone(),
            pharmacy.id.clone(),
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            vec![],
        );
        db.insert_contract(&contract).unwrap();
        (db, contract, patient)
    }

    #[test]
    fn test_insert_and_list_in_start_order() {
        let (db, contract, _) = setup_db();
        let late = Appointment::available(contract.id.clone(), at(11, 0), at(11, 30), 1500.0);
        let early = Appointment::available(contract.id.clone(), at(9, 0), at(9, 30), 1500.0);
        db.insert_appointment(&late).unwrap();
        db.insert_appointment(&early).unwrap();

        let listed = db.list_appointments_for_contract(&contract.id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], early);
        assert_eq!(listed[1], late);
    }

    #[test]
    fn test_book_slot_is_compare_and_set() {
        let (db, contract, patient) = setup_db();
        let slot = Appointment::available(contract.id.clone(), at(9, 0), at(9, 30), 1500.0);
        db.insert_appointment(&slot).unwrap();

        assert!(db.book_appointment_slot(&slot.id, &patient.id).unwrap());
        // Second booking sees status = booked and changes nothing
        assert!(!db.book_appointment_slot(&slot.id, &patient.id).unwrap());

        let booked = db.get_appointment(&slot.id).unwrap().unwrap();
        assert_eq!(booked.status, AppointmentStatus::Booked);
        assert_eq!(booked.patient_id.as_deref(), Some(patient.id.as_str()));
        assert_eq!(db.list_appointments_for_patient(&patient.id).unwrap().len(), 1);
    }

    #[test]
    fn test_complete_requires_booked() {
        let (db, contract, patient) = setup_db();
        let slot = Appointment::available(contract.id.clone(), at(9, 0), at(9, 30), 1500.0);
        db.insert_appointment(&slot).unwrap();

        assert!(!db.complete_appointment_slot(&slot.id, "Healthy skin").unwrap());
        db.book_appointment_slot(&slot.id, &patient.id).unwrap();
        assert!(db.complete_appointment_slot(&slot.id, "Healthy skin").unwrap());

        let done = db.get_appointment(&slot.id).unwrap().unwrap();
        assert_eq!(done.status, AppointmentStatus::TookPlace);
        assert_eq!(done.report.as_deref(), Some("Healthy skin"));
    }

    #[test]
    fn test_transition_checks_expected_status() {
        let (db, contract, _) = setup_db();
        let slot = Appointment::available(contract.id.clone(), at(9, 0), at(9, 30), 1500.0);
        db.insert_appointment(&slot).unwrap();

        assert!(!db
            .transition_appointment(&slot.id, AppointmentStatus::Booked, AppointmentStatus::Cancelled)
            .unwrap());
        assert!(db
            .transition_appointment(&slot.id, AppointmentStatus::Available, AppointmentStatus::Cancelled)
            .unwrap());
    }
}
