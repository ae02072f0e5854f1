//! Employee and patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Employee, Patient};

const PATIENT_COLUMNS: &str =
    "id, first_name, last_name, email, num_points, num_penalties, category_id";

fn read_employee(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
    })
}

fn read_patient(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        num_points: row.get(4)?,
        num_penalties: row.get(5)?,
        category_id: row.get(6)?,
    })
}

impl Database {
    /// Insert a new employee.
    pub fn insert_employee(&self, employee: &Employee) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO employees (id, first_name, last_name, email, role)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                employee.id,
                employee.first_name,
                employee.last_name,
                employee.email,
                employee.role,
            ],
        )?;
        Ok(())
    }

    /// Get an employee by ID.
    pub fn get_employee(&self, id: &str) -> DbResult<Option<Employee>> {
        self.conn
            .query_row(
                "SELECT id, first_name, last_name, email, role FROM employees WHERE id = ?",
                [id],
                read_employee,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, first_name, last_name, email, num_points, num_penalties, category_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                patient.id,
                patient.first_name,
                patient.last_name,
                patient.email,
                patient.num_points,
                patient.num_penalties,
                patient.category_id,
            ],
        )?;
        Ok(())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?"),
                [id],
                read_patient,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY last_name, first_name"
        ))?;
        let rows = stmt.query_map([], read_patient)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Add `delta` points (may be negative) to a patient.
    pub fn add_patient_points(&self, id: &str, delta: i64) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET num_points = num_points + ?2 WHERE id = ?1",
            params![id, delta],
        )?;
        Ok(rows_affected > 0)
    }

    /// Increment the patient's penalty counter by one.
    pub fn add_patient_penalty(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET num_penalties = num_penalties + 1 WHERE id = ?",
            [id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Store the category cached on the patient row.
    pub fn set_patient_category(&self, id: &str, category_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET category_id = ?2 WHERE id = ?1",
            params![id, category_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Number of patients currently placed in a category.
    pub fn count_patients_in_category(&self, category_id: &str) -> DbResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE category_id = ?",
            [category_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmployeeRole, DEFAULT_CATEGORY_ID};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get_employee() {
        let db = setup_db();
        let employee = Employee::new(
            "Marko".into(),
            "Markovic".into(),
            "marko@example.com".into(),
            EmployeeRole::Dermatologist,
        );
        db.insert_employee(&employee).unwrap();

        let retrieved = db.get_employee(&employee.id).unwrap().unwrap();
        assert_eq!(retrieved, employee);
        assert!(db.get_employee("missing").unwrap().is_none());
    }

    #[test]
    fn test_patient_points_and_penalties() {
        let db = setup_db();
        let patient = Patient::new("Ivana".into(), "Mandic".into(), "ivana@example.com".into());
        db.insert_patient(&patient).unwrap();

        assert!(db.add_patient_points(&patient.id, 150).unwrap());
        assert!(db.add_patient_penalty(&patient.id).unwrap());
        assert!(db.add_patient_penalty(&patient.id).unwrap());

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved.num_points, 150);
        assert_eq!(retrieved.num_penalties, 2);
        assert_eq!(retrieved.category_id, DEFAULT_CATEGORY_ID);
    }

    #[test]
    fn test_count_patients_in_category() {
        let db = setup_db();
        db.insert_patient(&Patient::new("A".into(), "A".into(), "a@example.com".into()))
            .unwrap();
        db.insert_patient(&Patient::new("B".into(), "B".into(), "b@example.com".into()))
            .unwrap();

        assert_eq!(db.count_patients_in_category(DEFAULT_CATEGORY_ID).unwrap(), 2);
        assert_eq!(db.list_patients().unwrap().len(), 2);
    }

    #[test]
    fn test_updates_on_missing_patient_report_false() {
        let db = setup_db();
        assert!(!db.add_patient_points("missing", 10).unwrap());
        assert!(!db.add_patient_penalty("missing").unwrap());
    }
}
