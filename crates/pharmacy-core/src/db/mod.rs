//! Database layer for the pharmacy core.

mod schema;
mod appointments;
mod categories;
mod contracts;
mod leave;
mod people;
mod pharmacies;
mod reservations;
mod settings;

pub use schema::*;

use std::path::Path;
use std::time::Duration;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use thiserror::Error;

use crate::models::{AppointmentStatus, EmployeeRole, LeaveStatus, ReservationStatus};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        // The scheduler process and the API process share the file.
        conn.busy_timeout(Duration::from_secs(5))?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one write transaction.
    ///
    /// Commits when `f` returns `Ok`; any `Err` rolls back every statement
    /// `f` executed. Must not be nested.
    pub fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E>,
        E: From<DbError>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        let value = f(self)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }
}

/// Stores enums as their lowercase text form.
macro_rules! text_column {
    ($($ty:ty),* $(,)?) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    )*};
}

text_column!(AppointmentStatus, LeaveStatus, ReservationStatus, EmployeeRole);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_open_on_disk_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pharmacy.db");

        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .execute("INSERT INTO pharmacies (id, name) VALUES ('p1', 'Benu')", [])
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let name: String = db
            .conn()
            .query_row("SELECT name FROM pharmacies WHERE id = 'p1'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "Benu");
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        // Check that tables exist
        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in [
            "appointments",
            "employees",
            "employment_contracts",
            "leave_requests",
            "medicine_purchases",
            "medicine_reservations",
            "medicine_stock",
            "medicines",
            "patient_categories",
            "patients",
            "pharmacies",
            "reservation_items",
            "system_settings",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_atomically_commits_on_ok() {
        let db = Database::open_in_memory().unwrap();
        let result: DbResult<()> = db.atomically(|db| {
            db.conn()
                .execute("INSERT INTO pharmacies (id, name) VALUES ('p1', 'Benu')", [])?;
            Ok(())
        });
        assert!(result.is_ok());

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM pharmacies", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_atomically_rolls_back_on_err() {
        let db = Database::open_in_memory().unwrap();
        let result: DbResult<()> = db.atomically(|db| {
            db.conn()
                .execute("INSERT INTO pharmacies (id, name) VALUES ('p1', 'Benu')", [])?;
            Err(DbError::Constraint("abort".into()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM pharmacies", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
