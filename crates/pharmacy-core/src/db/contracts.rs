//! Employment contract database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{EmploymentContract, WorkingWindow};

const CONTRACT_COLUMNS: &str = "id, employee_id, pharmacy_id, valid_from, valid_to, working_hours";

impl Database {
    /// Insert a new contract.
    pub fn insert_contract(&self, contract: &EmploymentContract) -> DbResult<()> {
        let working_hours_json = serde_json::to_string(&contract.working_hours)?;

        self.conn.execute(
            r#"
            INSERT INTO employment_contracts (
                id, employee_id, pharmacy_id, valid_from, valid_to, working_hours
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                contract.id,
                contract.employee_id,
                contract.pharmacy_id,
                contract.valid_from,
                contract.valid_to,
                working_hours_json,
            ],
        )?;
        Ok(())
    }

    /// Get a contract by ID.
    pub fn get_contract(&self, id: &str) -> DbResult<Option<EmploymentContract>> {
        self.conn
            .query_row(
                &format!("SELECT {CONTRACT_COLUMNS} FROM employment_contracts WHERE id = ?"),
                [id],
                read_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List every contract of an employee, oldest first.
    pub fn list_contracts_for_employee(&self, employee_id: &str) -> DbResult<Vec<EmploymentContract>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM employment_contracts WHERE employee_id = ? ORDER BY valid_from"
        ))?;

        let rows = stmt.query_map([employee_id], read_row)?;

        let mut contracts = Vec::new();
        for row in rows {
            contracts.push(row?.try_into()?);
        }
        Ok(contracts)
    }

    /// Set the end date of a running contract.
    pub fn terminate_contract(&self, id: &str, valid_to: NaiveDate) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE employment_contracts SET valid_to = ?2 WHERE id = ?1 AND valid_to IS NULL",
            params![id, valid_to],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct ContractRow {
    id: String,
    employee_id: String,
    pharmacy_id: String,
    valid_from: NaiveDate,
    valid_to: Option<NaiveDate>,
    working_hours: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<ContractRow> {
    Ok(ContractRow {
        id: row.get(0)?,
        employee_id: row.get(1)?,
        pharmacy_id: row.get(2)?,
        valid_from: row.get(3)?,
        valid_to: row.get(4)?,
        working_hours: row.get(5)?,
    })
}

impl TryFrom<ContractRow> for EmploymentContract {
    type Error = DbError;

    fn try_from(row: ContractRow) -> Result<Self, Self::Error> {
        let working_hours: Vec<WorkingWindow> = serde_json::from_str(&row.working_hours)?;

        Ok(EmploymentContract {
            id: row.id,
            employee_id: row.employee_id,
            pharmacy_id: row.pharmacy_id,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            working_hours,
        })
    }
}
