//! Leave request database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{LeaveDaysRequest, LeaveStatus};

const LEAVE_COLUMNS: &str =
    "id, employee_id, from_date, to_date, status, rejection_reason, created_at";

fn read_leave(row: &Row<'_>) -> rusqlite::Result<LeaveDaysRequest> {
    Ok(LeaveDaysRequest {
        id: row.get(0)?,
        employee_id: row.get(1)?,
        from: row.get(2)?,
        to: row.get(3)?,
        status: row.get(4)?,
        rejection_reason: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl Database {
    /// Insert a new leave request.
    pub fn insert_leave_request(&self, request: &LeaveDaysRequest) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO leave_requests (
                id, employee_id, from_date, to_date, status, rejection_reason, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                request.id,
                request.employee_id,
                request.from,
                request.to,
                request.status,
                request.rejection_reason,
                request.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a leave request by ID.
    pub fn get_leave_request(&self, id: &str) -> DbResult<Option<LeaveDaysRequest>> {
        self.conn
            .query_row(
                &format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"),
                [id],
                read_leave,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All requests of an employee, earliest leave first.
    pub fn list_leave_requests_for_employee(&self, employee_id: &str) -> DbResult<Vec<LeaveDaysRequest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE employee_id = ? ORDER BY from_date"
        ))?;
        let rows = stmt.query_map([employee_id], read_leave)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Pending requests whose first leave day is on or before `day`.
    pub fn list_pending_started_leave_requests(&self, day: NaiveDate) -> DbResult<Vec<LeaveDaysRequest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE status = ?1 AND from_date <= ?2 ORDER BY from_date"
        ))?;
        let rows = stmt.query_map(params![LeaveStatus::Pending, day], read_leave)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Approve a request that is still pending.
    pub fn approve_leave_request(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE leave_requests SET status = ?2 WHERE id = ?1 AND status = ?3",
            params![id, LeaveStatus::Approved, LeaveStatus::Pending],
        )?;
        Ok(rows_affected > 0)
    }

    /// Reject a request that is still pending, storing the reason.
    pub fn reject_leave_request(&self, id: &str, reason: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE leave_requests SET status = ?2, rejection_reason = ?3
            WHERE id = ?1 AND status = ?4
            "#,
            params![id, LeaveStatus::Rejected, reason, LeaveStatus::Pending],
        )?;
        Ok(rows_affected > 0)
    }
}
