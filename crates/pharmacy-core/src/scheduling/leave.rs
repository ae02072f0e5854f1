//! Leave-day requests and the daily sweep over stale ones.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::appointments::cancel_for_leave;
use crate::clock::Clock;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{LeaveDaysRequest, LeaveStatus, AUTO_REJECTION_REASON};
use crate::notify::{self, NotificationSink, Outbox};

/// Outcome of answering a leave request.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveDecision {
    pub request: LeaveDaysRequest,
    /// Appointments cancelled because of the approval
    pub cancelled_appointments: usize,
}

/// Leave-day requests and the daily sweep over stale ones.
pub struct LeaveService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
    sink: &'a dyn NotificationSink,
}

impl<'a> LeaveService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock, sink: &'a dyn NotificationSink) -> Self {
        Self { db, clock, sink }
    }

    pub fn get(&self, request_id: &str) -> ServiceResult<LeaveDaysRequest> {
        self.db
            .get_leave_request(request_id)?
            .ok_or_else(|| ServiceError::not_found("Leave request", request_id))
    }

    pub fn list_for_employee(&self, employee_id: &str) -> ServiceResult<Vec<LeaveDaysRequest>> {
        Ok(self.db.list_leave_requests_for_employee(employee_id)?)
    }

    /// File a pending request for the days `[from, to]`.
    pub fn create_request(&self, employee_id: &str, from: NaiveDate, to: NaiveDate) -> ServiceResult<LeaveDaysRequest> {
        if from > to {
            return Err(ServiceError::InvalidRange("Leave must start before it ends".into()));
        }
        let now = self.clock.now();
        if from < now.date() {
            return Err(ServiceError::InvalidRange("Leave cannot start in the past".into()));
        }

        self.db.atomically(|db| {
            if db.get_employee(employee_id)?.is_none() {
                return Err(ServiceError::not_found("Employee", employee_id));
            }
            let clash = db
                .list_leave_requests_for_employee(employee_id)?
                .into_iter()
                .find(|r| r.is_live() && r.overlaps_days(from, to));
            if let Some(existing) = clash {
                return Err(ServiceError::Conflict(format!(
                    "Overlaps {} leave request {} ({} - {})",
                    existing.status, existing.id, existing.from, existing.to
                )));
            }

            let request = LeaveDaysRequest::new(employee_id.to_string(), from, to, now);
            db.insert_leave_request(&request)?;
            info!(request = %request.id, employee = %employee_id, %from, %to, "Leave requested");
            Ok(request)
        })
    }

    /// Approve or reject a pending request.
    ///
    /// Approval cancels the employee's open appointments during the leave on
    /// every contract, in the same transaction.
    pub fn respond(
        &self,
        request_id: &str,
        approved: bool,
        rejection_reason: Option<&str>,
    ) -> ServiceResult<LeaveDecision> {
        let reason = match rejection_reason.map(str::trim) {
            _ if approved => None,
            Some(reason) if !reason.is_empty() => Some(reason.to_string()),
            _ => {
                return Err(ServiceError::Validation(
                    "A rejection reason is required".into(),
                ))
            }
        };
        let mut outbox = Outbox::new();

        let decision = self.db.atomically(|db| {
            let mut request = db
                .get_leave_request(request_id)?
                .ok_or_else(|| ServiceError::not_found("Leave request", request_id))?;
            if request.status != LeaveStatus::Pending {
                return Err(ServiceError::InvalidState(format!(
                    "Leave request is already {}",
                    request.status
                )));
            }
            let employee = db
                .get_employee(&request.employee_id)?
                .ok_or_else(|| ServiceError::not_found("Employee", &request.employee_id))?;

            let mut cancelled_appointments = 0;
            match &reason {
                None => {
                    if !db.approve_leave_request(request_id)? {
                        return Err(ServiceError::InvalidState("Leave request changed concurrently".into()));
                    }
                    request.status = LeaveStatus::Approved;
                    for contract in db.list_contracts_for_employee(&employee.id)? {
                        if contract.overlaps_days(request.from, request.to) {
                            cancelled_appointments +=
                                cancel_for_leave(db, &contract, request.from, request.to, &mut outbox)?;
                        }
                    }
                }
                Some(reason) => {
                    if !db.reject_leave_request(request_id, reason)? {
                        return Err(ServiceError::InvalidState("Leave request changed concurrently".into()));
                    }
                    request.status = LeaveStatus::Rejected;
                    request.rejection_reason = Some(reason.clone());
                }
            }

            outbox.push(notify::leave_response(&request, &employee));
            info!(
                request = %request.id,
                status = %request.status,
                cancelled_appointments,
                "Responded to leave request"
            );
            Ok(LeaveDecision {
                request,
                cancelled_appointments,
            })
        })?;

        outbox.dispatch(self.sink);
        Ok(decision)
    }

    /// Reject every request still pending on or after its first leave day.
    ///
    /// Only rows that are pending at evaluation time change, so running it
    /// again, or alongside an administrator's answer, rejects nothing twice.
    /// Returns the number of requests rejected by this run.
    pub fn reject_pending_started_leave_requests(&self) -> ServiceResult<usize> {
        let today = self.clock.today();
        let mut outbox = Outbox::new();

        let rejected = self.db.atomically(|db| {
            let mut rejected = 0;
            for mut request in db.list_pending_started_leave_requests(today)? {
                if !db.reject_leave_request(&request.id, AUTO_REJECTION_REASON)? {
                    debug!(request = %request.id, "Leave request no longer pending");
                    continue;
                }
                rejected += 1;
                request.status = LeaveStatus::Rejected;
                request.rejection_reason = Some(AUTO_REJECTION_REASON.to_string());

                if let Some(employee) = db.get_employee(&request.employee_id)? {
                    outbox.push(notify::leave_response(&request, &employee));
                }
            }
            Ok::<_, ServiceError>(rejected)
        })?;

        info!(%today, rejected, "Rejected stale pending leave requests");
        outbox.dispatch(self.sink);
        Ok(rejected)
    }
}
