//! Appointment slots: scheduling, booking, completion and leave cancellation.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::interval::day_span;
use crate::loyalty;
use crate::models::{
    Appointment, AppointmentStatus, Employee, EmploymentContract, LeaveStatus, Pharmacy,
};
use crate::notify::{self, NotificationSink, Outbox};

/// Employee and pharmacy behind a contract, for messages and point awards.
fn contract_parties(db: &Database, contract: &EmploymentContract) -> ServiceResult<(Employee, Pharmacy)> {
    let employee = db
        .get_employee(&contract.employee_id)?
        .ok_or_else(|| ServiceError::not_found("Employee", &contract.employee_id))?;
    let pharmacy = db
        .get_pharmacy(&contract.pharmacy_id)?
        .ok_or_else(|| ServiceError::not_found("Pharmacy", &contract.pharmacy_id))?;
    Ok((employee, pharmacy))
}

/// Cancel every open slot of `contract` that touches the leave days
/// `[from, to]`. Patients of booked slots get a notice through `outbox`.
///
/// Runs in the caller's transaction. Returns the number of cancelled slots.
pub(crate) fn cancel_for_leave(
    db: &Database,
    contract: &EmploymentContract,
    from: NaiveDate,
    to: NaiveDate,
    outbox: &mut Outbox,
) -> ServiceResult<usize> {
    let (leave_start, leave_end) = day_span(from, to);
    let affected: Vec<Appointment> = db
        .list_appointments_for_contract(&contract.id)?
        .into_iter()
        .filter(|a| a.is_open() && a.overlaps(leave_start, leave_end))
        .collect();
    if affected.is_empty() {
        return Ok(0);
    }

    let (employee, pharmacy) = contract_parties(db, contract)?;
    let mut cancelled = 0;
    for mut appointment in affected {
        if !db.transition_appointment(&appointment.id, appointment.status, AppointmentStatus::Cancelled)? {
            continue;
        }
        cancelled += 1;

        if appointment.status == AppointmentStatus::Booked {
            if let Some(patient_id) = &appointment.patient_id {
                let patient = db
                    .get_patient(patient_id)?
                    .ok_or_else(|| ServiceError::not_found("Patient", patient_id))?;
                appointment.status = AppointmentStatus::Cancelled;
                outbox.push(notify::appointment_cancelled(&appointment, &patient, &employee, &pharmacy));
            }
        }
        info!(appointment = %appointment.id, contract = %contract.id, "Cancelled appointment due to leave");
    }
    Ok(cancelled)
}

/// Appointment slot lifecycle: schedule, book, complete, cancel.
pub struct AppointmentService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
    sink: &'a dyn NotificationSink,
}

impl<'a> AppointmentService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock, sink: &'a dyn NotificationSink) -> Self {
        Self { db, clock, sink }
    }

    pub fn get(&self, appointment_id: &str) -> ServiceResult<Appointment> {
        self.db
            .get_appointment(appointment_id)?
            .ok_or_else(|| ServiceError::not_found("Appointment", appointment_id))
    }

    pub fn list_for_contract(&self, contract_id: &str) -> ServiceResult<Vec<Appointment>> {
        Ok(self.db.list_appointments_for_contract(contract_id)?)
    }

    pub fn list_for_patient(&self, patient_id: &str) -> ServiceResult<Vec<Appointment>> {
        Ok(self.db.list_appointments_for_patient(patient_id)?)
    }

    /// Open a bookable slot `[from, to)` on a contract.
    pub fn schedule_available(
        &self,
        contract_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
        price: f64,
    ) -> ServiceResult<Appointment> {
        if from >= to {
            return Err(ServiceError::InvalidRange("Appointment must start before it ends".into()));
        }
        if from < self.clock.now() {
            return Err(ServiceError::InvalidRange("Appointment cannot start in the past".into()));
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(ServiceError::Validation("Price must be positive".into()));
        }

        self.db.atomically(|db| {
            let contract = db
                .get_contract(contract_id)?
                .ok_or_else(|| ServiceError::not_found("Contract", contract_id))?;
            if !contract.covers_slot(from, to) {
                return Err(ServiceError::InvalidRange(
                    "Slot is outside the contract's working hours".into(),
                ));
            }

            let on_leave = db
                .list_leave_requests_for_employee(&contract.employee_id)?
                .iter()
                .any(|r| r.status == LeaveStatus::Approved && r.covers(from, to));
            if on_leave {
                return Err(ServiceError::Conflict("Employee is on leave at that time".into()));
            }

            let clash = db
                .list_appointments_for_contract(contract_id)?
                .into_iter()
                .find(|a| a.occupies_time() && a.overlaps(from, to));
            if let Some(existing) = clash {
                debug!(contract = %contract_id, existing = %existing.id, "Rejected overlapping slot");
                return Err(ServiceError::Conflict(format!(
                    "Slot overlaps appointment {} ({} - {})",
                    existing.id, existing.from, existing.to
                )));
            }

            let appointment = Appointment::available(contract_id.to_string(), from, to, price);
            db.insert_appointment(&appointment)?;
            info!(
                appointment = %appointment.id,
                contract = %contract_id,
                %from,
                %to,
                "Scheduled available appointment"
            );
            Ok(appointment)
        })
    }

    /// Reserve an available future slot for a patient.
    pub fn book(&self, appointment_id: &str, patient_id: &str) -> ServiceResult<Appointment> {
        let now = self.clock.now();
        let mut outbox = Outbox::new();

        let booked = self.db.atomically(|db| {
            let mut appointment = db
                .get_appointment(appointment_id)?
                .ok_or_else(|| ServiceError::not_found("Appointment", appointment_id))?;
            if appointment.status != AppointmentStatus::Available {
                return Err(ServiceError::InvalidState(format!(
                    "Appointment is {}, not available",
                    appointment.status
                )));
            }
            if appointment.from <= now {
                return Err(ServiceError::InvalidRange("Appointment has already started".into()));
            }

            let patient = db
                .get_patient(patient_id)?
                .ok_or_else(|| ServiceError::not_found("Patient", patient_id))?;
            let settings = db.get_settings()?;
            if patient.num_penalties >= settings.max_penalties {
                return Err(ServiceError::InvalidState(format!(
                    "Patient has {} penalties and cannot book",
                    patient.num_penalties
                )));
            }
            let double_booked = db
                .list_appointments_for_patient(patient_id)?
                .iter()
                .any(|a| {
                    a.status == AppointmentStatus::Booked && a.overlaps(appointment.from, appointment.to)
                });
            if double_booked {
                return Err(ServiceError::Conflict(
                    "Patient already has an appointment at that time".into(),
                ));
            }

            if !db.book_appointment_slot(appointment_id, patient_id)? {
                return Err(ServiceError::InvalidState("Appointment was booked concurrently".into()));
            }
            appointment.status = AppointmentStatus::Booked;
            appointment.patient_id = Some(patient_id.to_string());

            let contract = db
                .get_contract(&appointment.contract_id)?
                .ok_or_else(|| ServiceError::not_found("Contract", &appointment.contract_id))?;
            let (employee, pharmacy) = contract_parties(db, &contract)?;
            outbox.push(notify::booking_confirmation(&appointment, &patient, &employee, &pharmacy));
            Ok(appointment)
        })?;

        info!(appointment = %booked.id, patient = %patient_id, "Booked appointment");
        outbox.dispatch(self.sink);
        Ok(booked)
    }

    /// Close a booked slot that has ended, store the report and credit the
    /// patient's loyalty points.
    pub fn complete_with_report(&self, appointment_id: &str, report: &str) -> ServiceResult<Appointment> {
        if report.trim().is_empty() {
            return Err(ServiceError::Validation("Report must not be blank".into()));
        }
        let now = self.clock.now();

        self.db.atomically(|db| {
            let mut appointment = db
                .get_appointment(appointment_id)?
                .ok_or_else(|| ServiceError::not_found("Appointment", appointment_id))?;
            if appointment.status != AppointmentStatus::Booked {
                return Err(ServiceError::InvalidState(format!(
                    "Appointment is {}, not booked",
                    appointment.status
                )));
            }
            if appointment.to > now {
                return Err(ServiceError::InvalidRange("Appointment has not ended yet".into()));
            }
            let Some(patient_id) = appointment.patient_id.clone() else {
                return Err(ServiceError::InvalidState("Booked appointment has no patient".into()));
            };

            if !db.complete_appointment_slot(appointment_id, report)? {
                return Err(ServiceError::InvalidState("Appointment changed concurrently".into()));
            }

            let contract = db
                .get_contract(&appointment.contract_id)?
                .ok_or_else(|| ServiceError::not_found("Contract", &appointment.contract_id))?;
            let (employee, _) = contract_parties(db, &contract)?;
            let points = db.get_settings()?.appointment_points(employee.role);
            let category = loyalty::credit_points(db, &patient_id, points)?;

            appointment.status = AppointmentStatus::TookPlace;
            appointment.report = Some(report.to_string());
            info!(
                appointment = %appointment.id,
                patient = %patient_id,
                points,
                category = %category.name,
                "Appointment took place"
            );
            Ok(appointment)
        })
    }

    /// Cancel the open slots of a contract during leave days `[from, to]`.
    pub fn cancel_due_to_leave(&self, contract_id: &str, from: NaiveDate, to: NaiveDate) -> ServiceResult<usize> {
        if from > to {
            return Err(ServiceError::InvalidRange("Leave must start before it ends".into()));
        }
        let mut outbox = Outbox::new();

        let cancelled = self.db.atomically(|db| {
            let contract = db
                .get_contract(contract_id)?
                .ok_or_else(|| ServiceError::not_found("Contract", contract_id))?;
            cancel_for_leave(db, &contract, from, to, &mut outbox)
        })?;

        outbox.dispatch(self.sink);
        Ok(cancelled)
    }
}
