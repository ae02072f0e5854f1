//! Message builders for every notification the core sends.

use std::fmt::Write;

use chrono::NaiveDateTime;

use super::Notification;
use crate::models::{
    Appointment, Employee, LeaveDaysRequest, LeaveStatus, MedicineReservation, Patient, Pharmacy,
};

const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";
const DATE_FORMAT: &str = "%d/%m/%Y";

fn stamp(at: NaiveDateTime) -> String {
    at.format(DATE_TIME_FORMAT).to_string()
}

fn sign_off(body: &mut String, pharmacy: &Pharmacy) {
    let _ = write!(body, "\nAll the best,\n{}.", pharmacy.name);
}

/// Confirmation of a booked appointment, worded for the employee's role.
pub fn booking_confirmation(
    appointment: &Appointment,
    patient: &Patient,
    employee: &Employee,
    pharmacy: &Pharmacy,
) -> Notification {
    let title = employee.role.title();
    let mut body = format!("Dear {},\n\n", patient.first_name);
    let _ = writeln!(body, "Id of scheduled appointment with {} is {}\n", title, appointment.id);
    let _ = writeln!(body, "Pharmacy: {}\n", pharmacy.name);
    let _ = writeln!(body, "{}: {}\n", title, employee.full_name());
    let _ = writeln!(body, "Start date and time: {}\n", stamp(appointment.from));
    let _ = writeln!(body, "End date and time: {}", stamp(appointment.to));
    sign_off(&mut body, pharmacy);

    Notification {
        recipient: patient.email.clone(),
        subject: format!(
            "Scheduled {} appointment {} at {}",
            title, appointment.id, pharmacy.name
        ),
        body,
    }
}

/// Notice that a booked appointment was cancelled because of employee leave.
pub fn appointment_cancelled(
    appointment: &Appointment,
    patient: &Patient,
    employee: &Employee,
    pharmacy: &Pharmacy,
) -> Notification {
    let title = employee.role.title();
    let mut body = format!("Dear {},\n\n", patient.first_name);
    let _ = writeln!(
        body,
        "We are sorry to inform you that your appointment {} with {} {} starting at {} has been cancelled, since the {} will be on leave.",
        appointment.id,
        title.to_lowercase(),
        employee.full_name(),
        stamp(appointment.from),
        title.to_lowercase(),
    );
    let _ = writeln!(body, "You are welcome to book another available appointment.");
    sign_off(&mut body, pharmacy);

    Notification {
        recipient: patient.email.clone(),
        subject: format!("Cancelled {} appointment {}", title, appointment.id),
        body,
    }
}

/// Answer to a leave request, with the reason when rejected.
pub fn leave_response(request: &LeaveDaysRequest, employee: &Employee) -> Notification {
    let verdict = match request.status {
        LeaveStatus::Approved => "approved",
        _ => "rejected",
    };
    let mut body = format!("Dear {},\n\n", employee.first_name);
    let _ = write!(
        body,
        "We inform you that your request for leave days in a period {} - {} has been {}.",
        request.from.format(DATE_FORMAT),
        request.to.format(DATE_FORMAT),
        verdict,
    );
    if let Some(reason) = &request.rejection_reason {
        let _ = write!(body, "\nReason: {}", reason);
    }
    body.push_str("\n\nAll the best,\nAdministration.");

    Notification {
        recipient: employee.email.clone(),
        subject: "Leave days request response".into(),
        body,
    }
}

fn item_lines(body: &mut String, reservation: &MedicineReservation) {
    for item in &reservation.items {
        let _ = writeln!(
            body,
            "\t\t{} {} pcs - {:.2}RSD",
            item.medicine_name, item.quantity, item.price
        );
    }
}

/// Confirmation of a new reservation with its pickup deadline.
pub fn reservation_created(
    reservation: &MedicineReservation,
    patient: &Patient,
    pharmacy: &Pharmacy,
) -> Notification {
    let mut body = format!("Dear {},\n\n", patient.first_name);
    let _ = writeln!(body, "Id of reservation is {}\n", reservation.id);
    let _ = writeln!(
        body,
        "The following medicines have been reserved for you with total price of {:.2}RSD :",
        reservation.price
    );
    item_lines(&mut body, reservation);
    let _ = writeln!(body, "\nPlease pick them up before {}.", stamp(reservation.deadline));
    sign_off(&mut body, pharmacy);

    Notification {
        recipient: patient.email.clone(),
        subject: format!("Reservation {} at {}", reservation.id, pharmacy.name),
        body,
    }
}

/// Receipt for an issued reservation.
pub fn reservation_issued(
    reservation: &MedicineReservation,
    patient: &Patient,
    pharmacy: &Pharmacy,
) -> Notification {
    let mut body = format!("Dear {},\n\n", patient.first_name);
    let _ = writeln!(
        body,
        "The following medicines have been issued to you with total price of {:.2}RSD :",
        reservation.price
    );
    item_lines(&mut body, reservation);
    sign_off(&mut body, pharmacy);

    Notification {
        recipient: patient.email.clone(),
        subject: "Issued reservation".into(),
        body,
    }
}
