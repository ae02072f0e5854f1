//! Service boundary tests: permission checks and string-typed inputs.

use std::sync::Arc;

use chrono::NaiveDate;
use pharmacy_core::{
    Database, FfiEmployeeRole, FfiPrincipal, FfiReservationRequestItem, FfiRole, FfiSettings,
    FfiWorkingWindow, FixedClock, MemorySink, PharmacyCore, PharmacyError,
};

struct Setup {
    core: PharmacyCore,
    clock: Arc<FixedClock>,
    sink: Arc<MemorySink>,
}

fn setup() -> Setup {
    let now = NaiveDate::from_ymd_opt(2021, 6, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    let clock = Arc::new(FixedClock::new(now));
    let sink = Arc::new(MemorySink::new());
    let core = PharmacyCore::with_parts(Database::open_in_memory().unwrap(), clock.clone(), sink.clone());
    Setup { core, clock, sink }
}

fn principal(id: &str, role: FfiRole) -> FfiPrincipal {
    FfiPrincipal {
        id: id.to_string(),
        role,
    }
}

fn sysadmin() -> FfiPrincipal {
    principal("root", FfiRole::SystemAdmin)
}

fn pharmacy_admin() -> FfiPrincipal {
    principal("manager", FfiRole::PharmacyAdmin)
}

fn weekdays() -> Vec<FfiWorkingWindow> {
    ["Mon", "Tue", "Wed", "Thu", "Fri"]
        .into_iter()
        .map(|day| FfiWorkingWindow {
            day: day.to_string(),
            start: "08:00".to_string(),
            end: "16:00".to_string(),
        })
        .collect()
}

#[test]
fn test_roles_are_checked_before_anything_runs() {
    let s = setup();
    let patient = principal("p1", FfiRole::Patient);

    let err = s.core.create_pharmacy(patient.clone(), "Benu".into()).unwrap_err();
    assert!(matches!(err, PharmacyError::Forbidden(_)));
    let err = s
        .core
        .schedule_appointment(patient, "c1".into(), "2021-06-07T09:00".into(), "2021-06-07T09:30".into(), 1.0)
        .unwrap_err();
    assert!(matches!(err, PharmacyError::Forbidden(_)));

    let err = s.core.run_leave_sweep(pharmacy_admin()).unwrap_err();
    assert!(matches!(err, PharmacyError::Forbidden(_)));
}

#[test]
fn test_full_appointment_flow() {
    let s = setup();
    let pharmacy = s.core.create_pharmacy(sysadmin(), "Benu".into()).unwrap();
    let employee = s
        .core
        .register_employee(
            sysadmin(),
            "Mika".into(),
            "Mikic".into(),
            "mika@example.com".into(),
            FfiEmployeeRole::Dermatologist,
        )
        .unwrap();
    let patient = s
        .core
        .register_patient(sysadmin(), "Pera".into(), "Peric".into(), "pera@example.com".into())
        .unwrap();
    let contract = s
        .core
        .hire(pharmacy_admin(), employee.id.clone(), pharmacy.id, "2021-01-01".into(), weekdays())
        .unwrap();
    assert_eq!(contract.working_hours[0].day, "Mon");

    let slot = s
        .core
        .schedule_appointment(
            pharmacy_admin(),
            contract.id,
            "2021-06-07T09:00".into(),
            "2021-06-07T09:30:00".into(),
            1500.0,
        )
        .unwrap();
    assert_eq!(slot.from, "2021-06-07T09:00:00");
    assert_eq!(slot.status, "available");

    let booked = s
        .core
        .book_appointment(principal(&patient.id, FfiRole::Patient), slot.id.clone())
        .unwrap();
    assert_eq!(booked.patient_id.as_deref(), Some(patient.id.as_str()));
    assert_eq!(s.sink.sent_to("pera@example.com").len(), 1);

    s.clock.set(
        NaiveDate::from_ymd_opt(2021, 6, 7)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
    );
    let stranger = principal("someone-else", FfiRole::Dermatologist);
    let err = s
        .core
        .complete_appointment(stranger, slot.id.clone(), "Report".into())
        .unwrap_err();
    assert!(matches!(err, PharmacyError::Forbidden(_)));

    let done = s
        .core
        .complete_appointment(principal(&employee.id, FfiRole::Dermatologist), slot.id, "Report".into())
        .unwrap();
    assert_eq!(done.status, "took_place");
    assert_eq!(s.core.get_patient(patient.id).unwrap().unwrap().num_points, 3);
}

#[test]
fn test_malformed_inputs_are_validation_errors() {
    let s = setup();
    let err = s
        .core
        .request_leave(principal("e1", FfiRole::Pharmacist), "10.06.2021".into(), "2021-06-12".into())
        .unwrap_err();
    assert!(matches!(err, PharmacyError::Validation(_)));

    let mut hours = weekdays();
    hours[0].day = "Moonday".into();
    let err = s
        .core
        .hire(pharmacy_admin(), "e1".into(), "p1".into(), "2021-01-01".into(), hours)
        .unwrap_err();
    assert!(matches!(err, PharmacyError::Validation(_)));
}

#[test]
fn test_pharmacist_issues_only_at_own_pharmacy() {
    let s = setup();
    let benu = s.core.create_pharmacy(sysadmin(), "Benu".into()).unwrap();
    let other = s.core.create_pharmacy(sysadmin(), "Jankovic".into()).unwrap();
    let brufen = s.core.create_medicine(sysadmin(), "BRF".into(), "Brufen".into(), 5).unwrap();
    s.core
        .set_stock(pharmacy_admin(), benu.id.clone(), brufen.id.clone(), 5, 300.0)
        .unwrap();
    let patient = s
        .core
        .register_patient(sysadmin(), "Pera".into(), "Peric".into(), "pera@example.com".into())
        .unwrap();
    let make_pharmacist = |email: &str, pharmacy_id: String| {
        let employee = s
            .core
            .register_employee(sysadmin(), "Ana".into(), "Ilic".into(), email.into(), FfiEmployeeRole::Pharmacist)
            .unwrap();
        s.core
            .hire(pharmacy_admin(), employee.id.clone(), pharmacy_id, "2021-01-01".into(), weekdays())
            .unwrap();
        principal(&employee.id, FfiRole::Pharmacist)
    };
    let at_benu = make_pharmacist("ana@example.com", benu.id.clone());
    let elsewhere = make_pharmacist("iva@example.com", other.id);

    let reservation = s
        .core
        .reserve_medicines(
            principal(&patient.id, FfiRole::Patient),
            benu.id.clone(),
            vec![FfiReservationRequestItem {
                medicine_id: brufen.id.clone(),
                quantity: 2,
            }],
        )
        .unwrap();
    assert_eq!(s.core.stock_quantity(benu.id.clone(), brufen.id.clone()).unwrap(), Some(3));

    let err = s.core.issue_reservation(elsewhere, reservation.id.clone()).unwrap_err();
    assert!(matches!(err, PharmacyError::NotFound(_)));

    let issued = s.core.issue_reservation(at_benu, reservation.id).unwrap();
    assert_eq!(issued.status, "issued");

    let status = s.core.loyalty_status(patient.id.clone()).unwrap();
    assert_eq!(status.category.id, "default");
    assert!(status.next_category.is_none());
    assert_eq!(
        s.core
            .my_reservations(principal(&patient.id, FfiRole::Patient))
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_settings_update_is_validated() {
    let s = setup();
    let mut settings = s.core.get_settings().unwrap();
    assert_eq!(settings.reservation_horizon_hours, 48);

    settings.reservation_horizon_hours = 0;
    let err = s.core.update_settings(sysadmin(), settings.clone()).unwrap_err();
    assert!(matches!(err, PharmacyError::Validation(_)));

    let updated = FfiSettings {
        reservation_horizon_hours: 24,
        ..settings
    };
    s.core.update_settings(sysadmin(), updated).unwrap();
    assert_eq!(s.core.get_settings().unwrap().reservation_horizon_hours, 24);
}

#[test]
fn test_oversized_reservation_horizon_is_rejected() {
    let s = setup();
    let benu = s.core.create_pharmacy(sysadmin(), "Benu".into()).unwrap();
    let brufen = s.core.create_medicine(sysadmin(), "BRF".into(), "Brufen".into(), 5).unwrap();
    s.core
        .set_stock(pharmacy_admin(), benu.id.clone(), brufen.id.clone(), 5, 300.0)
        .unwrap();
    let patient = s
        .core
        .register_patient(sysadmin(), "Pera".into(), "Peric".into(), "pera@example.com".into())
        .unwrap();

    let settings = s.core.get_settings().unwrap();
    for hours in [1_000_000_000_000, 24 * 365 + 1] {
        let err = s
            .core
            .update_settings(
                sysadmin(),
                FfiSettings {
                    reservation_horizon_hours: hours,
                    ..settings.clone()
                },
            )
            .unwrap_err();
        assert!(matches!(err, PharmacyError::Validation(_)));
    }
    assert_eq!(s.core.get_settings().unwrap().reservation_horizon_hours, 48);

    // The core keeps working after the rejected update
    let reservation = s
        .core
        .reserve_medicines(
            principal(&patient.id, FfiRole::Patient),
            benu.id.clone(),
            vec![FfiReservationRequestItem {
                medicine_id: brufen.id.clone(),
                quantity: 1,
            }],
        )
        .unwrap();
    assert_eq!(reservation.status, "reserved");
    assert!(s.core.get_settings().is_ok());
}

#[test]
fn test_pharmacist_issues_at_every_contracted_pharmacy() {
    let s = setup();
    let benu = s.core.create_pharmacy(sysadmin(), "Benu".into()).unwrap();
    let lilly = s.core.create_pharmacy(sysadmin(), "Lilly".into()).unwrap();
    let unrelated = s.core.create_pharmacy(sysadmin(), "Jankovic".into()).unwrap();
    let brufen = s.core.create_medicine(sysadmin(), "BRF".into(), "Brufen".into(), 5).unwrap();
    for pharmacy_id in [&benu.id, &lilly.id, &unrelated.id] {
        s.core
            .set_stock(pharmacy_admin(), pharmacy_id.clone(), brufen.id.clone(), 5, 300.0)
            .unwrap();
    }
    let patient = s
        .core
        .register_patient(sysadmin(), "Pera".into(), "Peric".into(), "pera@example.com".into())
        .unwrap();
    let employee = s
        .core
        .register_employee(
            sysadmin(),
            "Ana".into(),
            "Ilic".into(),
            "ana@example.com".into(),
            FfiEmployeeRole::Pharmacist,
        )
        .unwrap();
    for pharmacy_id in [&benu.id, &lilly.id] {
        s.core
            .hire(pharmacy_admin(), employee.id.clone(), pharmacy_id.clone(), "2021-01-01".into(), weekdays())
            .unwrap();
    }
    let pharmacist = principal(&employee.id, FfiRole::Pharmacist);

    let reserve_at = |pharmacy_id: &str| {
        s.core
            .reserve_medicines(
                principal(&patient.id, FfiRole::Patient),
                pharmacy_id.to_string(),
                vec![FfiReservationRequestItem {
                    medicine_id: brufen.id.clone(),
                    quantity: 1,
                }],
            )
            .unwrap()
    };

    for pharmacy_id in [&benu.id, &lilly.id] {
        let reservation = reserve_at(pharmacy_id);
        let issued = s.core.issue_reservation(pharmacist.clone(), reservation.id).unwrap();
        assert_eq!(issued.status, "issued");
    }

    let foreign = reserve_at(&unrelated.id);
    let err = s.core.issue_reservation(pharmacist, foreign.id).unwrap_err();
    assert!(matches!(err, PharmacyError::NotFound(_)));
}
