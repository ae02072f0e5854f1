//! Shared fixture for the integration tests.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use pharmacy_core::models::MedicineStock;
use pharmacy_core::{
    AppointmentService, ContractService, Database, Employee, EmployeeRole, EmploymentContract,
    FixedClock, LeaveService, LoyaltyService, MemorySink, Medicine, Patient, Pharmacy,
    ReservationService, WorkingWindow,
};

/// A date in June 2021 (the 7th is a Monday).
pub fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 6, day).unwrap()
}

pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    june(day).and_hms_opt(hour, minute, 0).unwrap()
}

/// Monday to Friday, 08:00 - 16:00.
pub fn weekday_hours() -> Vec<WorkingWindow> {
    [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
        .into_iter()
        .map(|day| {
            WorkingWindow::new(
                day,
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            )
        })
        .collect()
}

pub struct World {
    pub db: Database,
    pub clock: FixedClock,
    pub sink: MemorySink,
    pub pharmacy: Pharmacy,
    pub employee: Employee,
    pub contract: EmploymentContract,
    pub patient: Patient,
}

impl World {
    /// One pharmacy, one employee with a running contract, one patient.
    /// The clock starts on Tuesday 2021-06-01 at 08:00.
    pub fn new(role: EmployeeRole) -> Self {
        let db = Database::open_in_memory().unwrap();
        let clock = FixedClock::new(at(1, 8, 0));
        let pharmacy = Pharmacy::new("Benu".into());
        let employee = Employee::new("Mika".into(), "Mikic".into(), "mika@example.com".into(), role);
        let patient = Patient::new("Pera".into(), "Peric".into(), "pera@example.com".into());
        db.insert_pharmacy(&pharmacy).unwrap();
        db.insert_employee(&employee).unwrap();
        db.insert_patient(&patient).unwrap();

        let contract = ContractService::new(&db, &clock)
            .hire(&employee.id, &pharmacy.id, june(1) - chrono::Duration::days(150), weekday_hours())
            .unwrap();

        Self {
            db,
            clock,
            sink: MemorySink::new(),
            pharmacy,
            employee,
            contract,
            patient,
        }
    }

    pub fn appointments(&self) -> AppointmentService<'_> {
        AppointmentService::new(&self.db, &self.clock, &self.sink)
    }

    pub fn leave(&self) -> LeaveService<'_> {
        LeaveService::new(&self.db, &self.clock, &self.sink)
    }

    pub fn reservations(&self) -> ReservationService<'_> {
        ReservationService::new(&self.db, &self.clock, &self.sink)
    }

    pub fn contracts(&self) -> ContractService<'_> {
        ContractService::new(&self.db, &self.clock)
    }

    pub fn loyalty(&self) -> LoyaltyService<'_> {
        LoyaltyService::new(&self.db)
    }

    pub fn add_patient(&self, first_name: &str, email: &str) -> Patient {
        let patient = Patient::new(first_name.into(), "Test".into(), email.into());
        self.db.insert_patient(&patient).unwrap();
        patient
    }

    pub fn add_pharmacy(&self, name: &str) -> Pharmacy {
        let pharmacy = Pharmacy::new(name.into());
        self.db.insert_pharmacy(&pharmacy).unwrap();
        pharmacy
    }

    /// A catalog medicine stocked at `pharmacy`.
    pub fn stock_medicine(&self, pharmacy: &Pharmacy, name: &str, points: i64, quantity: u32, price: f64) -> Medicine {
        let medicine = Medicine::new(name.to_uppercase(), name.into(), points);
        self.db.insert_medicine(&medicine).unwrap();
        self.db
            .upsert_stock(&MedicineStock {
                pharmacy_id: pharmacy.id.clone(),
                medicine_id: medicine.id.clone(),
                quantity,
                price,
            })
            .unwrap();
        medicine
    }

    pub fn stock_of(&self, pharmacy: &Pharmacy, medicine: &Medicine) -> u32 {
        self.db
            .get_stock(&pharmacy.id, &medicine.id)
            .unwrap()
            .unwrap()
            .quantity
    }

    pub fn patient_now(&self, patient: &Patient) -> Patient {
        self.db.get_patient(&patient.id).unwrap().unwrap()
    }
}
