//! Pharmacy Core Library
//!
//! Staff scheduling, leave days, medicine reservations and patient loyalty
//! for a multi-pharmacy backend.
//!
//! # Architecture
//!
//! ```text
//!   Employment contract (weekly working windows)
//!                 │
//!                 ▼
//!   AVAILABLE slot ──book──▶ BOOKED ──report──▶ TOOK_PLACE ──▶ +points
//!         │                    │                                  │
//!         └──── approved leave ┴──▶ CANCELLED (patient notified)  │
//!                                                                 ▼
//!   reserve ──▶ RESERVED ──issue──▶ ISSUED ──▶ purchases ──▶ +points
//!    (stock −)      │                                             │
//!                   └──deadline──▶ EXPIRED (stock +, penalty)     ▼
//!                                                      category re-evaluation
//! ```
//!
//! Every operation runs in one SQLite transaction. Notifications are queued
//! during the transaction and delivered only after it commits.
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence with compare-and-set status transitions
//! - [`models`]: Domain types (contracts, appointments, leave, reservations)
//! - [`scheduling`]: Contracts, appointment slots and leave-day workflow
//! - [`reservations`]: Medicine reservation, issuance and expiry
//! - [`loyalty`]: Category evaluation and administration
//! - [`notify`]: Notification sinks, outbox and message builders
//! - [`access`]: Role-based permission check

pub mod access;
pub mod clock;
pub mod db;
pub mod error;
pub mod interval;
pub mod loyalty;
pub mod models;
pub mod notify;
pub mod reservations;
pub mod scheduling;
pub mod settings;

// Re-export commonly used types
pub use access::{authorize, Action, Principal, Role};
pub use clock::{Clock, FixedClock, SystemClock};
pub use db::Database;
pub use error::{ServiceError, ServiceResult};
pub use loyalty::{evaluate_category, next_category, LoyaltyService};
pub use models::{
    Appointment, AppointmentStatus, Employee, EmployeeRole, EmploymentContract, LeaveDaysRequest,
    LeaveStatus, Medicine, MedicineReservation, Patient, PatientCategory, Pharmacy,
    ReservationStatus, WorkingWindow,
};
pub use notify::{MemorySink, Notification, NotificationSink, TracingSink};
pub use reservations::ReservationService;
pub use scheduling::{AppointmentService, ContractService, LeaveService};
pub use settings::SystemSettings;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::models::{MedicineStock, ReservationItem, ReservationRequestItem};

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PharmacyError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for PharmacyError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => PharmacyError::Validation(m),
            ServiceError::InvalidRange(m) => PharmacyError::InvalidRange(m),
            ServiceError::Conflict(m) => PharmacyError::Conflict(m),
            ServiceError::InvalidState(m) => PharmacyError::InvalidState(m),
            ServiceError::NotFound(m) => PharmacyError::NotFound(m),
            ServiceError::InsufficientStock(m) => PharmacyError::InsufficientStock(m),
            ServiceError::Forbidden(m) => PharmacyError::Forbidden(m),
            ServiceError::Database(db::DbError::NotFound(m)) => PharmacyError::NotFound(m),
            ServiceError::Database(e) => PharmacyError::Internal(e.to_string()),
        }
    }
}

impl From<db::DbError> for PharmacyError {
    fn from(e: db::DbError) -> Self {
        ServiceError::from(e).into()
    }
}

impl<T> From<std::sync::PoisonError<T>> for PharmacyError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PharmacyError::Internal(format!("Lock poisoned: {}", e))
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, PharmacyError> {
    value
        .parse()
        .map_err(|_| PharmacyError::Validation(format!("Invalid date (YYYY-MM-DD): {}", value)))
}

fn parse_date_time(value: &str) -> Result<NaiveDateTime, PharmacyError> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|_| {
            PharmacyError::Validation(format!("Invalid date-time (YYYY-MM-DDTHH:MM): {}", value))
        })
}

fn parse_time(value: &str) -> Result<NaiveTime, PharmacyError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| PharmacyError::Validation(format!("Invalid time (HH:MM): {}", value)))
}

fn format_date_time(value: NaiveDateTime) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a pharmacy database at the given path.
#[uniffi::export]
pub fn open_pharmacy(path: String) -> Result<Arc<PharmacyCore>, PharmacyError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(PharmacyCore::with_parts(
        db,
        Arc::new(SystemClock),
        Arc::new(TracingSink),
    )))
}

/// Create an in-memory pharmacy database (for testing).
#[uniffi::export]
pub fn open_pharmacy_in_memory() -> Result<Arc<PharmacyCore>, PharmacyError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(PharmacyCore::with_parts(
        db,
        Arc::new(SystemClock),
        Arc::new(TracingSink),
    )))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Service boundary: checks the caller's permission, then runs one
/// business operation on the shared database.
#[derive(uniffi::Object)]
pub struct PharmacyCore {
    db: Arc<Mutex<Database>>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
}

impl PharmacyCore {
    /// Assemble a core around an open database.
    pub fn with_parts(db: Database, clock: Arc<dyn Clock>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            clock,
            sink,
        }
    }

    /// Pharmacy at which the employee may issue the reservation: its own
    /// pharmacy when the employee holds a running contract there.
    fn issuing_pharmacy(
        &self,
        db: &Database,
        employee_id: &str,
        reservation_id: &str,
    ) -> Result<String, PharmacyError> {
        let pharmacies = ContractService::new(db, self.clock.as_ref()).active_pharmacies_of(employee_id)?;
        if pharmacies.is_empty() {
            return Err(PharmacyError::Forbidden("No active contract with any pharmacy".into()));
        }
        db.get_reservation(reservation_id)?
            .map(|r| r.pharmacy_id)
            .filter(|id| pharmacies.contains(id))
            .ok_or_else(|| {
                PharmacyError::NotFound(format!(
                    "No active reservation {} at this pharmacy",
                    reservation_id
                ))
            })
    }
}

#[uniffi::export]
impl PharmacyCore {
    // =========================================================================
    // Registry Operations
    // =========================================================================

    /// Register a pharmacy.
    pub fn create_pharmacy(&self, caller: FfiPrincipal, name: String) -> Result<FfiPharmacy, PharmacyError> {
        authorize(&caller.into(), Action::ManageRegistry)?;
        let db = self.db.lock()?;
        let pharmacy = Pharmacy::new(name);
        db.insert_pharmacy(&pharmacy)?;
        Ok(pharmacy.into())
    }

    /// Add a medicine to the shared catalog.
    pub fn create_medicine(
        &self,
        caller: FfiPrincipal,
        code: String,
        name: String,
        points: i64,
    ) -> Result<FfiMedicine, PharmacyError> {
        authorize(&caller.into(), Action::ManageRegistry)?;
        if points < 0 {
            return Err(PharmacyError::Validation("Medicine points cannot be negative".into()));
        }
        let db = self.db.lock()?;
        let medicine = Medicine::new(code, name, points);
        db.insert_medicine(&medicine)?;
        Ok(medicine.into())
    }

    /// Register a pharmacist or dermatologist.
    pub fn register_employee(
        &self,
        caller: FfiPrincipal,
        first_name: String,
        last_name: String,
        email: String,
        role: FfiEmployeeRole,
    ) -> Result<FfiEmployee, PharmacyError> {
        authorize(&caller.into(), Action::ManageRegistry)?;
        let db = self.db.lock()?;
        let employee = Employee::new(first_name, last_name, email, role.into());
        db.insert_employee(&employee)?;
        Ok(employee.into())
    }

    /// Register a patient in the default category.
    pub fn register_patient(
        &self,
        caller: FfiPrincipal,
        first_name: String,
        last_name: String,
        email: String,
    ) -> Result<FfiPatient, PharmacyError> {
        authorize(&caller.into(), Action::ManageRegistry)?;
        let db = self.db.lock()?;
        let patient = Patient::new(first_name, last_name, email);
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, PharmacyError> {
        let db = self.db.lock()?;
        Ok(db.get_patient(&patient_id)?.map(|p| p.into()))
    }

    /// Set the shelf quantity and price of a medicine at a pharmacy.
    pub fn set_stock(
        &self,
        caller: FfiPrincipal,
        pharmacy_id: String,
        medicine_id: String,
        quantity: u32,
        price: f64,
    ) -> Result<(), PharmacyError> {
        authorize(&caller.into(), Action::ManageStock)?;
        if !price.is_finite() || price <= 0.0 {
            return Err(PharmacyError::Validation("Price must be positive".into()));
        }
        let db = self.db.lock()?;
        db.upsert_stock(&MedicineStock {
            pharmacy_id,
            medicine_id,
            quantity,
            price,
        })?;
        Ok(())
    }

    /// Current shelf quantity of a medicine at a pharmacy.
    pub fn stock_quantity(&self, pharmacy_id: String, medicine_id: String) -> Result<Option<u32>, PharmacyError> {
        let db = self.db.lock()?;
        Ok(db.get_stock(&pharmacy_id, &medicine_id)?.map(|s| s.quantity))
    }

    // =========================================================================
    // Contract Operations
    // =========================================================================

    /// Hire an employee at a pharmacy.
    pub fn hire(
        &self,
        caller: FfiPrincipal,
        employee_id: String,
        pharmacy_id: String,
        valid_from: String,
        working_hours: Vec<FfiWorkingWindow>,
    ) -> Result<FfiContract, PharmacyError> {
        authorize(&caller.into(), Action::ManageContracts)?;
        let valid_from = parse_date(&valid_from)?;
        let working_hours = working_hours
            .into_iter()
            .map(WorkingWindow::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let db = self.db.lock()?;
        let contract = ContractService::new(&db, self.clock.as_ref()).hire(
            &employee_id,
            &pharmacy_id,
            valid_from,
            working_hours,
        )?;
        Ok(contract.into())
    }

    /// End a running contract.
    pub fn terminate_contract(
        &self,
        caller: FfiPrincipal,
        contract_id: String,
        valid_to: String,
    ) -> Result<FfiContract, PharmacyError> {
        authorize(&caller.into(), Action::ManageContracts)?;
        let valid_to = parse_date(&valid_to)?;
        let db = self.db.lock()?;
        let contract = ContractService::new(&db, self.clock.as_ref()).terminate(&contract_id, valid_to)?;
        Ok(contract.into())
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Open a bookable slot on a contract.
    pub fn schedule_appointment(
        &self,
        caller: FfiPrincipal,
        contract_id: String,
        from: String,
        to: String,
        price: f64,
    ) -> Result<FfiAppointment, PharmacyError> {
        authorize(&caller.into(), Action::ScheduleAppointment)?;
        let from = parse_date_time(&from)?;
        let to = parse_date_time(&to)?;
        let db = self.db.lock()?;
        let appointment = AppointmentService::new(&db, self.clock.as_ref(), self.sink.as_ref())
            .schedule_available(&contract_id, from, to, price)?;
        Ok(appointment.into())
    }

    /// Book an available slot for the calling patient.
    pub fn book_appointment(
        &self,
        caller: FfiPrincipal,
        appointment_id: String,
    ) -> Result<FfiAppointment, PharmacyError> {
        let caller: Principal = caller.into();
        authorize(&caller, Action::BookAppointment)?;
        let db = self.db.lock()?;
        let appointment = AppointmentService::new(&db, self.clock.as_ref(), self.sink.as_ref())
            .book(&appointment_id, &caller.id)?;
        Ok(appointment.into())
    }

    /// Close one of the caller's own booked appointments with a report.
    pub fn complete_appointment(
        &self,
        caller: FfiPrincipal,
        appointment_id: String,
        report: String,
    ) -> Result<FfiAppointment, PharmacyError> {
        let caller: Principal = caller.into();
        authorize(&caller, Action::CompleteAppointment)?;
        let db = self.db.lock()?;
        let service = AppointmentService::new(&db, self.clock.as_ref(), self.sink.as_ref());

        let appointment = service.get(&appointment_id)?;
        let owner = db
            .get_contract(&appointment.contract_id)?
            .map(|c| c.employee_id);
        if owner.as_deref() != Some(caller.id.as_str()) {
            return Err(PharmacyError::Forbidden(
                "Only the employee holding the appointment may complete it".into(),
            ));
        }
        Ok(service.complete_with_report(&appointment_id, &report)?.into())
    }

    /// Appointments of the calling patient.
    pub fn my_appointments(&self, caller: FfiPrincipal) -> Result<Vec<FfiAppointment>, PharmacyError> {
        let caller: Principal = caller.into();
        authorize(&caller, Action::BookAppointment)?;
        let db = self.db.lock()?;
        let appointments = AppointmentService::new(&db, self.clock.as_ref(), self.sink.as_ref())
            .list_for_patient(&caller.id)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    /// Slots of a contract, earliest first.
    pub fn contract_appointments(&self, contract_id: String) -> Result<Vec<FfiAppointment>, PharmacyError> {
        let db = self.db.lock()?;
        let appointments = AppointmentService::new(&db, self.clock.as_ref(), self.sink.as_ref())
            .list_for_contract(&contract_id)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    // =========================================================================
    // Leave Operations
    // =========================================================================

    /// File a leave request for the calling employee.
    pub fn request_leave(
        &self,
        caller: FfiPrincipal,
        from: String,
        to: String,
    ) -> Result<FfiLeaveRequest, PharmacyError> {
        let caller: Principal = caller.into();
        authorize(&caller, Action::RequestLeave)?;
        let from = parse_date(&from)?;
        let to = parse_date(&to)?;
        let db = self.db.lock()?;
        let request = LeaveService::new(&db, self.clock.as_ref(), self.sink.as_ref())
            .create_request(&caller.id, from, to)?;
        Ok(request.into())
    }

    /// Approve or reject a pending leave request.
    pub fn respond_to_leave(
        &self,
        caller: FfiPrincipal,
        request_id: String,
        approved: bool,
        rejection_reason: Option<String>,
    ) -> Result<FfiLeaveDecision, PharmacyError> {
        authorize(&caller.into(), Action::RespondToLeave)?;
        let db = self.db.lock()?;
        let decision = LeaveService::new(&db, self.clock.as_ref(), self.sink.as_ref()).respond(
            &request_id,
            approved,
            rejection_reason.as_deref(),
        )?;
        Ok(FfiLeaveDecision {
            request: decision.request.into(),
            cancelled_appointments: decision.cancelled_appointments as u32,
        })
    }

    /// Reject requests still pending after their first day.
    pub fn run_leave_sweep(&self, caller: FfiPrincipal) -> Result<u32, PharmacyError> {
        authorize(&caller.into(), Action::RunMaintenance)?;
        let db = self.db.lock()?;
        let rejected = LeaveService::new(&db, self.clock.as_ref(), self.sink.as_ref())
            .reject_pending_started_leave_requests()?;
        Ok(rejected as u32)
    }

    // =========================================================================
    // Reservation Operations
    // =========================================================================

    /// Reserve medicines at a pharmacy for the calling patient.
    pub fn reserve_medicines(
        &self,
        caller: FfiPrincipal,
        pharmacy_id: String,
        items: Vec<FfiReservationRequestItem>,
    ) -> Result<FfiReservation, PharmacyError> {
        let caller: Principal = caller.into();
        authorize(&caller, Action::ReserveMedicine)?;
        let items: Vec<ReservationRequestItem> = items.into_iter().map(|i| i.into()).collect();
        let db = self.db.lock()?;
        let reservation = ReservationService::new(&db, self.clock.as_ref(), self.sink.as_ref())
            .reserve(&caller.id, &pharmacy_id, &items)?;
        Ok(reservation.into())
    }

    /// Hand over a reservation at one of the calling pharmacist's pharmacies.
    pub fn issue_reservation(
        &self,
        caller: FfiPrincipal,
        reservation_id: String,
    ) -> Result<FfiReservation, PharmacyError> {
        let caller: Principal = caller.into();
        authorize(&caller, Action::IssueReservation)?;
        let db = self.db.lock()?;
        let pharmacy_id = self.issuing_pharmacy(&db, &caller.id, &reservation_id)?;
        let reservation = ReservationService::new(&db, self.clock.as_ref(), self.sink.as_ref())
            .issue(&reservation_id, &pharmacy_id)?;
        Ok(reservation.into())
    }

    /// Reservations of the calling patient, newest first.
    pub fn my_reservations(&self, caller: FfiPrincipal) -> Result<Vec<FfiReservation>, PharmacyError> {
        let caller: Principal = caller.into();
        authorize(&caller, Action::ReserveMedicine)?;
        let db = self.db.lock()?;
        let service = ReservationService::new(&db, self.clock.as_ref(), self.sink.as_ref());
        service.expire_overdue()?;
        let reservations = service.list_for_patient(&caller.id)?;
        Ok(reservations.into_iter().map(|r| r.into()).collect())
    }

    /// Expire reservations past their pickup deadline.
    pub fn run_expiry_sweep(&self, caller: FfiPrincipal) -> Result<u32, PharmacyError> {
        authorize(&caller.into(), Action::RunMaintenance)?;
        let db = self.db.lock()?;
        let expired = ReservationService::new(&db, self.clock.as_ref(), self.sink.as_ref()).expire_overdue()?;
        Ok(expired as u32)
    }

    // =========================================================================
    // Loyalty Operations
    // =========================================================================

    /// All categories, lowest threshold first.
    pub fn list_categories(&self) -> Result<Vec<FfiCategory>, PharmacyError> {
        let db = self.db.lock()?;
        let categories = LoyaltyService::new(&db).list_categories()?;
        Ok(categories.into_iter().map(|c| c.into()).collect())
    }

    /// Add a loyalty category.
    pub fn create_category(
        &self,
        caller: FfiPrincipal,
        name: String,
        points: i64,
        discount: u32,
        color: String,
    ) -> Result<FfiCategory, PharmacyError> {
        authorize(&caller.into(), Action::ManageCategories)?;
        let db = self.db.lock()?;
        let category = LoyaltyService::new(&db)
            .create_category(PatientCategory::new(name, points, discount, color))?;
        Ok(category.into())
    }

    /// Replace a loyalty category's fields.
    pub fn update_category(&self, caller: FfiPrincipal, category: FfiCategory) -> Result<FfiCategory, PharmacyError> {
        authorize(&caller.into(), Action::ManageCategories)?;
        let db = self.db.lock()?;
        let category = LoyaltyService::new(&db).update_category(category.into())?;
        Ok(category.into())
    }

    /// Remove an unused loyalty category.
    pub fn delete_category(&self, caller: FfiPrincipal, category_id: String) -> Result<(), PharmacyError> {
        authorize(&caller.into(), Action::ManageCategories)?;
        let db = self.db.lock()?;
        LoyaltyService::new(&db).delete_category(&category_id)?;
        Ok(())
    }

    /// Category and progress of a patient.
    pub fn loyalty_status(&self, patient_id: String) -> Result<FfiLoyaltyStatus, PharmacyError> {
        let db = self.db.lock()?;
        let service = LoyaltyService::new(&db);
        let category = service.category_of(&patient_id)?;
        let progress = service.progress_of(&patient_id)?;
        Ok(FfiLoyaltyStatus {
            category: category.into(),
            next_category: progress.as_ref().map(|p| p.next.clone().into()),
            points_missing: progress.map(|p| p.points_missing),
        })
    }

    // =========================================================================
    // Settings Operations
    // =========================================================================

    pub fn get_settings(&self) -> Result<FfiSettings, PharmacyError> {
        let db = self.db.lock()?;
        Ok(db.get_settings()?.into())
    }

    /// Replace the point awards, reservation horizon and penalty limit.
    pub fn update_settings(&self, caller: FfiPrincipal, settings: FfiSettings) -> Result<(), PharmacyError> {
        authorize(&caller.into(), Action::ManageSettings)?;
        let settings: SystemSettings = settings.into();
        settings.validate().map_err(PharmacyError::Validation)?;
        let db = self.db.lock()?;
        db.update_settings(&settings)?;
        tracing::info!(?settings, "Updated system settings");
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe caller role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiRole {
    Patient,
    Pharmacist,
    Dermatologist,
    PharmacyAdmin,
    SystemAdmin,
}

impl From<FfiRole> for Role {
    fn from(role: FfiRole) -> Self {
        match role {
            FfiRole::Patient => Role::Patient,
            FfiRole::Pharmacist => Role::Pharmacist,
            FfiRole::Dermatologist => Role::Dermatologist,
            FfiRole::PharmacyAdmin => Role::PharmacyAdmin,
            FfiRole::SystemAdmin => Role::SystemAdmin,
        }
    }
}

/// FFI-safe authenticated caller.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrincipal {
    pub id: String,
    pub role: FfiRole,
}

impl From<FfiPrincipal> for Principal {
    fn from(principal: FfiPrincipal) -> Self {
        Principal::new(principal.id, principal.role.into())
    }
}

/// FFI-safe employee role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiEmployeeRole {
    Pharmacist,
    Dermatologist,
}

impl From<FfiEmployeeRole> for EmployeeRole {
    fn from(role: FfiEmployeeRole) -> Self {
        match role {
            FfiEmployeeRole::Pharmacist => EmployeeRole::Pharmacist,
            FfiEmployeeRole::Dermatologist => EmployeeRole::Dermatologist,
        }
    }
}

impl From<EmployeeRole> for FfiEmployeeRole {
    fn from(role: EmployeeRole) -> Self {
        match role {
            EmployeeRole::Pharmacist => FfiEmployeeRole::Pharmacist,
            EmployeeRole::Dermatologist => FfiEmployeeRole::Dermatologist,
        }
    }
}

/// FFI-safe pharmacy.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPharmacy {
    pub id: String,
    pub name: String,
}

impl From<Pharmacy> for FfiPharmacy {
    fn from(pharmacy: Pharmacy) -> Self {
        Self {
            id: pharmacy.id,
            name: pharmacy.name,
        }
    }
}

/// FFI-safe medicine.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    pub id: String,
    pub code: String,
    pub name: String,
    pub points: i64,
}

impl From<Medicine> for FfiMedicine {
    fn from(medicine: Medicine) -> Self {
        Self {
            id: medicine.id,
            code: medicine.code,
            name: medicine.name,
            points: medicine.points,
        }
    }
}

/// FFI-safe employee.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiEmployee {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: FfiEmployeeRole,
}

impl From<Employee> for FfiEmployee {
    fn from(employee: Employee) -> Self {
        Self {
            id: employee.id,
            first_name: employee.first_name,
            last_name: employee.last_name,
            email: employee.email,
            role: employee.role.into(),
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub num_points: i64,
    pub num_penalties: u32,
    pub category_id: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            first_name: patient.first_name,
            last_name: patient.last_name,
            email: patient.email,
            num_points: patient.num_points,
            num_penalties: patient.num_penalties,
            category_id: patient.category_id,
        }
    }
}

/// FFI-safe weekly working window (`day` as "Mon".."Sun", times as "HH:MM").
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWorkingWindow {
    pub day: String,
    pub start: String,
    pub end: String,
}

impl TryFrom<FfiWorkingWindow> for WorkingWindow {
    type Error = PharmacyError;

    fn try_from(window: FfiWorkingWindow) -> Result<Self, Self::Error> {
        let day: Weekday = window
            .day
            .parse()
            .map_err(|_| PharmacyError::Validation(format!("Invalid weekday: {}", window.day)))?;
        Ok(WorkingWindow::new(
            day,
            parse_time(&window.start)?,
            parse_time(&window.end)?,
        ))
    }
}

impl From<WorkingWindow> for FfiWorkingWindow {
    fn from(window: WorkingWindow) -> Self {
        Self {
            day: window.day.to_string(),
            start: window.start.format("%H:%M").to_string(),
            end: window.end.format("%H:%M").to_string(),
        }
    }
}

/// FFI-safe employment contract.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiContract {
    pub id: String,
    pub employee_id: String,
    pub pharmacy_id: String,
    pub valid_from: String,
    pub valid_to: Option<String>,
    pub working_hours: Vec<FfiWorkingWindow>,
}

impl From<EmploymentContract> for FfiContract {
    fn from(contract: EmploymentContract) -> Self {
        Self {
            id: contract.id,
            employee_id: contract.employee_id,
            pharmacy_id: contract.pharmacy_id,
            valid_from: contract.valid_from.to_string(),
            valid_to: contract.valid_to.map(|d| d.to_string()),
            working_hours: contract.working_hours.into_iter().map(|w| w.into()).collect(),
        }
    }
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub contract_id: String,
    pub patient_id: Option<String>,
    pub from: String,
    pub to: String,
    pub price: f64,
    pub status: String,
    pub report: Option<String>,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            contract_id: appointment.contract_id,
            patient_id: appointment.patient_id,
            from: format_date_time(appointment.from),
            to: format_date_time(appointment.to),
            price: appointment.price,
            status: appointment.status.to_string(),
            report: appointment.report,
        }
    }
}

/// FFI-safe leave request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLeaveRequest {
    pub id: String,
    pub employee_id: String,
    pub from: String,
    pub to: String,
    pub status: String,
    pub rejection_reason: Option<String>,
}

impl From<LeaveDaysRequest> for FfiLeaveRequest {
    fn from(request: LeaveDaysRequest) -> Self {
        Self {
            id: request.id,
            employee_id: request.employee_id,
            from: request.from.to_string(),
            to: request.to.to_string(),
            status: request.status.to_string(),
            rejection_reason: request.rejection_reason,
        }
    }
}

/// FFI-safe answer to a leave request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLeaveDecision {
    pub request: FfiLeaveRequest,
    pub cancelled_appointments: u32,
}

/// FFI-safe requested reservation line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReservationRequestItem {
    pub medicine_id: String,
    pub quantity: u32,
}

impl From<FfiReservationRequestItem> for ReservationRequestItem {
    fn from(item: FfiReservationRequestItem) -> Self {
        ReservationRequestItem {
            medicine_id: item.medicine_id,
            quantity: item.quantity,
        }
    }
}

/// FFI-safe priced reservation line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReservationItem {
    pub medicine_id: String,
    pub medicine_name: String,
    pub quantity: u32,
    pub price: f64,
}

impl From<ReservationItem> for FfiReservationItem {
    fn from(item: ReservationItem) -> Self {
        Self {
            medicine_id: item.medicine_id,
            medicine_name: item.medicine_name,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

/// FFI-safe medicine reservation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReservation {
    pub id: String,
    pub pharmacy_id: String,
    pub patient_id: String,
    pub price: f64,
    pub reserved_at: String,
    pub deadline: String,
    pub status: String,
    pub items: Vec<FfiReservationItem>,
}

impl From<MedicineReservation> for FfiReservation {
    fn from(reservation: MedicineReservation) -> Self {
        Self {
            id: reservation.id,
            pharmacy_id: reservation.pharmacy_id,
            patient_id: reservation.patient_id,
            price: reservation.price,
            reserved_at: format_date_time(reservation.reserved_at),
            deadline: format_date_time(reservation.deadline),
            status: reservation.status.to_string(),
            items: reservation.items.into_iter().map(|i| i.into()).collect(),
        }
    }
}

/// FFI-safe loyalty category.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCategory {
    pub id: String,
    pub name: String,
    pub points: i64,
    pub discount: u32,
    pub color: String,
}

impl From<PatientCategory> for FfiCategory {
    fn from(category: PatientCategory) -> Self {
        Self {
            id: category.id,
            name: category.name,
            points: category.points,
            discount: category.discount,
            color: category.color,
        }
    }
}

impl From<FfiCategory> for PatientCategory {
    fn from(category: FfiCategory) -> Self {
        PatientCategory {
            id: category.id,
            name: category.name,
            points: category.points,
            discount: category.discount,
            color: category.color,
        }
    }
}

/// FFI-safe loyalty standing of a patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLoyaltyStatus {
    pub category: FfiCategory,
    pub next_category: Option<FfiCategory>,
    pub points_missing: Option<i64>,
}

/// FFI-safe system settings.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSettings {
    pub dermatologist_appointment_points: i64,
    pub pharmacist_appointment_points: i64,
    pub reservation_horizon_hours: i64,
    pub max_penalties: u32,
}

impl From<SystemSettings> for FfiSettings {
    fn from(settings: SystemSettings) -> Self {
        Self {
            dermatologist_appointment_points: settings.dermatologist_appointment_points,
            pharmacist_appointment_points: settings.pharmacist_appointment_points,
            reservation_horizon_hours: settings.reservation_horizon_hours,
            max_penalties: settings.max_penalties,
        }
    }
}

impl From<FfiSettings> for SystemSettings {
    fn from(settings: FfiSettings) -> Self {
        SystemSettings {
            dermatologist_appointment_points: settings.dermatologist_appointment_points,
            pharmacist_appointment_points: settings.pharmacist_appointment_points,
            reservation_horizon_hours: settings.reservation_horizon_hours,
            max_penalties: settings.max_penalties,
        }
    }
}
