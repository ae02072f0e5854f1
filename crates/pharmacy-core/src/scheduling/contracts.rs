use chrono::NaiveDate;
use tracing::info;

use crate::clock::Clock;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::interval::{open_day_span, overlaps};
use crate::models::{EmploymentContract, WorkingWindow};

fn validate_windows(windows: &[WorkingWindow]) -> ServiceResult<()> {
    if windows.is_empty() {
        return Err(ServiceError::Validation("At least one working window is required".into()));
    }
    for (i, window) in windows.iter().enumerate() {
        if window.start >= window.end {
            return Err(ServiceError::Validation(format!(
                "Working window on {} must start before it ends",
                window.day
            )));
        }
        let clash = windows[i + 1..].iter().any(|other| {
            other.day == window.day && overlaps(window.start, window.end, other.start, other.end)
        });
        if clash {
            return Err(ServiceError::Validation(format!(
                "Working windows on {} overlap",
                window.day
            )));
        }
    }
    Ok(())
}

/// Hiring and termination of employees at pharmacies.
pub struct ContractService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
}

impl<'a> ContractService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    /// Start a contract. One running contract per employee and pharmacy.
    pub fn hire(
        &self,
        employee_id: &str,
        pharmacy_id: &str,
        valid_from: NaiveDate,
        working_hours: Vec<WorkingWindow>,
    ) -> ServiceResult<EmploymentContract> {
        validate_windows(&working_hours)?;

        self.db.atomically(|db| {
            if db.get_employee(employee_id)?.is_none() {
                return Err(ServiceError::not_found("Employee", employee_id));
            }
            if db.get_pharmacy(pharmacy_id)?.is_none() {
                return Err(ServiceError::not_found("Pharmacy", pharmacy_id));
            }
            let running = db
                .list_contracts_for_employee(employee_id)?
                .into_iter()
                .any(|c| c.pharmacy_id == pharmacy_id && !c.is_terminated());
            if running {
                return Err(ServiceError::Conflict(
                    "Employee already has a running contract with this pharmacy".into(),
                ));
            }

            let contract = EmploymentContract::new(
                employee_id.to_string(),
                pharmacy_id.to_string(),
                valid_from,
                working_hours,
            );
            db.insert_contract(&contract)?;
            info!(
                contract = %contract.id,
                employee = %employee_id,
                pharmacy = %pharmacy_id,
                "Hired employee"
            );
            Ok(contract)
        })
    }

    /// End a running contract on `valid_to` (inclusive).
    ///
    /// Refused while open appointments remain after the last working day.
    pub fn terminate(&self, contract_id: &str, valid_to: NaiveDate) -> ServiceResult<EmploymentContract> {
        self.db.atomically(|db| {
            let mut contract = db
                .get_contract(contract_id)?
                .ok_or_else(|| ServiceError::not_found("Contract", contract_id))?;
            if contract.is_terminated() {
                return Err(ServiceError::InvalidState("Contract is already terminated".into()));
            }
            if valid_to < contract.valid_from {
                return Err(ServiceError::InvalidRange(
                    "Contract cannot end before it starts".into(),
                ));
            }

            let (_, end) = open_day_span(contract.valid_from, Some(valid_to));
            let stranded = db
                .list_appointments_for_contract(contract_id)?
                .into_iter()
                .filter(|a| a.is_open() && a.to > end)
                .count();
            if stranded > 0 {
                return Err(ServiceError::Conflict(format!(
                    "{} open appointments are scheduled after {}",
                    stranded, valid_to
                )));
            }

            if !db.terminate_contract(contract_id, valid_to)? {
                return Err(ServiceError::InvalidState("Contract is already terminated".into()));
            }
            contract.valid_to = Some(valid_to);
            info!(contract = %contract_id, %valid_to, "Terminated contract");
            Ok(contract)
        })
    }

    pub fn contracts_of(&self, employee_id: &str) -> ServiceResult<Vec<EmploymentContract>> {
        Ok(self.db.list_contracts_for_employee(employee_id)?)
    }

    /// Pharmacies the employee works at today.
    pub fn active_pharmacies_of(&self, employee_id: &str) -> ServiceResult<Vec<String>> {
        let today = self.clock.today();
        Ok(self
            .db
            .list_contracts_for_employee(employee_id)?
            .into_iter()
            .filter(|c| c.is_active_on(today))
            .map(|c| c.pharmacy_id)
            .collect())
    }
}
