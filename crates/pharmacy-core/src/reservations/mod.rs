//! Medicine reservation, issuance and expiry.
//!
//! Lifecycle: Reserved → Issued | Expired. Reserving takes the units off the
//! shelf immediately; expiry puts them back exactly once, guarded by the
//! compare-and-set on the reservation status.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::loyalty;
use crate::models::{
    MedicinePurchase, MedicineReservation, ReservationItem, ReservationRequestItem, ReservationStatus,
};
use crate::notify::{self, NotificationSink, Outbox};

/// Unit price after a percentage discount, rounded to cents.
pub fn discounted_price(price: f64, discount: u32) -> f64 {
    let factor = f64::from(100u32.saturating_sub(discount)) / 100.0;
    (price * factor * 100.0).round() / 100.0
}

/// Move one reservation to `Expired`, restock its items and penalize the
/// patient. Returns `false` when another caller got there first.
///
/// Runs in the caller's transaction.
fn expire_one(db: &Database, reservation: &MedicineReservation) -> ServiceResult<bool> {
    if !db.transition_reservation(&reservation.id, ReservationStatus::Reserved, ReservationStatus::Expired)? {
        return Ok(false);
    }
    for item in &reservation.items {
        db.restore_stock(&reservation.pharmacy_id, &item.medicine_id, item.quantity)?;
    }
    db.add_patient_penalty(&reservation.patient_id)?;
    info!(
        reservation = %reservation.id,
        patient = %reservation.patient_id,
        "Reservation expired"
    );
    Ok(true)
}

/// Reservation workflows for patients and pharmacy staff.
pub struct ReservationService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
    sink: &'a dyn NotificationSink,
}

impl<'a> ReservationService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock, sink: &'a dyn NotificationSink) -> Self {
        Self { db, clock, sink }
    }

    /// Hold the requested medicines for the patient.
    ///
    /// All items are taken from stock or none are.
    pub fn reserve(
        &self,
        patient_id: &str,
        pharmacy_id: &str,
        items: &[ReservationRequestItem],
    ) -> ServiceResult<MedicineReservation> {
        if items.is_empty() {
            return Err(ServiceError::Validation("Reservation needs at least one item".into()));
        }
        let mut seen = HashSet::new();
        for item in items {
            if item.quantity == 0 {
                return Err(ServiceError::Validation("Quantity must be positive".into()));
            }
            if !seen.insert(item.medicine_id.as_str()) {
                return Err(ServiceError::Validation(format!(
                    "Medicine {} is listed twice",
                    item.medicine_id
                )));
            }
        }
        let now = self.clock.now();
        let mut outbox = Outbox::new();

        let reservation = self.db.atomically(|db| {
            let patient = db
                .get_patient(patient_id)?
                .ok_or_else(|| ServiceError::not_found("Patient", patient_id))?;
            let pharmacy = db
                .get_pharmacy(pharmacy_id)?
                .ok_or_else(|| ServiceError::not_found("Pharmacy", pharmacy_id))?;
            let settings = db.get_settings()?;
            if patient.num_penalties >= settings.max_penalties {
                return Err(ServiceError::InvalidState(format!(
                    "Patient has {} penalties and cannot reserve",
                    patient.num_penalties
                )));
            }
            let discount = db
                .get_category(&patient.category_id)?
                .map_or(0, |c| c.discount);

            let mut priced = Vec::with_capacity(items.len());
            for item in items {
                let medicine = db
                    .get_medicine(&item.medicine_id)?
                    .ok_or_else(|| ServiceError::not_found("Medicine", &item.medicine_id))?;
                let stock = db
                    .get_stock(pharmacy_id, &item.medicine_id)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("{} is not sold at {}", medicine.name, pharmacy.name))
                    })?;
                if !db.decrement_stock_if_sufficient(pharmacy_id, &item.medicine_id, item.quantity)? {
                    debug!(
                        medicine = %medicine.id,
                        requested = item.quantity,
                        available = stock.quantity,
                        "Rejected reservation"
                    );
                    return Err(ServiceError::InsufficientStock(format!(
                        "{} units of {} requested, {} available",
                        item.quantity, medicine.name, stock.quantity
                    )));
                }
                priced.push(ReservationItem {
                    medicine_id: medicine.id,
                    medicine_name: medicine.name,
                    quantity: item.quantity,
                    price: discounted_price(stock.price, discount),
                });
            }

            let deadline = settings.reservation_deadline(now).ok_or_else(|| {
                ServiceError::Validation("Reservation horizon is out of range".into())
            })?;
            let reservation = MedicineReservation::new(
                pharmacy_id.to_string(),
                patient_id.to_string(),
                priced,
                now,
                deadline,
            );
            db.insert_reservation(&reservation)?;
            outbox.push(notify::reservation_created(&reservation, &patient, &pharmacy));
            Ok(reservation)
        })?;

        info!(
            reservation = %reservation.id,
            patient = %patient_id,
            pharmacy = %pharmacy_id,
            price = reservation.price,
            "Medicines reserved"
        );
        outbox.dispatch(self.sink);
        Ok(reservation)
    }

    /// Hand a reservation over at `pharmacy_id`.
    ///
    /// Reservations of other pharmacies, already closed ones and ones past
    /// their deadline are all reported as not found; an overdue one is
    /// expired on the way.
    pub fn issue(&self, reservation_id: &str, pharmacy_id: &str) -> ServiceResult<MedicineReservation> {
        let now = self.clock.now();
        let mut outbox = Outbox::new();

        let issued = self.db.atomically(|db| {
            let Some(mut reservation) = db
                .get_reservation(reservation_id)?
                .filter(|r| r.pharmacy_id == pharmacy_id && r.status == ReservationStatus::Reserved)
            else {
                return Ok(None);
            };
            if reservation.is_overdue(now) {
                expire_one(db, &reservation)?;
                return Ok(None);
            }
            if !db.transition_reservation(reservation_id, ReservationStatus::Reserved, ReservationStatus::Issued)? {
                return Ok(None);
            }
            reservation.status = ReservationStatus::Issued;

            let mut points = 0;
            for item in &reservation.items {
                db.insert_purchase(&MedicinePurchase::from_item(&reservation, item, now.date()))?;
                let medicine = db
                    .get_medicine(&item.medicine_id)?
                    .ok_or_else(|| ServiceError::not_found("Medicine", &item.medicine_id))?;
                points += medicine.points * i64::from(item.quantity);
            }
            let category = loyalty::credit_points(db, &reservation.patient_id, points)?;

            let patient = db
                .get_patient(&reservation.patient_id)?
                .ok_or_else(|| ServiceError::not_found("Patient", &reservation.patient_id))?;
            let pharmacy = db
                .get_pharmacy(pharmacy_id)?
                .ok_or_else(|| ServiceError::not_found("Pharmacy", pharmacy_id))?;
            outbox.push(notify::reservation_issued(&reservation, &patient, &pharmacy));

            info!(
                reservation = %reservation.id,
                patient = %patient.id,
                points,
                category = %category.name,
                "Reservation issued"
            );
            Ok::<_, ServiceError>(Some(reservation))
        })?;

        match issued {
            Some(reservation) => {
                outbox.dispatch(self.sink);
                Ok(reservation)
            }
            None => {
                debug!(reservation = %reservation_id, pharmacy = %pharmacy_id, "Nothing to issue");
                Err(ServiceError::NotFound(format!(
                    "No active reservation {} at this pharmacy",
                    reservation_id
                )))
            }
        }
    }

    /// Expire every reservation past its deadline. Safe to run from several
    /// places at once; each reservation is restocked only by the caller that
    /// wins its status transition.
    pub fn expire_overdue(&self) -> ServiceResult<usize> {
        let now = self.clock.now();
        let expired = self.db.atomically(|db| {
            let mut expired = 0;
            for reservation in db.list_reservations_by_status(ReservationStatus::Reserved)? {
                if reservation.is_overdue(now) && expire_one(db, &reservation)? {
                    expired += 1;
                }
            }
            Ok::<_, ServiceError>(expired)
        })?;
        if expired > 0 {
            info!(expired, "Expired overdue reservations");
        }
        Ok(expired)
    }

    /// Current state of a reservation, expiring it first if overdue.
    pub fn get(&self, reservation_id: &str) -> ServiceResult<MedicineReservation> {
        let now = self.clock.now();
        self.db.atomically(|db| {
            let mut reservation = db
                .get_reservation(reservation_id)?
                .ok_or_else(|| ServiceError::not_found("Reservation", reservation_id))?;
            if reservation.is_overdue(now) && expire_one(db, &reservation)? {
                reservation.status = ReservationStatus::Expired;
            }
            Ok(reservation)
        })
    }

    pub fn list_for_patient(&self, patient_id: &str) -> ServiceResult<Vec<MedicineReservation>> {
        Ok(self.db.list_reservations_for_patient(patient_id)?)
    }

    pub fn purchases_of(&self, patient_id: &str) -> ServiceResult<Vec<MedicinePurchase>> {
        Ok(self.db.list_purchases_for_patient(patient_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{Medicine, MedicineStock, Patient, Pharmacy};
    use crate::notify::MemorySink;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_discounted_price() {
        assert_eq!(discounted_price(300.0, 0), 300.0);
        assert_eq!(discounted_price(300.0, 25), 225.0);
        assert_eq!(discounted_price(99.99, 15), 84.99);
        assert_eq!(discounted_price(50.0, 150), 0.0);
    }

    struct Fixture {
        db: Database,
        clock: FixedClock,
        sink: MemorySink,
        pharmacy: Pharmacy,
        patient: Patient,
        medicine: Medicine,
    }

    fn setup() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let pharmacy = Pharmacy::new("Benu".into());
        let patient = Patient::new("Pera".into(), "Peric".into(), "pera@example.com".into());
        let medicine = Medicine::new("BRF".into(), "Brufen".into(), 5);
        db.insert_pharmacy(&pharmacy).unwrap();
        db.insert_patient(&patient).unwrap();
        db.insert_medicine(&medicine).unwrap();
        db.upsert_stock(&MedicineStock {
            pharmacy_id: pharmacy.id.clone(),
            medicine_id: medicine.id.clone(),
            quantity: 2,
            price: 300.0,
        })
        .unwrap();

        let now = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Fixture {
            db,
            clock: FixedClock::new(now),
            sink: MemorySink::new(),
            pharmacy,
            patient,
            medicine,
        }
    }

    fn request(fx: &Fixture, quantity: u32) -> Vec<ReservationRequestItem> {
        vec![ReservationRequestItem {
            medicine_id: fx.medicine.id.clone(),
            quantity,
        }]
    }

    fn stock_left(fx: &Fixture) -> u32 {
        fx.db
            .get_stock(&fx.pharmacy.id, &fx.medicine.id)
            .unwrap()
            .unwrap()
            .quantity
    }

    #[test]
    fn test_reserve_takes_stock_and_sets_deadline() {
        let fx = setup();
        let service = ReservationService::new(&fx.db, &fx.clock, &fx.sink);

        let reservation = service.reserve(&fx.patient.id, &fx.pharmacy.id, &request(&fx, 2)).unwrap();
        assert_eq!(reservation.price, 600.0);
        assert_eq!(reservation.deadline, fx.clock.now() + Duration::hours(48));
        assert_eq!(stock_left(&fx), 0);
        assert_eq!(fx.sink.sent_to(&fx.patient.email).len(), 1);
    }

    #[test]
    fn test_insufficient_stock_leaves_stock() {
        let fx = setup();
        let service = ReservationService::new(&fx.db, &fx.clock, &fx.sink);

        let err = service
            .reserve(&fx.patient.id, &fx.pharmacy.id, &request(&fx, 3))
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
        assert_eq!(stock_left(&fx), 2);
        assert!(fx.sink.sent().is_empty());
    }

    #[test]
    fn test_reserve_validation() {
        let fx = setup();
        let service = ReservationService::new(&fx.db, &fx.clock, &fx.sink);

        assert_eq!(
            service.reserve(&fx.patient.id, &fx.pharmacy.id, &[]).unwrap_err().code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            service
                .reserve(&fx.patient.id, &fx.pharmacy.id, &request(&fx, 0))
                .unwrap_err()
                .code(),
            "VALIDATION_ERROR"
        );
        let unknown = vec![ReservationRequestItem {
            medicine_id: "missing".into(),
            quantity: 1,
        }];
        assert_eq!(
            service
                .reserve(&fx.patient.id, &fx.pharmacy.id, &unknown)
                .unwrap_err()
                .code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_issue_only_at_own_pharmacy() {
        let fx = setup();
        let service = ReservationService::new(&fx.db, &fx.clock, &fx.sink);
        let reservation = service.reserve(&fx.patient.id, &fx.pharmacy.id, &request(&fx, 1)).unwrap();

        let err = service.issue(&reservation.id, "other-pharmacy").unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        let issued = service.issue(&reservation.id, &fx.pharmacy.id).unwrap();
        assert_eq!(issued.status, ReservationStatus::Issued);
        assert_eq!(fx.db.get_patient(&fx.patient.id).unwrap().unwrap().num_points, 5);

        let err = service.issue(&reservation.id, &fx.pharmacy.id).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_expiry_restores_stock_once() {
        let fx = setup();
        let service = ReservationService::new(&fx.db, &fx.clock, &fx.sink);
        let reservation = service.reserve(&fx.patient.id, &fx.pharmacy.id, &request(&fx, 2)).unwrap();

        fx.clock.advance(Duration::hours(47));
        assert_eq!(service.expire_overdue().unwrap(), 0);

        fx.clock.advance(Duration::hours(1));
        assert_eq!(service.expire_overdue().unwrap(), 1);
        assert_eq!(service.expire_overdue().unwrap(), 0);
        assert_eq!(service.get(&reservation.id).unwrap().status, ReservationStatus::Expired);

        assert_eq!(stock_left(&fx), 2);
        assert_eq!(fx.db.get_patient(&fx.patient.id).unwrap().unwrap().num_penalties, 1);
    }

    #[test]
    fn test_lazy_expiry_on_get_and_issue() {
        let fx = setup();
        let service = ReservationService::new(&fx.db, &fx.clock, &fx.sink);
        let first = service.reserve(&fx.patient.id, &fx.pharmacy.id, &request(&fx, 1)).unwrap();
        let second = service.reserve(&fx.patient.id, &fx.pharmacy.id, &request(&fx, 1)).unwrap();
        fx.clock.advance(Duration::hours(49));

        assert_eq!(service.get(&first.id).unwrap().status, ReservationStatus::Expired);
        assert_eq!(service.issue(&second.id, &fx.pharmacy.id).unwrap_err().code(), "NOT_FOUND");
        assert_eq!(service.get(&second.id).unwrap().status, ReservationStatus::Expired);

        assert_eq!(stock_left(&fx), 2);
        assert_eq!(fx.db.get_patient(&fx.patient.id).unwrap().unwrap().num_penalties, 2);
        assert_eq!(service.expire_overdue().unwrap(), 0);
    }
}
