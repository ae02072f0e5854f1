//! Reservation and purchase database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{MedicinePurchase, MedicineReservation, ReservationItem, ReservationStatus};

const RESERVATION_COLUMNS: &str =
    "id, pharmacy_id, patient_id, price, reserved_at, deadline, status";

/// Reservation header; items are loaded separately.
fn read_reservation(row: &Row<'_>) -> rusqlite::Result<MedicineReservation> {
    Ok(MedicineReservation {
        id: row.get(0)?,
        pharmacy_id: row.get(1)?,
        patient_id: row.get(2)?,
        price: row.get(3)?,
        reserved_at: row.get(4)?,
        deadline: row.get(5)?,
        status: row.get(6)?,
        items: Vec::new(),
    })
}

fn read_purchase(row: &Row<'_>) -> rusqlite::Result<MedicinePurchase> {
    Ok(MedicinePurchase {
        id: row.get(0)?,
        pharmacy_id: row.get(1)?,
        medicine_id: row.get(2)?,
        patient_id: row.get(3)?,
        reservation_id: row.get(4)?,
        quantity: row.get(5)?,
        price: row.get(6)?,
        purchased_on: row.get(7)?,
    })
}

impl Database {
    /// Insert a reservation together with its items.
    pub fn insert_reservation(&self, reservation: &MedicineReservation) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medicine_reservations (
                id, pharmacy_id, patient_id, price, reserved_at, deadline, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                reservation.id,
                reservation.pharmacy_id,
                reservation.patient_id,
                reservation.price,
                reservation.reserved_at,
                reservation.deadline,
                reservation.status,
            ],
        )?;

        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO reservation_items (
                reservation_id, position, medicine_id, medicine_name, quantity, price
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;
        for (position, item) in reservation.items.iter().enumerate() {
            stmt.execute(params![
                reservation.id,
                position as i64,
                item.medicine_id,
                item.medicine_name,
                item.quantity,
                item.price,
            ])?;
        }
        Ok(())
    }

    /// Get a reservation with its items.
    pub fn get_reservation(&self, id: &str) -> DbResult<Option<MedicineReservation>> {
        let reservation = self
            .conn
            .query_row(
                &format!("SELECT {RESERVATION_COLUMNS} FROM medicine_reservations WHERE id = ?"),
                [id],
                read_reservation,
            )
            .optional()?;

        match reservation {
            Some(mut reservation) => {
                reservation.items = self.list_reservation_items(&reservation.id)?;
                Ok(Some(reservation))
            }
            None => Ok(None),
        }
    }

    /// Items of a reservation in the order they were requested.
    pub fn list_reservation_items(&self, reservation_id: &str) -> DbResult<Vec<ReservationItem>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT medicine_id, medicine_name, quantity, price
            FROM reservation_items
            WHERE reservation_id = ?
            ORDER BY position
            "#,
        )?;
        let rows = stmt.query_map([reservation_id], |row| {
            Ok(ReservationItem {
                medicine_id: row.get(0)?,
                medicine_name: row.get(1)?,
                quantity: row.get(2)?,
                price: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Reservations in a given status, with items.
    pub fn list_reservations_by_status(&self, status: ReservationStatus) -> DbResult<Vec<MedicineReservation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM medicine_reservations WHERE status = ? ORDER BY deadline"
        ))?;
        let headers = stmt
            .query_map([status], read_reservation)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut reservations = Vec::with_capacity(headers.len());
        for mut reservation in headers {
            reservation.items = self.list_reservation_items(&reservation.id)?;
            reservations.push(reservation);
        }
        Ok(reservations)
    }

    /// Reservations of a patient (headers and items), newest first.
    pub fn list_reservations_for_patient(&self, patient_id: &str) -> DbResult<Vec<MedicineReservation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM medicine_reservations WHERE patient_id = ? ORDER BY reserved_at DESC"
        ))?;
        let headers = stmt
            .query_map([patient_id], read_reservation)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut reservations = Vec::with_capacity(headers.len());
        for mut reservation in headers {
            reservation.items = self.list_reservation_items(&reservation.id)?;
            reservations.push(reservation);
        }
        Ok(reservations)
    }

    /// Move a reservation to `next` only if it is still in `expected`.
    pub fn transition_reservation(
        &self,
        id: &str,
        expected: ReservationStatus,
        next: ReservationStatus,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE medicine_reservations SET status = ?3 WHERE id = ?1 AND status = ?2",
            params![id, expected, next],
        )?;
        Ok(rows_affected > 0)
    }

    /// Record one sale line.
    pub fn insert_purchase(&self, purchase: &MedicinePurchase) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medicine_purchases (
                id, pharmacy_id, medicine_id, patient_id, reservation_id,
                quantity, price, purchased_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                purchase.id,
                purchase.pharmacy_id,
                purchase.medicine_id,
                purchase.patient_id,
                purchase.reservation_id,
                purchase.quantity,
                purchase.price,
                purchase.purchased_on,
            ],
        )?;
        Ok(())
    }

    /// Sales lines produced by one reservation.
    pub fn list_purchases_for_reservation(&self, reservation_id: &str) -> DbResult<Vec<MedicinePurchase>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, pharmacy_id, medicine_id, patient_id, reservation_id,
                   quantity, price, purchased_on
            FROM medicine_purchases
            WHERE reservation_id = ?
            "#,
        )?;
        let rows = stmt.query_map([reservation_id], read_purchase)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Sales lines of a patient across all pharmacies.
    pub fn list_purchases_for_patient(&self, patient_id: &str) -> DbResult<Vec<MedicinePurchase>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, pharmacy_id, medicine_id, patient_id, reservation_id,
                   quantity, price, purchased_on
            FROM medicine_purchases
            WHERE patient_id = ?
            ORDER BY purchased_on
            "#,
        )?;
        let rows = stmt.query_map([patient_id], read_purchase)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
