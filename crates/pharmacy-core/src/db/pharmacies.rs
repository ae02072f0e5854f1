//! Pharmacy, medicine and stock database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Medicine, MedicineStock, Pharmacy};

fn read_medicine(row: &Row<'_>) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        points: row.get(3)?,
    })
}

fn read_stock(row: &Row<'_>) -> rusqlite::Result<MedicineStock> {
    Ok(MedicineStock {
        pharmacy_id: row.get(0)?,
        medicine_id: row.get(1)?,
        quantity: row.get(2)?,
        price: row.get(3)?,
    })
}

impl Database {
    /// Insert a new pharmacy.
    pub fn insert_pharmacy(&self, pharmacy: &Pharmacy) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO pharmacies (id, name) VALUES (?1, ?2)",
            params![pharmacy.id, pharmacy.name],
        )?;
        Ok(())
    }

    /// Get a pharmacy by ID.
    pub fn get_pharmacy(&self, id: &str) -> DbResult<Option<Pharmacy>> {
        self.conn
            .query_row("SELECT id, name FROM pharmacies WHERE id = ?", [id], |row| {
                Ok(Pharmacy {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()
            .map_err(Into::into)
    }

    /// Insert a new medicine.
    pub fn insert_medicine(&self, medicine: &Medicine) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO medicines (id, code, name, points) VALUES (?1, ?2, ?3, ?4)",
            params![medicine.id, medicine.code, medicine.name, medicine.points],
        )?;
        Ok(())
    }

    /// Get a medicine by ID.
    pub fn get_medicine(&self, id: &str) -> DbResult<Option<Medicine>> {
        self.conn
            .query_row(
                "SELECT id, code, name, points FROM medicines WHERE id = ?",
                [id],
                read_medicine,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Insert or replace the stock row of a medicine in a pharmacy.
    pub fn upsert_stock(&self, stock: &MedicineStock) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medicine_stock (pharmacy_id, medicine_id, quantity, price)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(pharmacy_id, medicine_id) DO UPDATE SET
                quantity = excluded.quantity,
                price = excluded.price
            "#,
            params![stock.pharmacy_id, stock.medicine_id, stock.quantity, stock.price],
        )?;
        Ok(())
    }

    /// Get the stock row of a medicine in a pharmacy.
    pub fn get_stock(&self, pharmacy_id: &str, medicine_id: &str) -> DbResult<Option<MedicineStock>> {
        self.conn
            .query_row(
                r#"
                SELECT pharmacy_id, medicine_id, quantity, price
                FROM medicine_stock
                WHERE pharmacy_id = ?1 AND medicine_id = ?2
                "#,
                params![pharmacy_id, medicine_id],
                read_stock,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Take `quantity` units off the shelf if at least that many are left.
    ///
    /// Single statement, so two callers can never both pass the check on
    /// the same units.
    pub fn decrement_stock_if_sufficient(
        &self,
        pharmacy_id: &str,
        medicine_id: &str,
        quantity: u32,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE medicine_stock SET quantity = quantity - ?3
            WHERE pharmacy_id = ?1 AND medicine_id = ?2 AND quantity >= ?3
            "#,
            params![pharmacy_id, medicine_id, quantity],
        )?;
        Ok(rows_affected > 0)
    }

    /// Put `quantity` units back on the shelf.
    pub fn restore_stock(&self, pharmacy_id: &str, medicine_id: &str, quantity: u32) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE medicine_stock SET quantity = quantity + ?3
            WHERE pharmacy_id = ?1 AND medicine_id = ?2
            "#,
            params![pharmacy_id, medicine_id, quantity],
        )?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> (Database, Pharmacy, Medicine) {
        let db = Database::open_in_memory().unwrap();
        let pharmacy = Pharmacy::new("Benu".into());
        let medicine = Medicine::new("BRF-400".into(), "Brufen 400mg".into(), 5);
        db.insert_pharmacy(&pharmacy).unwrap();
        db.insert_medicine(&medicine).unwrap();
        db.upsert_stock(&MedicineStock {
            pharmacy_id: pharmacy.id.clone(),
            medicine_id: medicine.id.clone(),
            quantity: 2,
            price: 300.0,
        })
        .unwrap();
        (db, pharmacy, medicine)
    }

    #[test]
    fn test_decrement_within_stock() {
        let (db, pharmacy, medicine) = setup_db();
        assert!(db.decrement_stock_if_sufficient(&pharmacy.id, &medicine.id, 2).unwrap());

        let stock = db.get_stock(&pharmacy.id, &medicine.id).unwrap().unwrap();
        assert_eq!(stock.quantity, 0);
    }

    #[test]
    fn test_decrement_beyond_stock_leaves_quantity() {
        let (db, pharmacy, medicine) = setup_db();
        assert!(!db.decrement_stock_if_sufficient(&pharmacy.id, &medicine.id, 3).unwrap());

        let stock = db.get_stock(&pharmacy.id, &medicine.id).unwrap().unwrap();
        assert_eq!(stock.quantity, 2);
    }

    #[test]
    fn test_restore_stock() {
        let (db, pharmacy, medicine) = setup_db();
        db.decrement_stock_if_sufficient(&pharmacy.id, &medicine.id, 1).unwrap();
        db.restore_stock(&pharmacy.id, &medicine.id, 1).unwrap();

        let stock = db.get_stock(&pharmacy.id, &medicine.id).unwrap().unwrap();
        assert_eq!(stock.quantity, 2);
    }

    #[test]
    fn test_upsert_replaces_price() {
        let (db, pharmacy, medicine) = setup_db();
        db.upsert_stock(&MedicineStock {
            pharmacy_id: pharmacy.id.clone(),
            medicine_id: medicine.id.clone(),
            quantity: 10,
            price: 280.0,
        })
        .unwrap();

        let stock = db.get_stock(&pharmacy.id, &medicine.id).unwrap().unwrap();
        assert_eq!(stock.quantity, 10);
        assert_eq!(stock.price, 280.0);
        assert_eq!(db.get_medicine(&medicine.id).unwrap().unwrap().points, 5);
    }
}
