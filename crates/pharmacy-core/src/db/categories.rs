//! Loyalty category database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::PatientCategory;

fn read_category(row: &Row<'_>) -> rusqlite::Result<PatientCategory> {
    Ok(PatientCategory {
        id: row.get(0)?,
        name: row.get(1)?,
        points: row.get(2)?,
        discount: row.get(3)?,
        color: row.get(4)?,
    })
}

impl Database {
    /// Insert a new category.
    pub fn insert_category(&self, category: &PatientCategory) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO patient_categories (id, name, points, discount, color) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                category.id,
                category.name,
                category.points,
                category.discount,
                category.color,
            ],
        )?;
        Ok(())
    }

    /// Get a category by ID.
    pub fn get_category(&self, id: &str) -> DbResult<Option<PatientCategory>> {
        self.conn
            .query_row(
                "SELECT id, name, points, discount, color FROM patient_categories WHERE id = ?",
                [id],
                read_category,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All categories, lowest threshold first.
    pub fn list_categories(&self) -> DbResult<Vec<PatientCategory>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, points, discount, color FROM patient_categories ORDER BY points",
        )?;
        let rows = stmt.query_map([], read_category)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Overwrite every field of an existing category.
    pub fn update_category(&self, category: &PatientCategory) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patient_categories
            SET name = ?2, points = ?3, discount = ?4, color = ?5
            WHERE id = ?1
            "#,
            params![
                category.id,
                category.name,
                category.points,
                category.discount,
                category.color,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a category.
    pub fn delete_category(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patient_categories WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Name of the first unique field `category` would collide on, ignoring
    /// the row with its own ID.
    pub fn find_category_clash(&self, category: &PatientCategory) -> DbResult<Option<&'static str>> {
        let clash: Option<(String, i64, u32, String)> = self
            .conn
            .query_row(
                r#"
                SELECT name, points, discount, color FROM patient_categories
                WHERE id != ?1 AND (name = ?2 OR points = ?3 OR discount = ?4 OR color = ?5)
                LIMIT 1
                "#,
                params![
                    category.id,
                    category.name,
                    category.points,
                    category.discount,
                    category.color,
                ],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        Ok(clash.map(|(name, points, discount, color)| {
            if name == category.name {
                "name"
            } else if points == category.points {
                "points"
            } else if discount == category.discount {
                "discount"
            } else {
                debug_assert_eq!(color, category.color);
                "color"
            }
        }))
    }
}
