//! Loyalty categories derived from accumulated points.
//!
//! A patient's `category_id` is only a cache of [`evaluate_category`] over the
//! current category table. Every point change and every category change
//! recomputes it inside the same transaction.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::PatientCategory;

/// Highest-threshold category reached with `points`.
///
/// Falls back to the zero-threshold category when nothing qualifies (e.g.
/// negative balances). `None` only when no zero-threshold category exists.
pub fn evaluate_category(points: i64, categories: &[PatientCategory]) -> Option<&PatientCategory> {
    categories
        .iter()
        .filter(|c| c.points <= points)
        .max_by_key(|c| c.points)
        .or_else(|| categories.iter().find(|c| c.points == 0))
}

/// The tier after the one `points` currently reaches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryProgress {
    pub next: PatientCategory,
    pub points_missing: i64,
}

/// Lowest category above `points`, or `None` at the top tier.
pub fn next_category(points: i64, categories: &[PatientCategory]) -> Option<CategoryProgress> {
    categories
        .iter()
        .filter(|c| c.points > points)
        .min_by_key(|c| c.points)
        .map(|c| CategoryProgress {
            next: c.clone(),
            points_missing: c.points - points,
        })
}

/// Recompute and store one patient's category. Runs in the caller's
/// transaction.
pub(crate) fn reevaluate_patient(db: &Database, patient_id: &str) -> ServiceResult<PatientCategory> {
    let patient = db
        .get_patient(patient_id)?
        .ok_or_else(|| ServiceError::not_found("Patient", patient_id))?;
    let categories = db.list_categories()?;
    let category = evaluate_category(patient.num_points, &categories)
        .cloned()
        .ok_or_else(|| ServiceError::InvalidState("No zero-threshold category".into()))?;

    if category.id != patient.category_id {
        db.set_patient_category(&patient.id, &category.id)?;
        info!(
            patient = %patient.id,
            from = %patient.category_id,
            to = %category.id,
            points = patient.num_points,
            "Patient category changed"
        );
    }
    Ok(category)
}

/// Add `points` to a patient and re-evaluate their category. Runs in the
/// caller's transaction.
pub(crate) fn credit_points(db: &Database, patient_id: &str, points: i64) -> ServiceResult<PatientCategory> {
    if !db.add_patient_points(patient_id, points)? {
        return Err(ServiceError::not_found("Patient", patient_id));
    }
    debug!(patient = %patient_id, points, "Credited loyalty points");
    reevaluate_patient(db, patient_id)
}

/// Re-evaluate every patient. Returns how many changed category.
pub(crate) fn reevaluate_all(db: &Database) -> ServiceResult<usize> {
    let categories = db.list_categories()?;
    let mut changed = 0;
    for patient in db.list_patients()? {
        let Some(category) = evaluate_category(patient.num_points, &categories) else {
            return Err(ServiceError::InvalidState("No zero-threshold category".into()));
        };
        if category.id != patient.category_id {
            db.set_patient_category(&patient.id, &category.id)?;
            changed += 1;
        }
    }
    Ok(changed)
}

fn validate_category(category: &PatientCategory) -> ServiceResult<()> {
    if category.name.trim().is_empty() {
        return Err(ServiceError::Validation("Category name must not be blank".into()));
    }
    if category.color.trim().is_empty() {
        return Err(ServiceError::Validation("Category color must not be blank".into()));
    }
    if category.points < 0 {
        return Err(ServiceError::Validation("Category points cannot be negative".into()));
    }
    if category.discount > 100 {
        return Err(ServiceError::Validation("Discount cannot exceed 100%".into()));
    }
    Ok(())
}

/// Category administration and per-patient loyalty queries.
pub struct LoyaltyService<'a> {
    db: &'a Database,
}

impl<'a> LoyaltyService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn list_categories(&self) -> ServiceResult<Vec<PatientCategory>> {
        Ok(self.db.list_categories()?)
    }

    /// Current category of a patient.
    pub fn category_of(&self, patient_id: &str) -> ServiceResult<PatientCategory> {
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| ServiceError::not_found("Patient", patient_id))?;
        self.db
            .get_category(&patient.category_id)?
            .ok_or_else(|| ServiceError::not_found("Category", &patient.category_id))
    }

    /// Next tier of a patient and how far away it is.
    pub fn progress_of(&self, patient_id: &str) -> ServiceResult<Option<CategoryProgress>> {
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| ServiceError::not_found("Patient", patient_id))?;
        Ok(next_category(patient.num_points, &self.db.list_categories()?))
    }

    /// Add a category and move every patient who now qualifies into it.
    pub fn create_category(&self, category: PatientCategory) -> ServiceResult<PatientCategory> {
        validate_category(&category)?;

        self.db.atomically(|db| {
            if let Some(field) = db.find_category_clash(&category)? {
                return Err(ServiceError::Conflict(format!(
                    "A category with the same {} already exists",
                    field
                )));
            }
            db.insert_category(&category)?;
            let moved = reevaluate_all(db)?;
            info!(category = %category.id, name = %category.name, moved, "Created category");
            Ok(category)
        })
    }

    /// Replace a category's fields. The default category is fixed.
    pub fn update_category(&self, category: PatientCategory) -> ServiceResult<PatientCategory> {
        if category.is_default() {
            return Err(ServiceError::Forbidden("The default category cannot be changed".into()));
        }
        validate_category(&category)?;

        self.db.atomically(|db| {
            if db.get_category(&category.id)?.is_none() {
                return Err(ServiceError::not_found("Category", &category.id));
            }
            if let Some(field) = db.find_category_clash(&category)? {
                return Err(ServiceError::Conflict(format!(
                    "A category with the same {} already exists",
                    field
                )));
            }
            db.update_category(&category)?;
            let moved = reevaluate_all(db)?;
            info!(category = %category.id, moved, "Updated category");
            Ok(category)
        })
    }

    /// Remove a category nobody is in. The default category is never removed.
    pub fn delete_category(&self, category_id: &str) -> ServiceResult<()> {
        self.db.atomically(|db| {
            let category = db
                .get_category(category_id)?
                .ok_or_else(|| ServiceError::not_found("Category", category_id))?;
            if category.is_default() || category.points == 0 {
                return Err(ServiceError::Forbidden("The default category cannot be deleted".into()));
            }
            let members = db.count_patients_in_category(category_id)?;
            if members > 0 {
                return Err(ServiceError::Forbidden(format!(
                    "Category {} still has {} patients",
                    category.name, members
                )));
            }
            db.delete_category(category_id)?;
            info!(category = %category_id, "Deleted category");
            Ok(())
        })
    }
}
