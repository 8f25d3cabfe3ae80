use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{Criterion, CriterionDraft, CriterionId, CriterionPatch, UserId};
use super::error::{JudgingError, RecordKind};
use super::repository::JudgingStore;
use super::sequence::next_record_id;

pub const DEFAULT_WEIGHT: u8 = 1;
pub const DEFAULT_MIN_SCORE: f64 = 1.0;
pub const DEFAULT_MAX_SCORE: f64 = 10.0;
pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 10;
pub const NAME_LIMIT: usize = 50;
pub const DESCRIPTION_LIMIT: usize = 200;

/// Registry of the weighted criteria judges score against.
pub struct CriteriaRegistry<S> {
    store: Arc<S>,
}

impl<S> CriteriaRegistry<S>
where
    S: JudgingStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        draft: CriterionDraft,
        created_by: UserId,
    ) -> Result<Criterion, JudgingError> {
        let criterion = Criterion {
            id: CriterionId(next_record_id("crit")),
            name: draft.name.trim().to_string(),
            description: draft.description,
            weight: draft.weight.unwrap_or(DEFAULT_WEIGHT),
            min_score: draft.min_score.unwrap_or(DEFAULT_MIN_SCORE),
            max_score: draft.max_score.unwrap_or(DEFAULT_MAX_SCORE),
            created_by,
            created_at: Utc::now(),
        };
        validate(&criterion)?;

        let stored = self.store.insert_criterion(criterion)?;
        info!(criterion_id = %stored.id, name = %stored.name, weight = stored.weight, "criterion registered");
        Ok(stored)
    }

    /// All criteria, alphabetically by name.
    pub fn list(&self) -> Result<Vec<Criterion>, JudgingError> {
        let mut criteria = self.store.all_criteria()?;
        criteria.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(criteria)
    }

    pub fn get(&self, id: &CriterionId) -> Result<Criterion, JudgingError> {
        self.store
            .fetch_criterion(id)?
            .ok_or_else(|| JudgingError::not_found(RecordKind::Criterion, id))
    }

    /// Applies a partial update. Criteria already referenced by evaluations are frozen.
    pub fn update(
        &self,
        id: &CriterionId,
        patch: CriterionPatch,
    ) -> Result<Criterion, JudgingError> {
        let mut criterion = self.get(id)?;
        self.ensure_unreferenced(id)?;

        if let Some(name) = patch.name {
            criterion.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            criterion.description = description;
        }
        if let Some(weight) = patch.weight {
            criterion.weight = weight;
        }
        if let Some(min_score) = patch.min_score {
            criterion.min_score = min_score;
        }
        if let Some(max_score) = patch.max_score {
            criterion.max_score = max_score;
        }
        validate(&criterion)?;

        self.store.update_criterion(criterion.clone())?;
        debug!(criterion_id = %criterion.id, "criterion updated");
        Ok(criterion)
    }

    pub fn delete(&self, id: &CriterionId) -> Result<(), JudgingError> {
        self.get(id)?;
        self.ensure_unreferenced(id)?;
        self.store.delete_criterion(id)?;
        info!(criterion_id = %id, "criterion removed");
        Ok(())
    }

    fn ensure_unreferenced(&self, id: &CriterionId) -> Result<(), JudgingError> {
        if self.store.any_references_criterion(id)? {
            return Err(JudgingError::CriterionInUse(id.clone()));
        }
        Ok(())
    }
}

pub(crate) fn validate(criterion: &Criterion) -> Result<(), JudgingError> {
    if criterion.name.is_empty() {
        return Err(JudgingError::InvalidCriterion(
            "name is required".to_string(),
        ));
    }
    if criterion.name.chars().count() > NAME_LIMIT {
        return Err(JudgingError::InvalidCriterion(format!(
            "name cannot be more than {NAME_LIMIT} characters"
        )));
    }
    if criterion.description.trim().is_empty() {
        return Err(JudgingError::InvalidCriterion(
            "description is required".to_string(),
        ));
    }
    if criterion.description.chars().count() > DESCRIPTION_LIMIT {
        return Err(JudgingError::InvalidCriterion(format!(
            "description cannot be more than {DESCRIPTION_LIMIT} characters"
        )));
    }
    if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&criterion.weight) {
        return Err(JudgingError::InvalidCriterion(format!(
            "weight must be between {MIN_WEIGHT} and {MAX_WEIGHT}, got {}",
            criterion.weight
        )));
    }
    if !criterion.min_score.is_finite()
        || !criterion.max_score.is_finite()
        || criterion.min_score > criterion.max_score
    {
        return Err(JudgingError::InvalidCriterion(format!(
            "score range {}..={} is not valid",
            criterion.min_score, criterion.max_score
        )));
    }
    Ok(())
}
