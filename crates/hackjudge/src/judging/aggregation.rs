use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{CriterionAverage, CriterionId, Evaluation, ProjectId, Score, ScoreId};
use super::error::{JudgingError, RecordKind};
use super::repository::JudgingStore;
use super::sequence::next_record_id;

/// Running `(sum, count)` for one criterion across every pooled evaluation.
#[derive(Debug, Clone, PartialEq)]
struct CriterionTally {
    criterion_id: CriterionId,
    sum: f64,
    count: u32,
}

/// Result of pooling a project's evaluations, before it is persisted as a `Score`.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub final_score: f64,
    pub evaluation_count: u32,
    pub criteria_scores: Vec<CriterionAverage>,
}

/// Pools per-criterion scores across all evaluations and applies each criterion's weight once.
///
/// Averages are taken over every entry for a criterion regardless of which judge gave it.
/// Criteria are reported in the order they are first seen.
pub fn aggregate<F>(evaluations: &[Evaluation], mut weight_of: F) -> Result<Aggregate, JudgingError>
where
    F: FnMut(&CriterionId) -> Result<u8, JudgingError>,
{
    let mut tallies: Vec<CriterionTally> = Vec::new();
    let mut positions: HashMap<CriterionId, usize> = HashMap::new();

    for evaluation in evaluations {
        for entry in &evaluation.scores {
            let slot = *positions
                .entry(entry.criterion_id.clone())
                .or_insert_with(|| {
                    tallies.push(CriterionTally {
                        criterion_id: entry.criterion_id.clone(),
                        sum: 0.0,
                        count: 0,
                    });
                    tallies.len() - 1
                });
            let tally = &mut tallies[slot];
            tally.sum += entry.score;
            tally.count += 1;
        }
    }

    let mut final_score = 0.0;
    let mut criteria_scores = Vec::with_capacity(tallies.len());
    for tally in tallies {
        let average_score = tally.sum / f64::from(tally.count);
        final_score += average_score * f64::from(weight_of(&tally.criterion_id)?);
        criteria_scores.push(CriterionAverage {
            criterion_id: tally.criterion_id,
            average_score,
        });
    }

    Ok(Aggregate {
        final_score,
        evaluation_count: u32::try_from(evaluations.len()).unwrap_or(u32::MAX),
        criteria_scores,
    })
}

/// Turns a project's submitted evaluations into its authoritative `Score`.
pub struct AggregationEngine<S> {
    store: Arc<S>,
}

impl<S> AggregationEngine<S>
where
    S: JudgingStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Recomputes and persists the project's score, then finalizes its submitted evaluations.
    ///
    /// Evaluations finalized by an earlier call still count, so repeating the call without new
    /// submissions yields the same averages and final score.
    pub fn finalize_project_score(&self, project_id: &ProjectId) -> Result<Score, JudgingError> {
        let score = self.score_project(project_id)?;
        let finalized = self.store.finalize_submitted(project_id)?;
        info!(
            project_id = %project_id,
            final_score = score.final_score,
            evaluation_count = score.evaluation_count,
            finalized,
            "project score finalized"
        );
        Ok(score)
    }

    /// Recomputes and persists the project's score without changing any evaluation status.
    pub fn score_project(&self, project_id: &ProjectId) -> Result<Score, JudgingError> {
        let evaluations = self.store.find_qualifying_by_project(project_id)?;
        if evaluations.is_empty() {
            return Err(JudgingError::NoEvaluations(project_id.clone()));
        }

        let mut weights: HashMap<CriterionId, u8> = HashMap::new();
        let aggregate = aggregate(&evaluations, |criterion_id| {
            if let Some(weight) = weights.get(criterion_id) {
                return Ok(*weight);
            }
            let criterion = self
                .store
                .fetch_criterion(criterion_id)?
                .ok_or_else(|| JudgingError::UnknownCriterion(criterion_id.clone()))?;
            weights.insert(criterion.id, criterion.weight);
            Ok(criterion.weight)
        })?;

        let previous = self.store.fetch_score(project_id)?;
        let (id, rank) = match previous {
            Some(previous) => (previous.id, previous.rank),
            None => (ScoreId(next_record_id("score")), None),
        };

        let score = self.store.upsert_score(Score {
            id,
            project_id: project_id.clone(),
            final_score: aggregate.final_score,
            rank,
            evaluation_count: aggregate.evaluation_count,
            criteria_scores: aggregate.criteria_scores,
            calculated_at: Utc::now(),
        })?;

        debug!(
            project_id = %project_id,
            final_score = score.final_score,
            evaluation_count = score.evaluation_count,
            "project score calculated"
        );
        Ok(score)
    }

    pub fn project_score(&self, project_id: &ProjectId) -> Result<Score, JudgingError> {
        self.store
            .fetch_score(project_id)?
            .ok_or_else(|| JudgingError::not_found(RecordKind::Score, project_id))
    }
}
