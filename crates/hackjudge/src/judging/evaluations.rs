use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{
    Criterion, CriterionId, CriterionScore, Evaluation, EvaluationId, EvaluationKey,
    EvaluationStatus, EvaluationSubmission, Judge, ProjectId,
};
use super::error::{JudgingError, RecordKind};
use super::repository::JudgingStore;
use super::sequence::next_record_id;

pub const SCORE_COMMENT_LIMIT: usize = 200;
pub const OVERALL_COMMENT_LIMIT: usize = 500;

/// Holds one evaluation per (project, judge) pair and gates writes on assignment.
pub struct EvaluationStore<S> {
    store: Arc<S>,
}

impl<S> EvaluationStore<S>
where
    S: JudgingStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Upserts a submitted evaluation and counts the submission against the judge.
    ///
    /// Every successful call bumps `completed_evaluations`, including resubmissions that
    /// overwrite an earlier evaluation for the same project.
    pub fn submit(&self, submission: EvaluationSubmission) -> Result<Evaluation, JudgingError> {
        let evaluation = self.prepare(submission, EvaluationStatus::Submitted)?;
        let (stored, completed) = self.store.record_submission(evaluation)?;

        info!(
            evaluation_id = %stored.id,
            project_id = %stored.project_id,
            judge_id = %stored.judge_id,
            total_score = stored.total_score,
            completed_evaluations = completed,
            "evaluation submitted"
        );
        Ok(stored)
    }

    /// Persists a work-in-progress evaluation that does not count toward scoring.
    pub fn save_draft(
        &self,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation, JudgingError> {
        let evaluation = self.prepare(submission, EvaluationStatus::Draft)?;
        let stored = self.store.upsert_evaluation(evaluation)?;
        debug!(evaluation_id = %stored.id, project_id = %stored.project_id, "draft saved");
        Ok(stored)
    }

    /// Evaluations of a project that count toward its score.
    pub fn for_project(&self, project_id: &ProjectId) -> Result<Vec<Evaluation>, JudgingError> {
        if self.store.fetch_project(project_id)?.is_none() {
            return Err(JudgingError::not_found(RecordKind::Project, project_id));
        }
        Ok(self.store.find_qualifying_by_project(project_id)?)
    }

    pub fn get(&self, key: &EvaluationKey) -> Result<Evaluation, JudgingError> {
        self.store.fetch_evaluation(key)?.ok_or_else(|| {
            JudgingError::not_found(
                RecordKind::Evaluation,
                format!("{}/{}", key.project_id, key.judge_id),
            )
        })
    }

    /// Validates the submission and builds the record to write, without persisting anything.
    fn prepare(
        &self,
        submission: EvaluationSubmission,
        status: EvaluationStatus,
    ) -> Result<Evaluation, JudgingError> {
        let EvaluationSubmission {
            project_id,
            judge_id,
            scores,
            overall_comment,
        } = submission;

        if self.store.fetch_project(&project_id)?.is_none() {
            return Err(JudgingError::not_found(RecordKind::Project, &project_id));
        }
        let judge = self
            .store
            .fetch_judge(&judge_id)?
            .ok_or_else(|| JudgingError::not_found(RecordKind::Judge, &judge_id))?;
        ensure_assigned(&judge, &project_id)?;

        let criteria = self.resolve_criteria(&scores)?;
        check_comments(&scores, overall_comment.as_deref())?;
        let total_score = weighted_total(&scores, &criteria)?;

        let key = EvaluationKey::new(project_id, judge_id);
        let existing = self.store.fetch_evaluation(&key)?;
        if let Some(existing) = &existing {
            check_transition(existing.status, status)?;
        }

        let now = Utc::now();
        let (id, created_at) = match existing {
            Some(existing) => (existing.id, existing.created_at),
            None => (EvaluationId(next_record_id("eval")), now),
        };
        let submitted_at = match status {
            EvaluationStatus::Draft => None,
            _ => Some(now),
        };

        Ok(Evaluation {
            id,
            project_id: key.project_id,
            judge_id: key.judge_id,
            scores,
            overall_comment,
            total_score,
            status,
            submitted_at,
            created_at,
        })
    }

    fn resolve_criteria(
        &self,
        scores: &[CriterionScore],
    ) -> Result<HashMap<CriterionId, Criterion>, JudgingError> {
        let mut criteria = HashMap::new();
        for entry in scores {
            if criteria.contains_key(&entry.criterion_id) {
                continue;
            }
            let criterion = self
                .store
                .fetch_criterion(&entry.criterion_id)?
                .ok_or_else(|| JudgingError::UnknownCriterion(entry.criterion_id.clone()))?;
            criteria.insert(criterion.id.clone(), criterion);
        }
        Ok(criteria)
    }
}

fn ensure_assigned(judge: &Judge, project_id: &ProjectId) -> Result<(), JudgingError> {
    if judge.is_assigned(project_id) {
        return Ok(());
    }
    warn!(judge_id = %judge.id, project_id = %project_id, "evaluation rejected: project not assigned");
    Err(JudgingError::NotAssigned {
        judge_id: judge.id.clone(),
        project_id: project_id.clone(),
    })
}

fn check_comments(
    scores: &[CriterionScore],
    overall_comment: Option<&str>,
) -> Result<(), JudgingError> {
    let too_long = scores
        .iter()
        .filter_map(|entry| entry.comment.as_deref())
        .any(|comment| comment.chars().count() > SCORE_COMMENT_LIMIT);
    if too_long {
        return Err(JudgingError::CommentTooLong {
            field: "score comment",
            limit: SCORE_COMMENT_LIMIT,
        });
    }
    if overall_comment.is_some_and(|comment| comment.chars().count() > OVERALL_COMMENT_LIMIT) {
        return Err(JudgingError::CommentTooLong {
            field: "overall comment",
            limit: OVERALL_COMMENT_LIMIT,
        });
    }
    Ok(())
}

fn check_transition(from: EvaluationStatus, to: EvaluationStatus) -> Result<(), JudgingError> {
    let allowed = match (from, to) {
        (EvaluationStatus::Finalized, _) => false,
        (EvaluationStatus::Submitted, EvaluationStatus::Draft) => false,
        _ => true,
    };
    if allowed {
        Ok(())
    } else {
        Err(JudgingError::InvalidTransition { from, to })
    }
}

/// `Σ(score * weight)` across the entries, checking each score against its criterion range.
pub fn weighted_total(
    scores: &[CriterionScore],
    criteria: &HashMap<CriterionId, Criterion>,
) -> Result<f64, JudgingError> {
    scores.iter().try_fold(0.0, |total, entry| {
        let criterion = criteria
            .get(&entry.criterion_id)
            .ok_or_else(|| JudgingError::UnknownCriterion(entry.criterion_id.clone()))?;
        if !criterion.accepts(entry.score) {
            return Err(JudgingError::ScoreOutOfRange {
                criterion_id: criterion.id.clone(),
                score: entry.score,
                min: criterion.min_score,
                max: criterion.max_score,
            });
        }
        Ok(total + entry.score * f64::from(criterion.weight))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judging::domain::UserId;

    fn criterion(id: &str, weight: u8) -> Criterion {
        Criterion {
            id: CriterionId::new(id),
            name: id.to_string(),
            description: "rubric".to_string(),
            weight,
            min_score: 1.0,
            max_score: 10.0,
            created_by: UserId::new("admin"),
            created_at: Utc::now(),
        }
    }

    fn entry(id: &str, score: f64) -> CriterionScore {
        CriterionScore {
            criterion_id: CriterionId::new(id),
            score,
            comment: None,
        }
    }

    #[test]
    fn weighted_total_multiplies_each_score_by_its_weight() {
        let criteria: HashMap<_, _> = [criterion("impact", 3), criterion("design", 2)]
            .into_iter()
            .map(|criterion| (criterion.id.clone(), criterion))
            .collect();

        let total = weighted_total(&[entry("impact", 7.5), entry("design", 4.0)], &criteria)
            .expect("total computes");
        assert!((total - (7.5 * 3.0 + 4.0 * 2.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn weighted_total_rejects_scores_outside_the_range() {
        let criteria: HashMap<_, _> = [(CriterionId::new("impact"), criterion("impact", 3))]
            .into_iter()
            .collect();

        match weighted_total(&[entry("impact", 11.0)], &criteria) {
            Err(JudgingError::ScoreOutOfRange { score, max, .. }) => {
                assert_eq!(score, 11.0);
                assert_eq!(max, 10.0);
            }
            other => panic!("expected out of range, got {other:?}"),
        }
    }

    #[test]
    fn finalized_is_terminal_and_submissions_are_not_downgraded() {
        assert!(check_transition(EvaluationStatus::Draft, EvaluationStatus::Submitted).is_ok());
        assert!(check_transition(EvaluationStatus::Submitted, EvaluationStatus::Submitted).is_ok());
        assert!(check_transition(EvaluationStatus::Submitted, EvaluationStatus::Draft).is_err());
        assert!(
            check_transition(EvaluationStatus::Finalized, EvaluationStatus::Submitted).is_err()
        );
    }

    #[test]
    fn overlong_comments_are_rejected() {
        let mut scored = entry("impact", 5.0);
        scored.comment = Some("x".repeat(SCORE_COMMENT_LIMIT + 1));
        assert!(matches!(
            check_comments(&[scored], None),
            Err(JudgingError::CommentTooLong {
                field: "score comment",
                ..
            })
        ));

        let overall = "y".repeat(OVERALL_COMMENT_LIMIT + 1);
        assert!(matches!(
            check_comments(&[], Some(overall.as_str())),
            Err(JudgingError::CommentTooLong {
                field: "overall comment",
                ..
            })
        ));
    }
}
