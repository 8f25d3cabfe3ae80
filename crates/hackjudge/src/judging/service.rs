use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::aggregation::AggregationEngine;
use super::assignments::AssignmentTracker;
use super::criteria::CriteriaRegistry;
use super::domain::{
    Evaluation, EvaluationSubmission, Judge, JudgeId, ProjectId, Score, SubmissionStatus,
};
use super::error::JudgingError;
use super::evaluations::EvaluationStore;
use super::projects::ProjectRegistry;
use super::ranking::RankingEngine;
use super::repository::JudgingStore;

/// Service composing the registries and engines over one shared store.
pub struct JudgingService<S> {
    criteria: CriteriaRegistry<S>,
    projects: ProjectRegistry<S>,
    judges: AssignmentTracker<S>,
    evaluations: EvaluationStore<S>,
    aggregation: AggregationEngine<S>,
    ranking: RankingEngine<S>,
}

/// Outcome for one project in a batch calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectScoreSummary {
    pub project_id: ProjectId,
    pub title: String,
    pub final_score: f64,
    pub evaluation_count: u32,
}

/// Report returned by [`JudgingService::calculate_all_scores`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub results: Vec<ProjectScoreSummary>,
    pub skipped: Vec<ProjectId>,
}

impl BatchSummary {
    pub fn message(&self) -> String {
        format!("Calculated scores for {} projects", self.results.len())
    }
}

impl<S> JudgingService<S>
where
    S: JudgingStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            criteria: CriteriaRegistry::new(store.clone()),
            projects: ProjectRegistry::new(store.clone()),
            judges: AssignmentTracker::new(store.clone()),
            evaluations: EvaluationStore::new(store.clone()),
            aggregation: AggregationEngine::new(store.clone()),
            ranking: RankingEngine::new(store),
        }
    }

    pub fn criteria(&self) -> &CriteriaRegistry<S> {
        &self.criteria
    }

    pub fn projects(&self) -> &ProjectRegistry<S> {
        &self.projects
    }

    pub fn judges(&self) -> &AssignmentTracker<S> {
        &self.judges
    }

    pub fn evaluations(&self) -> &EvaluationStore<S> {
        &self.evaluations
    }

    pub fn submit_evaluation(
        &self,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation, JudgingError> {
        self.evaluations.submit(submission)
    }

    pub fn finalize_project_score(&self, project_id: &ProjectId) -> Result<Score, JudgingError> {
        self.aggregation.finalize_project_score(project_id)
    }

    pub fn recompute_ranks(&self) -> Result<(), JudgingError> {
        self.ranking.recompute_ranks()
    }

    pub fn assign_projects(
        &self,
        judge_id: &JudgeId,
        project_ids: &[ProjectId],
    ) -> Result<Judge, JudgingError> {
        self.judges.assign_projects(judge_id, project_ids)
    }

    pub fn project_score(&self, project_id: &ProjectId) -> Result<Score, JudgingError> {
        self.aggregation.project_score(project_id)
    }

    pub fn list_scores(&self) -> Result<Vec<Score>, JudgingError> {
        self.ranking.leaderboard()
    }

    /// Recalculates the score of every approved project that has submitted evaluations, then
    /// re-ranks.
    ///
    /// Evaluations keep their status, so judges can still resubmit afterwards. Approved
    /// projects without any qualifying evaluation are skipped rather than failing the batch.
    pub fn calculate_all_scores(&self) -> Result<BatchSummary, JudgingError> {
        let approved: Vec<_> = self
            .projects
            .list()?
            .into_iter()
            .filter(|project| project.submission_status == SubmissionStatus::Approved)
            .collect();
        if approved.is_empty() {
            return Err(JudgingError::NoApprovedProjects);
        }

        let mut summary = BatchSummary {
            results: Vec::new(),
            skipped: Vec::new(),
        };
        for project in approved {
            match self.aggregation.score_project(&project.id) {
                Ok(score) => summary.results.push(ProjectScoreSummary {
                    project_id: project.id,
                    title: project.title,
                    final_score: score.final_score,
                    evaluation_count: score.evaluation_count,
                }),
                Err(JudgingError::NoEvaluations(project_id)) => {
                    warn!(project_id = %project_id, "skipping project without evaluations");
                    summary.skipped.push(project_id);
                }
                Err(other) => return Err(other),
            }
        }

        self.ranking.recompute_ranks()?;
        info!(
            calculated = summary.results.len(),
            skipped = summary.skipped.len(),
            "batch score calculation complete"
        );
        Ok(summary)
    }
}
