use super::domain::{
    Criterion, CriterionId, Evaluation, EvaluationKey, Judge, JudgeId, Project, ProjectId, Score,
    UserId,
};

/// Criterion storage. `all` yields records in insertion order.
pub trait CriterionRepository: Send + Sync {
    fn insert_criterion(&self, criterion: Criterion) -> Result<Criterion, RepositoryError>;
    fn update_criterion(&self, criterion: Criterion) -> Result<(), RepositoryError>;
    fn delete_criterion(&self, id: &CriterionId) -> Result<(), RepositoryError>;
    fn fetch_criterion(&self, id: &CriterionId) -> Result<Option<Criterion>, RepositoryError>;
    fn all_criteria(&self) -> Result<Vec<Criterion>, RepositoryError>;
}

/// Read access to projects plus the minimal writes needed to register them.
pub trait ProjectRepository: Send + Sync {
    fn insert_project(&self, project: Project) -> Result<Project, RepositoryError>;
    fn update_project(&self, project: Project) -> Result<(), RepositoryError>;
    fn fetch_project(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError>;
    fn all_projects(&self) -> Result<Vec<Project>, RepositoryError>;
}

pub trait JudgeRepository: Send + Sync {
    fn insert_judge(&self, judge: Judge) -> Result<Judge, RepositoryError>;
    fn fetch_judge(&self, id: &JudgeId) -> Result<Option<Judge>, RepositoryError>;
    fn find_judge_by_user(&self, user_id: &UserId) -> Result<Option<Judge>, RepositoryError>;
    fn all_judges(&self) -> Result<Vec<Judge>, RepositoryError>;
    /// Unions `project_ids` into the judge's assignment set in place.
    fn add_assignments(
        &self,
        id: &JudgeId,
        project_ids: &[ProjectId],
    ) -> Result<Judge, RepositoryError>;
    /// Overwrites only the given profile fields; the assignment set and counter are untouched.
    fn update_judge_profile(
        &self,
        id: &JudgeId,
        expertise: Option<Vec<String>>,
        is_available: Option<bool>,
    ) -> Result<Judge, RepositoryError>;
}

/// Evaluations are keyed by `(project, judge)` so a write is a single upsert.
pub trait EvaluationRepository: Send + Sync {
    fn upsert_evaluation(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError>;
    /// Upserts a submitted evaluation and bumps its judge's `completed_evaluations` as one unit,
    /// returning the stored evaluation and the new counter value. Nothing is written when the
    /// judge is missing.
    fn record_submission(
        &self,
        evaluation: Evaluation,
    ) -> Result<(Evaluation, u64), RepositoryError>;
    fn fetch_evaluation(&self, key: &EvaluationKey)
        -> Result<Option<Evaluation>, RepositoryError>;
    /// Submitted and finalized evaluations of a project, in creation order.
    fn find_qualifying_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<Evaluation>, RepositoryError>;
    /// Moves every submitted evaluation of a project to finalized, returning how many moved.
    fn finalize_submitted(&self, project_id: &ProjectId) -> Result<usize, RepositoryError>;
    fn any_references_criterion(&self, id: &CriterionId) -> Result<bool, RepositoryError>;
}

/// Score storage. `all_scores` yields records in the order they were first created.
pub trait ScoreRepository: Send + Sync {
    fn upsert_score(&self, score: Score) -> Result<Score, RepositoryError>;
    fn fetch_score(&self, project_id: &ProjectId) -> Result<Option<Score>, RepositoryError>;
    fn all_scores(&self) -> Result<Vec<Score>, RepositoryError>;
    fn save_ranks(&self, ranks: &[(ProjectId, u32)]) -> Result<(), RepositoryError>;
}

/// Everything the judging engine persists, behind one handle.
pub trait JudgingStore:
    CriterionRepository + ProjectRepository + JudgeRepository + EvaluationRepository + ScoreRepository
{
}

impl<T> JudgingStore for T where
    T: CriterionRepository
        + ProjectRepository
        + JudgeRepository
        + EvaluationRepository
        + ScoreRepository
{
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
