use super::domain::{CriterionId, EvaluationStatus, JudgeId, ProjectId, SubmissionStatus};
use super::repository::RepositoryError;

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Criterion,
    Project,
    Judge,
    Evaluation,
    Score,
}

impl RecordKind {
    pub const fn label(self) -> &'static str {
        match self {
            RecordKind::Criterion => "criterion",
            RecordKind::Project => "project",
            RecordKind::Judge => "judge",
            RecordKind::Evaluation => "evaluation",
            RecordKind::Score => "score",
        }
    }
}

/// Error raised by the judging engine.
#[derive(Debug, thiserror::Error)]
pub enum JudgingError {
    #[error("{} {id} not found", .kind.label())]
    NotFound { kind: RecordKind, id: String },
    #[error("project {project_id} is not assigned to judge {judge_id}")]
    NotAssigned {
        judge_id: JudgeId,
        project_id: ProjectId,
    },
    #[error("criterion {0} is not registered")]
    UnknownCriterion(CriterionId),
    #[error("no submitted evaluations found for project {0}")]
    NoEvaluations(ProjectId),
    #[error("project {project_id} is not ready for judging (status: {status})")]
    ProjectNotReady {
        project_id: ProjectId,
        status: SubmissionStatus,
    },
    #[error("invalid criterion: {0}")]
    InvalidCriterion(String),
    #[error("score {score} for criterion {criterion_id} is outside {min}..={max}")]
    ScoreOutOfRange {
        criterion_id: CriterionId,
        score: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} cannot exceed {limit} characters")]
    CommentTooLong { field: &'static str, limit: usize },
    #[error("evaluation cannot move from {from} to {to}")]
    InvalidTransition {
        from: EvaluationStatus,
        to: EvaluationStatus,
    },
    #[error("criterion {0} is referenced by evaluations and cannot change")]
    CriterionInUse(CriterionId),
    #[error("user {0} is already a judge")]
    DuplicateJudge(String),
    #[error("no approved projects found")]
    NoApprovedProjects,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl JudgingError {
    pub(crate) fn not_found(kind: RecordKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Whether the caller can fix the request and retry, as opposed to a storage failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, JudgingError::Repository(_))
    }
}
