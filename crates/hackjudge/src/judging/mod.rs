//! Hackathon judging: weighted criteria, per-judge evaluations, score finalization and ranking.
//!
//! Every component works against the repository traits in [`repository`], so the same
//! service runs over the in-memory store used by the binary and tests or any other backend.

pub mod aggregation;
pub mod assignments;
pub mod criteria;
pub mod domain;
pub mod error;
pub mod evaluations;
pub mod memory;
pub mod projects;
pub mod ranking;
pub mod repository;
pub mod router;
mod sequence;
pub mod service;

#[cfg(test)]
mod tests;

pub use aggregation::{aggregate, Aggregate, AggregationEngine};
pub use assignments::{AssignmentTracker, JudgeUpdate};
pub use criteria::CriteriaRegistry;
pub use domain::{
    Criterion, CriterionAverage, CriterionDraft, CriterionId, CriterionPatch, CriterionScore,
    Evaluation, EvaluationId, EvaluationKey, EvaluationStatus, EvaluationSubmission, Judge,
    JudgeId, Project, ProjectId, Score, ScoreId, SubmissionStatus, UserId,
};
pub use error::{JudgingError, RecordKind};
pub use evaluations::{weighted_total, EvaluationStore};
pub use memory::InMemoryJudgingStore;
pub use projects::ProjectRegistry;
pub use ranking::{dense_ranks, RankingEngine};
pub use repository::{
    CriterionRepository, EvaluationRepository, JudgeRepository, JudgingStore, ProjectRepository,
    RepositoryError, ScoreRepository,
};
pub use router::judging_router;
pub use service::{BatchSummary, JudgingService, ProjectScoreSummary};
