use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of a judging criterion.
    CriterionId
);
record_id!(
    /// Identifier of a submitted hackathon project.
    ProjectId
);
record_id!(
    /// Identifier of a judge profile (not the underlying user account).
    JudgeId
);
record_id!(EvaluationId);
record_id!(ScoreId);
record_id!(
    /// Identifier of the user account behind a judge profile.
    UserId
);

/// Named, weighted axis of evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriterionId,
    pub name: String,
    pub description: String,
    pub weight: u8,
    pub min_score: f64,
    pub max_score: f64,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Criterion {
    pub fn accepts(&self, score: f64) -> bool {
        score >= self.min_score && score <= self.max_score
    }
}

/// Input for registering a criterion. Missing fields fall back to the registry defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionDraft {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub weight: Option<u8>,
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
}

/// Partial update applied to an unreferenced criterion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub weight: Option<u8>,
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
}

/// Where a project sits in the submission pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    /// Only projects that made it past submission can be handed to judges.
    pub const fn ready_for_judging(self) -> bool {
        matches!(self, SubmissionStatus::Submitted | SubmissionStatus::Approved)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Slice of a project the judging engine needs to know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub submission_status: SubmissionStatus,
}

/// Judge profile together with its assignment set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judge {
    pub id: JudgeId,
    pub user_id: UserId,
    pub expertise: Vec<String>,
    pub is_available: bool,
    pub assigned_projects: BTreeSet<ProjectId>,
    /// Number of submission events, resubmissions included.
    pub completed_evaluations: u64,
    pub created_at: DateTime<Utc>,
}

impl Judge {
    pub fn is_assigned(&self, project_id: &ProjectId) -> bool {
        self.assigned_projects.contains(project_id)
    }
}

/// One judge's score for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion_id: CriterionId,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Draft,
    Submitted,
    Finalized,
}

impl EvaluationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationStatus::Draft => "draft",
            EvaluationStatus::Submitted => "submitted",
            EvaluationStatus::Finalized => "finalized",
        }
    }

    /// Submitted evaluations count toward a project's score, and keep counting once finalized.
    pub const fn qualifies_for_scoring(self) -> bool {
        matches!(
            self,
            EvaluationStatus::Submitted | EvaluationStatus::Finalized
        )
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compound identity of an evaluation: a judge holds at most one per project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EvaluationKey {
    pub project_id: ProjectId,
    pub judge_id: JudgeId,
}

impl EvaluationKey {
    pub fn new(project_id: ProjectId, judge_id: JudgeId) -> Self {
        Self {
            project_id,
            judge_id,
        }
    }
}

/// A judge's complete scoring submission for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub project_id: ProjectId,
    pub judge_id: JudgeId,
    pub scores: Vec<CriterionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_comment: Option<String>,
    /// `Σ(score * weight)` over this evaluation's own scores.
    pub total_score: f64,
    pub status: EvaluationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn key(&self) -> EvaluationKey {
        EvaluationKey::new(self.project_id.clone(), self.judge_id.clone())
    }

    pub fn references(&self, criterion_id: &CriterionId) -> bool {
        self.scores
            .iter()
            .any(|entry| &entry.criterion_id == criterion_id)
    }
}

/// Scores and comment a judge hands in for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSubmission {
    pub project_id: ProjectId,
    pub judge_id: JudgeId,
    pub scores: Vec<CriterionScore>,
    #[serde(default)]
    pub overall_comment: Option<String>,
}

/// Pooled average for one criterion across a project's evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionAverage {
    pub criterion_id: CriterionId,
    pub average_score: f64,
}

/// Authoritative, finalized result for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub id: ScoreId,
    pub project_id: ProjectId,
    pub final_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    pub evaluation_count: u32,
    pub criteria_scores: Vec<CriterionAverage>,
    pub calculated_at: DateTime<Utc>,
}

impl Score {
    pub fn average_for(&self, criterion_id: &CriterionId) -> Option<f64> {
        self.criteria_scores
            .iter()
            .find(|entry| &entry.criterion_id == criterion_id)
            .map(|entry| entry.average_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_submitted_and_approved_projects_are_ready() {
        assert!(SubmissionStatus::Submitted.ready_for_judging());
        assert!(SubmissionStatus::Approved.ready_for_judging());
        assert!(!SubmissionStatus::Draft.ready_for_judging());
        assert!(!SubmissionStatus::Rejected.ready_for_judging());
    }

    #[test]
    fn drafts_never_qualify_for_scoring() {
        assert!(!EvaluationStatus::Draft.qualifies_for_scoring());
        assert!(EvaluationStatus::Submitted.qualifies_for_scoring());
        assert!(EvaluationStatus::Finalized.qualifies_for_scoring());
    }

    #[test]
    fn identifiers_serialize_as_plain_strings() {
        let id = ProjectId::new("proj-000001");
        let json = serde_json::to_string(&id).expect("serializes");
        assert_eq!(json, "\"proj-000001\"");
    }
}
