use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{Judge, JudgeId, ProjectId, UserId};
use super::error::{JudgingError, RecordKind};
use super::repository::{JudgingStore, RepositoryError};
use super::sequence::next_record_id;

/// Changes an admin may make to a judge profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JudgeUpdate {
    #[serde(default)]
    pub expertise: Option<Vec<String>>,
    #[serde(default)]
    pub is_available: Option<bool>,
}

/// Keeps track of judges and the projects each one may evaluate.
pub struct AssignmentTracker<S> {
    store: Arc<S>,
}

impl<S> AssignmentTracker<S>
where
    S: JudgingStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn register_judge(
        &self,
        user_id: UserId,
        expertise: Vec<String>,
    ) -> Result<Judge, JudgingError> {
        if self.store.find_judge_by_user(&user_id)?.is_some() {
            return Err(JudgingError::DuplicateJudge(user_id.0));
        }

        let judge = Judge {
            id: JudgeId(next_record_id("judge")),
            user_id: user_id.clone(),
            expertise,
            is_available: true,
            assigned_projects: BTreeSet::new(),
            completed_evaluations: 0,
            created_at: Utc::now(),
        };

        let stored = self.store.insert_judge(judge).map_err(|err| match err {
            RepositoryError::Conflict => JudgingError::DuplicateJudge(user_id.0.clone()),
            other => other.into(),
        })?;
        info!(judge_id = %stored.id, user_id = %stored.user_id, "judge registered");
        Ok(stored)
    }

    pub fn get(&self, id: &JudgeId) -> Result<Judge, JudgingError> {
        self.store
            .fetch_judge(id)?
            .ok_or_else(|| JudgingError::not_found(RecordKind::Judge, id))
    }

    pub fn list(&self) -> Result<Vec<Judge>, JudgingError> {
        Ok(self.store.all_judges()?)
    }

    pub fn update(&self, id: &JudgeId, update: JudgeUpdate) -> Result<Judge, JudgingError> {
        let judge = self
            .store
            .update_judge_profile(id, update.expertise, update.is_available)
            .map_err(|err| match err {
                RepositoryError::NotFound => JudgingError::not_found(RecordKind::Judge, id),
                other => other.into(),
            })?;
        debug!(judge_id = %judge.id, is_available = judge.is_available, "judge updated");
        Ok(judge)
    }

    /// Adds projects to a judge's assignment set.
    ///
    /// Every project must exist and be submitted or approved; the whole request is validated
    /// before the set is touched. Existing assignments are kept.
    pub fn assign_projects(
        &self,
        judge_id: &JudgeId,
        project_ids: &[ProjectId],
    ) -> Result<Judge, JudgingError> {
        let before = self.get(judge_id)?.assigned_projects.len();

        for project_id in project_ids {
            let project = self
                .store
                .fetch_project(project_id)?
                .ok_or_else(|| JudgingError::not_found(RecordKind::Project, project_id))?;
            if !project.submission_status.ready_for_judging() {
                return Err(JudgingError::ProjectNotReady {
                    project_id: project.id,
                    status: project.submission_status,
                });
            }
        }

        let judge = self
            .store
            .add_assignments(judge_id, project_ids)
            .map_err(|err| match err {
                RepositoryError::NotFound => JudgingError::not_found(RecordKind::Judge, judge_id),
                other => other.into(),
            })?;

        info!(
            judge_id = %judge.id,
            added = judge.assigned_projects.len().saturating_sub(before),
            assigned = judge.assigned_projects.len(),
            "projects assigned"
        );
        Ok(judge)
    }
}
