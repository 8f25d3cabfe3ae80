use std::sync::Arc;

use tracing::debug;

use super::domain::{Project, ProjectId, SubmissionStatus};
use super::error::{JudgingError, RecordKind};
use super::repository::JudgingStore;
use super::sequence::next_record_id;

/// Minimal view of the project catalogue owned by the submission workflow.
pub struct ProjectRegistry<S> {
    store: Arc<S>,
}

impl<S> ProjectRegistry<S>
where
    S: JudgingStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn register(
        &self,
        title: impl Into<String>,
        submission_status: SubmissionStatus,
    ) -> Result<Project, JudgingError> {
        let project = self.store.insert_project(Project {
            id: ProjectId(next_record_id("proj")),
            title: title.into(),
            submission_status,
        })?;
        debug!(project_id = %project.id, status = %project.submission_status, "project registered");
        Ok(project)
    }

    pub fn set_submission_status(
        &self,
        id: &ProjectId,
        submission_status: SubmissionStatus,
    ) -> Result<Project, JudgingError> {
        let mut project = self.get(id)?;
        project.submission_status = submission_status;
        self.store.update_project(project.clone())?;
        Ok(project)
    }

    pub fn get(&self, id: &ProjectId) -> Result<Project, JudgingError> {
        self.store
            .fetch_project(id)?
            .ok_or_else(|| JudgingError::not_found(RecordKind::Project, id))
    }

    pub fn list(&self) -> Result<Vec<Project>, JudgingError> {
        Ok(self.store.all_projects()?)
    }
}
