use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::judging::domain::{
    Criterion, CriterionDraft, CriterionId, CriterionScore, Evaluation, EvaluationKey,
    EvaluationSubmission, Judge, JudgeId, Project, ProjectId, Score, SubmissionStatus, UserId,
};
use crate::judging::repository::{
    CriterionRepository, EvaluationRepository, JudgeRepository, ProjectRepository,
    RepositoryError, ScoreRepository,
};
use crate::judging::{InMemoryJudgingStore, JudgingService};

pub(super) struct Fixture {
    pub(super) service: JudgingService<InMemoryJudgingStore>,
    pub(super) store: Arc<InMemoryJudgingStore>,
}

pub(super) fn fixture() -> Fixture {
    let store = Arc::new(InMemoryJudgingStore::default());
    let service = JudgingService::new(store.clone());
    Fixture { service, store }
}

impl Fixture {
    pub(super) fn criterion(&self, name: &str, weight: u8) -> Criterion {
        self.service
            .criteria()
            .create(
                CriterionDraft {
                    name: name.to_string(),
                    description: format!("{name} rubric"),
                    weight: Some(weight),
                    min_score: Some(1.0),
                    max_score: Some(10.0),
                },
                UserId::new("organizer"),
            )
            .expect("criterion created")
    }

    pub(super) fn project(&self, title: &str, status: SubmissionStatus) -> Project {
        self.service
            .projects()
            .register(title, status)
            .expect("project registered")
    }

    pub(super) fn judge_for(&self, user: &str, projects: &[&Project]) -> Judge {
        let judge = self
            .service
            .judges()
            .register_judge(UserId::new(user), vec!["web".to_string()])
            .expect("judge registered");
        let ids: Vec<ProjectId> = projects.iter().map(|project| project.id.clone()).collect();
        self.service
            .assign_projects(&judge.id, &ids)
            .expect("projects assigned")
    }

    pub(super) fn submit(
        &self,
        project: &Project,
        judge: &Judge,
        scores: &[(&Criterion, f64)],
    ) -> Evaluation {
        self.service
            .submit_evaluation(submission(project, judge, scores))
            .expect("evaluation submitted")
    }

    pub(super) fn judge(&self, id: &JudgeId) -> Judge {
        self.service.judges().get(id).expect("judge present")
    }

    pub(super) fn stored_evaluation(&self, project: &Project, judge: &Judge) -> Option<Evaluation> {
        self.store
            .fetch_evaluation(&EvaluationKey::new(project.id.clone(), judge.id.clone()))
            .expect("fetch succeeds")
    }
}

pub(super) fn submission(
    project: &Project,
    judge: &Judge,
    scores: &[(&Criterion, f64)],
) -> EvaluationSubmission {
    EvaluationSubmission {
        project_id: project.id.clone(),
        judge_id: judge.id.clone(),
        scores: scores
            .iter()
            .map(|(criterion, score)| CriterionScore {
                criterion_id: criterion.id.clone(),
                score: *score,
                comment: None,
            })
            .collect(),
        overall_comment: Some("Solid demo".to_string()),
    }
}

pub(super) fn approx_eq(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store whose every call fails, for exercising storage error paths.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl CriterionRepository for UnavailableStore {
    fn insert_criterion(&self, _criterion: Criterion) -> Result<Criterion, RepositoryError> {
        offline()
    }
    fn update_criterion(&self, _criterion: Criterion) -> Result<(), RepositoryError> {
        offline()
    }
    fn delete_criterion(&self, _id: &CriterionId) -> Result<(), RepositoryError> {
        offline()
    }
    fn fetch_criterion(&self, _id: &CriterionId) -> Result<Option<Criterion>, RepositoryError> {
        offline()
    }
    fn all_criteria(&self) -> Result<Vec<Criterion>, RepositoryError> {
        offline()
    }
}

impl ProjectRepository for UnavailableStore {
    fn insert_project(&self, _project: Project) -> Result<Project, RepositoryError> {
        offline()
    }
    fn update_project(&self, _project: Project) -> Result<(), RepositoryError> {
        offline()
    }
    fn fetch_project(&self, _id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        offline()
    }
    fn all_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        offline()
    }
}

impl JudgeRepository for UnavailableStore {
    fn insert_judge(&self, _judge: Judge) -> Result<Judge, RepositoryError> {
        offline()
    }
    fn fetch_judge(&self, _id: &JudgeId) -> Result<Option<Judge>, RepositoryError> {
        offline()
    }
    fn find_judge_by_user(&self, _user_id: &UserId) -> Result<Option<Judge>, RepositoryError> {
        offline()
    }
    fn all_judges(&self) -> Result<Vec<Judge>, RepositoryError> {
        offline()
    }
    fn add_assignments(
        &self,
        _id: &JudgeId,
        _project_ids: &[ProjectId],
    ) -> Result<Judge, RepositoryError> {
        offline()
    }
    fn update_judge_profile(
        &self,
        _id: &JudgeId,
        _expertise: Option<Vec<String>>,
        _is_available: Option<bool>,
    ) -> Result<Judge, RepositoryError> {
        offline()
    }
}

impl EvaluationRepository for UnavailableStore {
    fn upsert_evaluation(&self, _evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        offline()
    }
    fn record_submission(
        &self,
        _evaluation: Evaluation,
    ) -> Result<(Evaluation, u64), RepositoryError> {
        offline()
    }
    fn fetch_evaluation(
        &self,
        _key: &EvaluationKey,
    ) -> Result<Option<Evaluation>, RepositoryError> {
        offline()
    }
    fn find_qualifying_by_project(
        &self,
        _project_id: &ProjectId,
    ) -> Result<Vec<Evaluation>, RepositoryError> {
        offline()
    }
    fn finalize_submitted(&self, _project_id: &ProjectId) -> Result<usize, RepositoryError> {
        offline()
    }
    fn any_references_criterion(&self, _id: &CriterionId) -> Result<bool, RepositoryError> {
        offline()
    }
}

impl ScoreRepository for UnavailableStore {
    fn upsert_score(&self, _score: Score) -> Result<Score, RepositoryError> {
        offline()
    }
    fn fetch_score(&self, _project_id: &ProjectId) -> Result<Option<Score>, RepositoryError> {
        offline()
    }
    fn all_scores(&self) -> Result<Vec<Score>, RepositoryError> {
        offline()
    }
    fn save_ranks(&self, _ranks: &[(ProjectId, u32)]) -> Result<(), RepositoryError> {
        offline()
    }
}

/// In-memory store that lands one queued submission right after the next judge read, so the
/// caller works from a snapshot that is already stale.
#[derive(Default)]
pub(super) struct InterleavingStore {
    pub(super) inner: InMemoryJudgingStore,
    queued: Mutex<Option<Evaluation>>,
}

impl InterleavingStore {
    pub(super) fn queue_submission(&self, evaluation: Evaluation) {
        *self.queued.lock().expect("queue lock") = Some(evaluation);
    }
}

impl CriterionRepository for InterleavingStore {
    fn insert_criterion(&self, criterion: Criterion) -> Result<Criterion, RepositoryError> {
        self.inner.insert_criterion(criterion)
    }
    fn update_criterion(&self, criterion: Criterion) -> Result<(), RepositoryError> {
        self.inner.update_criterion(criterion)
    }
    fn delete_criterion(&self, id: &CriterionId) -> Result<(), RepositoryError> {
        self.inner.delete_criterion(id)
    }
    fn fetch_criterion(&self, id: &CriterionId) -> Result<Option<Criterion>, RepositoryError> {
        self.inner.fetch_criterion(id)
    }
    fn all_criteria(&self) -> Result<Vec<Criterion>, RepositoryError> {
        self.inner.all_criteria()
    }
}

impl ProjectRepository for InterleavingStore {
    fn insert_project(&self, project: Project) -> Result<Project, RepositoryError> {
        self.inner.insert_project(project)
    }
    fn update_project(&self, project: Project) -> Result<(), RepositoryError> {
        self.inner.update_project(project)
    }
    fn fetch_project(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        self.inner.fetch_project(id)
    }
    fn all_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        self.inner.all_projects()
    }
}

impl JudgeRepository for InterleavingStore {
    fn insert_judge(&self, judge: Judge) -> Result<Judge, RepositoryError> {
        self.inner.insert_judge(judge)
    }
    fn fetch_judge(&self, id: &JudgeId) -> Result<Option<Judge>, RepositoryError> {
        let snapshot = self.inner.fetch_judge(id)?;
        let queued = self.queued.lock().expect("queue lock").take();
        if let Some(evaluation) = queued {
            self.inner.record_submission(evaluation)?;
        }
        Ok(snapshot)
    }
    fn find_judge_by_user(&self, user_id: &UserId) -> Result<Option<Judge>, RepositoryError> {
        self.inner.find_judge_by_user(user_id)
    }
    fn all_judges(&self) -> Result<Vec<Judge>, RepositoryError> {
        self.inner.all_judges()
    }
    fn add_assignments(
        &self,
        id: &JudgeId,
        project_ids: &[ProjectId],
    ) -> Result<Judge, RepositoryError> {
        self.inner.add_assignments(id, project_ids)
    }
    fn update_judge_profile(
        &self,
        id: &JudgeId,
        expertise: Option<Vec<String>>,
        is_available: Option<bool>,
    ) -> Result<Judge, RepositoryError> {
        self.inner.update_judge_profile(id, expertise, is_available)
    }
}

impl EvaluationRepository for InterleavingStore {
    fn upsert_evaluation(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        self.inner.upsert_evaluation(evaluation)
    }
    fn record_submission(
        &self,
        evaluation: Evaluation,
    ) -> Result<(Evaluation, u64), RepositoryError> {
        self.inner.record_submission(evaluation)
    }
    fn fetch_evaluation(&self, key: &EvaluationKey) -> Result<Option<Evaluation>, RepositoryError> {
        self.inner.fetch_evaluation(key)
    }
    fn find_qualifying_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<Evaluation>, RepositoryError> {
        self.inner.find_qualifying_by_project(project_id)
    }
    fn finalize_submitted(&self, project_id: &ProjectId) -> Result<usize, RepositoryError> {
        self.inner.finalize_submitted(project_id)
    }
    fn any_references_criterion(&self, id: &CriterionId) -> Result<bool, RepositoryError> {
        self.inner.any_references_criterion(id)
    }
}

impl ScoreRepository for InterleavingStore {
    fn upsert_score(&self, score: Score) -> Result<Score, RepositoryError> {
        self.inner.upsert_score(score)
    }
    fn fetch_score(&self, project_id: &ProjectId) -> Result<Option<Score>, RepositoryError> {
        self.inner.fetch_score(project_id)
    }
    fn all_scores(&self) -> Result<Vec<Score>, RepositoryError> {
        self.inner.all_scores()
    }
    fn save_ranks(&self, ranks: &[(ProjectId, u32)]) -> Result<(), RepositoryError> {
        self.inner.save_ranks(ranks)
    }
}
