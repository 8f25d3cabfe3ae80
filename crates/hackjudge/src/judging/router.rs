use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::assignments::JudgeUpdate;
use super::domain::{
    CriterionDraft, CriterionId, CriterionPatch, EvaluationSubmission, JudgeId, ProjectId,
    SubmissionStatus, UserId,
};
use super::error::JudgingError;
use super::repository::JudgingStore;
use super::service::JudgingService;

type SharedService<S> = State<Arc<JudgingService<S>>>;

/// Router builder exposing the judging operations over HTTP.
pub fn judging_router<S>(service: Arc<JudgingService<S>>) -> Router
where
    S: JudgingStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/judging/criteria",
            get(list_criteria_handler::<S>).post(create_criterion_handler::<S>),
        )
        .route(
            "/api/v1/judging/criteria/:criterion_id",
            get(get_criterion_handler::<S>)
                .put(update_criterion_handler::<S>)
                .delete(delete_criterion_handler::<S>),
        )
        .route(
            "/api/v1/judging/judges",
            get(list_judges_handler::<S>).post(register_judge_handler::<S>),
        )
        .route(
            "/api/v1/judging/judges/:judge_id",
            get(get_judge_handler::<S>).put(update_judge_handler::<S>),
        )
        .route(
            "/api/v1/judging/judges/:judge_id/assign",
            put(assign_projects_handler::<S>),
        )
        .route(
            "/api/v1/judging/evaluations",
            post(submit_evaluation_handler::<S>),
        )
        .route(
            "/api/v1/judging/evaluations/draft",
            post(save_draft_handler::<S>),
        )
        .route(
            "/api/v1/judging/projects/:project_id/evaluations",
            get(project_evaluations_handler::<S>),
        )
        .route(
            "/api/v1/judging/projects/:project_id/finalize",
            post(finalize_handler::<S>),
        )
        .route("/api/v1/projects", post(register_project_handler::<S>))
        .route(
            "/api/v1/projects/:project_id/status",
            put(project_status_handler::<S>),
        )
        .route("/api/v1/scores", get(list_scores_handler::<S>))
        .route(
            "/api/v1/scores/project/:project_id",
            get(project_score_handler::<S>),
        )
        .route("/api/v1/scores/calculate", post(calculate_handler::<S>))
        .route("/api/v1/scores/ranks", post(recompute_ranks_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateCriterionRequest {
    pub(crate) created_by: UserId,
    #[serde(flatten)]
    pub(crate) criterion: CriterionDraft,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterJudgeRequest {
    pub(crate) user_id: UserId,
    #[serde(default)]
    pub(crate) expertise: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignProjectsRequest {
    pub(crate) project_ids: Vec<ProjectId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterProjectRequest {
    pub(crate) title: String,
    pub(crate) submission_status: SubmissionStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectStatusRequest {
    pub(crate) submission_status: SubmissionStatus,
}

/// Maps engine errors onto HTTP status codes.
pub(crate) fn status_for(error: &JudgingError) -> StatusCode {
    match error {
        JudgingError::NotFound { .. } | JudgingError::UnknownCriterion(_) => StatusCode::NOT_FOUND,
        JudgingError::NotAssigned { .. } => StatusCode::FORBIDDEN,
        JudgingError::NoEvaluations(_)
        | JudgingError::ProjectNotReady { .. }
        | JudgingError::NoApprovedProjects => StatusCode::BAD_REQUEST,
        JudgingError::InvalidCriterion(_)
        | JudgingError::ScoreOutOfRange { .. }
        | JudgingError::CommentTooLong { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        JudgingError::InvalidTransition { .. }
        | JudgingError::CriterionInUse(_)
        | JudgingError::DuplicateJudge(_) => StatusCode::CONFLICT,
        JudgingError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: JudgingError) -> Response {
    let status = status_for(&error);
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, JudgingError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_criteria_handler<S>(State(service): SharedService<S>) -> Response
where
    S: JudgingStore + 'static,
{
    respond(StatusCode::OK, service.criteria().list())
}

pub(crate) async fn create_criterion_handler<S>(
    State(service): SharedService<S>,
    Json(request): Json<CreateCriterionRequest>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service
            .criteria()
            .create(request.criterion, request.created_by),
    )
}

pub(crate) async fn get_criterion_handler<S>(
    State(service): SharedService<S>,
    Path(criterion_id): Path<String>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(
        StatusCode::OK,
        service.criteria().get(&CriterionId(criterion_id)),
    )
}

pub(crate) async fn update_criterion_handler<S>(
    State(service): SharedService<S>,
    Path(criterion_id): Path<String>,
    Json(patch): Json<CriterionPatch>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(
        StatusCode::OK,
        service.criteria().update(&CriterionId(criterion_id), patch),
    )
}

pub(crate) async fn delete_criterion_handler<S>(
    State(service): SharedService<S>,
    Path(criterion_id): Path<String>,
) -> Response
where
    S: JudgingStore + 'static,
{
    let result = service
        .criteria()
        .delete(&CriterionId(criterion_id))
        .map(|()| json!({ "message": "Criteria removed" }));
    respond(StatusCode::OK, result)
}

pub(crate) async fn list_judges_handler<S>(State(service): SharedService<S>) -> Response
where
    S: JudgingStore + 'static,
{
    respond(StatusCode::OK, service.judges().list())
}

pub(crate) async fn register_judge_handler<S>(
    State(service): SharedService<S>,
    Json(request): Json<RegisterJudgeRequest>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service
            .judges()
            .register_judge(request.user_id, request.expertise),
    )
}

pub(crate) async fn get_judge_handler<S>(
    State(service): SharedService<S>,
    Path(judge_id): Path<String>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(StatusCode::OK, service.judges().get(&JudgeId(judge_id)))
}

pub(crate) async fn update_judge_handler<S>(
    State(service): SharedService<S>,
    Path(judge_id): Path<String>,
    Json(update): Json<JudgeUpdate>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(
        StatusCode::OK,
        service.judges().update(&JudgeId(judge_id), update),
    )
}

pub(crate) async fn assign_projects_handler<S>(
    State(service): SharedService<S>,
    Path(judge_id): Path<String>,
    Json(request): Json<AssignProjectsRequest>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(
        StatusCode::OK,
        service.assign_projects(&JudgeId(judge_id), &request.project_ids),
    )
}

pub(crate) async fn submit_evaluation_handler<S>(
    State(service): SharedService<S>,
    Json(submission): Json<EvaluationSubmission>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(StatusCode::CREATED, service.submit_evaluation(submission))
}

pub(crate) async fn save_draft_handler<S>(
    State(service): SharedService<S>,
    Json(submission): Json<EvaluationSubmission>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(StatusCode::OK, service.evaluations().save_draft(submission))
}

pub(crate) async fn project_evaluations_handler<S>(
    State(service): SharedService<S>,
    Path(project_id): Path<String>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(
        StatusCode::OK,
        service.evaluations().for_project(&ProjectId(project_id)),
    )
}

pub(crate) async fn finalize_handler<S>(
    State(service): SharedService<S>,
    Path(project_id): Path<String>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(
        StatusCode::OK,
        service.finalize_project_score(&ProjectId(project_id)),
    )
}

pub(crate) async fn register_project_handler<S>(
    State(service): SharedService<S>,
    Json(request): Json<RegisterProjectRequest>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(
        StatusCode::CREATED,
        service
            .projects()
            .register(request.title, request.submission_status),
    )
}

pub(crate) async fn project_status_handler<S>(
    State(service): SharedService<S>,
    Path(project_id): Path<String>,
    Json(request): Json<ProjectStatusRequest>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(
        StatusCode::OK,
        service
            .projects()
            .set_submission_status(&ProjectId(project_id), request.submission_status),
    )
}

pub(crate) async fn list_scores_handler<S>(State(service): SharedService<S>) -> Response
where
    S: JudgingStore + 'static,
{
    respond(StatusCode::OK, service.list_scores())
}

pub(crate) async fn project_score_handler<S>(
    State(service): SharedService<S>,
    Path(project_id): Path<String>,
) -> Response
where
    S: JudgingStore + 'static,
{
    respond(
        StatusCode::OK,
        service.project_score(&ProjectId(project_id)),
    )
}

pub(crate) async fn calculate_handler<S>(State(service): SharedService<S>) -> Response
where
    S: JudgingStore + 'static,
{
    let result = service.calculate_all_scores().map(|summary| {
        json!({
            "message": summary.message(),
            "results": summary.results,
            "skipped": summary.skipped,
        })
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn recompute_ranks_handler<S>(State(service): SharedService<S>) -> Response
where
    S: JudgingStore + 'static,
{
    let result = service
        .recompute_ranks()
        .and_then(|()| service.list_scores());
    respond(StatusCode::OK, result)
}
