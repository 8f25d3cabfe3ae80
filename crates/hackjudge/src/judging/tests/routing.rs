use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::Json;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::judging::domain::SubmissionStatus;
use crate::judging::router::{self, judging_router};
use crate::judging::JudgingService;

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn submit_route_returns_created_evaluation() {
    let fx = fixture();
    let innovation = fx.criterion("Innovation", 5);
    let project = fx.project("Solar Sync", SubmissionStatus::Submitted);
    let judge = fx.judge_for("ada", &[&project]);
    let payload = serde_json::to_value(submission(&project, &judge, &[(&innovation, 8.0)])).unwrap();

    let response = judging_router(Arc::new(fx.service))
        .oneshot(json_request("POST", "/api/v1/judging/evaluations", payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "submitted");
    assert_eq!(body["total_score"], 40.0);
}

#[tokio::test]
async fn submit_route_forbids_unassigned_judges() {
    let fx = fixture();
    let innovation = fx.criterion("Innovation", 5);
    let project = fx.project("Solar Sync", SubmissionStatus::Submitted);
    let judge = fx.judge_for("ada", &[]);
    let payload = serde_json::to_value(submission(&project, &judge, &[(&innovation, 8.0)])).unwrap();

    let response = judging_router(Arc::new(fx.service))
        .oneshot(json_request("POST", "/api/v1/judging/evaluations", payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("not assigned"));
}

#[tokio::test]
async fn finalize_handler_rejects_projects_without_evaluations() {
    let fx = fixture();
    let project = fx.project("Solar Sync", SubmissionStatus::Approved);

    let response = router::finalize_handler(
        State(Arc::new(fx.service)),
        Path(project.id.as_str().to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn project_score_route_returns_not_found_before_finalization() {
    let fx = fixture();
    let project = fx.project("Solar Sync", SubmissionStatus::Approved);

    let response = judging_router(Arc::new(fx.service))
        .oneshot(
            Request::get(format!("/api/v1/scores/project/{}", project.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn criteria_are_listed_by_name() {
    let fx = fixture();
    fx.criterion("Usability", 2);
    fx.criterion("Design", 3);

    let response = judging_router(Arc::new(fx.service))
        .oneshot(
            Request::get("/api/v1/judging/criteria")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let names: Vec<_> = body
        .as_array()
        .expect("array payload")
        .iter()
        .map(|criterion| criterion["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Design", "Usability"]);
}

#[tokio::test]
async fn create_criterion_route_rejects_inverted_ranges() {
    let fx = fixture();

    let response = judging_router(Arc::new(fx.service))
        .oneshot(json_request(
            "POST",
            "/api/v1/judging/criteria",
            json!({
                "created_by": "organizer",
                "name": "Impact",
                "description": "Real-world reach",
                "min_score": 8.0,
                "max_score": 2.0
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn calculate_route_reports_the_batch() {
    let fx = fixture();
    let innovation = fx.criterion("Innovation", 5);
    let project = fx.project("Solar Sync", SubmissionStatus::Approved);
    let judge = fx.judge_for("ada", &[&project]);
    fx.submit(&project, &judge, &[(&innovation, 6.0)]);

    let response = judging_router(Arc::new(fx.service))
        .oneshot(
            Request::post("/api/v1/scores/calculate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["message"], "Calculated scores for 1 projects");
    assert_eq!(body["results"][0]["title"], "Solar Sync");
}

#[tokio::test]
async fn storage_failures_surface_as_internal_errors() {
    let service = Arc::new(JudgingService::new(Arc::new(UnavailableStore)));

    let response = router::register_judge_handler(
        State(service),
        Json(router::RegisterJudgeRequest {
            user_id: crate::judging::domain::UserId::new("ada"),
            expertise: Vec::new(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("database offline"));
}
