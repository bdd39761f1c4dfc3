use super::common::*;
use axum::extract::{Path, Query, State};
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::workflows::applications::router::{
    respond_handler, submit_handler, view_handler, RespondRequest, ViewerQuery,
};
use crate::workflows::applications::{application_router, ResponseType};
use crate::workflows::memory::{MemoryNotifications, MemoryStore};

#[tokio::test]
async fn start_route_creates_an_application() {
    let fixture = fixture();
    let router = application_router(fixture.service.clone());

    let response = router
        .oneshot(
            Request::post(format!("/api/v1/roles/{}/applications", fixture.role.id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    json!({ "volunteer": fixture.volunteer.id }).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["label"], "Park clean-up - Val Tester");
    assert_eq!(body["submitted"], false);
}

#[tokio::test]
async fn submit_handler_lists_missing_fields() {
    let fixture = fixture();
    let submission = fixture
        .service
        .start(fixture.volunteer.id, fixture.role.id)
        .expect("started");

    let response = submit_handler::<MemoryStore, MemoryNotifications>(
        State(fixture.service.clone()),
        Path(submission.id.0),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["missing"], json!(["motivation"]));
}

#[tokio::test]
async fn view_handler_returns_not_found_for_unknown_application() {
    let fixture = fixture();

    let response = view_handler::<MemoryStore, MemoryNotifications>(
        State(fixture.service.clone()),
        Path(404),
        Query(ViewerQuery {
            viewer: fixture.provider.id,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn respond_handler_forbids_suspended_organisations() {
    use crate::workflows::provider::OrganisationRepository;

    let fixture = fixture();
    let id = submitted(&fixture);
    let mut organisation = fixture.organisation.clone();
    organisation.suspended = true;
    fixture
        .store
        .update_organisation(organisation)
        .expect("suspended");

    let response = respond_handler::<MemoryStore, MemoryNotifications>(
        State(fixture.service.clone()),
        Path(id.0),
        axum::Json(RespondRequest {
            actor: fixture.provider.id,
            response_type: ResponseType::Accepted,
            text: "Welcome".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "organisation is suspended");
}

#[tokio::test]
async fn delete_route_reports_notices() {
    let fixture = fixture();
    let id = submitted(&fixture);
    let router = application_router(fixture.service.clone());

    let response = router
        .oneshot(
            Request::delete(format!("/api/v1/applications/{id}"))
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["notices"], json!([]));
}
