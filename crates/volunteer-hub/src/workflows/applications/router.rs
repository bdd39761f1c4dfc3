use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicantDetails, ApplicationAnswers, ResponseType};
use super::service::{ApplicationService, ApplicationServiceError};
use crate::workflows::identifiers::{AccountId, ContentId, SubmissionId};
use crate::workflows::notifications::NotificationPublisher;
use crate::workflows::store::{MarketplaceStore, RepositoryError};

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub volunteer: AccountId,
}

#[derive(Debug, Deserialize)]
pub struct AnswersRequest {
    #[serde(default)]
    pub applicant: Option<ApplicantDetails>,
    #[serde(default)]
    pub answers: ApplicationAnswers,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub actor: AccountId,
    pub response_type: ResponseType,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    pub viewer: AccountId,
}

/// Router builder exposing the application endpoints.
pub fn application_router<S, N>(service: Arc<ApplicationService<S, N>>) -> Router
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/roles/:role_id/applications",
            post(start_handler::<S, N>),
        )
        .route(
            "/api/v1/applications/:id",
            get(view_handler::<S, N>).delete(delete_handler::<S, N>),
        )
        .route(
            "/api/v1/applications/:id/answers",
            put(answers_handler::<S, N>),
        )
        .route(
            "/api/v1/applications/:id/submit",
            post(submit_handler::<S, N>),
        )
        .route(
            "/api/v1/applications/:id/respond",
            post(respond_handler::<S, N>),
        )
        .with_state(service)
}

pub(crate) async fn start_handler<S, N>(
    State(service): State<Arc<ApplicationService<S, N>>>,
    Path(role_id): Path<u64>,
    axum::Json(request): axum::Json<StartRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.start(request.volunteer, ContentId(role_id)) {
        Ok(submission) => (StatusCode::CREATED, axum::Json(submission)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn answers_handler<S, N>(
    State(service): State<Arc<ApplicationService<S, N>>>,
    Path(id): Path<u64>,
    axum::Json(request): axum::Json<AnswersRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.save_answers(SubmissionId(id), request.applicant, request.answers) {
        Ok(submission) => (StatusCode::OK, axum::Json(submission)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<S, N>(
    State(service): State<Arc<ApplicationService<S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit(SubmissionId(id)) {
        Ok(outcome) => (StatusCode::ACCEPTED, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn respond_handler<S, N>(
    State(service): State<Arc<ApplicationService<S, N>>>,
    Path(id): Path<u64>,
    axum::Json(request): axum::Json<RespondRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.respond(
        SubmissionId(id),
        request.actor,
        request.response_type,
        &request.text,
    ) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn view_handler<S, N>(
    State(service): State<Arc<ApplicationService<S, N>>>,
    Path(id): Path<u64>,
    Query(query): Query<ViewerQuery>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.view(SubmissionId(id), query.viewer) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<S, N>(
    State(service): State<Arc<ApplicationService<S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.delete(SubmissionId(id)) {
        Ok(notices) => (StatusCode::OK, axum::Json(json!({ "notices": notices }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn status_for(error: &ApplicationServiceError) -> StatusCode {
    match error {
        ApplicationServiceError::Repository(RepositoryError::NotFound)
        | ApplicationServiceError::SubmissionNotFound(_)
        | ApplicationServiceError::RoleNotFound(_)
        | ApplicationServiceError::AccountNotFound(_)
        | ApplicationServiceError::OrganisationNotFound(_) => StatusCode::NOT_FOUND,
        ApplicationServiceError::Access(_) => StatusCode::FORBIDDEN,
        ApplicationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ApplicationServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ApplicationServiceError::Transition(_)
        | ApplicationServiceError::MissingOrganisation(_)
        | ApplicationServiceError::Incomplete { .. }
        | ApplicationServiceError::EmptyResponse => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(error: ApplicationServiceError) -> Response {
    let status = status_for(&error);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(%error, "application request failed");
    }

    let mut payload = json!({ "error": error.to_string() });
    if let ApplicationServiceError::Incomplete { missing } = &error {
        payload["missing"] = json!(missing);
    }
    (status, axum::Json(payload)).into_response()
}
