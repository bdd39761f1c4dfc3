use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::lifecycle::{ProviderError, ProviderLifecycleService};
use crate::workflows::applications::router::status_for as application_status;
use crate::workflows::identifiers::{AccountId, ContentId, OrganisationId};
use crate::workflows::moderation::ModerationError;
use crate::workflows::notifications::NotificationPublisher;
use crate::workflows::store::{MarketplaceStore, RepositoryError};

#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DuplicateRequest {
    pub actor: AccountId,
}

/// Router builder exposing organisation lifecycle and role endpoints.
///
/// Suspend, reactivate and delete carry no actor and perform no
/// administrator check. The host application must restrict these routes to
/// site administrators before mounting the router.
pub fn provider_router<S, N>(service: Arc<ProviderLifecycleService<S, N>>) -> Router
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/organisations/:id/suspend",
            post(suspend_handler::<S, N>),
        )
        .route(
            "/api/v1/organisations/:id/reactivate",
            post(reactivate_handler::<S, N>),
        )
        .route(
            "/api/v1/organisations/:id",
            delete(delete_handler::<S, N>),
        )
        .route(
            "/api/v1/organisations/:id/roles",
            get(overview_handler::<S, N>),
        )
        .route(
            "/api/v1/roles/:id/duplication",
            get(duplication_handler::<S, N>),
        )
        .route(
            "/api/v1/roles/:id/duplicate",
            post(duplicate_handler::<S, N>),
        )
        .route(
            "/api/v1/roles/:id/feedback",
            get(feedback_handler::<S, N>),
        )
        .with_state(service)
}

pub(crate) async fn suspend_handler<S, N>(
    State(service): State<Arc<ProviderLifecycleService<S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.suspend(OrganisationId(id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reactivate_handler<S, N>(
    State(service): State<Arc<ProviderLifecycleService<S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.reactivate(OrganisationId(id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<S, N>(
    State(service): State<Arc<ProviderLifecycleService<S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.delete(OrganisationId(id)) {
        Ok(notices) => (StatusCode::OK, axum::Json(json!({ "notices": notices }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn overview_handler<S, N>(
    State(service): State<Arc<ProviderLifecycleService<S, N>>>,
    Path(id): Path<u64>,
    Query(query): Query<OverviewQuery>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    match service.role_overview(OrganisationId(id), today) {
        Ok(overview) => (StatusCode::OK, axum::Json(overview)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn duplication_handler<S, N>(
    State(service): State<Arc<ProviderLifecycleService<S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.duplication_eligibility(ContentId(id)) {
        Ok(eligibility) => (StatusCode::OK, axum::Json(eligibility)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn duplicate_handler<S, N>(
    State(service): State<Arc<ProviderLifecycleService<S, N>>>,
    Path(id): Path<u64>,
    axum::Json(request): axum::Json<DuplicateRequest>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    match service.duplicate_role(ContentId(id), request.actor) {
        Ok(duplicate) => (StatusCode::CREATED, axum::Json(duplicate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn feedback_handler<S, N>(
    State(service): State<Arc<ProviderLifecycleService<S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: MarketplaceStore + 'static,
    N: NotificationPublisher + 'static,
{
    let id = ContentId(id);
    match service.moderation().latest_feedback(id) {
        Ok(feedback) => (
            StatusCode::OK,
            axum::Json(json!({ "content_id": id, "feedback": feedback })),
        )
            .into_response(),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) fn status_for(error: &ProviderError) -> StatusCode {
    match error {
        ProviderError::Repository(RepositoryError::NotFound)
        | ProviderError::OrganisationNotFound(_)
        | ProviderError::AccountNotFound(_)
        | ProviderError::Moderation(ModerationError::ContentNotFound(_))
        | ProviderError::Moderation(ModerationError::RevisionNotFound(_))
        | ProviderError::Moderation(ModerationError::Repository(RepositoryError::NotFound)) => {
            StatusCode::NOT_FOUND
        }
        ProviderError::Repository(RepositoryError::Conflict)
        | ProviderError::Moderation(ModerationError::Repository(RepositoryError::Conflict)) => {
            StatusCode::CONFLICT
        }
        ProviderError::Repository(RepositoryError::Unavailable(_))
        | ProviderError::Moderation(ModerationError::Repository(RepositoryError::Unavailable(
            _,
        ))) => StatusCode::INTERNAL_SERVER_ERROR,
        ProviderError::Access(_) => StatusCode::FORBIDDEN,
        ProviderError::Applications(error) => application_status(error),
        ProviderError::Moderation(ModerationError::TransitionNotAllowed { .. })
        | ProviderError::Moderation(ModerationError::Incomplete { .. })
        | ProviderError::NoOrganisation(_)
        | ProviderError::NotARole(_)
        | ProviderError::NotDuplicable(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(error: ProviderError) -> Response {
    let status = status_for(&error);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(%error, "provider request failed");
    }

    let mut payload = json!({ "error": error.to_string() });
    if let ProviderError::Moderation(ModerationError::Incomplete { violations }) = &error {
        payload["violations"] = json!(violations);
    }
    (status, axum::Json(payload)).into_response()
}
