use crate::infra::{AppState, Services};
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use volunteer_hub::error::AppError;
use volunteer_hub::workflows::applications::application_router;
use volunteer_hub::workflows::moderation::{
    ContentFields, ModerationState, Schedule, TransitionRequest,
};
use volunteer_hub::workflows::provider::{provider_router, ModerationReport};
use volunteer_hub::workflows::{AccountId, ContentId, OrganisationId};

#[derive(Debug, Deserialize)]
pub(crate) struct ModerationRequest {
    pub(crate) target: ModerationState,
    pub(crate) actor: AccountId,
    #[serde(default)]
    pub(crate) log: String,
    #[serde(default)]
    pub(crate) fields: Option<ContentFields>,
    #[serde(default)]
    pub(crate) schedule: Option<Schedule>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorQuery {
    pub(crate) actor: AccountId,
}

/// Workflow routers merged with the operational and account endpoints.
pub(crate) fn with_workflow_routes(services: &Services) -> axum::Router {
    application_router(services.applications.clone())
        .merge(provider_router(services.providers.clone()))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/content/:id/moderation",
            axum::routing::post(moderation_endpoint),
        )
        .route(
            "/api/v1/accounts/:id",
            axum::routing::delete(delete_account_endpoint),
        )
        .route(
            "/api/v1/organisations/:id/members/:member",
            axum::routing::delete(remove_member_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn moderation_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<ModerationRequest>,
) -> Result<Json<ModerationReport>, AppError> {
    let mut request = TransitionRequest::new(payload.target, payload.actor).with_log(payload.log);
    if let Some(fields) = payload.fields {
        request = request.with_fields(fields);
    }
    if let Some(schedule) = payload.schedule {
        request = request.with_schedule(schedule);
    }

    let report = state.providers.moderate(ContentId(id), request)?;
    Ok(Json(report))
}

pub(crate) async fn delete_account_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let account = state.accounts.account(AccountId(id))?;
    let notices = state.accounts.delete_account(&account)?;
    Ok(Json(json!({ "account": account.id, "notices": notices })))
}

pub(crate) async fn remove_member_endpoint(
    Extension(state): Extension<AppState>,
    Path((organisation, member)): Path<(u64, u64)>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Value>, AppError> {
    let notices = state.accounts.remove_member(
        query.actor,
        OrganisationId(organisation),
        AccountId(member),
    )?;
    Ok(Json(json!({ "notices": notices })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::seed_marketplace;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;
    use volunteer_hub::config::WorkflowConfig;

    fn app(ready: bool) -> (Services, axum::Router) {
        let services = Services::in_memory(&WorkflowConfig::default());
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            accounts: services.accounts.clone(),
            providers: services.providers.clone(),
        };
        let router = with_workflow_routes(&services).layer(Extension(state));
        (services, router)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let (_, router) = app(false);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(read_json(response).await["status"], "initializing");
    }

    #[tokio::test]
    async fn moderation_endpoint_rejects_skipping_review() {
        let (services, router) = app(true);
        let seeded = seed_marketplace(&services, today()).expect("seeded");
        let draft = services
            .providers
            .create_stub_role(seeded.coordinator)
            .expect("stub role");

        let response = router
            .oneshot(
                Request::post(format!("/api/v1/content/{}/moderation", draft.id))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "target": "published", "actor": seeded.coordinator })
                            .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn removing_a_member_hands_over_their_content() {
        let (services, router) = app(true);
        let seeded = seed_marketplace(&services, today()).expect("seeded");

        let response = router
            .oneshot(
                Request::delete(format!(
                    "/api/v1/organisations/{}/members/{}?actor={}",
                    seeded.organisation.id, seeded.coordinator, seeded.teammate
                ))
                .body(Body::empty())
                .expect("request"),
            )
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::OK);
        let role = services
            .providers
            .moderation()
            .content(seeded.role.id)
            .expect("role kept");
        assert_eq!(role.owner, seeded.teammate);
    }

    #[tokio::test]
    async fn deleting_an_unknown_account_is_not_found() {
        let (_, router) = app(true);
        let response = router
            .oneshot(
                Request::delete("/api/v1/accounts/77")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            read_json(response).await["error"],
            "account workflow error: account 77 not found"
        );
    }

    #[tokio::test]
    async fn application_routes_are_mounted() {
        let (services, router) = app(true);
        let seeded = seed_marketplace(&services, today()).expect("seeded");

        let response = router
            .oneshot(
                Request::get(format!(
                    "/api/v1/applications/{}?viewer={}",
                    seeded.application, seeded.volunteer
                ))
                .body(Body::empty())
                .expect("request"),
            )
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["email"], "kim@example.org");
    }
}
