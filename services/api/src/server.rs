use crate::cli::ServeArgs;
use crate::infra::{seed_marketplace, AppState, Services};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use volunteer_hub::config::AppConfig;
use volunteer_hub::error::AppError;
use volunteer_hub::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let services = Services::in_memory(&config.workflow);
    if args.seed {
        let seeded = seed_marketplace(&services, Local::now().date_naive())?;
        info!(
            organisation = %seeded.organisation.id,
            role = %seeded.role.id,
            application = %seeded.application,
            "sample marketplace seeded"
        );
    }

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        accounts: services.accounts.clone(),
        providers: services.providers.clone(),
    };

    let app = with_workflow_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        site = %config.workflow.site_name,
        "volunteer hub ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
