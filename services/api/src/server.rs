use crate::cli::ServeArgs;
use crate::infra::{open_service, AppState};
use crate::routes::with_lettings_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use sole_agent::config::AppConfig;
use sole_agent::error::AppError;
use sole_agent::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let lettings_service = open_service(&config.storage)?;
    let storage = lettings_service.storage_info();
    info!(
        applicants = storage.applicant_count,
        properties = storage.property_count,
        matches = storage.match_count,
        "lettings snapshot ready"
    );

    let app = with_lettings_routes(lettings_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "sole agent lettings service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
