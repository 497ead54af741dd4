use crate::cli::ServeArgs;
use crate::infra::{load_reference_data, AppState};
use crate::routes::estimation_routes;
use aid_engine::config::AppConfig;
use aid_engine::error::AppError;
use aid_engine::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let reference = Arc::new(load_reference_data(&config.catalog)?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = estimation_routes()
        .layer(Extension(reference.clone()))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        aids = reference.snapshot.catalog().len(),
        degraded = reference.snapshot.is_degraded(),
        "aid estimation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
