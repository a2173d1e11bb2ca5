use crate::cli::ServeArgs;
use crate::infra::{demo_gateway, AppState};
use crate::routes::with_home_visit_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use homevisit::config::AppConfig;
use homevisit::error::AppError;
use homevisit::scheduling::HomeVisitService;
use homevisit::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let gateway = demo_gateway(
        config.availability.unmapped_capability,
        Local::now().date_naive(),
    )?;
    let home_visits = Arc::new(HomeVisitService::new(
        Arc::new(gateway),
        config.availability,
    ));

    let app = with_home_visit_routes(home_visits)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_concurrent_checks = config.availability.max_concurrent_checks,
        "home visit scheduler ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
