use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryBsdRepository};
use crate::routes::with_registry_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bsd_index::config::AppConfig;
use bsd_index::error::AppError;
use bsd_index::telemetry;
use bsd_index::{InMemoryIndex, RegistryService};
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let repository = match args.fixtures.take() {
        Some(path) => InMemoryBsdRepository::from_path(&path)?,
        None => InMemoryBsdRepository::default(),
    };
    let registry_service = Arc::new(RegistryService::new(
        Arc::new(repository),
        Arc::new(InMemoryIndex::new()),
        &config.index,
    ));

    let outcome = registry_service
        .rebuild(config.environment, None, false, Utc::now())
        .await?;
    if outcome.report.is_complete() {
        info!(
            index = %outcome.plan.target(),
            indexed = outcome.report.indexed,
            "initial index built"
        );
    } else {
        warn!(
            index = %outcome.plan.target(),
            failed_chunks = outcome.report.failed_chunks,
            "initial index incomplete; alias left unchanged"
        );
    }

    let app = with_registry_routes(registry_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "bordereau index service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
