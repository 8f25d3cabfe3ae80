use crate::cli::ServeArgs;
use crate::infra::{seed_demo_data, AppState};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hackjudge::config::AppConfig;
use hackjudge::error::AppError;
use hackjudge::judging::{InMemoryJudgingStore, JudgingService};
use hackjudge::telemetry;
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
    if args.no_seed {
        config.judging.seed_demo = false;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryJudgingStore::default());
    let judging_service = Arc::new(JudgingService::new(store));
    if config.judging.seed_demo {
        seed_demo_data(&judging_service)?;
    }

    let app = with_service_routes(judging_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, seeded = config.judging.seed_demo, "judging service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
