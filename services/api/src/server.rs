use crate::cli::ServeArgs;
use crate::infra::{build_engine, sample_directory, AppState};
use crate::routes::with_engine_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use staffing_engine::clock::SystemClock;
use staffing_engine::config::AppConfig;
use staffing_engine::error::AppError;
use staffing_engine::telemetry;
use staffing_engine::workflows::matching::InMemoryDirectory;
use staffing_engine::workflows::notifications::TracingSink;
use staffing_engine::workflows::StaffingEngine;
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

    let directory = if args.empty {
        InMemoryDirectory::default()
    } else {
        sample_directory()
    };
    let engine = Arc::new(build_engine(
        &config.engine,
        Arc::new(directory),
        Arc::new(SystemClock),
        Arc::new(TracingSink),
    ));

    spawn_expiry_sweeper(engine.clone(), config.engine.sweep_interval());

    let app = with_engine_routes(engine)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "staffing engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_expiry_sweeper(engine: Arc<StaffingEngine>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match engine.sweeper().sweep_now() {
                Ok(report) if report.expired_count() > 0 => {
                    info!(
                        scanned = report.scanned,
                        expired = report.expired_count(),
                        "scheduled offer sweep"
                    );
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "scheduled offer sweep failed"),
            }
        }
    });
}
