//! quire-api server binary.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use quire_api::config::ApiConfig;
use quire_api::{build_router, AppState};
use quire_core::{AiError, AiRunRepository, Error};
use quire_db::{log_pool_metrics, Database, PoolConfig};
use quire_inference::openai::OpenAIBackend;
use quire_inference::AiPipeline;

/// How often idle rate-limit keys are swept.
const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Initialize tracing.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, daily rotation)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "quire_api=debug,tower_http=debug")
fn init_tracing() -> Option<WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "quire_api=debug,quire_inference=debug,quire_db=info,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(path) = log_file.as_deref() {
        let path = Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("quire-api.log");
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

/// Build the AI pipeline, or `None` when no provider key is set.
fn build_pipeline(runs: Arc<dyn AiRunRepository>) -> Result<Option<AiPipeline>, Error> {
    match OpenAIBackend::from_env() {
        Ok(backend) => {
            info!(
                subsystem = "api",
                model = backend.config().model.as_str(),
                base_url = backend.config().base_url.as_str(),
                "AI backend configured"
            );
            Ok(Some(AiPipeline::new(Arc::new(backend), runs)))
        }
        Err(Error::Ai(AiError::Unconfigured)) => {
            warn!(
                subsystem = "api",
                "GROQ_API_KEY not set, AI actions will answer AI_UNCONFIGURED"
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let config = ApiConfig::from_env()?;

    let db = Database::connect_with_config(&config.database_url, PoolConfig::from_env()).await?;
    db.migrate().await?;
    log_pool_metrics(db.pool());
    info!(subsystem = "api", "Database ready");

    let ai_runs: Arc<dyn AiRunRepository> = Arc::new(db.ai_runs.clone());
    let pipeline = build_pipeline(ai_runs.clone())?;

    let mut state = AppState::new(
        Arc::new(db.notes.clone()),
        Arc::new(db.tasks.clone()),
        Arc::new(db.profiles.clone()),
        ai_runs,
        &config.jwt,
    )
    .with_rate_limits(&config.rate_limit)?;
    if let Some(pipeline) = pipeline {
        state = state.with_ai(pipeline);
    }

    if let Some(limits) = state.rate_limits.clone() {
        info!(
            subsystem = "api",
            requests = config.rate_limit.requests,
            ai_requests = config.rate_limit.ai_requests,
            period_secs = config.rate_limit.period.as_secs(),
            "Rate limiting enabled"
        );
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                limits.retain_recent();
            }
        });
    } else {
        warn!(subsystem = "api", "Rate limiting disabled");
    }

    let app = build_router(state, &config.http);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
