use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::handlers::{
    create_user, delete_user, get_user, health, health_check, list_users, metrics, mongo_status,
    route_not_found, update_user, AppState,
};
use crate::middleware::{request_timing, security_headers};
use subforge::db::{close_gracefully, run_metrics_loop, Supervisor};
use subforge::{AppConfig, Backend};

/// How often pool usage is written to the log.
pub const POOL_METRICS_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// CORS for a single configured origin. `*` mirrors the request origin,
/// since credentials cannot be combined with a literal wildcard.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    if origin == "*" {
        return layer.allow_origin(AllowOrigin::mirror_request());
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!(origin, "invalid CORS origin, cross-origin requests disabled");
            layer
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.config.max_body_kb * 1024;
    let cors = cors_layer(&state.config.cors_origin);

    // A known path with an unrouted method answers like an unknown path.
    let users = Router::new()
        .route(
            "/api/users",
            get(list_users).post(create_user).fallback(route_not_found),
        )
        .route(
            "/api/users/:id",
            get(get_user)
                .put(update_user)
                .delete(delete_user)
                .fallback(route_not_found),
        );

    let monitor = Router::new()
        .route("/api/monitor/status", get(mongo_status).fallback(route_not_found))
        .route("/api/monitor/metrics", get(metrics).fallback(route_not_found))
        .route("/api/monitor/health", get(health_check).fallback(route_not_found));

    Router::new()
        .route("/health", get(health).fallback(route_not_found))
        .merge(users)
        .merge(monitor)
        .fallback(route_not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(request_timing))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

/// Start the API server with configuration from `SUBFORGE_*` variables.
///
/// Returns an error when configuration is invalid, when the database
/// cannot be reached within the reconnect budget, or when the connection
/// fails to close cleanly on shutdown.
pub async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    init_tracing();

    tracing::info!(
        env = %config.env,
        storage = ?config.storage,
        database = %config.db.database,
        pool = %format!("{}-{}", config.db.min_pool_size, config.db.max_pool_size),
        "Configuration loaded"
    );

    let backend = Backend::from_config(&config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let supervisor = Supervisor::default();
    let link = Arc::clone(&backend.link);
    let supervise_rx = shutdown_rx.clone();
    let mut supervise = tokio::spawn(async move { supervisor.supervise(link, supervise_rx).await });

    let metrics_task = tokio::spawn(run_metrics_loop(
        Arc::clone(&backend.monitor),
        POOL_METRICS_INTERVAL,
        shutdown_rx,
    ));

    let state = AppState::new(backend.clone(), config.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        "Subforge server running in {} mode on {}",
        config.env,
        listener.local_addr()?
    );

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    let supervisor_exit = tokio::select! {
        res = server => {
            res?;
            None
        }
        res = &mut supervise => Some(res),
    };

    let _ = shutdown_tx.send(true);
    let _ = metrics_task.await;

    match supervisor_exit {
        Some(Ok(Err(e))) => {
            tracing::error!(error = %e, "Giving up on MongoDB connection");
            return Err(Box::new(e));
        }
        Some(Ok(Ok(()))) => {}
        Some(Err(join_err)) => return Err(Box::new(join_err)),
        None => match supervise.await {
            Ok(Err(e)) => tracing::warn!(error = %e, "connection supervisor stopped"),
            Ok(Ok(())) => {}
            Err(join_err) => return Err(Box::new(join_err)),
        },
    }

    close_gracefully(backend.link.as_ref()).await?;
    tracing::info!("Server stopped");
    Ok(())
}
