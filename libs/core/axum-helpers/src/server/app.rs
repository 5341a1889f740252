use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::{method_not_allowed, not_found};
use crate::http::create_cors_layer;
use axum::Router;
use core_config::server::ServerConfig;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

/// Wrap the application routes with the cross-cutting layers.
///
/// Adds:
/// - JSON 404 and 405 fallbacks
/// - request tracing at INFO
/// - response compression negotiated from `Accept-Encoding`
/// - CORS, when `server_config.cors_allowed_origins` is non-empty
///
/// Domain routers apply their own state before being passed in.
///
/// # Errors
/// Returns `InvalidInput` if a configured CORS origin is not a valid header value.
///
/// # Example
/// ```ignore
/// let apis = Router::new()
///     .merge(health_router())
///     .merge(domain_users::router(service));
/// let router = create_router(apis, &ServerConfig::default())?;
/// ```
pub fn create_router(apis: Router, server_config: &ServerConfig) -> io::Result<Router> {
    let mut router = apis
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new());

    if let Some(cors) = create_cors_layer(&server_config.cors_allowed_origins)? {
        router = router.layer(cors);
    }

    Ok(router)
}

/// Bind the configured address and serve until shutdown.
///
/// Shutdown starts on SIGINT/SIGTERM or when `coordinator` is triggered
/// elsewhere. In-flight requests observe it through their cancellation
/// tokens. Once the listener has drained, `cleanup` runs with at most
/// `shutdown_timeout` to finish.
///
/// ```ignore
/// let cleanup = async move {
///     if let Err(e) = db.close().await {
///         tracing::warn!("Failed to close database pool: {}", e);
///     }
/// };
///
/// create_production_app(router, &config, Duration::from_secs(30), coordinator, cleanup).await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    coordinator: ShutdownCoordinator,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(server_config.address()).await?;
    serve(listener, router, shutdown_timeout, coordinator, cleanup).await
}

/// Serve on an already bound listener. See [`create_production_app`].
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    shutdown_timeout: Duration,
    coordinator: ShutdownCoordinator,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Server starting on {}", listener.local_addr()?);

    let signal_watcher = coordinator.clone();
    let signal_handle = tokio::spawn(async move { signal_watcher.wait_for_signal().await });

    let drain = coordinator.clone();
    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { drain.cancelled().await })
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        });

    // The server can also stop on an I/O error; release the signal task either way.
    coordinator.shutdown();
    signal_handle.await.ok();

    info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
    match tokio::time::timeout(shutdown_timeout, cleanup).await {
        Ok(()) => info!("Cleanup completed successfully"),
        Err(_) => tracing::warn!(
            "Cleanup exceeded timeout of {:?}, forcing shutdown",
            shutdown_timeout
        ),
    }

    serve_result
}
