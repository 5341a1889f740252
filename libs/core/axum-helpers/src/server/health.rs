use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use core_config::AppInfo;
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::future::Future;
use std::pin::Pin;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// A boxed readiness probe; the error string is logged, not returned.
pub type HealthCheckFuture<'a> = Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>>;

/// Liveness: 200 `{"status":"UP"}` whenever the process is serving.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// Router with `GET /health`.
pub fn health_router() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// Run readiness probes concurrently.
///
/// Responds 200 when every probe passes and 503 otherwise, with one
/// `connected`/`disconnected` entry per probe:
///
/// ```json
/// { "status": "ready", "name": "users_api", "version": "0.1.0", "database": "connected" }
/// ```
pub async fn run_health_checks(app: AppInfo, checks: Vec<(&str, HealthCheckFuture<'_>)>) -> Response {
    let (names, probes): (Vec<_>, Vec<_>) = checks.into_iter().unzip();
    let results = join_all(probes).await;

    let mut body = Map::new();
    let mut all_healthy = true;

    for (name, result) in names.into_iter().zip(results) {
        let status = match result {
            Ok(()) => "connected",
            Err(e) => {
                tracing::error!(check = name, error = %e, "Readiness check failed");
                all_healthy = false;
                "disconnected"
            }
        };
        body.insert(name.to_string(), json!(status));
    }

    body.insert(
        "status".to_string(),
        json!(if all_healthy { "ready" } else { "not ready" }),
    );
    body.insert("name".to_string(), json!(app.name));
    body.insert("version".to_string(), json!(app.version));

    let status = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(Value::Object(body))).into_response()
}
