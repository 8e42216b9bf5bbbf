use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::ApiOut;
use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::site::AdminSite;

/// Full application router: admin site routes, health check and global layers
pub fn app(site: &AdminSite, config: &AppConfig) -> Result<Router, ConfigError> {
    let mut app = Router::new()
        .route("/health", get(health))
        .merge(site.router()?)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if let Some(cors) = cors_layer(config) {
        app = app.layer(cors);
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    Ok(app)
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    if config.security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any),
    )
}

async fn health() -> ApiOut<serde_json::Value> {
    ApiOut::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}
