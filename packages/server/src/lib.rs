pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Json, middleware};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::config::CorsConfig;
use crate::state::AppState;

/// Floor for the request body limit.
const MIN_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Headroom for form fields around the image.
const BODY_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Body limit for a configured image size: the image base64-encoded inside
/// JSON, plus the other fields.
fn body_limit(max_image_size: u64) -> usize {
    let image = usize::try_from(max_image_size).unwrap_or(usize::MAX);
    image
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(BODY_OVERHEAD_BYTES)
        .max(MIN_BODY_BYTES)
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Portfolio Showcase API",
        version = "1.0.0",
        description = "API for browsing and managing portfolio showcase entries"
    ),
    tags(
        (name = "Portfolio", description = "Portfolio entry CRUD, likes and statistics"),
        (name = "Images", description = "Uploaded image retrieval"),
        (name = "Contact", description = "Contact-form mail relay"),
        (name = "System", description = "Health checks"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(routes::api_routes())
        .split_for_parts();

    let cors = cors_layer(&state.config.server.cors);
    let body_limit = body_limit(state.config.storage.max_image_size);
    let spec = api.clone();

    router
        .route(
            "/api-docs/openapi.json",
            get(move || {
                let spec = spec.clone();
                async move { Json(spec) }
            }),
        )
        .fallback(handlers::health::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .merge(Scalar::with_url("/scalar", api))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(config.max_age))
}
