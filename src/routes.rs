//! Route table and middleware stack.

use axum::{
    routing::{get, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{self, AppState};
use crate::openapi::ApiDoc;
use crate::service_area_handler;

type Methods = MethodRouter<Arc<AppState>>;

/// Every resource route, by path. Each path is registered both with and
/// without a trailing slash.
pub const ROUTES: &[(&str, fn() -> Methods)] = &[
    ("/providers", provider_collection),
    ("/providers/:id", provider_detail),
    ("/service-areas", service_area_collection),
    ("/service-areas/:id", service_area_detail),
];

fn provider_collection() -> Methods {
    get(handlers::list_providers).post(handlers::create_provider)
}

fn provider_detail() -> Methods {
    get(handlers::get_provider)
        .put(handlers::update_provider)
        .patch(handlers::partial_update_provider)
        .delete(handlers::delete_provider)
}

fn service_area_collection() -> Methods {
    get(service_area_handler::list_service_areas).post(service_area_handler::create_service_area)
}

fn service_area_detail() -> Methods {
    get(service_area_handler::get_service_area)
        .put(service_area_handler::update_service_area)
        .patch(service_area_handler::partial_update_service_area)
        .delete(service_area_handler::delete_service_area)
}

/// API root plus every route in [`ROUTES`], without middleware.
pub fn api_routes() -> Router<Arc<AppState>> {
    ROUTES.iter().fold(
        Router::new().route("/", get(handlers::api_root)),
        |router, (path, methods)| {
            router
                .route(path, methods())
                .route(&format!("{}/", path), methods())
        },
    )
}

/// The API with state attached and only tracing applied. Used by tests that
/// drive the router directly, where there is no peer address to rate limit.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// The full application: API routes behind body-size and per-IP rate
/// limits, plus health check, Swagger UI, tracing and CORS.
pub fn app(state: Arc<AppState>) -> anyhow::Result<Router> {
    let config = &state.config;

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?,
    );

    let protected_routes = api_routes().layer(
        ServiceBuilder::new()
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    Ok(Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
