use crate::config::Config;
use crate::db::Database;
use crate::errors::{AppError, ResultExt};
use crate::links::LinkBuilder;
use crate::pagination::Pager;
use crate::serializers::{provider_fields_from_json, ProviderRepresentation, ProviderWrite};
use crate::storage::ProviderStore;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Renders and resolves resource hyperlinks.
    pub links: LinkBuilder,
    /// Page size limits for the service area listing.
    pub pager: Pager,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let links = LinkBuilder::new(&config.public_base_url)
            .map_err(|e| anyhow::anyhow!("invalid public base URL: {}", e))?;
        let pager = Pager::new(config.page_size, config.max_page_size);
        Ok(Self {
            db,
            config,
            links,
            pager,
        })
    }
}

/// Health check endpoint.
///
/// Reports the service name and version, and whether the database answers.
/// Responds 503 when it does not.
#[utoipa::path(
    get,
    path = "/health",
    tag = "meta",
    responses(
        (status = 200, description = "Service and database are up"),
        (status = 503, description = "Database unreachable")
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match Database::ping(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
    }
}

/// GET /
///
/// Links to both resource collections.
#[utoipa::path(
    get,
    path = "/",
    tag = "meta",
    responses((status = 200, description = "Collection links"))
)]
pub async fn api_root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "providers": state.links.provider_list(),
        "service-areas": state.links.service_area_list(),
    }))
}

/// Parses a path id. Anything that is not an id cannot name a record, so it
/// is reported as not found.
pub(crate) fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim_end_matches('/')
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::NotFound(format!("'{}' is not a valid id", raw)))
}

/// Unwraps a JSON body. A missing JSON content type is a 415, any other
/// extractor failure a 400 with detail.
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Err(AppError::UnsupportedMediaType(
            "Unsupported media type in request. Expected application/json.".to_string(),
        )),
        Err(rejection) => Err(AppError::BadRequest(format!(
            "JSON parse error - {}",
            rejection.body_text()
        ))),
    }
}

/// GET /providers/
///
/// Lists every provider, ascending by id. Not paginated.
///
/// # Returns
///
/// * `Result<Json<Vec<ProviderRepresentation>>, AppError>` - All providers or an error.
#[utoipa::path(
    get,
    path = "/providers/",
    tag = "providers",
    responses((status = 200, description = "All providers", body = [ProviderRepresentation]))
)]
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProviderRepresentation>>, AppError> {
    tracing::info!("GET /providers");

    let providers = ProviderStore::new(state.db.clone()).list().await?;
    Ok(Json(
        providers
            .iter()
            .map(|p| ProviderRepresentation::new(p, &state.links))
            .collect(),
    ))
}

/// POST /providers/
///
/// Creates a provider.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `body` - Provider fields as JSON.
///
/// # Returns
///
/// * `Result<(StatusCode, Json<ProviderRepresentation>), AppError>` - 201 with the new provider, or a validation error.
#[utoipa::path(
    post,
    path = "/providers/",
    tag = "providers",
    request_body = ProviderWrite,
    responses(
        (status = 201, description = "Provider created", body = ProviderRepresentation),
        (status = 400, description = "Validation errors keyed by field")
    )
)]
pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ProviderRepresentation>), AppError> {
    tracing::info!("POST /providers");

    let body = json_body(body)?;
    let fields = provider_fields_from_json(&body, None)?;
    let provider = ProviderStore::new(state.db.clone())
        .create(&fields)
        .await
        .context("creating provider")?;

    Ok((
        StatusCode::CREATED,
        Json(ProviderRepresentation::new(&provider, &state.links)),
    ))
}

/// GET /providers/:id/
#[utoipa::path(
    get,
    path = "/providers/{id}/",
    tag = "providers",
    params(("id" = i64, Path, description = "Provider id")),
    responses(
        (status = 200, description = "The provider", body = ProviderRepresentation),
        (status = 404, description = "No such provider")
    )
)]
pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProviderRepresentation>, AppError> {
    tracing::info!("GET /providers/{}", id);

    let id = parse_id(&id)?;
    let provider = ProviderStore::new(state.db.clone()).get(id).await?;
    Ok(Json(ProviderRepresentation::new(&provider, &state.links)))
}

/// PUT /providers/:id/
///
/// Replaces every writable field; all of them must be present.
#[utoipa::path(
    put,
    path = "/providers/{id}/",
    tag = "providers",
    params(("id" = i64, Path, description = "Provider id")),
    request_body = ProviderWrite,
    responses(
        (status = 200, description = "Provider replaced", body = ProviderRepresentation),
        (status = 400, description = "Validation errors keyed by field"),
        (status = 404, description = "No such provider")
    )
)]
pub async fn update_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProviderRepresentation>, AppError> {
    tracing::info!("PUT /providers/{}", id);
    save_provider(&state, &id, body, false).await.map(Json)
}

/// PATCH /providers/:id/
///
/// Updates only the submitted fields.
#[utoipa::path(
    patch,
    path = "/providers/{id}/",
    tag = "providers",
    params(("id" = i64, Path, description = "Provider id")),
    request_body = ProviderWrite,
    responses(
        (status = 200, description = "Provider updated", body = ProviderRepresentation),
        (status = 400, description = "Validation errors keyed by field"),
        (status = 404, description = "No such provider")
    )
)]
pub async fn partial_update_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProviderRepresentation>, AppError> {
    tracing::info!("PATCH /providers/{}", id);
    save_provider(&state, &id, body, true).await.map(Json)
}

async fn save_provider(
    state: &AppState,
    raw_id: &str,
    body: Result<Json<Value>, JsonRejection>,
    partial: bool,
) -> Result<ProviderRepresentation, AppError> {
    let id = parse_id(raw_id)?;
    let store = ProviderStore::new(state.db.clone());
    let existing = store.get(id).await?;

    let body = json_body(body)?;
    let current = existing.fields();
    let fields = provider_fields_from_json(&body, partial.then_some(&current))?;
    let provider = store
        .update(id, &fields)
        .await
        .with_context(|| format!("saving provider {}", id))?;

    Ok(ProviderRepresentation::new(&provider, &state.links))
}

/// DELETE /providers/:id/
///
/// Deletes the provider and, through the foreign key cascade, every service
/// area it owns.
#[utoipa::path(
    delete,
    path = "/providers/{id}/",
    tag = "providers",
    params(("id" = i64, Path, description = "Provider id")),
    responses(
        (status = 204, description = "Provider and its service areas deleted"),
        (status = 404, description = "No such provider")
    )
)]
pub async fn delete_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    tracing::info!("DELETE /providers/{}", id);

    let id = parse_id(&id)?;
    ProviderStore::new(state.db.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(matches!(parse_id("0"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_id("-4"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_id("abc"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn json_body_passes_values_through() {
        let value = json_body(Ok(Json(json!({ "name": "x" })))).unwrap();
        assert_eq!(value["name"], "x");
    }
}
