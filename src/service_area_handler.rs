//! Service area endpoints.
//!
//! Records are exchanged as GeoJSON Features. The listing is paginated as a
//! FeatureCollection and can be restricted to the areas containing a point.

use crate::errors::{AppError, ResultExt};
use crate::filters::{AreaFilter, CoordinateParams};
use crate::handlers::{json_body, parse_id, AppState};
use crate::models::ServiceArea;
use crate::pagination::{FeatureCollectionPage, PAGE_PARAM, PAGE_SIZE_PARAM};
use crate::serializers::{CheckedServiceArea, ServiceAreaFeature, ServiceAreaWrite};
use crate::storage::{ProviderStore, ServiceAreaStore};
use axum::{
    extract::{rejection::JsonRejection, Path, RawQuery, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use url::form_urlencoded;

/// Query string of the service area listing.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ServiceAreaListParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl ServiceAreaListParams {
    /// Reads the known keys from a raw query string. A repeated key keeps
    /// its last value; unknown keys are ignored.
    pub fn from_query(raw_query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = raw_query else {
            return params;
        };
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "latitude" => &mut params.latitude,
                "longitude" => &mut params.longitude,
                PAGE_PARAM => &mut params.page,
                PAGE_SIZE_PARAM => &mut params.page_size,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        params
    }

    fn coordinates(&self) -> CoordinateParams {
        CoordinateParams {
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
        }
    }
}

/// GET /service-areas/
///
/// Lists service areas as a paginated FeatureCollection. With both
/// `latitude` and `longitude` present only areas containing
/// `POINT(latitude longitude)` are returned; unparseable coordinates give an
/// empty collection.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `raw_query` - Coordinate filter and paging parameters; also reused
///   in page links.
///
/// # Returns
///
/// * `Result<Json<FeatureCollectionPage<ServiceAreaFeature>>, AppError>` - One page of features, or 404 for an invalid page.
#[utoipa::path(
    get,
    path = "/service-areas/",
    tag = "service-areas",
    params(
        ("latitude" = Option<String>, Query, description = "x coordinate of the point (used together with longitude)"),
        ("longitude" = Option<String>, Query, description = "y coordinate of the point (used together with latitude)"),
        ("page" = Option<String>, Query, description = "1-based page number or 'last'"),
        ("page_size" = Option<u32>, Query, description = "Results per page")
    ),
    responses(
        (status = 200, description = "FeatureCollection page"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_service_areas(
    State(state): State<Arc<AppState>>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<FeatureCollectionPage<ServiceAreaFeature>>, AppError> {
    let params = ServiceAreaListParams::from_query(raw_query.as_deref());
    tracing::info!("GET /service-areas - params: {:?}", params);

    let filter = AreaFilter::from_params(&params.coordinates());
    let store = ServiceAreaStore::new(state.db.clone());

    let count = store.count(&filter).await?;
    let page = state
        .pager
        .resolve(count, params.page.as_deref(), params.page_size.as_deref())?;
    let areas = store.list(&filter, page.size, page.offset()).await?;

    tracing::debug!(
        "Service area page {} of {} ({} matching)",
        page.number,
        page.num_pages(),
        count
    );

    let features = areas
        .iter()
        .map(|area| ServiceAreaFeature::new(area, &state.links))
        .collect();
    Ok(Json(FeatureCollectionPage::new(
        &page,
        features,
        &state.links.service_area_list(),
        raw_query.as_deref(),
    )))
}

/// POST /service-areas/
///
/// Creates a service area owned by the provider its `provider` hyperlink
/// names.
#[utoipa::path(
    post,
    path = "/service-areas/",
    tag = "service-areas",
    request_body = ServiceAreaWrite,
    responses(
        (status = 201, description = "Service area created", body = ServiceAreaFeature),
        (status = 400, description = "Validation errors keyed by field")
    )
)]
pub async fn create_service_area(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ServiceAreaFeature>), AppError> {
    tracing::info!("POST /service-areas");

    let body = json_body(body)?;
    let checked = CheckedServiceArea::check(&body, None, &state.links)?;
    let fields = verify_provider(&state, checked).await?.finish()?;

    let area = ServiceAreaStore::new(state.db.clone())
        .create(&fields)
        .await
        .context("creating service area")?;

    Ok((
        StatusCode::CREATED,
        Json(ServiceAreaFeature::new(&area, &state.links)),
    ))
}

/// GET /service-areas/:id/
#[utoipa::path(
    get,
    path = "/service-areas/{id}/",
    tag = "service-areas",
    params(("id" = i64, Path, description = "Service area id")),
    responses(
        (status = 200, description = "The service area", body = ServiceAreaFeature),
        (status = 404, description = "No such service area")
    )
)]
pub async fn get_service_area(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ServiceAreaFeature>, AppError> {
    tracing::info!("GET /service-areas/{}", id);

    let id = parse_id(&id)?;
    let area = ServiceAreaStore::new(state.db.clone()).get(id).await?;
    Ok(Json(ServiceAreaFeature::new(&area, &state.links)))
}

/// PUT /service-areas/:id/
///
/// Replaces every writable field; all of them must be present.
#[utoipa::path(
    put,
    path = "/service-areas/{id}/",
    tag = "service-areas",
    params(("id" = i64, Path, description = "Service area id")),
    request_body = ServiceAreaWrite,
    responses(
        (status = 200, description = "Service area replaced", body = ServiceAreaFeature),
        (status = 400, description = "Validation errors keyed by field"),
        (status = 404, description = "No such service area")
    )
)]
pub async fn update_service_area(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ServiceAreaFeature>, AppError> {
    tracing::info!("PUT /service-areas/{}", id);
    save_service_area(&state, &id, body, false).await.map(Json)
}

/// PATCH /service-areas/:id/
///
/// Updates only the submitted fields.
#[utoipa::path(
    patch,
    path = "/service-areas/{id}/",
    tag = "service-areas",
    params(("id" = i64, Path, description = "Service area id")),
    request_body = ServiceAreaWrite,
    responses(
        (status = 200, description = "Service area updated", body = ServiceAreaFeature),
        (status = 400, description = "Validation errors keyed by field"),
        (status = 404, description = "No such service area")
    )
)]
pub async fn partial_update_service_area(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ServiceAreaFeature>, AppError> {
    tracing::info!("PATCH /service-areas/{}", id);
    save_service_area(&state, &id, body, true).await.map(Json)
}

async fn save_service_area(
    state: &AppState,
    raw_id: &str,
    body: Result<Json<Value>, JsonRejection>,
    partial: bool,
) -> Result<ServiceAreaFeature, AppError> {
    let id = parse_id(raw_id)?;
    let store = ServiceAreaStore::new(state.db.clone());
    let existing: ServiceArea = store.get(id).await?;

    let body = json_body(body)?;
    let current = existing.fields();
    let checked = CheckedServiceArea::check(&body, partial.then_some(&current), &state.links)?;
    let fields = verify_provider(state, checked).await?.finish()?;

    let area = store
        .update(id, &fields)
        .await
        .with_context(|| format!("saving service area {}", id))?;
    Ok(ServiceAreaFeature::new(&area, &state.links))
}

/// Looks up a submitted provider hyperlink, recording an error when the
/// provider does not exist.
async fn verify_provider(
    state: &AppState,
    mut checked: CheckedServiceArea,
) -> Result<CheckedServiceArea, AppError> {
    if let (true, Some(provider_id)) = (checked.provider_submitted, checked.provider_id) {
        if !ProviderStore::new(state.db.clone()).exists(provider_id).await? {
            tracing::debug!("Provider {} referenced by hyperlink does not exist", provider_id);
            checked.provider_does_not_exist();
        }
    }
    Ok(checked)
}

/// DELETE /service-areas/:id/
#[utoipa::path(
    delete,
    path = "/service-areas/{id}/",
    tag = "service-areas",
    params(("id" = i64, Path, description = "Service area id")),
    responses(
        (status = 204, description = "Service area deleted"),
        (status = 404, description = "No such service area")
    )
)]
pub async fn delete_service_area(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    tracing::info!("DELETE /service-areas/{}", id);

    let id = parse_id(&id)?;
    ServiceAreaStore::new(state.db.clone()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_reads_known_keys() {
        let params = ServiceAreaListParams::from_query(Some(
            "latitude=-107.2&longitude=44.7&page=2&page_size=5&format=json",
        ));
        assert_eq!(
            params,
            ServiceAreaListParams {
                latitude: Some("-107.2".into()),
                longitude: Some("44.7".into()),
                page: Some("2".into()),
                page_size: Some("5".into()),
            }
        );
        assert_eq!(ServiceAreaListParams::from_query(None), ServiceAreaListParams::default());
    }

    #[test]
    fn repeated_keys_keep_the_last_value() {
        let params =
            ServiceAreaListParams::from_query(Some("latitude=1&latitude=2&longitude=3&page=1&page=last"));
        assert_eq!(params.latitude.as_deref(), Some("2"));
        assert_eq!(params.longitude.as_deref(), Some("3"));
        assert_eq!(params.page.as_deref(), Some("last"));
    }

    #[test]
    fn encoded_values_are_decoded() {
        let params = ServiceAreaListParams::from_query(Some("latitude=%2B10.5&longitude=1e1"));
        assert_eq!(params.latitude.as_deref(), Some("+10.5"));
        assert_eq!(params.longitude.as_deref(), Some("1e1"));
    }
}
