use utoipa::OpenApi;

use crate::serializers::{
    ProviderRepresentation, ProviderWrite, ServiceAreaFeature, ServiceAreaProperties,
    ServiceAreaWrite,
};

/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Service Areas API",
        description = "Providers, their priced service area polygons, and point containment lookups."
    ),
    paths(
        crate::handlers::health,
        crate::handlers::api_root,
        crate::handlers::list_providers,
        crate::handlers::create_provider,
        crate::handlers::get_provider,
        crate::handlers::update_provider,
        crate::handlers::partial_update_provider,
        crate::handlers::delete_provider,
        crate::service_area_handler::list_service_areas,
        crate::service_area_handler::create_service_area,
        crate::service_area_handler::get_service_area,
        crate::service_area_handler::update_service_area,
        crate::service_area_handler::partial_update_service_area,
        crate::service_area_handler::delete_service_area,
    ),
    components(schemas(
        ProviderRepresentation,
        ProviderWrite,
        ServiceAreaFeature,
        ServiceAreaProperties,
        ServiceAreaWrite,
    )),
    tags(
        (name = "providers", description = "Service providers"),
        (name = "service-areas", description = "Priced service area polygons"),
        (name = "meta", description = "Health and discovery")
    )
)]
pub struct ApiDoc;
