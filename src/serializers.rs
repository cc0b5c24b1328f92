//! JSON representations of providers and service areas, and the checks that
//! turn submitted bodies into writable fields.

use bigdecimal::BigDecimal;
use geo_types::Polygon;
use geojson::Geometry;
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::errors::FieldErrors;
use crate::geometry;
use crate::links::LinkBuilder;
use crate::models::*;
use crate::validation::{self, NOT_NULL};

pub const HYPERLINK_NO_MATCH: &str = "Invalid hyperlink - No URL match.";
pub const HYPERLINK_DOES_NOT_EXIST: &str = "Invalid hyperlink - Object does not exist.";

// ============ Provider ============

/// Provider as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProviderRepresentation {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub language: String,
    pub currency: String,
    /// Hyperlinks to the provider's service areas.
    pub areas: Vec<String>,
}

impl ProviderRepresentation {
    pub fn new(provider: &Provider, links: &LinkBuilder) -> Self {
        Self {
            id: provider.id,
            name: provider.name.clone(),
            email: provider.email.clone(),
            phone_number: provider.phone_number.clone(),
            language: provider.language.clone(),
            currency: provider.currency.clone(),
            areas: provider
                .area_ids
                .iter()
                .map(|id| links.service_area(*id))
                .collect(),
        }
    }
}

/// Writable provider fields (request body documentation only).
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ProviderWrite {
    #[schema(max_length = 50)]
    name: String,
    #[schema(max_length = 50)]
    email: String,
    #[schema(max_length = 50)]
    phone_number: String,
    #[schema(max_length = 2)]
    language: String,
    #[schema(max_length = 3)]
    currency: String,
}

/// Checks a provider body.
///
/// With `existing` set (partial update) absent fields keep their stored
/// values; otherwise every field is required.
pub fn provider_fields_from_json(
    body: &Value,
    existing: Option<&ProviderFields>,
) -> Result<ProviderFields, FieldErrors> {
    let data = validation::expect_object(body)?;
    let partial = existing.is_some();
    let mut errors = FieldErrors::new();

    let mut field = |name: &str, max_chars: usize, current: Option<&String>| {
        match validation::lookup(data, name, partial, &mut errors) {
            Some(value) => validation::text(name, value, max_chars, &mut errors),
            None => current.cloned(),
        }
    };

    let name = field("name", NAME_MAX_CHARS, existing.map(|e| &e.name));
    let email = field("email", EMAIL_MAX_CHARS, existing.map(|e| &e.email));
    let phone_number = field(
        "phone_number",
        PHONE_MAX_CHARS,
        existing.map(|e| &e.phone_number),
    );
    let language = field("language", LANGUAGE_MAX_CHARS, existing.map(|e| &e.language));
    let currency = field("currency", CURRENCY_MAX_CHARS, existing.map(|e| &e.currency));

    match (name, email, phone_number, language, currency) {
        (Some(name), Some(email), Some(phone_number), Some(language), Some(currency))
            if errors.is_empty() =>
        {
            Ok(ProviderFields {
                name,
                email,
                phone_number,
                language,
                currency,
            })
        }
        _ => Err(errors),
    }
}

// ============ Service area ============

/// Service area as a GeoJSON Feature.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceAreaFeature {
    pub id: i64,
    #[serde(rename = "type")]
    #[schema(example = "Feature")]
    pub kind: String,
    #[schema(value_type = Object)]
    pub geometry: Geometry,
    pub properties: ServiceAreaProperties,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceAreaProperties {
    pub id: i64,
    pub name: String,
    /// Two decimal places, as a string.
    #[schema(example = "1.00")]
    pub price: String,
    pub provider_name: String,
    /// Hyperlink to the owning provider.
    pub provider: String,
}

impl ServiceAreaFeature {
    pub fn new(area: &ServiceArea, links: &LinkBuilder) -> Self {
        Self {
            id: area.id,
            kind: "Feature".to_string(),
            geometry: geometry::polygon_to_geometry(&area.poly),
            properties: ServiceAreaProperties {
                id: area.id,
                name: area.name.clone(),
                price: format_price(&area.price),
                provider_name: area.provider_name.clone(),
                provider: links.provider(area.provider_id),
            },
        }
    }
}

/// Renders a price with exactly two decimals.
pub fn format_price(price: &BigDecimal) -> String {
    price.with_scale(PRICE_DECIMAL_PLACES as i64).to_string()
}

/// Writable service area fields (request body documentation only). The
/// same fields may also be sent as a Feature with `geometry` standing in
/// for `poly`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ServiceAreaWrite {
    #[schema(max_length = 50)]
    name: String,
    #[schema(example = "1.00")]
    price: String,
    /// Provider hyperlink.
    provider: String,
    /// GeoJSON Polygon, as an object or a string.
    #[schema(value_type = Object)]
    poly: Value,
}

/// A checked service area body, before the provider lookup.
#[derive(Debug)]
pub struct CheckedServiceArea {
    name: Option<String>,
    price: Option<BigDecimal>,
    poly: Option<Polygon<f64>>,
    /// Provider named by the hyperlink; not yet known to exist.
    pub provider_id: Option<i64>,
    /// True when the body carried a provider hyperlink (as opposed to the
    /// stored one being kept by a partial update).
    pub provider_submitted: bool,
    errors: FieldErrors,
}

impl CheckedServiceArea {
    /// Checks every field of a flat or Feature-shaped body.
    ///
    /// Fails outright only when the body is not an object; field problems
    /// are collected and reported by [`CheckedServiceArea::finish`].
    pub fn check(
        body: &Value,
        existing: Option<&ServiceAreaFields>,
        links: &LinkBuilder,
    ) -> Result<Self, FieldErrors> {
        let data = flatten_feature(validation::expect_object(body)?);
        let partial = existing.is_some();
        let mut errors = FieldErrors::new();

        let name = match validation::lookup(&data, "name", partial, &mut errors) {
            Some(value) => validation::text("name", value, NAME_MAX_CHARS, &mut errors),
            None => existing.map(|e| e.name.clone()),
        };

        let price = match validation::lookup(&data, "price", partial, &mut errors) {
            Some(value) => validation::decimal(
                "price",
                value,
                PRICE_MAX_DIGITS,
                PRICE_DECIMAL_PLACES,
                &mut errors,
            ),
            None => existing.map(|e| e.price.clone()),
        };

        let poly = match validation::lookup(&data, "poly", partial, &mut errors) {
            Some(Value::Null) => {
                errors.add("poly", NOT_NULL);
                None
            }
            Some(value) => match geometry::polygon_from_json(value) {
                Ok(polygon) => Some(polygon),
                Err(e) => {
                    errors.add("poly", e.to_string());
                    None
                }
            },
            None => existing.map(|e| e.poly.clone()),
        };

        let submitted = validation::lookup(&data, "provider", partial, &mut errors);
        let provider_submitted = submitted.is_some();
        let provider_id = match submitted {
            Some(value) => provider_from_link(value, links, &mut errors),
            None => existing.map(|e| e.provider_id),
        };

        Ok(Self {
            name,
            price,
            poly,
            provider_id,
            provider_submitted,
            errors,
        })
    }

    /// Records that the linked provider does not exist.
    pub fn provider_does_not_exist(&mut self) {
        self.errors.add("provider", HYPERLINK_DOES_NOT_EXIST);
    }

    pub fn finish(self) -> Result<ServiceAreaFields, FieldErrors> {
        match (self.name, self.price, self.poly, self.provider_id) {
            (Some(name), Some(price), Some(poly), Some(provider_id)) if self.errors.is_empty() => {
                Ok(ServiceAreaFields {
                    name,
                    price,
                    poly,
                    provider_id,
                })
            }
            _ => Err(self.errors),
        }
    }
}

/// Accepts `{"type": "Feature", "geometry": ..., "properties": {...}}` by
/// lifting the properties and mapping `geometry` onto `poly`.
fn flatten_feature(data: &Map<String, Value>) -> Map<String, Value> {
    match data.get("properties") {
        Some(Value::Object(properties)) => {
            let mut flat = properties.clone();
            if let Some(geometry) = data.get("geometry") {
                flat.insert("poly".to_string(), geometry.clone());
            }
            flat
        }
        _ => data.clone(),
    }
}

fn provider_from_link(value: &Value, links: &LinkBuilder, errors: &mut FieldErrors) -> Option<i64> {
    match value {
        Value::Null => {
            errors.add("provider", NOT_NULL);
            None
        }
        Value::String(link) => match links.resolve_provider(link) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add("provider", HYPERLINK_NO_MATCH);
                None
            }
        },
        other => {
            errors.add(
                "provider",
                format!(
                    "Incorrect type. Expected URL string, received {}.",
                    validation::type_name(other)
                ),
            );
            None
        }
    }
}
