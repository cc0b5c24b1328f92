//! GeoJSON polygon handling for service area boundaries.
//!
//! Boundaries are held as `geo_types` polygons and converted to and from
//! GeoJSON with the `geojson` crate. Spatial predicates run in PostGIS.

use geo_types::Polygon;
use geojson::{Geometry, PolygonType, Value as GeoJsonValue};
use serde_json::Value;
use std::fmt;

/// Spatial reference system of every stored geometry (WGS 84).
pub const SRID: i32 = 4326;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Input is neither a GeoJSON object nor a string containing one.
    UnrecognizedFormat,
    /// Valid GeoJSON of another geometry type.
    WrongType(String),
    /// Coordinates do not describe a valid polygon.
    InvalidCoordinates(String),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::UnrecognizedFormat => {
                write!(f, "Invalid format: string or unicode input unrecognized as GeoJSON.")
            }
            GeometryError::WrongType(kind) => {
                write!(f, "Geometry type mismatch: expected Polygon, got {}.", kind)
            }
            GeometryError::InvalidCoordinates(reason) => {
                write!(f, "Invalid Polygon coordinates: {}", reason)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Parses a submitted boundary: a GeoJSON geometry object or a string
/// holding one.
pub fn polygon_from_json(value: &Value) -> Result<Polygon<f64>, GeometryError> {
    match value {
        Value::String(text) => polygon_from_geojson_str(text.trim()),
        Value::Object(_) => {
            let geometry = Geometry::from_json_value(value.clone())
                .map_err(|e| classify_parse_error(value, e))?;
            polygon_from_geometry(geometry)
        }
        _ => Err(GeometryError::UnrecognizedFormat),
    }
}

/// Parses GeoJSON text, either submitted or produced by `ST_AsGeoJSON`.
pub fn polygon_from_geojson_str(text: &str) -> Result<Polygon<f64>, GeometryError> {
    let value: Value =
        serde_json::from_str(text).map_err(|_| GeometryError::UnrecognizedFormat)?;
    if !value.is_object() {
        return Err(GeometryError::UnrecognizedFormat);
    }
    polygon_from_json(&value)
}

pub fn polygon_from_geometry(geometry: Geometry) -> Result<Polygon<f64>, GeometryError> {
    match &geometry.value {
        GeoJsonValue::Polygon(rings) => check_rings(rings)?,
        other => return Err(GeometryError::WrongType(type_name(other).to_string())),
    }
    Polygon::try_from(geometry.value)
        .map_err(|e| GeometryError::InvalidCoordinates(format!("{}.", e)))
}

/// The GeoJSON geometry of a polygon, as rendered in Feature output.
pub fn polygon_to_geometry(polygon: &Polygon<f64>) -> Geometry {
    Geometry::new(GeoJsonValue::from(polygon))
}

/// GeoJSON text handed to `ST_GeomFromGeoJSON`.
pub fn to_geojson_string(polygon: &Polygon<f64>) -> String {
    polygon_to_geometry(polygon).to_string()
}

/// `geo_types` closes open rings silently, so shape is checked on the raw
/// positions first.
fn check_rings(rings: &PolygonType) -> Result<(), GeometryError> {
    if rings.is_empty() {
        return Err(GeometryError::InvalidCoordinates(
            "a polygon needs at least one ring.".to_string(),
        ));
    }
    for (index, ring) in rings.iter().enumerate() {
        if ring.len() < 4 {
            return Err(GeometryError::InvalidCoordinates(format!(
                "ring {} has {} positions, at least 4 are required.",
                index,
                ring.len()
            )));
        }
        if ring.iter().any(|position| position.len() != 2) {
            return Err(GeometryError::InvalidCoordinates(
                "each position must be an array of two numbers.".to_string(),
            ));
        }
        if ring.iter().flatten().any(|c| !c.is_finite()) {
            return Err(GeometryError::InvalidCoordinates(format!(
                "ring {} contains a non-finite coordinate.",
                index
            )));
        }
        if ring.first() != ring.last() {
            return Err(GeometryError::InvalidCoordinates(format!(
                "ring {} is not closed.",
                index
            )));
        }
    }
    Ok(())
}

fn classify_parse_error(value: &Value, err: geojson::Error) -> GeometryError {
    match value.get("type").and_then(Value::as_str) {
        None => GeometryError::UnrecognizedFormat,
        Some("Polygon") => GeometryError::InvalidCoordinates(format!("{}.", err)),
        Some(other) => GeometryError::WrongType(other.to_string()),
    }
}

fn type_name(value: &GeoJsonValue) -> &'static str {
    match value {
        GeoJsonValue::Point(_) => "Point",
        GeoJsonValue::MultiPoint(_) => "MultiPoint",
        GeoJsonValue::LineString(_) => "LineString",
        GeoJsonValue::MultiLineString(_) => "MultiLineString",
        GeoJsonValue::Polygon(_) => "Polygon",
        GeoJsonValue::MultiPolygon(_) => "MultiPolygon",
        GeoJsonValue::GeometryCollection(_) => "GeometryCollection",
    }
}
