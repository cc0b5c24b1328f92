use bigdecimal::BigDecimal;
use geo_types::Polygon;
use sqlx::FromRow;

use crate::geometry::{self, GeometryError};

// ============ Column limits ============

pub const NAME_MAX_CHARS: usize = 50;
pub const EMAIL_MAX_CHARS: usize = 50;
pub const PHONE_MAX_CHARS: usize = 50;
pub const LANGUAGE_MAX_CHARS: usize = 2;
pub const CURRENCY_MAX_CHARS: usize = 3;
pub const PRICE_MAX_DIGITS: u64 = 6;
pub const PRICE_DECIMAL_PLACES: u64 = 2;

// ============ Database Models ============

/// A provider row together with the ids of the service areas it owns.
#[derive(Debug, Clone, FromRow)]
pub struct Provider {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub language: String,
    pub currency: String,
    /// Owned service area ids, ascending.
    pub area_ids: Vec<i64>,
}

impl Provider {
    pub fn fields(&self) -> ProviderFields {
        ProviderFields {
            name: self.name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            language: self.language.clone(),
            currency: self.currency.clone(),
        }
    }
}

/// A service area row as selected from the database, geometry still as
/// GeoJSON text and joined with its provider's name.
#[derive(Debug, Clone, FromRow)]
pub struct ServiceAreaRow {
    pub id: i64,
    pub name: String,
    pub price: BigDecimal,
    pub poly: String,
    pub provider_id: i64,
    pub provider_name: String,
}

/// A service area with its geometry parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceArea {
    pub id: i64,
    pub name: String,
    pub price: BigDecimal,
    pub poly: Polygon<f64>,
    pub provider_id: i64,
    pub provider_name: String,
}

impl ServiceArea {
    pub fn fields(&self) -> ServiceAreaFields {
        ServiceAreaFields {
            name: self.name.clone(),
            price: self.price.clone(),
            poly: self.poly.clone(),
            provider_id: self.provider_id,
        }
    }
}

impl TryFrom<ServiceAreaRow> for ServiceArea {
    type Error = GeometryError;

    fn try_from(row: ServiceAreaRow) -> Result<Self, Self::Error> {
        Ok(Self {
            poly: geometry::polygon_from_geojson_str(&row.poly)?,
            id: row.id,
            name: row.name,
            price: row.price,
            provider_id: row.provider_id,
            provider_name: row.provider_name,
        })
    }
}

// ============ Writable fields ============

/// Every writable provider column, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFields {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub language: String,
    pub currency: String,
}

/// Every writable service area column, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceAreaFields {
    pub name: String,
    pub price: BigDecimal,
    pub poly: Polygon<f64>,
    pub provider_id: i64,
}
