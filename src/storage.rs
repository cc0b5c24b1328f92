//! Database access for providers and service areas.
//!
//! Geometry crosses the SQL boundary as GeoJSON text; containment is
//! evaluated by PostGIS.

use sqlx::PgPool;

use crate::errors::{AppError, FieldErrors, ResultExt};
use crate::filters::AreaFilter;
use crate::geometry::{self, SRID};
use crate::models::{Provider, ProviderFields, ServiceArea, ServiceAreaFields, ServiceAreaRow};
use crate::serializers::HYPERLINK_DOES_NOT_EXIST;

const PROVIDER_SELECT: &str = r#"
    SELECT p.id, p.name, p.email, p.phone_number, p.language, p.currency,
           ARRAY(
               SELECT sa.id FROM service_areas sa
               WHERE sa.provider_id = p.id
               ORDER BY sa.id
           ) AS area_ids
    FROM providers p
"#;

// Up to 15 decimal digits so stored coordinates come back unrounded.
const SERVICE_AREA_SELECT: &str = r#"
    SELECT sa.id, sa.name, sa.price, ST_AsGeoJSON(sa.poly, 15) AS poly,
           sa.provider_id, p.name AS provider_name
    FROM service_areas sa
    JOIN providers p ON p.id = sa.provider_id
"#;

const CONTAINS_POINT: &str = "ST_Contains(sa.poly, ST_SetSRID(ST_MakePoint($1, $2), $3))";

/// Provider persistence.
pub struct ProviderStore {
    pool: PgPool,
}

impl ProviderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All providers, ascending by id.
    pub async fn list(&self) -> Result<Vec<Provider>, AppError> {
        sqlx::query_as::<_, Provider>(&format!("{} ORDER BY p.id", PROVIDER_SELECT))
            .fetch_all(&self.pool)
            .await
            .context("listing providers")
    }

    pub async fn get(&self, id: i64) -> Result<Provider, AppError> {
        sqlx::query_as::<_, Provider>(&format!("{} WHERE p.id = $1", PROVIDER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("loading provider {}", id))?
            .ok_or_else(|| AppError::NotFound(format!("Provider with id {} not found", id)))
    }

    pub async fn exists(&self, id: i64) -> Result<bool, AppError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM providers WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .with_context(|| format!("checking provider {}", id))?;
        Ok(exists)
    }

    pub async fn create(&self, fields: &ProviderFields) -> Result<Provider, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO providers (name, email, phone_number, language, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone_number)
        .bind(&fields.language)
        .bind(&fields.currency)
        .fetch_one(&self.pool)
        .await
        .context("inserting provider")?;

        tracing::info!("Created provider {} ({})", id, fields.name);
        self.get(id).await
    }

    /// Overwrites every writable column of provider `id`.
    pub async fn update(&self, id: i64, fields: &ProviderFields) -> Result<Provider, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE providers
            SET name = $2, email = $3, phone_number = $4, language = $5, currency = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone_number)
        .bind(&fields.language)
        .bind(&fields.currency)
        .execute(&self.pool)
        .await
        .with_context(|| format!("updating provider {}", id))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Provider with id {} not found", id)));
        }
        tracing::info!("Updated provider {}", id);
        self.get(id).await
    }

    /// Deletes provider `id`; its service areas go with it (ON DELETE CASCADE).
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM providers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("deleting provider {}", id))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Provider with id {} not found", id)));
        }
        tracing::info!("Deleted provider {} and its service areas", id);
        Ok(())
    }
}

/// Service area persistence.
pub struct ServiceAreaStore {
    pool: PgPool,
}

impl ServiceAreaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Number of service areas matching `filter`.
    pub async fn count(&self, filter: &AreaFilter) -> Result<u64, AppError> {
        let count: i64 = match filter {
            AreaFilter::Nothing => return Ok(0),
            AreaFilter::All => sqlx::query_scalar("SELECT COUNT(*) FROM service_areas sa")
                .fetch_one(&self.pool)
                .await
                .context("counting service areas")?,
            AreaFilter::Contains(point) => sqlx::query_scalar(&format!(
                "SELECT COUNT(*) FROM service_areas sa WHERE {}",
                CONTAINS_POINT
            ))
            .bind(point.x)
            .bind(point.y)
            .bind(SRID)
            .fetch_one(&self.pool)
            .await
            .context("counting service areas containing point")?,
        };
        Ok(count.max(0) as u64)
    }

    /// One page of service areas matching `filter`, ascending by id.
    pub async fn list(
        &self,
        filter: &AreaFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<ServiceArea>, AppError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let rows: Vec<ServiceAreaRow> = match filter {
            AreaFilter::Nothing => return Ok(Vec::new()),
            AreaFilter::All => sqlx::query_as(&format!(
                "{} ORDER BY sa.id LIMIT $1 OFFSET $2",
                SERVICE_AREA_SELECT
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("listing service areas")?,
            AreaFilter::Contains(point) => {
                tracing::debug!("Filtering service areas containing POINT({} {})", point.x, point.y);
                sqlx::query_as(&format!(
                    "{} WHERE {} ORDER BY sa.id LIMIT $4 OFFSET $5",
                    SERVICE_AREA_SELECT, CONTAINS_POINT
                ))
                .bind(point.x)
                .bind(point.y)
                .bind(SRID)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .context("listing service areas containing point")?
            }
        };

        rows.into_iter().map(into_service_area).collect()
    }

    pub async fn get(&self, id: i64) -> Result<ServiceArea, AppError> {
        let row: ServiceAreaRow =
            sqlx::query_as(&format!("{} WHERE sa.id = $1", SERVICE_AREA_SELECT))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("loading service area {}", id))?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Service area with id {} not found", id))
                })?;
        into_service_area(row)
    }

    pub async fn create(&self, fields: &ServiceAreaFields) -> Result<ServiceArea, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO service_areas (name, price, poly, provider_id)
            VALUES ($1, $2, ST_SetSRID(ST_GeomFromGeoJSON($3), $4), $5)
            RETURNING id
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.price)
        .bind(geometry::to_geojson_string(&fields.poly))
        .bind(SRID)
        .bind(fields.provider_id)
        .fetch_one(&self.pool)
        .await
        .map_err(provider_violation)
        .context("inserting service area")?;

        tracing::info!(
            "Created service area {} ({}) for provider {}",
            id,
            fields.name,
            fields.provider_id
        );
        self.get(id).await
    }

    /// Overwrites every writable column of service area `id`.
    pub async fn update(&self, id: i64, fields: &ServiceAreaFields) -> Result<ServiceArea, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE service_areas
            SET name = $2, price = $3, poly = ST_SetSRID(ST_GeomFromGeoJSON($4), $5), provider_id = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.price)
        .bind(geometry::to_geojson_string(&fields.poly))
        .bind(SRID)
        .bind(fields.provider_id)
        .execute(&self.pool)
        .await
        .map_err(provider_violation)
        .with_context(|| format!("updating service area {}", id))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Service area with id {} not found",
                id
            )));
        }
        tracing::info!("Updated service area {}", id);
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM service_areas WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("deleting service area {}", id))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Service area with id {} not found",
                id
            )));
        }
        tracing::info!("Deleted service area {}", id);
        Ok(())
    }
}

fn into_service_area(row: ServiceAreaRow) -> Result<ServiceArea, AppError> {
    let id = row.id;
    ServiceArea::try_from(row).map_err(|e| {
        AppError::InternalError(format!("service area {} has unreadable geometry: {}", id, e))
    })
}

/// A foreign key failure here means the provider vanished between the
/// existence check and the write.
fn provider_violation(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            AppError::Validation(FieldErrors::single("provider", HYPERLINK_DOES_NOT_EXIST))
        }
        _ => AppError::DatabaseError(err),
    }
}
