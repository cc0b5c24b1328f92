//! Loads the demo providers and service areas into the database.
//!
//! Two providers and three overlapping zones over the western United States.
//! The point `latitude=-107.2265625&longitude=44.736328125` lies in all three
//! zones, `latitude=-119.03652191162&longitude=43.590660095215` only in the
//! first.

use bigdecimal::BigDecimal;
use geo_types::{LineString, Polygon};
use service_areas_api::config::Config;
use service_areas_api::db::Database;
use service_areas_api::models::{ProviderFields, ServiceAreaFields};
use service_areas_api::obs;
use service_areas_api::storage::{ProviderStore, ServiceAreaStore};

const ZONE_1: [(f64, f64); 5] = [
    (-123.046875, 47.109375),
    (-101.689453125, 47.109375),
    (-101.77734375, 34.716796875),
    (-123.22265625, 34.892578125),
    (-123.046875, 47.109375),
];

const ZONE_2: [(f64, f64); 5] = [
    (-111.62109375, 39.375),
    (-86.396484375, 39.375),
    (-86.396484375, 50.9765625),
    (-111.533203125, 51.591796875),
    (-111.62109375, 39.375),
];

const ZONE_3: [(f64, f64); 5] = [
    (-111.4453125, 40.78125),
    (-103.095703125, 40.60546875),
    (-103.359375, 49.921875),
    (-111.4453125, 49.658203125),
    (-111.4453125, 40.78125),
];

fn provider(name: &str, email: &str, phone: &str, language: &str, currency: &str) -> ProviderFields {
    ProviderFields {
        name: name.to_string(),
        email: email.to_string(),
        phone_number: phone.to_string(),
        language: language.to_string(),
        currency: currency.to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    obs::init_tracing_with("seed_fixtures=info,service_areas_api=info");

    let config = Config::from_env()?;
    let db = Database::from_config(&config).await?;
    let providers = ProviderStore::new(db.pool.clone());
    let areas = ServiceAreaStore::new(db.pool.clone());

    let p1 = providers
        .create(&provider("Test Provider 1", "info@provider1.com", "1111", "US", "USD"))
        .await?;
    let p2 = providers
        .create(&provider("Test Provider 2", "info@provider2.com", "2222", "AR", "ARS"))
        .await?;

    let zones = [
        ("Test Service Area 1", ZONE_1, p1.id, 1),
        ("Test Service Area 2", ZONE_2, p1.id, 2),
        ("Test Service Area 3", ZONE_3, p2.id, 2),
    ];
    for (name, zone, provider_id, price) in zones {
        let area = areas
            .create(&ServiceAreaFields {
                name: name.to_string(),
                price: BigDecimal::from(price).with_scale(2),
                poly: Polygon::new(LineString::from(zone.to_vec()), vec![]),
                provider_id,
            })
            .await?;
        tracing::info!("Seeded service area {} ({})", area.id, area.name);
    }

    tracing::info!("Seeded providers {} and {}", p1.id, p2.id);
    Ok(())
}
