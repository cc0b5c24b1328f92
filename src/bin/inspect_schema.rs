//! Utility to inspect the database schema and print table structures.

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

const TABLES: [&str; 2] = ["providers", "service_areas"];

/// Main entry point for the schema inspection utility.
///
/// Lists the columns of the provider and service area tables, then the
/// geometry columns PostGIS has registered for them.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("DB_URL"))
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    for table in TABLES {
        let columns: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT column_name::text, udt_name::text, is_nullable::text FROM information_schema.columns WHERE table_name = $1 ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&pool)
        .await?;

        if columns.is_empty() {
            println!("{}: missing (run the server with RUN_MIGRATIONS=true)", table);
            println!();
            continue;
        }

        println!("{}:", table);
        for (column, type_, nullable) in columns {
            let null_marker = if nullable == "YES" { " (nullable)" } else { "" };
            println!("  - {}: {}{}", column, type_, null_marker);
        }
        println!();
    }

    let geometry_columns: Vec<(String, String, String, i32)> = sqlx::query_as(
        "SELECT f_table_name::text, f_geometry_column::text, type::text, srid FROM geometry_columns WHERE f_table_name = ANY($1) ORDER BY f_table_name, f_geometry_column",
    )
    .bind(&TABLES[..])
    .fetch_all(&pool)
    .await?;

    println!("Geometry columns:");
    for (table, column, kind, srid) in geometry_columns {
        println!("  - {}.{}: {} (SRID {})", table, column, kind, srid);
    }

    Ok(())
}
