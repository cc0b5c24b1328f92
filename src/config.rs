use serde::Deserialize;

const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Origin used when rendering hyperlinks (no trailing slash).
    pub public_base_url: String,
    pub page_size: u32,
    pub max_page_size: u32,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let port: u16 = parse_var("PORT", DEFAULT_PORT)
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?;

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("DB_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DATABASE_URL or DB_URL environment variable required")
                })
                .and_then(|url| {
                    validate_database_url(&url)?;
                    Ok(url)
                })?,
            port,
            public_base_url: normalize_base_url(
                &std::env::var("PUBLIC_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| format!("http://localhost:{}", port)),
            )?,
            page_size: parse_var("PAGE_SIZE", DEFAULT_PAGE_SIZE)
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow::anyhow!("PAGE_SIZE must be a positive integer"))?,
            max_page_size: parse_var("MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow::anyhow!("MAX_PAGE_SIZE must be a positive integer"))?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 10)
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a number"))?,
            run_migrations: parse_flag("RUN_MIGRATIONS", true)?,
            rate_limit_per_second: parse_var("RATE_LIMIT_PER_SECOND", 10)
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_PER_SECOND must be a number"))?,
            rate_limit_burst: parse_var("RATE_LIMIT_BURST", 20)
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_BURST must be a number"))?,
            max_body_bytes: parse_var("MAX_BODY_BYTES", 1024 * 1024)
                .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a number"))?,
        };

        if config.max_page_size < config.page_size {
            anyhow::bail!(
                "MAX_PAGE_SIZE ({}) must not be smaller than PAGE_SIZE ({})",
                config.max_page_size,
                config.page_size
            );
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Public base URL: {}", config.public_base_url);
        tracing::debug!(
            "Page size: {} (max {})",
            config.page_size,
            config.max_page_size
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Configuration for tests and tools that only need a database URL.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            port: DEFAULT_PORT,
            public_base_url: format!("http://localhost:{}", DEFAULT_PORT),
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            db_max_connections: 5,
            run_migrations: true,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
            max_body_bytes: 1024 * 1024,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, T::Err> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse(),
        _ => Ok(default),
    }
}

fn parse_flag(name: &str, default: bool) -> anyhow::Result<bool> {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("{} must be a boolean, got '{}'", name, other),
        },
        Err(_) => Ok(default),
    }
}

fn validate_database_url(url: &str) -> anyhow::Result<()> {
    if url.trim().is_empty() {
        anyhow::bail!("DATABASE_URL cannot be empty");
    }
    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
    }
    Ok(())
}

fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| anyhow::anyhow!("PUBLIC_BASE_URL is not a valid URL: {}", e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("PUBLIC_BASE_URL must start with http:// or https://");
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_url_must_be_postgres() {
        assert!(validate_database_url("postgres://u:p@localhost/db").is_ok());
        assert!(validate_database_url("postgresql://localhost/db").is_ok());
        assert!(validate_database_url("mysql://localhost/db").is_err());
        assert!(validate_database_url("  ").is_err());
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://areas.example.com/").unwrap(),
            "https://areas.example.com"
        );
        assert_eq!(
            normalize_base_url("http://localhost:8000").unwrap(),
            "http://localhost:8000"
        );
        assert!(normalize_base_url("ftp://example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn database_only_config_uses_defaults() {
        let config = Config::for_database("postgres://localhost/test");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.public_base_url, "http://localhost:8000");
        assert!(config.run_migrations);
    }
}
