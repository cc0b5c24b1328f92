//! Absolute hyperlinks between resources.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub const PROVIDERS_PATH: &str = "providers";
pub const SERVICE_AREAS_PATH: &str = "service-areas";

/// Why a submitted hyperlink could not be resolved to a record id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Not a URL, or a URL that does not point at the expected route.
    NoMatch,
}

/// Renders and resolves resource URLs against the public base URL.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base: Url,
}

impl LinkBuilder {
    /// `base_url` is the public origin (optionally with a path prefix).
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    fn join(&self, relative: &str) -> String {
        match self.base.join(relative) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.base, relative),
        }
    }

    pub fn root(&self) -> String {
        self.base.to_string()
    }

    pub fn provider_list(&self) -> String {
        self.join(&format!("{}/", PROVIDERS_PATH))
    }

    pub fn provider(&self, id: i64) -> String {
        self.join(&format!("{}/{}/", PROVIDERS_PATH, id))
    }

    pub fn service_area_list(&self) -> String {
        self.join(&format!("{}/", SERVICE_AREAS_PATH))
    }

    pub fn service_area(&self, id: i64) -> String {
        self.join(&format!("{}/{}/", SERVICE_AREAS_PATH, id))
    }

    /// Resolves a provider hyperlink (absolute, or a path relative to the
    /// host) to the provider id it names.
    pub fn resolve_provider(&self, link: &str) -> Result<i64, LinkError> {
        self.resolve(link, provider_pattern())
    }

    fn resolve(&self, link: &str, pattern: &Regex) -> Result<i64, LinkError> {
        let link = link.trim();
        if link.is_empty() {
            return Err(LinkError::NoMatch);
        }
        let url = self.base.join(link).map_err(|_| LinkError::NoMatch)?;

        // Resources live under the base path. The host is not compared.
        let relative = url
            .path()
            .strip_prefix(self.base.path())
            .or_else(|| url.path().strip_prefix('/'))
            .ok_or(LinkError::NoMatch)?;

        let captures = pattern.captures(relative).ok_or(LinkError::NoMatch)?;
        captures[1].parse::<i64>().map_err(|_| LinkError::NoMatch)
    }
}

fn provider_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(r"^{}/([0-9]+)/?$", PROVIDERS_PATH)).expect("valid provider pattern")
    })
}
