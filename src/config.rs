use crate::fetcher::ListingSource;
use std::{env, fmt::Display, str::FromStr};
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_base: Url,
    pub source: ListingSource,
}

impl Config {
    pub fn load() -> Result<Self, url::ParseError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, url::ParseError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_base = Url::parse(&var("GALLERY_API_BASE").unwrap_or_else(|| {
            info!("GALLERY_API_BASE not set, using default: {DEFAULT_API_BASE}");
            DEFAULT_API_BASE.to_string()
        }))?;

        let require_username = try_load("GALLERY_REQUIRE_USERNAME", var("GALLERY_REQUIRE_USERNAME"), true);
        let source = match var("GALLERY_SOURCE").as_deref().map(str::trim) {
            Some("static") => ListingSource::StaticAssets,
            Some("api") | None => ListingSource::Api { require_username },
            Some(other) => {
                warn!("unknown GALLERY_SOURCE {other:?}, using the image service");
                ListingSource::Api { require_username }
            }
        };

        Ok(Self {
            port: try_load("PORT", var("PORT"), DEFAULT_PORT),
            api_base,
            source,
        })
    }
}

fn try_load<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|err| {
            warn!("invalid {key} value {raw:?} ({err}), using default: {default}");
            default
        }),
        None => default,
    }
}
