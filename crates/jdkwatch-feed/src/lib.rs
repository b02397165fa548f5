use std::path::PathBuf;

use async_trait::async_trait;
use jdkwatch_core::{FeedEntry, FeedError, VersionFeed};
use serde::Deserialize;
use tracing::warn;

pub const FEED_ENV: &str = "JDKWATCH_FEED";

const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub schema_version: u32,
    pub toolchains: Vec<CatalogToolchain>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogToolchain {
    pub suggested_name: String,
    pub version: String,
    pub vendor: String,
    pub channel: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            toolchains: Vec::new(),
        }
    }
}

/// Where the catalog lives. `JDKWATCH_FEED` accepts either a local path or an
/// http(s) URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedSource {
    File(PathBuf),
    Http(String),
}

impl FeedSource {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            FeedSource::Http(trimmed.to_string())
        } else {
            FeedSource::File(jdkwatch_util::expand_user(trimmed))
        }
    }

    pub fn from_env() -> Option<Self> {
        match std::env::var(FEED_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Some(Self::parse(&raw)),
            _ => None,
        }
    }
}

/// Reference `VersionFeed`: a JSON catalog read from disk or fetched over
/// HTTPS on every cycle that needs it.
pub struct CatalogFeed {
    source: FeedSource,
    client: reqwest::Client,
}

impl CatalogFeed {
    pub fn new(source: FeedSource) -> Self {
        Self {
            source,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl VersionFeed for CatalogFeed {
    async fn fetch(&self) -> Result<Vec<FeedEntry>, FeedError> {
        let raw = match &self.source {
            FeedSource::File(path) => tokio::fs::read_to_string(path).await?,
            FeedSource::Http(url) => self
                .client
                .get(url)
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(|err| FeedError::Transport(err.to_string()))?
                .text()
                .await
                .map_err(|err| FeedError::Transport(err.to_string()))?,
        };
        parse_catalog(&raw)
    }
}

/// Entries without a join key or version are dropped with a warning rather
/// than failing the whole catalog.
pub fn parse_catalog(raw: &str) -> Result<Vec<FeedEntry>, FeedError> {
    let catalog: Catalog =
        serde_json::from_str(raw).map_err(|err| FeedError::Malformed(err.to_string()))?;
    if catalog.schema_version != SCHEMA_VERSION {
        warn!(
            "catalog schema version {} (expected {}); reading anyway",
            catalog.schema_version, SCHEMA_VERSION
        );
    }
    Ok(catalog
        .toolchains
        .into_iter()
        .filter(|item| {
            let usable = !item.suggested_name.trim().is_empty() && !item.version.trim().is_empty();
            if !usable {
                warn!("dropping catalog entry with empty name or version");
            }
            usable
        })
        .map(|item| FeedEntry {
            suggested_name: item.suggested_name,
            version: item.version,
        })
        .collect())
}
