use serde::Deserialize;

use crate::models::MediaType;

/// What happens to a follower whose rating fetch fails
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Back to `NotLoaded`, the next request fetches again
    #[default]
    Retry,
    /// Parked in `Failed` until explicitly reset
    Sticky,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// AniList GraphQL endpoint
    #[serde(default = "default_anilist_api_url")]
    pub anilist_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Media list compared across followers
    #[serde(default)]
    pub media_type: MediaType,

    /// Accounts requested per following page
    #[serde(default = "default_following_page_size")]
    pub following_page_size: u32,

    /// Entries requested per media list chunk
    #[serde(default = "default_rated_items_chunk_size")]
    pub rated_items_chunk_size: u32,

    /// Aliased sub-queries per batch request
    #[serde(default = "default_batch_chunk_size")]
    pub batch_chunk_size: usize,

    /// Batch requests allowed in flight at once
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_anilist_api_url() -> String {
    "https://graphql.anilist.co".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_following_page_size() -> u32 {
    50
}

fn default_rated_items_chunk_size() -> u32 {
    500
}

fn default_batch_chunk_size() -> usize {
    50
}

fn default_max_concurrent_requests() -> usize {
    4
}

/// Knobs the social graph engine needs, detached from the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub media_type: MediaType,
    pub failure_policy: FailurePolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            media_type: MediaType::Anime,
            failure_policy: FailurePolicy::Retry,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.batch_chunk_size == 0 {
            anyhow::bail!("BATCH_CHUNK_SIZE must be at least 1");
        }
        if self.max_concurrent_requests == 0 {
            anyhow::bail!("MAX_CONCURRENT_REQUESTS must be at least 1");
        }
        if self.following_page_size == 0 || self.rated_items_chunk_size == 0 {
            anyhow::bail!("page sizes must be at least 1");
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            media_type: self.media_type,
            failure_policy: self.failure_policy,
        }
    }
}
