use serde::Deserialize;

use crate::models::PopularityScheme;

/// How the bot receives updates from Telegram
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Long-poll `getUpdates` in a background task
    Polling,
    /// Telegram pushes updates to `POST /webhook`
    Webhook,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Bot API token issued by BotFather
    pub bot_token: String,

    /// Channel whose members may use the bot, e.g. `@moviechannel`
    pub channel_username: String,

    /// The bot's own handle, shown in the welcome message
    #[serde(default)]
    pub bot_username: String,

    /// The only user allowed to run `/addmovie`
    pub owner_id: i64,

    /// Path of the JSON catalog file
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Popularity scheme applied to the catalog
    #[serde(default = "default_popularity_scheme")]
    pub popularity_scheme: PopularityScheme,

    #[serde(default = "default_update_mode")]
    pub update_mode: UpdateMode,

    /// Telegram Bot API base URL
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    /// Shared secret Telegram echoes back in webhook requests
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Long-poll timeout in seconds
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Timeout in seconds for every other Bot API call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Minimum similarity for approximate title suggestions
    #[serde(default = "default_suggestion_cutoff")]
    pub suggestion_cutoff: f64,

    /// Maximum number of approximate suggestions
    #[serde(default = "default_max_fuzzy_suggestions")]
    pub max_fuzzy_suggestions: usize,

    /// Number of movies listed as favorites by `/start`
    #[serde(default = "default_top_favorites")]
    pub top_favorites: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_catalog_path() -> String {
    "movies.json".to_string()
}

fn default_popularity_scheme() -> PopularityScheme {
    PopularityScheme::Rating
}

fn default_update_mode() -> UpdateMode {
    UpdateMode::Polling
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_suggestion_cutoff() -> f64 {
    0.4
}

fn default_max_fuzzy_suggestions() -> usize {
    3
}

fn default_top_favorites() -> usize {
    3
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    /// Load configuration from an explicit set of key/value pairs
    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if !(0.0..=1.0).contains(&config.suggestion_cutoff) {
            anyhow::bail!(
                "SUGGESTION_CUTOFF must be between 0.0 and 1.0, got {}",
                config.suggestion_cutoff
            );
        }

        if config.update_mode == UpdateMode::Webhook
            && config.webhook_secret.as_deref().map_or(true, str::is_empty)
        {
            anyhow::bail!("WEBHOOK_SECRET is required when UPDATE_MODE is webhook");
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
