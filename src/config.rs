use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const TOKEN_KEYS: [&str; 3] = ["BOT_TOKEN", "DISCORD_TOKEN", "TOKEN"];

/// Connection parameters for one Lavalink node.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct NodeConfig {
    #[serde(default = "default_node_name")]
    pub name: String,
    pub host: String,
    pub port: u16,
    pub password: String,
    #[serde(default)]
    pub secure: bool,
}

fn default_node_name() -> String {
    "Main Node".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: default_node_name(),
            host: "lavalink.jirayu.net".to_string(),
            port: 13592,
            password: "youshallnotpass".to_string(),
            secure: false,
        }
    }
}

/// Client credentials for the Spotify source on the node.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub prefix: String,

    // Audio
    pub nodes: Vec<NodeConfig>,
    pub search_platform: String,
    pub default_volume: u16,

    // APIs (Opcionales)
    pub spotify: Option<SpotifyCredentials>,

    // Health check
    pub http_port: u16,
}

impl Config {
    /// Loads `.env` (if any) and reads the configuration from the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Blank values count as missing. A missing bot token is an error; every
    /// other key has a default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token = TOKEN_KEYS
            .iter()
            .find_map(|key| get(*key))
            .context("No BOT_TOKEN found. Set BOT_TOKEN in your .env or environment variables.")?;

        let nodes = match get("LAVALINK_NODES") {
            Some(raw) => serde_json::from_str::<Vec<NodeConfig>>(&raw)
                .context("LAVALINK_NODES must be a JSON array of nodes")?,
            None => {
                let fallback = NodeConfig::default();
                vec![NodeConfig {
                    name: fallback.name,
                    host: get("LAVALINK_HOST").unwrap_or(fallback.host),
                    port: parse_or(&get, "LAVALINK_PORT", fallback.port)?,
                    password: get("LAVALINK_PASSWORD").unwrap_or(fallback.password),
                    secure: parse_or(&get, "LAVALINK_SECURE", fallback.secure)?,
                }]
            }
        };

        let spotify = match (get("SPOTIFY_CLIENT_ID"), get("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let defaults = Self::default();
        let config = Self {
            discord_token,
            prefix: get("PREFIX").unwrap_or(defaults.prefix),
            nodes,
            search_platform: get("SEARCH_PLATFORM").unwrap_or(defaults.search_platform),
            default_volume: parse_or(&get, "DEFAULT_VOLUME", defaults.default_volume)?,
            spotify,
            http_port: parse_or(&get, "PORT", defaults.http_port)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - The prefix must be non-empty and contain no whitespace
    /// - At least one node, each with a host and a non-zero port
    /// - Default volume within 0..=100
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() || self.prefix.chars().any(char::is_whitespace) {
            anyhow::bail!("Prefix must be non-empty and without spaces, got: {:?}", self.prefix);
        }

        if self.nodes.is_empty() {
            anyhow::bail!("At least one Lavalink node must be configured");
        }

        for node in &self.nodes {
            if node.host.trim().is_empty() {
                anyhow::bail!("Lavalink node '{}' has an empty host", node.name);
            }
            if node.port == 0 {
                anyhow::bail!("Lavalink node '{}' has port 0", node.name);
            }
        }

        if self.default_volume > 100 {
            anyhow::bail!("Default volume must be between 0 and 100, got: {}", self.default_volume);
        }

        if self.search_platform.trim().is_empty() {
            anyhow::bail!("Search platform cannot be empty");
        }

        Ok(())
    }

    pub fn spotify_enabled(&self) -> bool {
        self.spotify.is_some()
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Tokens and passwords are left out.
    pub fn summary(&self) -> String {
        let nodes = self
            .nodes
            .iter()
            .map(|node| format!("{}@{}:{}", node.name, node.host, node.port))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Config Summary:\n  \
            Prefix: {}\n  \
            Nodes: {}\n  \
            Search: {} (Spotify={})\n  \
            Volume: {}%\n  \
            Health: port {}",
            self.prefix,
            nodes,
            self.search_platform,
            self.spotify_enabled(),
            self.default_volume,
            self.http_port
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),
            prefix: "!".to_string(),

            nodes: vec![NodeConfig::default()],
            search_platform: "ytmsearch".to_string(),
            default_volume: 100,

            spotify: None,

            http_port: 3000,
        }
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
