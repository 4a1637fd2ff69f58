use crate::gate::DEFAULT_COOLDOWN;
use crate::moderation::{RetryPolicy, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Redis { url: String },
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Credential and endpoint for the moderation API
#[derive(Clone, PartialEq, Eq)]
pub struct ModerationConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for ModerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModerationConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub moderation: ModerationConfig,
    pub cooldown: Duration,
    pub denylist_path: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Config {
    /// Read configuration from the process environment, after loading `.env`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:3001")?;

        let store = match var("STORE_BACKEND").as_deref().unwrap_or("redis") {
            "redis" => StoreBackend::Redis {
                url: var("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            },
            "memory" => StoreBackend::Memory,
            other => return Err(anyhow!("Unknown STORE_BACKEND {:?}, expected redis or memory", other)),
        };

        let api_key = var("OPENAI_API_KEY")
            .ok_or_else(|| anyhow!("OPENAI_API_KEY is required for name moderation"))?;

        let moderation = ModerationConfig {
            endpoint: var("MODERATION_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key,
            model: var("MODERATION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            retry: RetryPolicy::default(),
        };

        let cooldown = match var("NAME_COOLDOWN_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse::<u64>()
                    .context("NAME_COOLDOWN_SECS must be a whole number of seconds")?,
            ),
            None => DEFAULT_COOLDOWN,
        };

        let log_format = match var("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            bind_addr,
            store,
            moderation,
            cooldown,
            denylist_path: var("DENYLIST_PATH").map(PathBuf::from),
            log_format,
        })
    }
}
