use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::kernel::jobs::TaskWorkerConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Task broker database. Without it tasks live in memory and the server
    /// runs its own worker.
    pub database_url: Option<String>,
    pub provider_api_key: Option<String>,
    pub provider_base_url: String,
    /// Longest silence tolerated while reading a provider response
    pub provider_read_timeout: Duration,
    /// Model id the gateway starts with, before any switch
    pub default_model: String,
    pub lexicon_path: PathBuf,
    pub embedded_worker: bool,
    /// How long finished tasks stay queryable in the in-memory broker
    pub task_retention: Duration,
    pub worker: WorkerSettings,
}

/// Limits applied by every task worker
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub prefetch: i64,
    pub soft_time_limit: Duration,
    pub hard_time_limit: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let embedded_worker = match env::var("EMBEDDED_WORKER") {
            Ok(value) => parse_bool(&value).context("EMBEDDED_WORKER must be true or false")?,
            Err(_) => database_url.is_none(),
        };

        let soft_time_limit = parse_secs("TASK_SOFT_TIME_LIMIT_SECS", 540)?;
        let hard_time_limit = parse_secs("TASK_HARD_TIME_LIMIT_SECS", 600)?;
        anyhow::ensure!(
            soft_time_limit < hard_time_limit,
            "TASK_SOFT_TIME_LIMIT_SECS must be lower than TASK_HARD_TIME_LIMIT_SECS"
        );

        let prefetch: i64 = env::var("WORKER_PREFETCH")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .context("WORKER_PREFETCH must be a valid number")?;
        anyhow::ensure!(prefetch >= 1, "WORKER_PREFETCH must be at least 1");

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            database_url,
            provider_api_key: env::var("OPENAI_API_KEY").ok().filter(|key| !key.is_empty()),
            provider_base_url: env::var("PROVIDER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            provider_read_timeout: parse_secs("PROVIDER_READ_TIMEOUT_SECS", 120)?,
            default_model: env::var("DEFAULT_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            lexicon_path: env::var("LEXICON_PATH")
                .unwrap_or_else(|_| "/root/lexicon/sl.tsv".to_string())
                .into(),
            embedded_worker,
            task_retention: parse_secs("TASK_RETENTION_SECS", 3600)?,
            worker: WorkerSettings {
                prefetch,
                soft_time_limit,
                hard_time_limit,
            },
        })
    }
}

impl WorkerSettings {
    /// Worker configuration with these limits and a fresh worker id.
    pub fn task_worker_config(&self) -> TaskWorkerConfig {
        TaskWorkerConfig {
            prefetch: self.prefetch,
            soft_time_limit: self.soft_time_limit,
            hard_time_limit: self.hard_time_limit,
            ..TaskWorkerConfig::default()
        }
    }
}

fn parse_secs(var: &str, default: u64) -> Result<Duration> {
    let secs: u64 = match env::var(var) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{} must be a whole number of seconds", var))?,
        Err(_) => default,
    };
    Ok(Duration::from_secs(secs))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognised boolean '{}'", other),
    }
}
