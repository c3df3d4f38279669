//! Runtime configuration from the environment.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `DATABASE` | (required) | SQLite file, `~` expanded |
//! | `DBTALK_LLM` | `gpt-4-turbo` | Model name; prefix picks the provider |
//! | `ANTHROPIC_API_KEY` / `CEREBRAS_API_KEY` / `OPENAI_API_KEY` | | Key for the chosen provider |
//! | `DBTALK_DISCOVERY` | `catalog` | `catalog` or `llm` schema introspection |
//! | `DBTALK_MAX_ROWS` | `200` | Row cap per query |
//! | `DBTALK_TIMEOUT_SECS` | `60` | Per-request LLM timeout |
//!
//! A `.env` file in the working directory is loaded first when present.

use crate::database::DEFAULT_MAX_ROWS;
use crate::llm::LlmProvider;
use crate::types::{AgentError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// How the schema is introspected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Read `sqlite_master` and table pragmas
    #[default]
    Catalog,
    /// Ask the model to describe the DDL
    Llm,
}

impl FromStr for DiscoveryMode {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "catalog" => Ok(Self::Catalog),
            "llm" => Ok(Self::Llm),
            other => Err(AgentError::ConfigError(format!(
                "Unknown discovery mode '{}' (expected 'catalog' or 'llm')",
                other
            ))),
        }
    }
}

impl fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog => write!(f, "catalog"),
            Self::Llm => write!(f, "llm"),
        }
    }
}

/// Resolved configuration.
#[derive(Clone)]
pub struct Config {
    pub database: PathBuf,
    pub model: String,
    pub provider: LlmProvider,
    pub api_key: String,
    pub discovery: DiscoveryMode,
    pub max_rows: usize,
    pub timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database", &self.database)
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("discovery", &self.discovery)
            .field("max_rows", &self.max_rows)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Load from the process environment (after `.env`).
    ///
    /// # Errors
    ///
    /// Returns `AgentError::ConfigError` if `DATABASE` is missing or a
    /// numeric setting does not parse. The provider key is checked by
    /// [`Config::validate`].
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = get("DATABASE")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AgentError::ConfigError("DATABASE environment variable not set".to_string()))?;
        let database = PathBuf::from(shellexpand::tilde(database.trim()).into_owned());

        let model = get("DBTALK_LLM").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let provider = LlmProvider::from_model(&model);
        let api_key = get(provider.api_key_var()).unwrap_or_default();

        let discovery = match get("DBTALK_DISCOVERY") {
            Some(mode) => mode.parse()?,
            None => DiscoveryMode::default(),
        };

        let max_rows = parse_number(&get, "DBTALK_MAX_ROWS", DEFAULT_MAX_ROWS as u64)? as usize;
        let timeout = Duration::from_secs(parse_number(&get, "DBTALK_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);

        Ok(Self {
            database,
            model,
            provider,
            api_key,
            discovery,
            max_rows,
            timeout,
        })
    }

    /// Override the model, re-deriving the provider.
    ///
    /// The key is kept; callers switching providers must also set `api_key`.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.provider = LlmProvider::from_model(&self.model);
        self
    }

    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = database.into();
        self
    }

    /// Check the configuration before building a router.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::ConfigError` for a missing database file, an
    /// empty API key or a zero row cap.
    pub fn validate(&self) -> Result<()> {
        self.validate_database()?;
        if self.api_key.trim().is_empty() {
            return Err(AgentError::ConfigError(format!(
                "{} environment variable not set",
                self.provider.api_key_var()
            )));
        }
        Ok(())
    }

    /// Checks needed to read the database without a model.
    pub fn validate_database(&self) -> Result<()> {
        if !self.database.is_file() {
            return Err(AgentError::ConfigError(format!(
                "Database file not found: {}",
                self.database.display()
            )));
        }
        if self.max_rows == 0 {
            return Err(AgentError::ConfigError("DBTALK_MAX_ROWS must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_number<F>(get: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AgentError::ConfigError(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
