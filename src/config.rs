//! Environment-driven configuration.
//!
//! Clients are constructed from explicit config structs and passed down
//! to the code that needs them; nothing reads the environment after
//! startup and nothing is process-global.
use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

/// Default chat completion endpoint base.
pub const DEFAULT_MODEL_API_BASE: &str = "https://api.openai.com";
/// Default model used when the CLI does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for the chat model API.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_base: String,
    pub api_key: String,
}

impl ModelConfig {
    /// Resolve from `FIELDSMITH_MODEL_API_BASE` / `FIELDSMITH_MODEL_API_KEY`,
    /// falling back to `OPENAI_API_KEY` for the key.
    pub fn from_env() -> Result<Self> {
        let api_base = env::var("FIELDSMITH_MODEL_API_BASE")
            .unwrap_or_else(|_| DEFAULT_MODEL_API_BASE.to_string());
        let api_key = env::var("FIELDSMITH_MODEL_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                anyhow!("set FIELDSMITH_MODEL_API_KEY or OPENAI_API_KEY for model access")
            })?;
        Ok(ModelConfig { api_base, api_key })
    }
}

/// Connection settings for the record store API.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub host: String,
    pub app_id: String,
    pub api_key: String,
}

impl StoreConfig {
    /// Resolve from `FIELDSMITH_STORE_*` environment variables. The host
    /// defaults to the conventional `https://{app_id}-dsn.algolia.net`.
    pub fn from_env() -> Result<Self> {
        let app_id = env::var("FIELDSMITH_STORE_APP_ID")
            .map_err(|_| anyhow!("set FIELDSMITH_STORE_APP_ID for record store access"))?;
        let api_key = env::var("FIELDSMITH_STORE_API_KEY")
            .map_err(|_| anyhow!("set FIELDSMITH_STORE_API_KEY for record store access"))?;
        let host = env::var("FIELDSMITH_STORE_HOST")
            .unwrap_or_else(|_| format!("https://{}-dsn.algolia.net", app_id.to_lowercase()));
        Ok(StoreConfig {
            host,
            app_id,
            api_key,
        })
    }
}

/// Resolve the instruction library path: explicit flag > env > data dir.
pub fn resolve_library_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Ok(path) = env::var("FIELDSMITH_LIBRARY") {
        return Ok(PathBuf::from(path));
    }
    let data_dir = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(data_dir.join("fieldsmith").join("instructions.json"))
}
