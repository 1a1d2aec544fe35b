//! CLI argument definitions for the KisanGPT terminal client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// KisanGPT: an agricultural assistant for Indian farmers, in the terminal.
#[derive(Parser, Debug)]
#[command(name = "kisan", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the KisanGPT backend.
    #[arg(short = 'b', long = "backend-url")]
    pub backend_url: Option<String>,

    /// Gemini API key forwarded when the backend has none of its own.
    #[arg(long = "api-key")]
    pub api_key: Option<String>,

    /// Data directory for the persisted chat history.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Keep chat history between runs.
    #[arg(long = "persist-history")]
    pub persist_history: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > KISAN_CONFIG env var > ~/.kisan/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("KISAN_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the backend URL.
    ///
    /// Priority: --backend-url flag > KISAN_BACKEND_URL env var > config file value.
    pub fn resolve_backend_url(&self, config_url: &str) -> String {
        pick(self.backend_url.clone(), std::env::var("KISAN_BACKEND_URL").ok())
            .unwrap_or_else(|| config_url.to_string())
    }

    /// Resolve the client API key.
    ///
    /// Priority: --api-key flag > GEMINI_API_KEY env var > config file value.
    pub fn resolve_api_key(&self, config_key: Option<String>) -> Option<String> {
        pick(self.api_key.clone(), std::env::var("GEMINI_API_KEY").ok()).or(config_key)
    }

    /// Resolve the data directory path. `None` keeps the config value.
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level. `None` keeps the config value.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// First non-blank value of `flag` then `env`.
fn pick(flag: Option<String>, env: Option<String>) -> Option<String> {
    flag.into_iter()
        .chain(env)
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".kisan").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".kisan").join("config.toml");
    }
    PathBuf::from("config.toml")
}
