use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BriefError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    2076
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            temperature: default_temperature(),
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_model() -> String {
    "deepseek/deepseek-chat-v3-0324:free".into()
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_model_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchSettings {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_max_results() -> usize {
    5
}

fn default_search_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

fn default_max_rounds() -> usize {
    6
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub agent: AgentConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|err| BriefError::Config(format!("failed to parse configuration: {err}")))
    }

    /// Load from the TOML file when it exists (defaults otherwise), then apply
    /// environment overrides. The API key is only ever supplied out-of-band.
    pub fn from_env_or_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = if path.as_ref().exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        if let Ok(host) = env::var("STOCKBRIEF_HOST") {
            cfg.server.host = host;
        }
        if let Ok(port) = env::var("STOCKBRIEF_PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                cfg.server.port = parsed;
            }
        }
        if let Ok(model) = env::var("STOCKBRIEF_MODEL") {
            cfg.model.model = model;
        }
        if let Ok(base_url) = env::var("STOCKBRIEF_BASE_URL") {
            cfg.model.base_url = base_url;
        }
        if let Ok(key) = env::var("OPENROUTER_API_KEY") {
            cfg.model.api_key = Some(key);
        }
        Ok(cfg)
    }
}
