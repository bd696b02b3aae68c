use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;

pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-4o";
pub const OLLAMA_HOST: &str = "http://localhost:11434";
pub const OLLAMA_MODEL: &str = "qwen2.5";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

// Unified enum to wrap different provider configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProviderConfig {
    OpenAi(OpenAiProviderConfig),
    Ollama(OllamaProviderConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
    pub timeout_secs: u64,
}

impl OpenAiProviderConfig {
    pub fn new<K: Into<String>, M: Into<String>>(api_key: K, model: M) -> Self {
        Self {
            host: OPENAI_HOST.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = get_env("OPENAI_API_KEY", true, None)?
            .ok_or_else(|| anyhow!("OpenAI API key must be set"))?;
        let host = get_env("OPENAI_HOST", false, Some(OPENAI_HOST.to_string()))?
            .unwrap_or_else(|| OPENAI_HOST.to_string());
        let model = get_env("OPENAI_MODEL", false, Some(OPENAI_MODEL.to_string()))?
            .unwrap_or_else(|| OPENAI_MODEL.to_string());

        Ok(Self {
            host,
            ..Self::new(api_key, model)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaProviderConfig {
    pub host: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
    pub timeout_secs: u64,
}

impl OllamaProviderConfig {
    pub fn new<H: Into<String>, M: Into<String>>(host: H, model: M) -> Self {
        Self {
            host: host.into(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn from_env() -> Result<Self> {
        let host = get_env("OLLAMA_HOST", false, Some(OLLAMA_HOST.to_string()))?
            .unwrap_or_else(|| OLLAMA_HOST.to_string());
        let model = get_env("OLLAMA_MODEL", false, Some(OLLAMA_MODEL.to_string()))?
            .unwrap_or_else(|| OLLAMA_MODEL.to_string());
        Ok(Self::new(host, model))
    }
}

/// Helper function to get environment variables with error handling
fn get_env(key: &str, required: bool, default: Option<String>) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) if !required => Ok(default),
        Err(env::VarError::NotPresent) => Err(anyhow!(
            "Environment variable '{}' is required but not set.",
            key
        )),
        Err(e) => Err(e.into()),
    }
}
