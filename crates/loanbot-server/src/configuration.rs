use crate::error::{missing_field_path, to_env_var, ConfigError, ENV_PREFIX};
use config::{Config, Environment, File};
use loanbot::agent::{AgentPolicy, DEFAULT_MAX_TOOL_ROUNDS};
use loanbot::providers::{
    configs::{
        OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig, DEFAULT_TIMEOUT_SECS,
        OLLAMA_HOST, OLLAMA_MODEL, OPENAI_HOST, OPENAI_MODEL,
    },
    factory::ProviderType,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sessions without a request for this long are closed
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
    #[serde(default = "default_session_sweep_secs")]
    pub session_sweep_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_idle_secs: default_session_idle_secs(),
            session_sweep_secs: default_session_sweep_secs(),
        }
    }
}

impl ServerSettings {
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn session_sweep(&self) -> Duration {
        // tokio intervals panic on a zero period
        Duration::from_secs(self.session_sweep_secs.max(1))
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid server address {}:{}: {}", self.host, self.port, e))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderSettings {
    OpenAi {
        #[serde(default = "default_openai_host")]
        host: String,
        api_key: String,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    Ollama {
        #[serde(default = "default_ollama_host")]
        host: String,
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
}

impl ProviderSettings {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderSettings::OpenAi { .. } => ProviderType::OpenAi,
            ProviderSettings::Ollama { .. } => ProviderType::Ollama,
        }
    }

    // Convert to the loanbot ProviderConfig
    pub fn into_config(self) -> ProviderConfig {
        match self {
            ProviderSettings::OpenAi {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
                timeout_secs,
            } => ProviderConfig::OpenAi(OpenAiProviderConfig {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
                timeout_secs,
            }),
            ProviderSettings::Ollama {
                host,
                model,
                temperature,
                max_tokens,
                timeout_secs,
            } => ProviderConfig::Ollama(OllamaProviderConfig {
                host,
                model,
                temperature,
                max_tokens,
                timeout_secs,
            }),
        }
    }
}

/// Where the borrower's loan document lives
#[derive(Debug, Deserialize)]
pub struct LoanSettings {
    pub path: PathBuf,
    /// Read the document on first use instead of at startup
    #[serde(default)]
    pub lazy: bool,
}

#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    #[serde(default)]
    pub system_prompt: Option<PathBuf>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            system_prompt: None,
        }
    }
}

impl AgentSettings {
    pub fn policy(&self) -> AgentPolicy {
        AgentPolicy {
            max_tool_rounds: self.max_tool_rounds,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub loan: LoanSettings,
    #[serde(default)]
    pub agent: AgentSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            // An optional loanbot.toml in the working directory
            .add_source(File::with_name("loanbot").required(false))
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        // Point at the environment variable when a required setting is missing
        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                if let config::ConfigError::NotFound(field) = &err {
                    return Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    });
                }
                match missing_field_path(&err.to_string()) {
                    Some(field) => Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(&field),
                    }),
                    None => Err(ConfigError::Other(err)),
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_session_idle_secs() -> u64 {
    30 * 60
}

fn default_session_sweep_secs() -> u64 {
    60
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_openai_model() -> String {
    OPENAI_MODEL.to_string()
}

fn default_ollama_host() -> String {
    OLLAMA_HOST.to_string()
}

fn default_ollama_model() -> String {
    OLLAMA_MODEL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_tool_rounds() -> usize {
    DEFAULT_MAX_TOOL_ROUNDS
}
