use super::{
    base::Provider, configs::ProviderConfig, ollama::OllamaProvider, openai::OpenAiProvider,
};
use anyhow::Result;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(EnumIter, EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    Ollama,
}

impl ProviderConfig {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderConfig::OpenAi(_) => ProviderType::OpenAi,
            ProviderConfig::Ollama(_) => ProviderType::Ollama,
        }
    }
}

pub fn get_provider(config: ProviderConfig) -> Result<Box<dyn Provider + Send + Sync>> {
    match config {
        ProviderConfig::OpenAi(openai_config) => Ok(Box::new(OpenAiProvider::new(openai_config)?)),
        ProviderConfig::Ollama(ollama_config) => Ok(Box::new(OllamaProvider::new(ollama_config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::configs::{OllamaProviderConfig, OLLAMA_HOST};
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_provider_type_names() {
        let names: Vec<String> = ProviderType::iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["openai", "ollama"]);
        assert_eq!(ProviderType::from_str("ollama").unwrap(), ProviderType::Ollama);
        assert!(ProviderType::from_str("databricks").is_err());
    }

    #[test]
    fn test_get_provider() {
        let config = ProviderConfig::Ollama(OllamaProviderConfig::new(OLLAMA_HOST, "qwen2.5"));
        assert_eq!(config.provider_type(), ProviderType::Ollama);
        assert!(get_provider(config).is_ok());
    }
}
