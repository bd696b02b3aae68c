use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{AgentArgs, CliProviderVariant};
use loanbot::agent::{Agent, AgentPolicy};
use loanbot::loan::LoanFacts;
use loanbot::providers::configs::{
    OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig, OPENAI_HOST, OPENAI_MODEL,
};
use loanbot::providers::factory::get_provider;

/// Wire the provider, the loan document and the loop policy into a shareable agent
pub fn build_agent(args: &AgentArgs, loan: PathBuf) -> Result<Arc<Agent>> {
    let facts = if args.lazy_load {
        LoanFacts::lazy(loan)
    } else {
        LoanFacts::eager(&loan)
            .with_context(|| format!("Failed to load loan document {}", loan.display()))?
    };

    let config = create_provider_config(args)?;
    tracing::info!(provider = %config.provider_type(), "creating provider");
    let provider = get_provider(config)?;

    let mut agent = Agent::for_loan(provider, Arc::new(facts))?.with_policy(AgentPolicy {
        max_tool_rounds: args.max_tool_rounds,
    });
    if let Some(path) = &args.system_prompt {
        agent = agent.with_system_prompt_file(path)?;
    }

    Ok(Arc::new(agent))
}

fn create_provider_config(args: &AgentArgs) -> Result<ProviderConfig> {
    match args.provider {
        CliProviderVariant::OpenAi => {
            let api_key = args
                .api_key
                .clone()
                .or_else(|| env::var("OPENAI_API_KEY").ok())
                .context(
                    "API key must be provided via --api-key or OPENAI_API_KEY environment variable",
                )?;
            let host = env::var("OPENAI_HOST").unwrap_or_else(|_| OPENAI_HOST.to_string());
            let model = args
                .model
                .clone()
                .or_else(|| env::var("OPENAI_MODEL").ok())
                .unwrap_or_else(|| OPENAI_MODEL.to_string());

            Ok(ProviderConfig::OpenAi(OpenAiProviderConfig {
                host,
                ..OpenAiProviderConfig::new(api_key, model)
            }))
        }
        CliProviderVariant::Ollama => {
            let mut config = OllamaProviderConfig::from_env()?;
            if let Some(model) = &args.model {
                config.model = model.clone();
            }
            Ok(ProviderConfig::Ollama(config))
        }
    }
}
