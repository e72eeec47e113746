use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crate::prompt::cliclack::CliclackPrompt;
use crate::session::Session;

use wayfarer::agent::{Agent, AgentConfig, DEFAULT_MAX_TURNS};
use wayfarer::capabilities::{OpenMeteoClient, OpenMeteoConfig};
use wayfarer::providers::configs::{OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig};
use wayfarer::providers::factory;
use wayfarer::registry::CapabilityRegistry;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum CliProviderVariant {
    #[value(name = "openai")]
    OpenAi,
    Ollama,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Language model provider
    #[arg(short, long, value_enum, default_value = "openai")]
    pub provider: CliProviderVariant,

    /// Model to use, defaults to the provider's default
    #[arg(short, long)]
    pub model: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Maximum model calls per reply
    #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
    pub max_turns: usize,
}

pub fn create_provider_config(args: &ChatArgs) -> Result<ProviderConfig> {
    match args.provider {
        CliProviderVariant::OpenAi => {
            let api_key = args.api_key.clone().context(
                "API key must be provided via --api-key or OPENAI_API_KEY environment variable",
            )?;
            let mut config = OpenAiProviderConfig::new(api_key);
            if let Some(model) = &args.model {
                config.model = model.clone();
            }
            Ok(ProviderConfig::OpenAi(config))
        }
        CliProviderVariant::Ollama => {
            let mut config = OllamaProviderConfig::default();
            if let Some(model) = &args.model {
                config.model = model.clone();
            }
            Ok(ProviderConfig::Ollama(config))
        }
    }
}

pub fn build_agent(args: &ChatArgs) -> Result<Agent> {
    let provider = factory::get_provider(create_provider_config(args)?)?;
    let client = OpenMeteoClient::new(OpenMeteoConfig::default())?;

    Ok(Agent::new(
        provider,
        CapabilityRegistry::with_travel_capabilities(client),
        AgentConfig {
            max_turns: args.max_turns,
            ..AgentConfig::default()
        },
    ))
}

pub async fn execute(args: ChatArgs) -> Result<()> {
    let agent = build_agent(&args)?;
    let mut session = Session::new(agent, Box::new(CliclackPrompt::new()));
    session.start().await
}
