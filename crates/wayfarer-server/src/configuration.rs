use crate::error::{missing_field, to_env_var, ConfigError, ENV_PREFIX};
use config::{Config, Environment};
use serde::Deserialize;
use std::net::SocketAddr;
use wayfarer::agent::{AgentConfig, DEFAULT_MAX_TURNS};
use wayfarer::providers::{
    configs::{
        OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig, OLLAMA_HOST, OLLAMA_MODEL,
        OPENAI_HOST, OPENAI_MODEL,
    },
    factory::ProviderType,
};

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
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
        #[serde(default = "default_temperature")]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
    Ollama {
        #[serde(default = "default_ollama_host")]
        host: String,
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default = "default_temperature")]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<i32>,
    },
}

impl ProviderSettings {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderSettings::OpenAi { .. } => ProviderType::OpenAi,
            ProviderSettings::Ollama { .. } => ProviderType::Ollama,
        }
    }

    pub fn into_config(self) -> ProviderConfig {
        match self {
            ProviderSettings::OpenAi {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            } => ProviderConfig::OpenAi(OpenAiProviderConfig {
                host,
                api_key,
                model,
                temperature,
                max_tokens,
            }),
            ProviderSettings::Ollama {
                host,
                model,
                temperature,
                max_tokens,
            } => ProviderConfig::Ollama(OllamaProviderConfig {
                host,
                model,
                temperature,
                max_tokens,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            system_prompt: None,
        }
    }
}

impl AgentSettings {
    pub fn into_config(self) -> AgentConfig {
        let defaults = AgentConfig::default();
        AgentConfig {
            max_turns: self.max_turns,
            system_prompt: self.system_prompt.unwrap_or(defaults.system_prompt),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub agent: AgentSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("agent.max_turns", default_max_turns() as i64)?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match config.try_deserialize::<Self>() {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                if let Some(field) = missing_field(&err.to_string()) {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(&field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
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

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

fn default_temperature() -> Option<f32> {
    Some(0.0)
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
