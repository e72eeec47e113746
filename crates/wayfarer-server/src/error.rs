use thiserror::Error;

pub const ENV_PREFIX: &str = "WAYFARER";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

// Provider fields can be reported without their parent key
const PROVIDER_FIELDS: [&str; 6] = ["type", "api_key", "host", "model", "temperature", "max_tokens"];

/// Environment variable that sets a configuration key, e.g. `provider.api_key`
/// becomes `WAYFARER_PROVIDER__API_KEY`
pub fn to_env_var(field: &str) -> String {
    let path = if field == "provider" {
        "provider.type".to_string()
    } else if !field.contains('.') && PROVIDER_FIELDS.contains(&field) {
        format!("provider.{}", field)
    } else {
        field.to_string()
    };

    format!("{}_{}", ENV_PREFIX, path.replace('.', "__").to_uppercase())
}

/// Pull the field name out of serde's "missing field `x`" message, keeping the
/// parent key when the message names one
pub fn missing_field(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let (field, tail) = rest.split_once('`')?;

    match tail
        .strip_prefix(" for key `")
        .and_then(|key| key.strip_suffix('`'))
    {
        Some(key) if !key.is_empty() => Some(format!("{}.{}", key, field)),
        _ => Some(field.to_string()),
    }
}
