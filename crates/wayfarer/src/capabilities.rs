//! The travel capabilities an agent can invoke.
//!
//! Every capability answers with a JSON object serialized to a string. Failures
//! the model should reason about (an unknown city, an out of range day count, an
//! upstream outage) are reported inside that object as `{"error": "..."}`. Only
//! arguments that cannot be decoded at all surface as an `AgentError`, which the
//! registry turns into an error string.
pub mod attractions;
pub mod distance;
pub mod open_meteo;
pub mod packing;
pub mod weather;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;

pub use attractions::SearchAttractions;
pub use distance::CalculateTravelDistance;
pub use open_meteo::{OpenMeteoClient, OpenMeteoConfig};
pub use packing::PackingSuggestions;
pub use weather::{CurrentWeather, WeatherForecast};

/// A named function the model can call
#[async_trait]
pub trait Capability: Send + Sync {
    /// The schema published to the model; its name is the dispatch key
    fn tool(&self) -> &Tool;

    /// Run the capability with already parsed arguments
    async fn call(&self, arguments: Value) -> AgentResult<String>;

    fn name(&self) -> &str {
        &self.tool().name
    }
}

/// Decode the argument mapping into the capability's typed parameters
pub(crate) fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> AgentResult<T> {
    serde_json::from_value(arguments).map_err(|e| AgentError::InvalidParameters(e.to_string()))
}

pub(crate) fn to_payload<T: Serialize>(value: &T) -> AgentResult<String> {
    serde_json::to_string(value).map_err(|e| AgentError::Internal(e.to_string()))
}

pub(crate) fn error_payload(message: impl Into<String>) -> String {
    json!({ "error": message.into() }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Args {
        city: String,
    }

    #[test]
    fn test_parse_arguments_missing_field() {
        let result: AgentResult<Args> = parse_arguments(json!({}));
        match result {
            Err(AgentError::InvalidParameters(message)) => assert!(message.contains("city")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_arguments() {
        let args: Args = parse_arguments(json!({"city": "Paris"})).unwrap();
        assert_eq!(args.city, "Paris");
    }

    #[test]
    fn test_parse_arguments_rejects_raw_string() {
        let result: AgentResult<Args> = parse_arguments(json!("city=Paris"));
        assert!(result.is_err());
    }

    #[test]
    fn test_error_payload() {
        assert_eq!(error_payload("boom"), r#"{"error":"boom"}"#);
    }
}
