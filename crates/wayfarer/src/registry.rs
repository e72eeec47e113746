use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::capabilities::{
    CalculateTravelDistance, Capability, CurrentWeather, OpenMeteoClient, PackingSuggestions,
    SearchAttractions, WeatherForecast,
};
use crate::errors::AgentError;
use crate::models::message::{ToolRequest, ToolResponse};
use crate::models::tool::Tool;

/// Maps capability names to implementations and turns every failure into a value
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: Vec<Box<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five travel capabilities, sharing one weather client
    pub fn with_travel_capabilities(client: OpenMeteoClient) -> Self {
        let mut registry = Self::new();
        registry.capabilities = vec![
            Box::new(CurrentWeather::new(client.clone())),
            Box::new(WeatherForecast::new(client)),
            Box::new(SearchAttractions::new()),
            Box::new(CalculateTravelDistance::new()),
            Box::new(PackingSuggestions::new()),
        ];
        registry
    }

    /// Add a capability; names must be unique
    pub fn register(&mut self, capability: Box<dyn Capability>) -> Result<()> {
        if self.get(capability.name()).is_some() {
            return Err(anyhow!("Duplicate tool name: {}", capability.name()));
        }
        self.capabilities.push(capability);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Capability> {
        self.capabilities
            .iter()
            .find(|capability| capability.name() == name)
            .map(|v| &**v)
    }

    /// Schemas for every registered capability, in registration order
    pub fn tools(&self) -> Vec<Tool> {
        self.capabilities
            .iter()
            .map(|capability| capability.tool().clone())
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    /// Run a capability, returning either its output or the error string to show
    /// the model in its place
    async fn run(&self, name: &str, arguments: Value) -> std::result::Result<String, String> {
        let capability = self
            .get(name)
            .ok_or_else(|| format!("Error: Tool {} not found.", name))?;

        capability.call(arguments).await.map_err(|e| {
            let message = match e {
                AgentError::InvalidParameters(m)
                | AgentError::ExecutionError(m)
                | AgentError::Internal(m) => m,
                other => other.to_string(),
            };
            format!("Error executing tool {}: {}", name, message)
        })
    }

    /// Dispatch a call by name. Never fails: unknown names and capability errors
    /// come back as error strings.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> String {
        match self.run(name, arguments).await {
            Ok(output) => output,
            Err(error) => error,
        }
    }

    /// Execute one invocation request, parsing string arguments first
    pub async fn execute(&self, request: &ToolRequest) -> ToolResponse {
        let name = &request.tool_call.name;
        let arguments = request.tool_call.parsed_arguments();
        tracing::info!(tool = %name, arguments = %arguments, "tool call");

        let (content, error) = match self.run(name, arguments).await {
            Ok(output) => (output, None),
            Err(error) => {
                tracing::warn!(tool = %name, "{}", error);
                (error.clone(), Some(error))
            }
        };

        ToolResponse {
            id: request.id.clone(),
            name: name.clone(),
            content,
            error,
        }
    }
}
