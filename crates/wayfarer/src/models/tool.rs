use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A capability schema published to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// A JSON schema describing the parameters, including which are required
    pub parameters: Value,
}

impl Tool {
    /// Create a new tool with the given name and description
    pub fn new<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names of the parameters the schema marks as required
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(|v| v.as_array())
            .map(|required| required.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }
}

/// A capability invocation as requested by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// The name of the capability to execute
    pub name: String,
    /// The arguments for the execution, either a mapping or a serialized JSON string
    pub arguments: Value,
}

impl ToolCall {
    pub fn new<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Arguments as a mapping when possible.
    ///
    /// Models sometimes send arguments pre-serialized as a JSON string. Those are
    /// parsed here; a string that does not parse is passed through unchanged.
    pub fn parsed_arguments(&self) -> Value {
        match &self.arguments {
            Value::String(raw) => {
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
            }
            other => other.clone(),
        }
    }
}
