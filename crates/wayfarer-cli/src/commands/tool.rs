use anyhow::{Context, Result};
use console::style;
use serde_json::Value;

use wayfarer::capabilities::{OpenMeteoClient, OpenMeteoConfig};
use wayfarer::registry::CapabilityRegistry;

fn registry() -> Result<CapabilityRegistry> {
    let client = OpenMeteoClient::new(OpenMeteoConfig::default())?;
    Ok(CapabilityRegistry::with_travel_capabilities(client))
}

/// Run one capability with JSON encoded arguments and return its output
pub async fn run(registry: &CapabilityRegistry, name: &str, args: &str) -> Result<String> {
    let arguments: Value = serde_json::from_str(args)
        .with_context(|| format!("--args must be a JSON object, got: {}", args))?;
    Ok(registry.dispatch(name, arguments).await)
}

pub async fn execute(name: &str, args: &str) -> Result<()> {
    let output = run(&registry()?, name, args).await?;

    // Pretty print JSON payloads; error strings are printed as they are
    match serde_json::from_str::<Value>(&output) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{}", output),
    }
    Ok(())
}

pub fn list() -> Result<()> {
    for tool in registry()?.tools() {
        println!("{}", style(&tool.name).bold());
        println!("  {}", style(&tool.description).dim());
    }
    Ok(())
}
