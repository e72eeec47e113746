use std::io::{self, Write};

use anyhow::{anyhow, Result};
use bat::WrappingMode;
use cliclack::{input, spinner};
use console::style;
use wayfarer::models::message::{Message, MessageContent};

use super::{parse_input, Input, Prompt};

pub struct CliclackPrompt {
    spinner: Option<cliclack::ProgressBar>,
    theme: &'static str,
}

impl Default for CliclackPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl CliclackPrompt {
    pub fn new() -> Self {
        CliclackPrompt {
            spinner: None,
            theme: "zenburn",
        }
    }
}

fn print_markdown(content: &str, theme: &str) -> Result<()> {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .map_err(|e| anyhow!("failed to render reply: {}", e))?;
    println!();
    Ok(())
}

/// One line summary of a tool call, e.g. `search_attractions {"location":"Paris"}`
fn tool_call_summary(name: &str, arguments: &serde_json::Value) -> String {
    match arguments {
        serde_json::Value::String(raw) => format!("{} {}", name, raw),
        other => format!("{} {}", name, other),
    }
}

impl Prompt for CliclackPrompt {
    fn render(&mut self, message: &Message) -> Result<()> {
        for content in &message.content {
            match content {
                MessageContent::Text(text) if !text.text.is_empty() => {
                    print_markdown(&text.text, self.theme)?
                }
                MessageContent::Text(_) => {}
                MessageContent::ToolRequest(request) => {
                    let summary =
                        tool_call_summary(&request.tool_call.name, &request.tool_call.arguments);
                    println!("{}", style(format!("  → {}", summary)).dim());
                }
                MessageContent::ToolResponse(response) => {
                    if let Some(error) = &response.error {
                        println!("{}", style(format!("  ✗ {}", error)).dim());
                    }
                }
            }
        }

        io::stdout().flush()?;
        Ok(())
    }

    fn render_error(&mut self, error: &str) {
        eprintln!("{} {}", style("Error:").red().bold(), error);
    }

    fn show_busy(&mut self) {
        let spin = spinner();
        spin.start("planning...");
        self.spinner = Some(spin);
    }

    fn hide_busy(&mut self) {
        if let Some(spin) = self.spinner.take() {
            spin.stop("");
        }
    }

    fn get_input(&mut self) -> Result<Input> {
        let message_text: String = input("You:")
            .placeholder("")
            .required(false)
            .interact()?;
        Ok(parse_input(&message_text))
    }

    fn close(&self) {
        println!("{}", style("Safe travels!").green());
    }
}
