use anyhow::Result;
use wayfarer::models::message::Message;

pub mod cliclack;

pub trait Prompt {
    fn render(&mut self, message: &Message) -> Result<()>;
    fn render_error(&mut self, error: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    fn close(&self);
    fn ready(&self) {
        println!("\n");
        println!("Where are we headed? Ask about weather, sights, distances or packing.");
        println!("\n");
    }
}

#[derive(Debug, PartialEq)]
pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Commands such as exit carry no content
}

#[derive(Debug, PartialEq)]
pub enum InputType {
    AskAgain, // Ask the user for input again. Control flow command.
    Message,  // User sent a message
    Exit,     // User wants to exit the session
}

/// Classify a raw line typed by the user
pub fn parse_input(raw: &str) -> Input {
    let text = raw.trim();

    if text.is_empty() {
        return Input {
            input_type: InputType::AskAgain,
            content: None,
        };
    }

    if ["quit", "exit", "q"]
        .iter()
        .any(|command| text.eq_ignore_ascii_case(command))
    {
        return Input {
            input_type: InputType::Exit,
            content: None,
        };
    }

    Input {
        input_type: InputType::Message,
        content: Some(text.to_string()),
    }
}
