use anyhow::Result;

use crate::prompt::{InputType, Prompt};

use wayfarer::agent::Agent;
use wayfarer::models::conversation::Conversation;
use wayfarer::models::message::Message;
use wayfarer::models::role::Role;

pub struct Session<'a> {
    agent: Agent,
    prompt: Box<dyn Prompt + 'a>,
    history: Conversation,
}

impl<'a> Session<'a> {
    pub fn new(agent: Agent, prompt: Box<impl Prompt + 'a>) -> Self {
        Session {
            agent,
            prompt,
            history: Conversation::default(),
        }
    }

    pub fn history(&self) -> &Conversation {
        &self.history
    }

    pub async fn start(&mut self) -> Result<()> {
        self.prompt.ready();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = input.content {
                        self.process_message(&content).await?;
                    }
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }
        }

        self.prompt.close();
        Ok(())
    }

    /// Run one user turn. On failure or interrupt the history stays as it was
    /// before the message was sent.
    pub async fn process_message(&mut self, text: &str) -> Result<()> {
        let pending = self.history.merge([Message::user().with_text(text)]);
        // The agent prepends a system message on the first turn
        let offset = match pending.messages().first() {
            Some(first) if first.role == Role::System => pending.len(),
            _ => pending.len() + 1,
        };

        self.prompt.show_busy();
        let outcome = tokio::select! {
            reply = self.agent.reply(pending.messages()) => Some(reply),
            _ = tokio::signal::ctrl_c() => None,
        };
        self.prompt.hide_busy();

        match outcome {
            Some(Ok(conversation)) => {
                for message in conversation.since(offset) {
                    self.prompt.render(message)?;
                }
                self.history = conversation;
            }
            Some(Err(e)) => {
                tracing::debug!("reply failed: {:?}", e);
                self.prompt.render_error(&e.to_string());
            }
            None => {
                self.prompt
                    .render_error("Interrupted, the last message was discarded.");
            }
        }

        Ok(())
    }
}
