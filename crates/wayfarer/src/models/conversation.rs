use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::message::Message;
use super::role::Role;
use crate::errors::{AgentError, AgentResult};

/// An append-only, ordered sequence of messages.
///
/// A conversation is never edited in place: `merge` returns a new conversation
/// with the extra messages concatenated onto the end, leaving the original
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Concatenate new messages onto this state
    pub fn merge<I>(&self, messages: I) -> Conversation
    where
        I: IntoIterator<Item = Message>,
    {
        let mut merged = self.messages.clone();
        merged.extend(messages);
        Conversation { messages: merged }
    }

    /// Prepend a system message built from `preamble` unless the first message
    /// already is one
    pub fn with_system_preamble(&self, preamble: &str) -> Conversation {
        match self.messages.first() {
            Some(first) if first.role == Role::System => self.clone(),
            _ => {
                let mut messages = Vec::with_capacity(self.messages.len() + 1);
                messages.push(Message::system().with_text(preamble));
                messages.extend(self.messages.iter().cloned());
                Conversation { messages }
            }
        }
    }

    /// Messages added after the first `offset` ones
    pub fn since(&self, offset: usize) -> &[Message] {
        &self.messages[offset.min(self.messages.len())..]
    }

    /// Check the ordering invariants: a single leading system message, and every
    /// tool message answering an invocation requested by the latest assistant
    /// message, at most once.
    pub fn validate(&self) -> AgentResult<()> {
        match self.messages.first() {
            Some(first) if first.role == Role::System => {}
            _ => {
                return Err(AgentError::InvalidConversation(
                    "conversation must start with a system message".to_string(),
                ))
            }
        }

        let mut pending: HashSet<&str> = HashSet::new();

        for (index, message) in self.messages.iter().enumerate().skip(1) {
            match message.role {
                Role::System => {
                    return Err(AgentError::InvalidConversation(format!(
                        "system message at position {}, only position 0 is allowed",
                        index
                    )));
                }
                Role::Assistant => {
                    pending.clear();
                    for request in message.tool_requests() {
                        if !pending.insert(request.id.as_str()) {
                            return Err(AgentError::InvalidConversation(format!(
                                "duplicate invocation id {}",
                                request.id
                            )));
                        }
                    }
                }
                Role::Tool => {
                    let responses = message.tool_responses();
                    if responses.is_empty() {
                        return Err(AgentError::InvalidConversation(format!(
                            "tool message at position {} carries no result",
                            index
                        )));
                    }
                    for response in responses {
                        if !pending.remove(response.id.as_str()) {
                            return Err(AgentError::InvalidConversation(format!(
                                "tool result {} does not answer a pending request",
                                response.id
                            )));
                        }
                    }
                }
                Role::User => {}
            }
        }

        Ok(())
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Conversation::new(messages)
    }
}
