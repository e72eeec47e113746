use anyhow::Result;

use crate::models::conversation::Conversation;
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::Tool;
use crate::providers::base::Provider;
use crate::registry::CapabilityRegistry;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful travel assistant. You have access to tools specifically for weather, attractions, distance, and packing. Use them when needed. Always respond in a slightly excited, helpful tone. Formats your response in Markdown.";

/// Final assistant message when a reply runs out of advisory turns
pub const TURN_LIMIT_NOTICE: &str = "I stopped after reaching the maximum number of tool rounds for a single reply. Ask me to continue if you need more.";

pub const DEFAULT_MAX_TURNS: usize = 10;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Upper bound on provider calls within one reply
    pub max_turns: usize,
    /// Preamble prepended when a conversation has no system message
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// What the provider told the agent to do next
#[derive(Debug, Clone, PartialEq)]
pub enum Advice {
    Answer(Message),
    Invoke {
        message: Message,
        requests: Vec<ToolRequest>,
    },
}

impl From<Message> for Advice {
    fn from(message: Message) -> Self {
        let requests: Vec<ToolRequest> = message.tool_requests().into_iter().cloned().collect();
        if requests.is_empty() {
            Advice::Answer(message)
        } else {
            Advice::Invoke { message, requests }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    AwaitAdvisory,
    DispatchTools(Vec<ToolRequest>),
    Done,
}

/// Working state of one reply
struct Progress {
    state: TurnState,
    conversation: Conversation,
    advisory_calls: usize,
}

/// Agent integrates a language model with the travel capabilities it can call
pub struct Agent {
    provider: Box<dyn Provider>,
    registry: CapabilityRegistry,
    config: AgentConfig,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>, registry: CapabilityRegistry, config: AgentConfig) -> Self {
        Self {
            provider,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.registry.tools()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn max_turns(&self) -> usize {
        self.config.max_turns.max(1)
    }

    /// Advance the reply by one state
    async fn transition(&self, progress: Progress, tools: &[Tool]) -> Result<Progress> {
        let Progress {
            state,
            conversation,
            advisory_calls,
        } = progress;

        match state {
            TurnState::AwaitAdvisory => {
                let (response, _usage) = self
                    .provider
                    .complete(conversation.messages(), tools)
                    .await?;

                let (message, next) = match Advice::from(response) {
                    Advice::Answer(message) => (message, TurnState::Done),
                    Advice::Invoke { message, requests } => {
                        (message, TurnState::DispatchTools(requests))
                    }
                };

                Ok(Progress {
                    state: next,
                    conversation: conversation.merge([message]),
                    advisory_calls: advisory_calls + 1,
                })
            }
            TurnState::DispatchTools(requests) => {
                // Sequential, in request order
                let mut results = Vec::with_capacity(requests.len());
                for request in &requests {
                    results.push(Message::tool(self.registry.execute(request).await));
                }
                let mut conversation = conversation.merge(results);

                let state = if advisory_calls >= self.max_turns() {
                    tracing::warn!(
                        max_turns = self.max_turns(),
                        "turn limit reached, ending reply"
                    );
                    conversation =
                        conversation.merge([Message::assistant().with_text(TURN_LIMIT_NOTICE)]);
                    TurnState::Done
                } else {
                    TurnState::AwaitAdvisory
                };

                Ok(Progress {
                    state,
                    conversation,
                    advisory_calls,
                })
            }
            TurnState::Done => Ok(Progress {
                state: TurnState::Done,
                conversation,
                advisory_calls,
            }),
        }
    }

    /// Run the conversation forward until the model answers, returning the full
    /// history including the system message, every tool round and the answer
    pub async fn reply(&self, messages: &[Message]) -> Result<Conversation> {
        let conversation =
            Conversation::new(messages.to_vec()).with_system_preamble(&self.config.system_prompt);
        conversation.validate()?;

        let tools = self.registry.tools();
        let mut progress = Progress {
            state: TurnState::AwaitAdvisory,
            conversation,
            advisory_calls: 0,
        };

        while progress.state != TurnState::Done {
            progress = self.transition(progress, &tools).await?;
        }

        Ok(progress.conversation)
    }
}
