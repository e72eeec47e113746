//! These models represent the objects passed around by the agent
//!
//! There are several different related formats we need to interact with:
//! - conversation history, sent from the caller to the agent and back
//! - openai messages/tools, sent from the agent to the LLM
//! - capability calls, sent from the agent to the registry
//!
//! We always immediately convert those data models into the internal structs
//! using to/from helpers, so the internal models are not an exact match to any
//! of these formats.
pub mod conversation;
pub mod message;
pub mod role;
pub mod tool;
