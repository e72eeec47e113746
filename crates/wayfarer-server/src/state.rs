use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use wayfarer::agent::Agent;
use wayfarer::models::conversation::Conversation;
use wayfarer::models::role::Role;

pub const DEFAULT_TITLE: &str = "New Conversation";
const TITLE_LENGTH: usize = 30;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub store: ConversationStore,
}

impl AppState {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent: Arc::new(agent),
            store: ConversationStore::default(),
        }
    }
}

/// Conversations keyed by id. Each entry has its own lock so turns on one id
/// run one at a time while other ids proceed.
#[derive(Clone, Default)]
pub struct ConversationStore {
    conversations: Arc<Mutex<HashMap<String, Arc<Mutex<Conversation>>>>>,
}

impl ConversationStore {
    /// The entry for `id`, created empty on first use
    pub async fn entry(&self, id: &str) -> Arc<Mutex<Conversation>> {
        let mut conversations = self.conversations.lock().await;
        conversations
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::default())))
            .clone()
    }

    /// Remove the entry for `id` when it is still empty and no other turn holds
    /// it. Entries are only cloned under the map lock, so a count of two (the
    /// map and `entry`) means nobody is waiting on it.
    pub async fn discard_if_empty(&self, id: &str, entry: Arc<Mutex<Conversation>>) {
        let mut conversations = self.conversations.lock().await;
        let unused = conversations
            .get(id)
            .is_some_and(|stored| Arc::ptr_eq(stored, &entry))
            && Arc::strong_count(&entry) == 2
            && entry
                .try_lock()
                .map(|conversation| conversation.is_empty())
                .unwrap_or(false);

        if unused {
            conversations.remove(id);
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.conversations.lock().await.len()
    }

    /// The stored history for `id`, if it has any messages
    pub async fn get(&self, id: &str) -> Option<Conversation> {
        let entry = self.conversations.lock().await.get(id).cloned()?;
        let conversation = entry.lock().await.clone();
        (!conversation.is_empty()).then_some(conversation)
    }
}

/// Display title: the opening of the first user message
pub fn title(conversation: &Conversation) -> String {
    let first = conversation
        .messages()
        .iter()
        .find(|message| message.role == Role::User)
        .and_then(|message| message.text());

    match first {
        Some(text) if text.chars().count() > TITLE_LENGTH => {
            format!("{}..", text.chars().take(TITLE_LENGTH).collect::<String>())
        }
        Some(text) => text,
        None => DEFAULT_TITLE.to_string(),
    }
}
