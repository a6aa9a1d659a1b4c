//! Conversation store contract and the in-memory implementation.
//!
//! The gateway treats the store as a collaborator behind a narrow
//! interface: it reads conversations and recent history while assembling a
//! turn, and callers persist messages through the same interface after a
//! turn completes. Each call is one transactional unit; no transaction
//! spans a provider network call.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use llm::Role;
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

/// A conversation between one owner and one model.
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: Uuid,
    /// Identifier of the owning user.
    pub owner: CompactString,
    /// Display title.
    pub title: String,
    /// Composite model identifier, `"<provider>/<model-name>"`.
    pub model: CompactString,
    /// Optional system prompt prepended to every turn.
    pub system_prompt: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp.
    pub updated_at: DateTime<Utc>,
}

/// One persisted message of a conversation.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    /// Unique message identifier.
    pub id: Uuid,
    /// The conversation this message belongs to.
    pub conversation_id: Uuid,
    /// Message author role.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Free-form metadata (token usage, context sources).
    pub metadata: Option<serde_json::Value>,
}

/// Storage collaborator interface.
///
/// Failures are reported as `anyhow::Error`; the orchestrator maps them to
/// its own taxonomy and fails a turn before contacting the provider.
pub trait ConversationStore: Send + Sync {
    /// Fetch a conversation scoped to its owner.
    fn conversation(
        &self,
        id: Uuid,
        owner: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Conversation>>> + Send;

    /// Append one message to a conversation.
    fn append(
        &self,
        conversation_id: Uuid,
        role: Role,
        content: &str,
        metadata: Option<serde_json::Value>,
    ) -> impl Future<Output = anyhow::Result<StoredMessage>> + Send;

    /// The most recent messages of a conversation, newest first.
    fn recent_messages(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<StoredMessage>>> + Send;

    /// Bump the conversation's last-activity timestamp.
    fn touch(&self, conversation_id: Uuid) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// In-memory conversation store for tests and embedded use.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<BTreeMap<Uuid, Entry>>,
}

struct Entry {
    conversation: Conversation,
    messages: Vec<StoredMessage>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new conversation and return it.
    pub fn create(&self, owner: &str, model: &str, system_prompt: Option<&str>) -> Conversation {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            owner: owner.into(),
            title: "New conversation".to_owned(),
            model: model.into(),
            system_prompt: system_prompt.map(str::to_owned),
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().expect("store lock poisoned").insert(
            conversation.id,
            Entry {
                conversation: conversation.clone(),
                messages: Vec::new(),
            },
        );
        conversation
    }
}

impl ConversationStore for MemoryStore {
    async fn conversation(&self, id: Uuid, owner: &str) -> anyhow::Result<Option<Conversation>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .get(&id)
            .filter(|entry| entry.conversation.owner == owner)
            .map(|entry| entry.conversation.clone()))
    }

    async fn append(
        &self,
        conversation_id: Uuid,
        role: Role,
        content: &str,
        metadata: Option<serde_json::Value>,
    ) -> anyhow::Result<StoredMessage> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let entry = inner
            .get_mut(&conversation_id)
            .ok_or_else(|| anyhow::anyhow!("conversation '{conversation_id}' not found"))?;

        let message = StoredMessage {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.to_owned(),
            created_at: Utc::now(),
            metadata,
        };
        entry.messages.push(message.clone());
        entry.conversation.updated_at = message.created_at;
        Ok(message)
    }

    async fn recent_messages(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> anyhow::Result<Vec<StoredMessage>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let entry = inner
            .get(&conversation_id)
            .ok_or_else(|| anyhow::anyhow!("conversation '{conversation_id}' not found"))?;
        Ok(entry.messages.iter().rev().take(limit).cloned().collect())
    }

    async fn touch(&self, conversation_id: Uuid) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let entry = inner
            .get_mut(&conversation_id)
            .ok_or_else(|| anyhow::anyhow!("conversation '{conversation_id}' not found"))?;
        entry.conversation.updated_at = Utc::now();
        Ok(())
    }
}
