//! Tests for the in-memory conversation store.

use llm::Role;
use moray_gateway::{ConversationStore, MemoryStore};
use uuid::Uuid;

#[tokio::test]
async fn create_and_fetch_scoped_to_owner() {
    let store = MemoryStore::new();
    let conversation = store.create("ada", "ollama/llama3", Some("be helpful"));

    let fetched = store
        .conversation(conversation.id, "ada")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.model, "ollama/llama3");
    assert_eq!(fetched.system_prompt.as_deref(), Some("be helpful"));

    // Another owner cannot see it.
    assert!(store.conversation(conversation.id, "eve").await.unwrap().is_none());
    // Nor does a random id resolve.
    assert!(store.conversation(Uuid::new_v4(), "ada").await.unwrap().is_none());
}

#[tokio::test]
async fn recent_messages_are_newest_first_and_bounded() {
    let store = MemoryStore::new();
    let conversation = store.create("ada", "ollama/llama3", None);

    for i in 1..=5 {
        store
            .append(conversation.id, Role::User, &format!("m{i}"), None)
            .await
            .unwrap();
    }

    let recent = store.recent_messages(conversation.id, 3).await.unwrap();
    let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["m5", "m4", "m3"]);
}

#[tokio::test]
async fn append_updates_conversation_activity() {
    let store = MemoryStore::new();
    let conversation = store.create("ada", "ollama/llama3", None);

    let message = store
        .append(conversation.id, Role::Assistant, "hello", None)
        .await
        .unwrap();
    assert_eq!(message.role, Role::Assistant);

    let fetched = store
        .conversation(conversation.id, "ada")
        .await
        .unwrap()
        .unwrap();
    assert!(fetched.updated_at >= conversation.updated_at);
}

#[tokio::test]
async fn touch_bumps_updated_at() {
    let store = MemoryStore::new();
    let conversation = store.create("ada", "ollama/llama3", None);
    store.touch(conversation.id).await.unwrap();

    let fetched = store
        .conversation(conversation.id, "ada")
        .await
        .unwrap()
        .unwrap();
    assert!(fetched.updated_at >= conversation.updated_at);
}

#[tokio::test]
async fn operations_on_missing_conversations_fail() {
    let store = MemoryStore::new();
    let ghost = Uuid::new_v4();
    assert!(store.append(ghost, Role::User, "hi", None).await.is_err());
    assert!(store.recent_messages(ghost, 10).await.is_err());
    assert!(store.touch(ghost).await.is_err());
}
