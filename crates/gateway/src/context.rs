//! Context assembly: the ordered message list for one turn.

use crate::StoredMessage;
use llm::ChatMessage;

/// How many prior messages a turn carries at most.
pub const HISTORY_WINDOW: usize = 10;

/// Build the message list for a turn, in fixed order:
///
/// 1. the conversation's system prompt, if any;
/// 2. injected retrieval context as a second system message, delimited so
///    the model can tell instruction from retrieved material;
/// 3. up to [`HISTORY_WINDOW`] prior messages; `history` arrives newest
///    first from the store and is reversed into chronological order here;
/// 4. the new user message, always last.
///
/// Message content is never truncated; token budgets are the backend's
/// concern.
pub fn assemble(
    system_prompt: Option<&str>,
    injected_context: Option<&str>,
    history: &[StoredMessage],
    user_message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len().min(HISTORY_WINDOW) + 3);

    if let Some(prompt) = system_prompt {
        messages.push(ChatMessage::system(prompt));
    }

    if let Some(context) = injected_context {
        messages.push(ChatMessage::system(format!("Additional context:\n{context}")));
    }

    for stored in history.iter().take(HISTORY_WINDOW).rev() {
        messages.push(ChatMessage {
            role: stored.role,
            content: stored.content.clone(),
            name: None,
        });
    }

    messages.push(ChatMessage::user(user_message));
    messages
}

/// Combine retrieval results into one context block, or `None` when there
/// is nothing to inject.
pub fn compose_context(web_results: &[String], doc_results: &[String]) -> Option<String> {
    let mut content = String::new();
    if !web_results.is_empty() {
        content.push_str("Web search results:\n");
        content.push_str(&web_results.join("\n"));
        content.push_str("\n\n");
    }
    if !doc_results.is_empty() {
        content.push_str("Document references:\n");
        content.push_str(&doc_results.join("\n"));
        content.push_str("\n\n");
    }
    (!content.is_empty()).then_some(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use llm::Role;
    use uuid::Uuid;

    fn stored(role: Role, content: &str) -> StoredMessage {
        StoredMessage {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            role,
            content: content.to_owned(),
            created_at: Utc::now(),
            metadata: None,
        }
    }

    /// Newest-first history of `n` alternating user/assistant messages,
    /// contents `m<n>` down to `m1`.
    fn history(n: usize) -> Vec<StoredMessage> {
        (1..=n)
            .rev()
            .map(|i| {
                let role = if i % 2 == 1 { Role::User } else { Role::Assistant };
                stored(role, &format!("m{i}"))
            })
            .collect()
    }

    #[test]
    fn full_turn_is_thirteen_messages() {
        let messages = assemble(
            Some("be helpful"),
            Some("Web search results:\nsnippet\n\n"),
            &history(15),
            "what next?",
        );

        assert_eq!(messages.len(), 13);
        assert_eq!(messages[0], ChatMessage::system("be helpful"));
        assert!(messages[1].content.starts_with("Additional context:\n"));
        // The ten most recent prior messages, oldest first.
        assert_eq!(messages[2].content, "m6");
        assert_eq!(messages[11].content, "m15");
        assert_eq!(messages[12], ChatMessage::user("what next?"));
    }

    #[test]
    fn bare_turn_is_history_plus_user_message() {
        let messages = assemble(None, None, &history(2), "hi");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "m1");
        assert_eq!(messages[1].content, "m2");
        assert_eq!(messages[2], ChatMessage::user("hi"));
    }

    #[test]
    fn empty_history_yields_single_user_message() {
        let messages = assemble(None, None, &[], "hi");
        assert_eq!(messages, vec![ChatMessage::user("hi")]);
    }

    #[test]
    fn history_roles_survive_assembly() {
        let messages = assemble(None, None, &history(2), "hi");
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn compose_joins_web_and_docs() {
        let web = vec!["w1".to_owned(), "w2".to_owned()];
        let docs = vec!["d1".to_owned()];
        let content = compose_context(&web, &docs).unwrap();
        assert_eq!(content, "Web search results:\nw1\nw2\n\nDocument references:\nd1\n\n");
    }

    #[test]
    fn compose_empty_is_none() {
        assert!(compose_context(&[], &[]).is_none());
    }
}
