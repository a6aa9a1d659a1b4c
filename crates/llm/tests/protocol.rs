//! Wire-shape tests for the chat protocol types.

use moray_llm::{
    ChatMessage, ChatRequest, ChatResponse, ChatStreamChunk, FinishReason, Role, Usage,
};
use serde_json::json;

#[test]
fn message_omits_absent_name() {
    let message = ChatMessage::user("hi");
    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value, json!({"role": "user", "content": "hi"}));
}

#[test]
fn message_roundtrips_with_name() {
    let message = ChatMessage {
        role: Role::Assistant,
        content: "hello".into(),
        name: Some("bot".into()),
    };
    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(
        value,
        json!({"role": "assistant", "content": "hello", "name": "bot"})
    );
    let back: ChatMessage = serde_json::from_value(value).unwrap();
    assert_eq!(back, message);
}

#[test]
fn request_parses_with_defaults() {
    let request: ChatRequest = serde_json::from_value(json!({
        "messages": [{"role": "user", "content": "hi"}],
        "model": "ollama/llama3"
    }))
    .unwrap();
    assert!(!request.stream);
    assert!(request.parameters.is_empty());
    assert_eq!(request.provider().unwrap(), "ollama");
    assert_eq!(request.model_name().unwrap(), "llama3");
}

#[test]
fn response_wire_shape() {
    let response = ChatResponse {
        model: "ollama/llama3".into(),
        message: ChatMessage::assistant("hello"),
        usage: Usage::from_counts(Some(3), Some(2)),
    };
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(
        value,
        json!({
            "model": "ollama/llama3",
            "message": {"role": "assistant", "content": "hello"},
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        })
    );
}

#[test]
fn response_with_no_usage_serializes_empty_mapping() {
    let response = ChatResponse {
        model: "ollama/llama3".into(),
        message: ChatMessage::assistant("hello"),
        usage: Usage::default(),
    };
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["usage"], json!({}));
}

#[test]
fn content_chunk_carries_null_finish_reason() {
    let chunk = ChatStreamChunk::token("ollama/llama3", "hel");
    let value = serde_json::to_value(&chunk).unwrap();
    assert_eq!(
        value,
        json!({"model": "ollama/llama3", "token": "hel", "finish_reason": null})
    );
}

#[test]
fn terminal_chunk_wire_shape() {
    let chunk = ChatStreamChunk::terminal("ollama/llama3", FinishReason::Stop);
    let value = serde_json::to_value(&chunk).unwrap();
    assert_eq!(
        value,
        json!({"model": "ollama/llama3", "token": "", "finish_reason": "stop"})
    );
}

#[test]
fn internal_usage_never_reaches_the_wire() {
    let mut chunk = ChatStreamChunk::terminal("ollama/llama3", FinishReason::Stop);
    chunk.usage = Some(Usage::from_counts(Some(3), Some(2)));
    let value = serde_json::to_value(&chunk).unwrap();
    assert!(value.get("usage").is_none());
}

#[test]
fn finish_reasons_serialize_snake_case() {
    for (reason, expected) in [
        (FinishReason::Stop, "stop"),
        (FinishReason::Length, "length"),
        (FinishReason::Error, "error"),
    ] {
        assert_eq!(serde_json::to_value(reason).unwrap(), json!(expected));
    }
}
