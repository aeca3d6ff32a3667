//! Thread and user-management tests for the assistant facade.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use vitalis_rs_config::VitalisConfig;
use vitalis_rs_core::{Assistant, ChatRequest, ModelGateway, VitalisCoreError};
use vitalis_rs_memory::{InMemoryStore, MemoryStore, Namespace};
use vitalis_rs_protocol::{MemoryEvaluation, Role};
use vitalis_rs_test_utils::{ScriptedLLM, tool_call};

fn assistant(llm: &ScriptedLLM, store: Arc<InMemoryStore>) -> Assistant {
    Assistant::builder(
        VitalisConfig::default(),
        ModelGateway::new(Arc::new(llm.clone())),
    )
    .store(store)
    .build()
    .expect("assistant")
}

#[tokio::test]
async fn missing_thread_id_starts_a_new_thread() {
    let llm = ScriptedLLM::new().reply("one").reply("two");
    let assistant = assistant(&llm, Arc::new(InMemoryStore::new()));

    let first = assistant
        .chat(ChatRequest::new("u", "Hi"))
        .await
        .expect("chat");
    let second = assistant
        .chat(ChatRequest::new("u", "Hi again"))
        .await
        .expect("chat");

    assert!(uuid::Uuid::parse_str(&first.thread_id).is_ok());
    assert!(first.thread_id != second.thread_id);
    for reply in [&first, &second] {
        let thread = assistant.threads().get(&reply.thread_id).expect("thread");
        assert_eq!(thread.user_id, "u");
        assert_eq!(thread.messages.len(), 2);
    }
}

#[tokio::test]
async fn follow_up_turn_sees_the_full_thread_history() {
    let llm = ScriptedLLM::new()
        .evaluate_as(MemoryEvaluation::Store)
        .reply_with_tool_calls(
            "",
            vec![tool_call("c1", "upsert_memory", json!({ "content": "Goal: 10000 steps" }))],
        )
        .reply("Great goal!")
        .reply("You're on track.");
    let assistant = assistant(&llm, Arc::new(InMemoryStore::new()));

    let first = assistant
        .chat(ChatRequest::new("u", "My goal is 10000 steps.").in_thread("t1"))
        .await
        .expect("chat");
    assert_eq!(first.new_messages.len(), 3);

    let thread = assistant.threads().get("t1").expect("thread");
    let roles: Vec<_> = thread.messages.iter().map(|message| message.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );

    let second = assistant
        .chat(ChatRequest::new("u", "How am I doing?").in_thread("t1"))
        .await
        .expect("chat");
    assert_eq!(second.thread_id, "t1");

    // evaluation verdict is still STORE, but the scripted reply carries no tool calls
    let last_call = llm.generation_calls().pop().expect("generation");
    assert_eq!(last_call.messages.len(), 1 + 4 + 1);
    assert_eq!(assistant.threads().get("t1").expect("thread").messages.len(), 6);
}

#[tokio::test]
async fn thread_of_another_user_is_unknown() {
    let llm = ScriptedLLM::new().reply("hello");
    let assistant = assistant(&llm, Arc::new(InMemoryStore::new()));
    assistant
        .chat(ChatRequest::new("alice", "Hi").in_thread("shared"))
        .await
        .expect("chat");

    let err = assistant
        .chat(ChatRequest::new("bob", "Hi").in_thread("shared"))
        .await
        .expect_err("foreign thread");
    assert!(matches!(err, VitalisCoreError::UnknownThread(_)));
}

#[tokio::test]
async fn blank_input_is_rejected() {
    let llm = ScriptedLLM::new();
    let assistant = assistant(&llm, Arc::new(InMemoryStore::new()));

    let no_user = assistant.chat(ChatRequest::new(" ", "Hi")).await;
    assert!(matches!(no_user, Err(VitalisCoreError::InvalidRequest(_))));
    let no_message = assistant.chat(ChatRequest::new("u", "")).await;
    assert!(matches!(no_message, Err(VitalisCoreError::InvalidRequest(_))));
    assert!(llm.calls().is_empty());
}

#[tokio::test]
async fn initialize_user_seeds_five_memories() {
    let llm = ScriptedLLM::new();
    let store = Arc::new(InMemoryStore::new());
    let assistant = assistant(&llm, store.clone());

    let profile = assistant.initialize_user("fresh").await.expect("initialize");
    let memories = assistant
        .list_memories("fresh", None)
        .await
        .expect("list");

    assert_eq!(memories.len(), 5);
    assert_eq!(store.len(&Namespace::new("memories", "fresh")), 5);
    let steps = profile.daily_stats.steps.to_string();
    assert!(
        memories
            .iter()
            .any(|item| item.value.content.contains(&steps))
    );
    let limited = assistant
        .list_memories("fresh", Some(2))
        .await
        .expect("list");
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn forget_user_removes_memories_and_threads() {
    let llm = ScriptedLLM::new().reply("hi");
    let store = Arc::new(InMemoryStore::new());
    let assistant = assistant(&llm, store.clone());
    assistant.initialize_user("gone").await.expect("initialize");
    assistant.initialize_user("kept").await.expect("initialize");
    assistant
        .chat(ChatRequest::new("gone", "Hello").in_thread("t-gone"))
        .await
        .expect("chat");

    let removed = assistant.forget_user("gone").await.expect("forget");

    assert_eq!(removed, 5);
    assert!(
        store
            .search(&Namespace::new("memories", "gone"), "", 100)
            .await
            .expect("search")
            .is_empty()
    );
    assert_eq!(store.len(&Namespace::new("memories", "kept")), 5);
    assert!(assistant.threads().get("t-gone").is_none());
}
