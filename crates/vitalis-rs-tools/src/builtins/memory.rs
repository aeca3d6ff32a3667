//! Built-in tool that writes long-term user memories.

use crate::tool::parse_args;
use crate::{Tool, ToolContext};
use async_trait::async_trait;
use autoagents_core::tool::ToolInputT;
use autoagents_derive::ToolInput;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;
use vitalis_rs_memory::MemoryValue;
use vitalis_rs_protocol::ToolError;

/// Registered name of the memory write tool.
pub const UPSERT_MEMORY_TOOL: &str = "upsert_memory";

/// Tool that inserts or updates a memory in the caller's namespace.
#[derive(Debug, Default)]
pub struct UpsertMemoryTool;

#[async_trait]
impl Tool for UpsertMemoryTool {
    fn name(&self) -> &str {
        UPSERT_MEMORY_TOOL
    }

    fn description(&self) -> &str {
        "Save a fact about the user to long-term memory. Pass memory_id to update an \
         existing memory instead of creating a duplicate, for example when the user \
         corrects something stored earlier."
    }

    fn args_schema(&self) -> Value {
        serde_json::from_str(UpsertMemoryArgs::io_schema())
            .unwrap_or_else(|_| json!({ "type": "object" }))
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        let input: UpsertMemoryArgs = parse_args(args)?;
        if input.content.trim().is_empty() {
            return Err(ToolError::InvalidArguments(
                "content cannot be empty".to_string(),
            ));
        }

        let value = ctx
            .services
            .write_policy
            .apply(MemoryValue::new(input.content).with_context(input.context))
            .map_err(|err| ToolError::MemoryWrite(err.to_string()))?;
        if !value.has_content() {
            return Err(ToolError::InvalidArguments(
                "content is empty after applying the write policy".to_string(),
            ));
        }

        let key = match input.memory_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => Uuid::new_v4().to_string(),
        };
        let namespace = ctx.namespace();
        ctx.services
            .store
            .put(&namespace, &key, value)
            .await
            .map_err(|err| ToolError::MemoryWrite(err.to_string()))?;
        info!("memory upserted (namespace={}, key={})", namespace, key);

        Ok(Value::String(format!("Stored memory {key}")))
    }
}

/// Arguments for UpsertMemoryTool.
#[derive(Debug, Serialize, Deserialize, ToolInput)]
struct UpsertMemoryArgs {
    #[input(description = "The fact to remember, e.g. 'User's daily step goal is 10,000'.")]
    content: String,
    #[input(description = "Where the fact came up, e.g. 'Mentioned while setting fitness goals'.")]
    #[serde(default)]
    context: String,
    #[input(description = "Key of an existing memory to overwrite; omit to create a new one.")]
    #[serde(default)]
    memory_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{UPSERT_MEMORY_TOOL, UpsertMemoryTool};
    use crate::{Tool, ToolContext, TurnServices};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use vitalis_rs_memory::{InMemoryStore, MemoryStore, MemoryWritePolicy, Namespace};
    use vitalis_rs_protocol::ToolError;

    fn context(store: Arc<InMemoryStore>, policy: MemoryWritePolicy) -> ToolContext {
        ToolContext {
            user_id: "sam".to_string(),
            thread_id: "thread-1".to_string(),
            turn_id: None,
            tool_call_id: None,
            tool_name: Some(UPSERT_MEMORY_TOOL.to_string()),
            services: Arc::new(TurnServices {
                store,
                collection: "memories".to_string(),
                write_policy: policy,
                event_sink: None,
            }),
        }
    }

    fn ack_key(ack: &serde_json::Value) -> String {
        ack.as_str()
            .and_then(|text| text.strip_prefix("Stored memory "))
            .expect("ack")
            .to_string()
    }

    #[tokio::test]
    async fn upsert_stores_under_fresh_key_in_user_namespace() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = context(store.clone(), MemoryWritePolicy::default());
        let ack = UpsertMemoryTool
            .call(
                &ctx,
                json!({ "content": "Name is Sam; goal is 10k steps/day", "context": "intro" }),
            )
            .await
            .expect("call");

        let key = ack_key(&ack);
        let namespace = Namespace::new("memories", "sam");
        let item = store.get(&namespace, &key).await.expect("get").expect("item");
        assert_eq!(item.value.content, "Name is Sam; goal is 10k steps/day");
        assert_eq!(item.value.context, "intro");
    }

    #[tokio::test]
    async fn distinct_calls_get_distinct_keys() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = context(store.clone(), MemoryWritePolicy::default());
        let first = UpsertMemoryTool
            .call(&ctx, json!({ "content": "likes tea" }))
            .await
            .expect("call");
        let second = UpsertMemoryTool
            .call(&ctx, json!({ "content": "likes tea" }))
            .await
            .expect("call");
        assert!(ack_key(&first) != ack_key(&second));
        assert_eq!(store.len(&Namespace::new("memories", "sam")), 2);
    }

    #[tokio::test]
    async fn memory_id_overwrites_existing_entry() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = context(store.clone(), MemoryWritePolicy::default());
        let ack = UpsertMemoryTool
            .call(&ctx, json!({ "content": "sleeps 6h" }))
            .await
            .expect("call");
        let key = ack_key(&ack);
        let updated = UpsertMemoryTool
            .call(&ctx, json!({ "content": "sleeps 8h", "memory_id": key }))
            .await
            .expect("call");

        assert_eq!(ack_key(&updated), key);
        let namespace = Namespace::new("memories", "sam");
        assert_eq!(store.len(&namespace), 1);
        let item = store.get(&namespace, &key).await.expect("get").expect("item");
        assert_eq!(item.value.content, "sleeps 8h");
    }

    #[tokio::test]
    async fn empty_or_malformed_content_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = context(store.clone(), MemoryWritePolicy::default());
        let blank = UpsertMemoryTool
            .call(&ctx, json!({ "content": "   " }))
            .await
            .unwrap_err();
        assert!(matches!(blank, ToolError::InvalidArguments(_)));
        let missing = UpsertMemoryTool.call(&ctx, json!({ "context": "x" })).await.unwrap_err();
        assert!(matches!(missing, ToolError::InvalidArguments(_)));
        assert!(store.is_empty(&Namespace::new("memories", "sam")));
    }

    #[tokio::test]
    async fn write_policy_redacts_before_storing() {
        let store = Arc::new(InMemoryStore::new());
        let policy = MemoryWritePolicy {
            redact_patterns: vec![r"\b\d{3}-\d{4}\b".to_string()],
            ..MemoryWritePolicy::passthrough()
        };
        let ctx = context(store.clone(), policy);
        let ack = UpsertMemoryTool
            .call(&ctx, json!({ "content": "doctor's line is 555-1234" }))
            .await
            .expect("call");
        let item = store
            .get(&Namespace::new("memories", "sam"), &ack_key(&ack))
            .await
            .expect("get")
            .expect("item");
        assert_eq!(item.value.content, "doctor's line is [REDACTED]");
    }

    #[test]
    fn schema_names_the_content_field() {
        let schema = UpsertMemoryTool.args_schema();
        assert!(schema.to_string().contains("content"));
    }
}
