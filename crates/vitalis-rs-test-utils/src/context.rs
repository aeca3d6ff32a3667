use std::sync::Arc;
use vitalis_rs_memory::{MemoryStore, MemoryWritePolicy};
use vitalis_rs_tools::{ToolContext, TurnServices};

/// Tool context for `user-1` on `thread-1` over the given store.
pub fn base_tool_context(store: Arc<dyn MemoryStore>) -> ToolContext {
    ToolContext {
        user_id: "user-1".to_string(),
        thread_id: "thread-1".to_string(),
        turn_id: None,
        tool_call_id: None,
        tool_name: None,
        services: Arc::new(TurnServices {
            store,
            collection: "memories".to_string(),
            write_policy: MemoryWritePolicy::default(),
            event_sink: None,
        }),
    }
}
