//! Tool execution context and event helpers.

use crate::Tool;
use log::{debug, warn};
use serde_json::{Value, json};
use std::sync::Arc;
use vitalis_rs_memory::{MemoryStore, MemoryWritePolicy, Namespace};
use vitalis_rs_protocol::{
    EventMsg, EventPayload, EventSink, ThreadId, ToolCallId, ToolError, TurnId, UserId,
};

/// Shared service dependencies for a turn (constructed once, shared via Arc).
pub struct TurnServices {
    /// Long-term memory store.
    pub store: Arc<dyn MemoryStore>,
    /// Collection component of the user namespace.
    pub collection: String,
    /// Policy applied before memory writes.
    pub write_policy: MemoryWritePolicy,
    /// Optional event sink for tool events.
    pub event_sink: Option<Arc<dyn EventSink>>,
}

/// Shared context passed to tools during execution.
///
/// Per-invocation identity fields are stored directly.
/// Shared service references live behind an `Arc<TurnServices>`.
#[derive(Clone)]
pub struct ToolContext {
    /// User the tool acts on behalf of.
    pub user_id: UserId,
    /// Thread the tool call belongs to.
    pub thread_id: ThreadId,
    /// Optional turn id for the tool call.
    pub turn_id: Option<TurnId>,
    /// Model-issued call id for this invocation.
    pub tool_call_id: Option<ToolCallId>,
    /// Tool name for the current invocation.
    pub tool_name: Option<String>,
    /// Shared turn-scoped services.
    pub services: Arc<TurnServices>,
}

impl ToolContext {
    /// Namespace of the user this context is bound to.
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.services.collection.clone(), self.user_id.clone())
    }

    /// Derive a context for one tool call.
    pub fn for_call(&self, tool_call_id: impl Into<ToolCallId>, tool_name: &str) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            tool_name: Some(tool_name.to_string()),
            ..self.clone()
        }
    }

    /// Execute a tool, emitting started and finished events around the call.
    pub async fn execute_tool(&self, tool: &dyn Tool, args: Value) -> Result<Value, ToolError> {
        debug!(
            "executing tool (name={}, user_id={}, tool_call_id={:?})",
            tool.name(),
            self.user_id,
            self.tool_call_id
        );
        self.emit_tool_started(tool.name(), &args);
        match tool.call(self, args).await {
            Ok(result) => {
                self.emit_tool_finished(result.clone(), true);
                Ok(result)
            }
            Err(err) => {
                warn!(
                    "tool failed (name={}, user_id={}): {}",
                    tool.name(),
                    self.user_id,
                    err
                );
                self.emit_tool_finished(json!({ "error": err.to_string() }), false);
                Err(err)
            }
        }
    }

    /// Emit a tool-call started event.
    pub fn emit_tool_started(&self, name: &str, args: &Value) {
        let (Some(turn_id), Some(tool_call_id)) = (self.turn_id, self.tool_call_id.clone()) else {
            return;
        };
        let Some(sink) = self.services.event_sink.as_ref() else {
            return;
        };
        sink.emit(EventMsg::new(
            self.thread_id.clone(),
            EventPayload::ToolCallStarted {
                turn_id,
                tool_call_id,
                tool_name: name.to_string(),
                arguments: args.clone(),
            },
        ));
    }

    /// Emit a tool-call finished event.
    pub fn emit_tool_finished(&self, result: Value, success: bool) {
        let (Some(turn_id), Some(tool_call_id)) = (self.turn_id, self.tool_call_id.clone()) else {
            return;
        };
        let Some(sink) = self.services.event_sink.as_ref() else {
            return;
        };
        sink.emit(EventMsg::new(
            self.thread_id.clone(),
            EventPayload::ToolCallFinished {
                turn_id,
                tool_call_id,
                result,
                success,
            },
        ));
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("user_id", &self.user_id)
            .field("thread_id", &self.thread_id)
            .field("turn_id", &self.turn_id)
            .field("tool_call_id", &self.tool_call_id)
            .field("tool_name", &self.tool_name)
            .finish()
    }
}
