//! Wire protocol types for Vitalis conversations, turn events, and common types.

mod evaluation;
mod message;
mod tool;

pub use evaluation::MemoryEvaluation;
pub use message::{Message, Role, ToolCallRequest};
pub use tool::ToolError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identifier for a conversation thread (client supplied or generated).
pub type ThreadId = String;
/// Identifier for a user; scopes the memory namespace.
pub type UserId = String;
/// Unique identifier for a turn.
pub type TurnId = Uuid;
/// Identifier for a tool call, as issued by the model.
pub type ToolCallId = String;

/// Wrapper for events emitted while a turn runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMsg {
    /// Unique id for the event.
    pub id: Uuid,
    /// Thread the event belongs to.
    pub thread_id: ThreadId,
    /// Timestamp when the event was created.
    pub created_at: DateTime<Utc>,
    /// Event payload content.
    pub payload: EventPayload,
}

impl EventMsg {
    /// Build an event for a thread stamped with the current time.
    pub fn new(thread_id: impl Into<ThreadId>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            thread_id: thread_id.into(),
            created_at: Utc::now(),
            payload,
        }
    }
}

/// All events emitted during a conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum EventPayload {
    /// Turn lifecycle started.
    TurnStarted {
        turn_id: TurnId,
        user_id: UserId,
    },
    /// Memories were retrieved for the prompt.
    MemoryRetrieved { turn_id: TurnId, count: usize },
    /// The memory evaluation step produced a verdict.
    MemoryEvaluated {
        turn_id: TurnId,
        evaluation: MemoryEvaluation,
    },
    /// Tool call execution started.
    ToolCallStarted {
        turn_id: TurnId,
        tool_call_id: ToolCallId,
        tool_name: String,
        arguments: Value,
    },
    /// Tool call execution completed.
    ToolCallFinished {
        turn_id: TurnId,
        tool_call_id: ToolCallId,
        result: Value,
        success: bool,
    },
    /// Turn lifecycle completed with the user-facing reply.
    TurnCompleted { turn_id: TurnId, message: String },
    /// Error event for the thread or turn.
    Error {
        turn_id: Option<TurnId>,
        message: String,
    },
}

impl EventPayload {
    /// Wire name of the payload variant.
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::TurnStarted { .. } => "turn_started",
            EventPayload::MemoryRetrieved { .. } => "memory_retrieved",
            EventPayload::MemoryEvaluated { .. } => "memory_evaluated",
            EventPayload::ToolCallStarted { .. } => "tool_call_started",
            EventPayload::ToolCallFinished { .. } => "tool_call_finished",
            EventPayload::TurnCompleted { .. } => "turn_completed",
            EventPayload::Error { .. } => "error",
        }
    }
}

/// Sink interface for orchestrator and tool events.
pub trait EventSink: Send + Sync {
    /// Emit an event to downstream listeners.
    fn emit(&self, event: EventMsg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn event_payload_uses_tagged_layout() {
        let turn_id = Uuid::new_v4();
        let event = EventMsg::new(
            "thread-1",
            EventPayload::MemoryEvaluated {
                turn_id,
                evaluation: MemoryEvaluation::Explicit,
            },
        );
        let encoded = serde_json::to_value(&event).expect("serialize");
        assert_eq!(encoded["thread_id"], json!("thread-1"));
        assert_eq!(encoded["payload"]["type"], json!("memory_evaluated"));
        assert_eq!(
            encoded["payload"]["payload"],
            json!({ "turn_id": turn_id, "evaluation": "EXPLICIT" })
        );
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let payload = EventPayload::TurnCompleted {
            turn_id: Uuid::new_v4(),
            message: "done".to_string(),
        };
        let encoded = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(encoded["type"], json!(payload.kind()));
    }

    #[test]
    fn tool_call_finished_survives_json() {
        let event = EventMsg::new(
            "thread-2",
            EventPayload::ToolCallFinished {
                turn_id: Uuid::new_v4(),
                tool_call_id: "call_1".to_string(),
                result: json!("Stored memory abc"),
                success: true,
            },
        );
        let encoded = serde_json::to_value(&event).expect("serialize");
        let decoded: EventMsg = serde_json::from_value(encoded.clone()).expect("deserialize");
        let decoded_value = serde_json::to_value(decoded).expect("serialize decoded");
        assert_eq!(decoded_value, encoded);
    }
}
