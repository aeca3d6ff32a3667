//! Conversation messages exchanged between users, the assistant, and tools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ToolCallId;

/// Speaker role for a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-generated message.
    System,
    /// User-authored message.
    User,
    /// Assistant-authored message.
    Assistant,
    /// Result of a tool call.
    Tool,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallRequest {
    /// Call id issued by the model; tool results answer it.
    pub id: ToolCallId,
    /// Tool name to dispatch.
    pub name: String,
    /// Arguments as decoded JSON.
    pub arguments: Value,
}

/// Message stored in a conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role that produced the message.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Tool calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Call id this tool message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<ToolCallId>,
    /// Timestamp for the message.
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            created_at: Utc::now(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a plain assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create an assistant message that requests tool calls.
    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::with_role(Role::Assistant, content)
        }
    }

    /// Create a tool result answering `call_id`.
    pub fn tool_result(call_id: impl Into<ToolCallId>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::with_role(Role::Tool, content)
        }
    }

    /// Whether this message requests at least one tool call.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Whether this message is part of a tool round-trip (request or result).
    pub fn is_tool_traffic(&self) -> bool {
        self.has_tool_calls() || self.role == Role::Tool || self.tool_call_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn tool_traffic_covers_requests_and_results() {
        let request = Message::assistant_tool_calls(
            "",
            vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "upsert_memory".to_string(),
                arguments: json!({ "content": "likes tea" }),
            }],
        );
        let result = Message::tool_result("call_1", "Stored memory 1");
        assert!(request.is_tool_traffic());
        assert!(result.is_tool_traffic());
        assert!(!Message::user("hello").is_tool_traffic());
        assert!(!Message::assistant("hi").is_tool_traffic());
    }

    #[test]
    fn plain_messages_omit_tool_fields_in_json() {
        let encoded = serde_json::to_value(Message::user("hello")).expect("serialize");
        assert_eq!(encoded["role"], json!("user"));
        assert!(encoded.get("tool_calls").is_none());
        assert!(encoded.get("tool_call_id").is_none());
    }
}
