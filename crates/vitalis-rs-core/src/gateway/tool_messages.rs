//! Utilities for normalizing tool-use and tool-result messages.

use autoagents_llm::chat::{ChatMessage, ChatRole, MessageType};
use autoagents_llm::{FunctionCall, ToolCall};
use std::collections::{HashMap, VecDeque};

pub(crate) const TOOL_RESULT_PLACEHOLDER: &str = "error: tool result missing";

/// Regroup tool results directly behind the tool use that requested them.
///
/// Every call of a `ToolUse` gets exactly one result, in call order. Results
/// sharing a call id are handed out in the order they were recorded. Missing
/// results are replaced by a placeholder and orphaned results are dropped.
pub(crate) fn ensure_tool_results(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    if messages.iter().all(|message| {
        !matches!(
            message.message_type,
            MessageType::ToolUse(_) | MessageType::ToolResult(_)
        )
    }) {
        return messages;
    }

    let mut result_map = collect_tool_results(&messages);
    let mut output = Vec::with_capacity(messages.len());

    for message in messages {
        match &message.message_type {
            MessageType::ToolUse(calls) => {
                let resolved: Vec<ToolCall> = calls
                    .iter()
                    .map(|call| {
                        take_result(&mut result_map, &call.id)
                            .unwrap_or_else(|| placeholder_tool_result(call))
                    })
                    .collect();
                output.push(message);
                if !resolved.is_empty() {
                    output.push(ChatMessage {
                        role: ChatRole::Tool,
                        message_type: MessageType::ToolResult(resolved),
                        content: String::new(),
                    });
                }
            }
            MessageType::ToolResult(_) => {}
            _ => output.push(message),
        }
    }

    output
}

pub(crate) fn placeholder_tool_result(call: &ToolCall) -> ToolCall {
    ToolCall {
        id: call.id.clone(),
        call_type: call.call_type.clone(),
        function: FunctionCall {
            name: call.function.name.clone(),
            arguments: TOOL_RESULT_PLACEHOLDER.to_string(),
        },
    }
}

fn collect_tool_results(messages: &[ChatMessage]) -> HashMap<String, VecDeque<ToolCall>> {
    let mut results: HashMap<String, VecDeque<ToolCall>> = HashMap::new();
    for message in messages {
        if let MessageType::ToolResult(calls) = &message.message_type {
            for call in calls {
                results
                    .entry(call.id.clone())
                    .or_default()
                    .push_back(call.clone());
            }
        }
    }
    results
}

fn take_result(results: &mut HashMap<String, VecDeque<ToolCall>>, id: &str) -> Option<ToolCall> {
    results.get_mut(id).and_then(VecDeque::pop_front)
}
