//! Tool execution layer: concurrent fan-out of model-issued tool calls.

use crate::error::VitalisCoreError;
use futures_util::future::join_all;
use log::{debug, error};
use serde_json::Value;
use std::sync::Arc;
use vitalis_rs_protocol::{Message, ToolCallRequest, ToolError};
use vitalis_rs_tools::{Tool, ToolContext, ToolRegistry};

/// Dispatches tool calls through the registry.
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run every call concurrently and return one tool result per call, in call order.
    ///
    /// All calls are awaited before a failure is reported. Unknown tool names
    /// fail before anything is spawned.
    pub async fn execute(
        &self,
        ctx: &ToolContext,
        calls: &[ToolCallRequest],
    ) -> Result<Vec<Message>, VitalisCoreError> {
        let mut resolved: Vec<(ToolCallRequest, Arc<dyn Tool>)> = Vec::with_capacity(calls.len());
        for call in calls {
            let tool = self
                .registry
                .resolve(&call.name)
                .map_err(|err| VitalisCoreError::ToolExecution(err.to_string()))?;
            resolved.push((call.clone(), tool));
        }

        debug!(
            "dispatching tool calls (user_id={}, count={})",
            ctx.user_id,
            resolved.len()
        );
        let handles = resolved.into_iter().map(|(call, tool)| {
            let call_ctx = ctx.for_call(call.id.clone(), &call.name);
            tokio::spawn(async move {
                let outcome = call_ctx.execute_tool(tool.as_ref(), call.arguments).await;
                (call.id, outcome)
            })
        });
        let joined = join_all(handles).await;

        let mut results = Vec::with_capacity(joined.len());
        let mut first_error: Option<VitalisCoreError> = None;
        for outcome in joined {
            match outcome {
                Ok((call_id, Ok(value))) => {
                    results.push(Message::tool_result(call_id, ack_text(value)));
                }
                Ok((call_id, Err(err))) => {
                    error!("tool call failed (tool_call_id={}): {}", call_id, err);
                    if first_error.is_none() {
                        first_error = Some(tool_failure(&call_id, err));
                    }
                }
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(VitalisCoreError::ToolExecution(format!(
                            "tool task aborted: {err}"
                        )));
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }
}

fn tool_failure(call_id: &str, err: ToolError) -> VitalisCoreError {
    VitalisCoreError::ToolExecution(format!("tool call {call_id} failed: {err}"))
}

fn ack_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
