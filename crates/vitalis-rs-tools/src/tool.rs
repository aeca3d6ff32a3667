//! The `Tool` trait and the spec handed to the model.

use crate::context::ToolContext;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;
use vitalis_rs_protocol::ToolError;

/// Name, description and argument schema advertised for a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the `arguments` object the model must produce.
    pub args_schema: Value,
}

/// A named action the model may request during a memory-write turn.
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    /// Registry key; must match the name the model calls.
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn args_schema(&self) -> Value;

    /// Run the tool for the user and turn carried by `ctx`.
    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<Value, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            args_schema: self.args_schema(),
        }
    }
}

/// Decode model-produced arguments, reporting failures as invalid arguments.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::parse_args;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;
    use vitalis_rs_protocol::ToolError;

    #[derive(Debug, Deserialize)]
    struct Goal {
        content: String,
        #[serde(default)]
        context: String,
    }

    #[test]
    fn decodes_arguments_with_defaults() {
        let goal: Goal = parse_args(json!({ "content": "Walk 10000 steps" })).expect("args");
        assert_eq!(goal.content, "Walk 10000 steps");
        assert_eq!(goal.context, "");
    }

    #[test]
    fn wrong_shape_is_invalid_arguments() {
        let err = parse_args::<Goal>(json!({ "content": 42 })).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
