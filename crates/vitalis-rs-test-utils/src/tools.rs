use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use vitalis_rs_protocol::ToolError;
use vitalis_rs_tools::{Tool, ToolContext};

/// Tool that sleeps, then echoes its arguments back as a string.
#[derive(Debug, Clone)]
pub struct EchoTool {
    name: String,
    delay: Duration,
}

impl EchoTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "echo arguments"
    }

    fn args_schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn call(&self, _ctx: &ToolContext, args: Value) -> Result<Value, ToolError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Value::String(format!("echo {args}")))
    }
}

/// Tool whose calls block until `parties` calls are in flight at once.
#[derive(Debug, Clone)]
pub struct BarrierTool {
    name: String,
    barrier: Arc<Barrier>,
}

impl BarrierTool {
    pub fn new(name: impl Into<String>, parties: usize) -> Self {
        Self {
            name: name.into(),
            barrier: Arc::new(Barrier::new(parties)),
        }
    }
}

#[async_trait]
impl Tool for BarrierTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "waits for sibling calls"
    }

    fn args_schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn call(&self, _ctx: &ToolContext, _args: Value) -> Result<Value, ToolError> {
        self.barrier.wait().await;
        Ok(Value::String("released".to_string()))
    }
}

/// Tool that always fails with an execution error.
#[derive(Debug, Clone)]
pub struct FailingTool {
    name: String,
}

impl FailingTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "always fails"
    }

    fn args_schema(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn call(&self, _ctx: &ToolContext, _args: Value) -> Result<Value, ToolError> {
        Err(ToolError::Failed(format!("{} failed", self.name)))
    }
}
