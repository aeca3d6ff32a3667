//! Memory evaluation: a structured model call that gates the tool path.

use crate::error::VitalisCoreError;
use crate::gateway::ModelGateway;
use autoagents_llm::chat::StructuredOutputFormat;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::json;
use vitalis_rs_protocol::{MemoryEvaluation, Message};

const EVALUATION_SCHEMA_NAME: &str = "MemoryEvaluation";

#[derive(Debug, Deserialize)]
struct EvaluationOutput {
    #[serde(default)]
    evaluation: Option<String>,
}

/// Classifies whether the latest exchange should be written to memory.
#[derive(Clone)]
pub struct MemoryEvaluator {
    gateway: ModelGateway,
    instruction: String,
    window: usize,
}

impl MemoryEvaluator {
    pub fn new(gateway: ModelGateway, instruction: impl Into<String>, window: usize) -> Self {
        Self {
            gateway,
            instruction: instruction.into(),
            window,
        }
    }

    /// Evaluate the recent conversation, resolving any failure to `SKIP`.
    pub async fn evaluate(&self, messages: &[Message]) -> MemoryEvaluation {
        match self.try_evaluate(messages).await {
            Ok(evaluation) => evaluation,
            Err(err) => {
                warn!("memory evaluation failed, falling back to SKIP: {}", err);
                MemoryEvaluation::Skip
            }
        }
    }

    /// Evaluate the recent conversation, surfacing failures.
    pub async fn try_evaluate(
        &self,
        messages: &[Message],
    ) -> Result<MemoryEvaluation, VitalisCoreError> {
        let recent = evaluation_window(messages, self.window);
        debug!(
            "evaluating memory need (window={}, considered={})",
            self.window,
            recent.len()
        );
        let output: EvaluationOutput = self
            .gateway
            .complete_structured(&self.instruction, &recent, evaluation_format())
            .await?;
        match output.evaluation {
            None => Ok(MemoryEvaluation::Skip),
            Some(raw) => MemoryEvaluation::parse(&raw).ok_or_else(|| {
                VitalisCoreError::Evaluation(format!("unknown evaluation value: {raw}"))
            }),
        }
    }
}

/// The last `window` messages with tool requests and tool results removed.
pub fn evaluation_window(messages: &[Message], window: usize) -> Vec<Message> {
    let start = messages.len().saturating_sub(window);
    messages[start..]
        .iter()
        .filter(|message| !message.is_tool_traffic())
        .cloned()
        .collect()
}

/// Output schema forcing the three-way verdict.
pub fn evaluation_format() -> StructuredOutputFormat {
    StructuredOutputFormat {
        name: EVALUATION_SCHEMA_NAME.to_string(),
        description: Some(
            "The result of memory evaluation: STORE, SKIP, or EXPLICIT".to_string(),
        ),
        schema: Some(json!({
            "type": "object",
            "properties": {
                "evaluation": {
                    "type": "string",
                    "enum": ["STORE", "SKIP", "EXPLICIT"],
                    "default": "SKIP"
                }
            },
            "required": ["evaluation"],
            "additionalProperties": false
        })),
        strict: Some(true),
    }
}
