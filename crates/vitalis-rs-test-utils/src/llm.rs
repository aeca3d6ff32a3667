use async_trait::async_trait;
use autoagents_llm::chat::{
    ChatMessage, ChatProvider, ChatResponse, StructuredOutputFormat, Tool,
};
use autoagents_llm::completion::{CompletionProvider, CompletionRequest, CompletionResponse};
use autoagents_llm::embedding::EmbeddingProvider;
use autoagents_llm::error::LLMError;
use autoagents_llm::models::ModelsProvider;
use autoagents_llm::{FunctionCall, LLMProvider, ToolCall};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use vitalis_rs_protocol::MemoryEvaluation;

/// Build a model-issued tool call with JSON arguments.
pub fn tool_call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        call_type: "function".to_string(),
        function: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

#[derive(Debug, Clone)]
pub struct FixedChatResponse {
    text: String,
    tool_calls: Option<Vec<ToolCall>>,
}

impl FixedChatResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: None,
        }
    }

    pub fn with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Some(tool_calls),
        }
    }
}

impl std::fmt::Display for FixedChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl ChatResponse for FixedChatResponse {
    fn text(&self) -> Option<String> {
        Some(self.text.clone())
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        self.tool_calls.clone()
    }
}

/// One provider invocation observed by [`ScriptedLLM`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<String>,
    pub structured: bool,
}

impl RecordedCall {
    /// Content of the leading system message, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|message| message.role == autoagents_llm::chat::ChatRole::System)
            .map(|message| message.content.as_str())
    }
}

/// Provider that answers structured calls with an evaluation verdict and
/// free-form calls from a queue of scripted replies.
#[derive(Debug, Clone)]
pub struct ScriptedLLM {
    evaluation: Arc<Mutex<Result<String, String>>>,
    replies: Arc<Mutex<VecDeque<Result<FixedChatResponse, String>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Default for ScriptedLLM {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedLLM {
    pub fn new() -> Self {
        Self {
            evaluation: Arc::new(Mutex::new(Ok(json!({ "evaluation": "SKIP" }).to_string()))),
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer evaluation calls with the given verdict.
    pub fn evaluate_as(self, evaluation: MemoryEvaluation) -> Self {
        *self.evaluation.lock() = Ok(json!({ "evaluation": evaluation.as_str() }).to_string());
        self
    }

    /// Answer evaluation calls with raw text.
    pub fn evaluation_text(self, text: impl Into<String>) -> Self {
        *self.evaluation.lock() = Ok(text.into());
        self
    }

    /// Make evaluation calls fail with a provider error.
    pub fn failing_evaluation(self, message: impl Into<String>) -> Self {
        *self.evaluation.lock() = Err(message.into());
        self
    }

    /// Queue a plain text reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies
            .lock()
            .push_back(Ok(FixedChatResponse::new(text)));
        self
    }

    /// Queue a reply that requests tool calls.
    pub fn reply_with_tool_calls(self, text: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        self.replies
            .lock()
            .push_back(Ok(FixedChatResponse::with_tool_calls(text, calls)));
        self
    }

    /// Queue a provider failure.
    pub fn fail_next(self, message: impl Into<String>) -> Self {
        self.replies.lock().push_back(Err(message.into()));
        self
    }

    /// Every call seen so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Calls that were not structured evaluation calls.
    pub fn generation_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| !call.structured)
            .collect()
    }

    /// Number of scripted replies not yet consumed.
    pub fn pending_replies(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedLLM {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
        json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        let structured = json_schema.is_some();
        self.calls.lock().push(RecordedCall {
            messages: messages.to_vec(),
            tools: tools
                .unwrap_or(&[])
                .iter()
                .map(|tool| tool.function.name.clone())
                .collect(),
            structured,
        });

        if structured {
            return match self.evaluation.lock().clone() {
                Ok(text) => Ok(Box::new(FixedChatResponse::new(text))),
                Err(message) => Err(LLMError::ProviderError(message)),
            };
        }
        match self.replies.lock().pop_front() {
            Some(Ok(reply)) => Ok(Box::new(reply)),
            Some(Err(message)) => Err(LLMError::ProviderError(message)),
            None => Err(LLMError::ProviderError(
                "no scripted reply left".to_string(),
            )),
        }
    }
}

#[async_trait]
impl CompletionProvider for ScriptedLLM {
    async fn complete(
        &self,
        _req: &CompletionRequest,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<CompletionResponse, LLMError> {
        Err(LLMError::ProviderError("scripted".to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedLLM {
    async fn embed(&self, _input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        Err(LLMError::ProviderError("scripted".to_string()))
    }
}

#[async_trait]
impl ModelsProvider for ScriptedLLM {}

impl LLMProvider for ScriptedLLM {}

#[derive(Debug, Clone)]
pub struct FailingLLM {
    message: String,
}

impl FailingLLM {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for FailingLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Err(LLMError::ProviderError(self.message.clone()))
    }
}

#[async_trait]
impl CompletionProvider for FailingLLM {
    async fn complete(
        &self,
        _req: &CompletionRequest,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<CompletionResponse, LLMError> {
        Err(LLMError::ProviderError(self.message.clone()))
    }
}

#[async_trait]
impl EmbeddingProvider for FailingLLM {
    async fn embed(&self, _input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        Err(LLMError::ProviderError(self.message.clone()))
    }
}

#[async_trait]
impl ModelsProvider for FailingLLM {}

impl LLMProvider for FailingLLM {}
