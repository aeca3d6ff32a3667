//! Model gateway: provider resolution and the three invocation modes used by turns.

mod tool_messages;

use crate::error::VitalisCoreError;
use autoagents_llm::LLMProvider;
use autoagents_llm::builder::LLMBuilder;
use autoagents_llm::chat::{
    ChatMessage, ChatResponse, ChatRole, FunctionTool, MessageType, StructuredOutputFormat, Tool,
};
use autoagents_llm::{FunctionCall, ToolCall};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tool_messages::ensure_tool_results;
use uuid::Uuid;
use vitalis_rs_config::ModelConfig;
use vitalis_rs_protocol::{Message, Role, ToolCallRequest};
use vitalis_rs_tools::ToolSpec;

pub(crate) use tool_messages::TOOL_RESULT_PLACEHOLDER;

#[cfg(feature = "anthropic")]
use autoagents_llm::backends::anthropic::Anthropic;
#[cfg(feature = "openai")]
use autoagents_llm::backends::openai::OpenAI;

/// Default environment variable holding the Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
/// Default environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Parsed `"provider/model"` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelId {
    pub provider: String,
    pub model: String,
}

impl ModelId {
    /// Split an identifier on its first `/`.
    pub fn parse(value: &str) -> Result<Self, VitalisCoreError> {
        let Some((provider, model)) = value.trim().split_once('/') else {
            return Err(VitalisCoreError::Configuration(format!(
                "model id must be provider/model, got `{value}`"
            )));
        };
        let provider = provider.trim();
        let model = model.trim();
        if provider.is_empty() || model.is_empty() {
            return Err(VitalisCoreError::Configuration(format!(
                "model id must be provider/model, got `{value}`"
            )));
        }
        Ok(Self {
            provider: provider.to_lowercase(),
            model: model.to_string(),
        })
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Build a provider for a model id, reading the API key from the environment.
pub fn resolve_provider(
    model: &ModelId,
    api_key_env: Option<&str>,
) -> Result<Arc<dyn LLMProvider>, VitalisCoreError> {
    debug!(
        "resolving model provider (provider={}, model={})",
        model.provider, model.model
    );
    match model.provider.as_str() {
        #[cfg(feature = "anthropic")]
        "anthropic" => {
            let api_key = read_api_key(api_key_env.unwrap_or(ANTHROPIC_API_KEY_ENV))?;
            let llm: Arc<dyn LLMProvider> = LLMBuilder::<Anthropic>::new()
                .api_key(api_key)
                .model(model.model.clone())
                .build()
                .map_err(|err| {
                    VitalisCoreError::Configuration(format!(
                        "failed to build anthropic provider: {err}"
                    ))
                })?;
            Ok(llm)
        }
        #[cfg(feature = "openai")]
        "openai" => {
            let api_key = read_api_key(api_key_env.unwrap_or(OPENAI_API_KEY_ENV))?;
            let llm: Arc<dyn LLMProvider> = LLMBuilder::<OpenAI>::new()
                .api_key(api_key)
                .model(model.model.clone())
                .build()
                .map_err(|err| {
                    VitalisCoreError::Configuration(format!(
                        "failed to build openai provider: {err}"
                    ))
                })?;
            Ok(llm)
        }
        other => Err(VitalisCoreError::Configuration(format!(
            "unsupported model provider: {other}"
        ))),
    }
}

fn read_api_key(var: &str) -> Result<String, VitalisCoreError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(VitalisCoreError::Configuration(format!(
            "{var} is not set"
        ))),
    }
}

/// Which invocation mode produced a provider error; decides the error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Plain,
    Structured,
    Tools,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Plain => "plain",
            Mode::Structured => "structured",
            Mode::Tools => "tools",
        }
    }

    fn error(self, message: String) -> VitalisCoreError {
        match self {
            Mode::Structured => VitalisCoreError::Evaluation(message),
            Mode::Plain | Mode::Tools => VitalisCoreError::Generation(message),
        }
    }
}

/// Completion service used by turns.
#[derive(Clone)]
pub struct ModelGateway {
    llm: Arc<dyn LLMProvider>,
}

impl ModelGateway {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    /// Resolve the configured provider and wrap it.
    pub fn from_config(config: &ModelConfig) -> Result<Self, VitalisCoreError> {
        let model = ModelId::parse(&config.id)?;
        let llm = resolve_provider(&model, config.api_key_env.as_deref())?;
        Ok(Self::new(llm))
    }

    /// Free-form completion.
    pub async fn complete(
        &self,
        system: &str,
        messages: &[Message],
    ) -> Result<Message, VitalisCoreError> {
        let response = self.invoke(Mode::Plain, system, messages, None, None).await?;
        Ok(response_to_message(response.as_ref()))
    }

    /// Schema-constrained completion decoded into `T`.
    pub async fn complete_structured<T: DeserializeOwned>(
        &self,
        system: &str,
        messages: &[Message],
        format: StructuredOutputFormat,
    ) -> Result<T, VitalisCoreError> {
        let response = self
            .invoke(Mode::Structured, system, messages, None, Some(format))
            .await?;
        let text = response.text().unwrap_or_default();
        serde_json::from_str(strip_code_fence(&text)).map_err(|err| {
            VitalisCoreError::Evaluation(format!("unparseable structured output: {err}"))
        })
    }

    /// Completion with tools bound; the reply may carry zero or more tool calls.
    pub async fn complete_with_tools(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Message, VitalisCoreError> {
        let tools: Vec<Tool> = tools.iter().map(to_llm_tool).collect();
        let response = self
            .invoke(Mode::Tools, system, messages, Some(&tools), None)
            .await?;
        Ok(response_to_message(response.as_ref()))
    }

    async fn invoke(
        &self,
        mode: Mode,
        system: &str,
        messages: &[Message],
        tools: Option<&[Tool]>,
        format: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, VitalisCoreError> {
        let chat_messages = to_chat_messages(system, messages);
        debug!(
            "invoking model (mode={}, messages={}, tools={})",
            mode.as_str(),
            chat_messages.len(),
            tools.map(|tools| tools.len()).unwrap_or(0)
        );
        self.llm
            .chat_with_tools(&chat_messages, tools, format)
            .await
            .map_err(|err| mode.error(err.to_string()))
    }
}

/// Convert a conversation into provider messages led by the system prompt.
pub(crate) fn to_chat_messages(system: &str, messages: &[Message]) -> Vec<ChatMessage> {
    let mut tool_names: HashMap<&str, &str> = HashMap::new();
    let mut output = Vec::with_capacity(messages.len() + 1);
    output.push(ChatMessage {
        role: ChatRole::System,
        message_type: MessageType::Text,
        content: system.to_string(),
    });

    for message in messages {
        let chat_message = match message.role {
            Role::System => ChatMessage {
                role: ChatRole::System,
                message_type: MessageType::Text,
                content: message.content.clone(),
            },
            Role::User => ChatMessage {
                role: ChatRole::User,
                message_type: MessageType::Text,
                content: message.content.clone(),
            },
            Role::Assistant if message.has_tool_calls() => {
                let calls = message
                    .tool_calls
                    .iter()
                    .map(|call| {
                        tool_names.insert(call.id.as_str(), call.name.as_str());
                        ToolCall {
                            id: call.id.clone(),
                            call_type: "function".to_string(),
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: arguments_to_string(&call.arguments),
                            },
                        }
                    })
                    .collect();
                ChatMessage {
                    role: ChatRole::Assistant,
                    message_type: MessageType::ToolUse(calls),
                    content: message.content.clone(),
                }
            }
            Role::Assistant => ChatMessage {
                role: ChatRole::Assistant,
                message_type: MessageType::Text,
                content: message.content.clone(),
            },
            Role::Tool => {
                let call_id = message.tool_call_id.clone().unwrap_or_default();
                let name = tool_names
                    .get(call_id.as_str())
                    .copied()
                    .unwrap_or_default()
                    .to_string();
                ChatMessage {
                    role: ChatRole::Tool,
                    message_type: MessageType::ToolResult(vec![ToolCall {
                        id: call_id,
                        call_type: "function".to_string(),
                        function: FunctionCall {
                            name,
                            arguments: message.content.clone(),
                        },
                    }]),
                    content: String::new(),
                }
            }
        };
        output.push(chat_message);
    }

    ensure_tool_results(output)
}

fn response_to_message(response: &dyn ChatResponse) -> Message {
    let text = response.text().unwrap_or_default();
    let calls: Vec<ToolCallRequest> = response
        .tool_calls()
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCallRequest {
            id: if call.id.trim().is_empty() {
                Uuid::new_v4().to_string()
            } else {
                call.id
            },
            name: call.function.name,
            arguments: parse_arguments(call.function.arguments),
        })
        .collect();
    if calls.is_empty() {
        Message::assistant(text)
    } else {
        Message::assistant_tool_calls(text, calls)
    }
}

fn parse_arguments(raw: String) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn arguments_to_string(arguments: &Value) -> String {
    match arguments {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

fn to_llm_tool(spec: &ToolSpec) -> Tool {
    Tool {
        tool_type: "function".to_string(),
        function: FunctionTool {
            name: spec.name.clone(),
            description: spec.description.clone(),
            parameters: spec.args_schema.clone(),
        },
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
