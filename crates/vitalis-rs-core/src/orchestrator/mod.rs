//! Assistant facade: owns threads and injected handles, and runs turns.

mod memory;
mod runtime;
mod sessions;

pub use runtime::TurnOutcome;
pub use sessions::{Thread, ThreadStore};

use crate::error::VitalisCoreError;
use crate::evaluation::MemoryEvaluator;
use crate::executor::ToolExecutor;
use crate::gateway::ModelGateway;
use crate::health::HealthProfile;
use crate::prompt::{DEFAULT_MEMORY_EVALUATION_PROMPT, DEFAULT_SYSTEM_PROMPT};
use crate::retrieval::MemoryRetriever;
use log::{error, info, warn};
use memory::write_policy_from_config;
use runtime::{TurnExecutor, TurnParams};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;
use vitalis_rs_config::VitalisConfig;
use vitalis_rs_memory::{InMemoryStore, MemoryItem, MemoryStore, Namespace};
use vitalis_rs_protocol::{
    EventMsg, EventPayload, EventSink, Message, ThreadId, TurnId, UserId,
};
use vitalis_rs_tools::{ToolRegistry, builtin_tool_registry};

/// Default number of memories returned by [`Assistant::list_memories`].
pub const DEFAULT_MEMORY_LIST_LIMIT: usize = 100;
/// Upper bound on memories removed by [`Assistant::forget_user`].
pub const FORGET_USER_LIMIT: usize = 1000;
const CHAT_STREAM_BUFFER: usize = 256;

/// One user message addressed to a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: UserId,
    /// Existing thread to continue; a new thread is started when absent.
    #[serde(default)]
    pub thread_id: Option<ThreadId>,
    pub message: String,
}

impl ChatRequest {
    pub fn new(user_id: impl Into<UserId>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: None,
            message: message.into(),
        }
    }

    pub fn in_thread(mut self, thread_id: impl Into<ThreadId>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

/// Reply for a completed chat turn.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub response: String,
    pub thread_id: ThreadId,
    pub user_id: UserId,
    /// Messages the turn appended after the user message.
    pub new_messages: Vec<Message>,
}

/// Streaming handle for a single chat turn.
pub struct ChatStream {
    pub thread_id: ThreadId,
    pub turn_id: TurnId,
    /// Events emitted while the turn runs.
    pub events: broadcast::Receiver<EventMsg>,
    handle: JoinHandle<Result<ChatReply, VitalisCoreError>>,
}

impl ChatStream {
    /// Await completion of the turn and return its reply.
    pub async fn finish(self) -> Result<ChatReply, VitalisCoreError> {
        self.handle
            .await
            .map_err(|err| VitalisCoreError::Generation(format!("turn task failed: {err}")))?
    }
}

#[derive(Clone)]
struct RunEventBus {
    sender: broadcast::Sender<EventMsg>,
}

impl RunEventBus {
    fn new(buffer: usize) -> (Self, broadcast::Receiver<EventMsg>) {
        let (sender, receiver) = broadcast::channel(buffer);
        (Self { sender }, receiver)
    }
}

impl EventSink for RunEventBus {
    fn emit(&self, event: EventMsg) {
        let _ = self.sender.send(event);
    }
}

struct FanoutEventSink {
    primary: Option<Arc<dyn EventSink>>,
    secondary: Arc<dyn EventSink>,
}

impl EventSink for FanoutEventSink {
    fn emit(&self, event: EventMsg) {
        if let Some(primary) = &self.primary {
            primary.emit(event.clone());
        }
        self.secondary.emit(event);
    }
}

/// Builder for [`Assistant`]; only the config and gateway are required.
pub struct AssistantBuilder {
    config: VitalisConfig,
    gateway: ModelGateway,
    store: Option<Arc<dyn MemoryStore>>,
    tools: Option<ToolRegistry>,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl AssistantBuilder {
    /// Memory store to read and write; defaults to an empty in-memory store.
    pub fn store(mut self, store: Arc<dyn MemoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Tool registry bound on memory-write turns; defaults to the builtins.
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Sink receiving the events of every turn.
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<Assistant, VitalisCoreError> {
        self.config
            .validate()
            .map_err(|err| VitalisCoreError::Configuration(err.to_string()))?;
        let config = Arc::new(self.config);
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()) as Arc<dyn MemoryStore>);
        let tools = Arc::new(self.tools.unwrap_or_else(builtin_tool_registry));
        let evaluation_prompt = config
            .prompts
            .memory_evaluation
            .clone()
            .unwrap_or_else(|| DEFAULT_MEMORY_EVALUATION_PROMPT.to_string());
        let system_template = config
            .prompts
            .system
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        if !system_template.contains("{user_info}") || !system_template.contains("{time}") {
            warn!("system prompt template lacks {{user_info}} or {{time}} placeholders");
        }

        let executor = TurnExecutor {
            gateway: self.gateway.clone(),
            retriever: MemoryRetriever::new(store.clone(), &config.memory),
            evaluator: MemoryEvaluator::new(
                self.gateway.clone(),
                evaluation_prompt,
                config.memory.evaluation_window,
            ),
            tools: ToolExecutor::new(tools.clone()),
            store: store.clone(),
            collection: config.memory.collection.clone(),
            write_policy: write_policy_from_config(&config.memory.write),
            system_template,
            step_limit: config.orchestrator.step_limit,
        };
        info!(
            "assistant ready (model={}, tools={}, step_limit={})",
            config.model.id,
            tools.list().join(","),
            config.orchestrator.step_limit
        );
        Ok(Assistant {
            config,
            store,
            tools,
            threads: ThreadStore::new(),
            executor: Arc::new(executor),
            event_sink: self.event_sink,
        })
    }
}

/// Memory-augmented health assistant.
#[derive(Clone)]
pub struct Assistant {
    config: Arc<VitalisConfig>,
    store: Arc<dyn MemoryStore>,
    tools: Arc<ToolRegistry>,
    threads: ThreadStore,
    executor: Arc<TurnExecutor>,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl Assistant {
    pub fn builder(config: VitalisConfig, gateway: ModelGateway) -> AssistantBuilder {
        AssistantBuilder {
            config,
            gateway,
            store: None,
            tools: None,
            event_sink: None,
        }
    }

    pub fn config(&self) -> &VitalisConfig {
        &self.config
    }

    /// Configured `provider/model` identifier.
    pub fn model_id(&self) -> &str {
        &self.config.model.id
    }

    /// Names of the tools bound on memory-write turns.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.list()
    }

    pub fn threads(&self) -> &ThreadStore {
        &self.threads
    }

    /// Run one turn and append its messages to the thread.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply, VitalisCoreError> {
        let (request, thread_id) = prepare_request(request)?;
        self.run_chat(request, thread_id, Uuid::new_v4(), self.event_sink.clone())
            .await
    }

    /// Run one turn in a background task, streaming its events.
    pub fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, VitalisCoreError> {
        let (request, thread_id) = prepare_request(request)?;
        let turn_id = Uuid::new_v4();
        let (bus, events) = RunEventBus::new(CHAT_STREAM_BUFFER);
        let fanout: Arc<dyn EventSink> = Arc::new(FanoutEventSink {
            primary: self.event_sink.clone(),
            secondary: Arc::new(bus),
        });
        info!(
            "streaming turn (thread_id={}, user_id={}, turn_id={})",
            thread_id, request.user_id, turn_id
        );
        let assistant = self.clone();
        let task_thread_id = thread_id.clone();
        let handle = tokio::spawn(async move {
            assistant
                .run_chat(request, task_thread_id, turn_id, Some(fanout))
                .await
        });
        Ok(ChatStream {
            thread_id,
            turn_id,
            events,
            handle,
        })
    }

    async fn run_chat(
        &self,
        request: ChatRequest,
        thread_id: ThreadId,
        turn_id: TurnId,
        event_sink: Option<Arc<dyn EventSink>>,
    ) -> Result<ChatReply, VitalisCoreError> {
        let ChatRequest {
            user_id, message, ..
        } = request;
        let user_message = Message::user(message);
        let mut history = self.threads.history(&user_id, &thread_id)?;
        history.push(user_message.clone());

        let outcome = self
            .executor
            .run_turn(TurnParams {
                user_id: user_id.clone(),
                thread_id: thread_id.clone(),
                turn_id,
                history,
                event_sink: event_sink.clone(),
            })
            .await?;

        let mut appended = Vec::with_capacity(outcome.new_messages.len() + 1);
        appended.push(user_message);
        appended.extend(outcome.new_messages.iter().cloned());
        // The turn only completes once its messages are part of the thread.
        let payload = match self.threads.append(&user_id, &thread_id, &appended) {
            Ok(()) => EventPayload::TurnCompleted {
                turn_id,
                message: outcome.response().to_string(),
            },
            Err(err) => {
                error!("turn not recorded (turn_id={}): {}", turn_id, err);
                let payload = EventPayload::Error {
                    turn_id: Some(turn_id),
                    message: err.to_string(),
                };
                emit_to(event_sink.as_deref(), &thread_id, payload);
                return Err(err);
            }
        };
        emit_to(event_sink.as_deref(), &thread_id, payload);

        Ok(ChatReply {
            response: outcome.response().to_string(),
            thread_id,
            user_id,
            new_messages: outcome.new_messages,
        })
    }

    /// Generate a health snapshot for the user and seed it as memories.
    pub async fn initialize_user(&self, user_id: &str) -> Result<HealthProfile, VitalisCoreError> {
        let profile = HealthProfile::generate(&mut rand::rng());
        self.seed_profile(user_id, &profile).await?;
        Ok(profile)
    }

    /// Write the memories of a profile under fresh keys.
    pub async fn seed_profile(
        &self,
        user_id: &str,
        profile: &HealthProfile,
    ) -> Result<(), VitalisCoreError> {
        let namespace = self.namespace(user_id)?;
        for value in profile.memories() {
            let key = Uuid::new_v4().to_string();
            self.store
                .put(&namespace, &key, value)
                .await
                .map_err(|err| VitalisCoreError::Memory(err.to_string()))?;
        }
        info!("seeded health profile (user_id={})", user_id);
        Ok(())
    }

    /// Most recent memories of a user, up to `limit` (default 100).
    pub async fn list_memories(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<MemoryItem>, VitalisCoreError> {
        let namespace = self.namespace(user_id)?;
        self.store
            .search(&namespace, "", limit.unwrap_or(DEFAULT_MEMORY_LIST_LIMIT))
            .await
            .map_err(|err| VitalisCoreError::Memory(err.to_string()))
    }

    /// Delete a user's memories and threads, returning the number of memories removed.
    pub async fn forget_user(&self, user_id: &str) -> Result<usize, VitalisCoreError> {
        let namespace = self.namespace(user_id)?;
        let removed = self
            .store
            .purge(&namespace, FORGET_USER_LIMIT)
            .await
            .map_err(|err| VitalisCoreError::Memory(err.to_string()))?;
        let threads = self.threads.remove_user(user_id);
        info!(
            "forgot user (user_id={}, memories={}, threads={})",
            user_id, removed, threads
        );
        Ok(removed)
    }

    fn namespace(&self, user_id: &str) -> Result<Namespace, VitalisCoreError> {
        if user_id.trim().is_empty() {
            return Err(VitalisCoreError::InvalidRequest(
                "user_id must not be empty".to_string(),
            ));
        }
        Ok(Namespace::new(self.config.memory.collection.clone(), user_id))
    }
}

fn emit_to(sink: Option<&dyn EventSink>, thread_id: &str, payload: EventPayload) {
    if let Some(sink) = sink {
        sink.emit(EventMsg::new(thread_id.to_string(), payload));
    }
}

fn prepare_request(request: ChatRequest) -> Result<(ChatRequest, ThreadId), VitalisCoreError> {
    if request.user_id.trim().is_empty() {
        return Err(VitalisCoreError::InvalidRequest(
            "user_id must not be empty".to_string(),
        ));
    }
    if request.message.trim().is_empty() {
        return Err(VitalisCoreError::InvalidRequest(
            "message must not be empty".to_string(),
        ));
    }
    let thread_id = request
        .thread_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    Ok((request, thread_id))
}
