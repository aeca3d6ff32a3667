//! Turn execution: the retrieve, evaluate, generate state machine.

use crate::error::VitalisCoreError;
use crate::evaluation::MemoryEvaluator;
use crate::executor::ToolExecutor;
use crate::gateway::ModelGateway;
use crate::prompt::build_system_prompt;
use crate::retrieval::MemoryRetriever;
use chrono::Local;
use log::{debug, error, info};
use std::sync::Arc;
use vitalis_rs_memory::{MemoryStore, MemoryWritePolicy};
use vitalis_rs_protocol::{
    EventMsg, EventPayload, EventSink, MemoryEvaluation, Message, Role, ThreadId, TurnId, UserId,
};
use vitalis_rs_tools::{ToolContext, TurnServices};

/// Parameters for a single turn execution.
pub(crate) struct TurnParams {
    pub(crate) user_id: UserId,
    pub(crate) thread_id: ThreadId,
    pub(crate) turn_id: TurnId,
    /// Prior thread history followed by the new user message.
    pub(crate) history: Vec<Message>,
    pub(crate) event_sink: Option<Arc<dyn EventSink>>,
}

/// Messages produced by a finished turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub turn_id: TurnId,
    pub evaluation: MemoryEvaluation,
    /// Either `[assistant]` or `[assistant_with_tool_calls, tool_result..., final_assistant]`.
    pub new_messages: Vec<Message>,
    /// State transitions consumed.
    pub steps: usize,
}

impl TurnOutcome {
    /// Content of the user-facing reply.
    pub fn response(&self) -> &str {
        self.new_messages
            .last()
            .map(|message| message.content.as_str())
            .unwrap_or_default()
    }
}

enum TurnState {
    Retrieve,
    Evaluate {
        system: String,
    },
    GenerateWithTools {
        system: String,
    },
    ExecuteTools {
        system: String,
        request: Message,
    },
    GenerateFinal {
        system: String,
        request: Message,
        results: Vec<Message>,
    },
    GeneratePlain {
        system: String,
    },
    Done {
        new_messages: Vec<Message>,
    },
}

impl TurnState {
    fn name(&self) -> &'static str {
        match self {
            TurnState::Retrieve => "retrieve",
            TurnState::Evaluate { .. } => "evaluate",
            TurnState::GenerateWithTools { .. } => "generate_with_tools",
            TurnState::ExecuteTools { .. } => "execute_tools",
            TurnState::GenerateFinal { .. } => "generate_final",
            TurnState::GeneratePlain { .. } => "generate_plain",
            TurnState::Done { .. } => "done",
        }
    }
}

/// Per-turn identity and scratch state.
struct ActiveTurn {
    user_id: UserId,
    thread_id: ThreadId,
    turn_id: TurnId,
    history: Vec<Message>,
    event_sink: Option<Arc<dyn EventSink>>,
    evaluation: MemoryEvaluation,
}

impl ActiveTurn {
    fn emit(&self, payload: EventPayload) {
        if let Some(sink) = &self.event_sink {
            sink.emit(EventMsg::new(self.thread_id.clone(), payload));
        }
    }

    fn last_user_message(&self) -> &str {
        self.history
            .iter()
            .rev()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.as_str())
            .unwrap_or_default()
    }
}

/// Executes turns against injected gateway, store and tools.
pub(crate) struct TurnExecutor {
    pub(crate) gateway: ModelGateway,
    pub(crate) retriever: MemoryRetriever,
    pub(crate) evaluator: MemoryEvaluator,
    pub(crate) tools: ToolExecutor,
    pub(crate) store: Arc<dyn MemoryStore>,
    pub(crate) collection: String,
    pub(crate) write_policy: MemoryWritePolicy,
    /// Base system prompt with `{user_info}` and `{time}` placeholders.
    pub(crate) system_template: String,
    pub(crate) step_limit: usize,
}

impl TurnExecutor {
    /// Execute a single turn end-to-end.
    pub(crate) async fn run_turn(
        &self,
        params: TurnParams,
    ) -> Result<TurnOutcome, VitalisCoreError> {
        let TurnParams {
            user_id,
            thread_id,
            turn_id,
            history,
            event_sink,
        } = params;
        info!(
            "starting turn (turn_id={}, thread_id={}, user_id={}, history_len={})",
            turn_id,
            thread_id,
            user_id,
            history.len()
        );
        let mut turn = ActiveTurn {
            user_id,
            thread_id,
            turn_id,
            history,
            event_sink,
            evaluation: MemoryEvaluation::Skip,
        };
        turn.emit(EventPayload::TurnStarted {
            turn_id,
            user_id: turn.user_id.clone(),
        });

        let mut state = TurnState::Retrieve;
        let mut steps = 0;
        let result = loop {
            if let TurnState::Done { new_messages } = state {
                break Ok(new_messages);
            }
            steps += 1;
            if steps > self.step_limit {
                break Err(VitalisCoreError::StepLimitExceeded {
                    limit: self.step_limit,
                });
            }
            debug!(
                "turn step (turn_id={}, step={}, state={})",
                turn_id,
                steps,
                state.name()
            );
            state = match self.advance(&mut turn, state).await {
                Ok(next) => next,
                Err(err) => break Err(err),
            };
        };

        match result {
            Ok(new_messages) => {
                let outcome = TurnOutcome {
                    turn_id,
                    evaluation: turn.evaluation,
                    new_messages,
                    steps,
                };
                info!(
                    "turn finished (turn_id={}, evaluation={}, new_messages={}, steps={})",
                    turn_id,
                    outcome.evaluation,
                    outcome.new_messages.len(),
                    steps
                );
                Ok(outcome)
            }
            Err(err) => {
                error!("turn failed (turn_id={}): {}", turn_id, err);
                turn.emit(EventPayload::Error {
                    turn_id: Some(turn_id),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn advance(
        &self,
        turn: &mut ActiveTurn,
        state: TurnState,
    ) -> Result<TurnState, VitalisCoreError> {
        match state {
            TurnState::Retrieve => {
                let retrieved = self
                    .retriever
                    .retrieve(&turn.user_id, turn.last_user_message())
                    .await?;
                let count = retrieved.rendered_count();
                debug!(
                    "memories retrieved (turn_id={}, count={})",
                    turn.turn_id, count
                );
                turn.emit(EventPayload::MemoryRetrieved {
                    turn_id: turn.turn_id,
                    count,
                });
                let system = build_system_prompt(
                    &self.system_template,
                    &turn.user_id,
                    Local::now(),
                    &retrieved.block,
                );
                Ok(TurnState::Evaluate { system })
            }
            TurnState::Evaluate { system } => {
                let evaluation = self.evaluator.evaluate(&turn.history).await;
                info!(
                    "memory evaluated (turn_id={}, evaluation={})",
                    turn.turn_id, evaluation
                );
                turn.evaluation = evaluation;
                turn.emit(EventPayload::MemoryEvaluated {
                    turn_id: turn.turn_id,
                    evaluation,
                });
                if evaluation.wants_memory_write() {
                    Ok(TurnState::GenerateWithTools { system })
                } else {
                    Ok(TurnState::GeneratePlain { system })
                }
            }
            TurnState::GenerateWithTools { system } => {
                let specs = self.tools.registry().specs();
                let reply = self
                    .gateway
                    .complete_with_tools(&system, &turn.history, &specs)
                    .await?;
                if reply.has_tool_calls() {
                    Ok(TurnState::ExecuteTools {
                        system,
                        request: reply,
                    })
                } else {
                    debug!("no tool calls requested (turn_id={})", turn.turn_id);
                    Ok(TurnState::Done {
                        new_messages: vec![reply],
                    })
                }
            }
            TurnState::ExecuteTools { system, request } => {
                let ctx = self.tool_context(turn);
                let results = self.tools.execute(&ctx, &request.tool_calls).await?;
                Ok(TurnState::GenerateFinal {
                    system,
                    request,
                    results,
                })
            }
            TurnState::GenerateFinal {
                system,
                request,
                results,
            } => {
                let mut conversation = turn.history.clone();
                conversation.push(request.clone());
                conversation.extend(results.iter().cloned());
                let reply = self.gateway.complete(&system, &conversation).await?;
                let mut new_messages = Vec::with_capacity(results.len() + 2);
                new_messages.push(request);
                new_messages.extend(results);
                new_messages.push(reply);
                Ok(TurnState::Done { new_messages })
            }
            TurnState::GeneratePlain { system } => {
                let reply = self.gateway.complete(&system, &turn.history).await?;
                Ok(TurnState::Done {
                    new_messages: vec![reply],
                })
            }
            TurnState::Done { new_messages } => Ok(TurnState::Done { new_messages }),
        }
    }

    fn tool_context(&self, turn: &ActiveTurn) -> ToolContext {
        ToolContext {
            user_id: turn.user_id.clone(),
            thread_id: turn.thread_id.clone(),
            turn_id: Some(turn.turn_id),
            tool_call_id: None,
            tool_name: None,
            services: Arc::new(TurnServices {
                store: self.store.clone(),
                collection: self.collection.clone(),
                write_policy: self.write_policy.clone(),
                event_sink: turn.event_sink.clone(),
            }),
        }
    }
}
