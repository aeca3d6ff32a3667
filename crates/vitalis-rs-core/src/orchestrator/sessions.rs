//! In-memory conversation threads keyed by thread id.

use crate::error::VitalisCoreError;
use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use vitalis_rs_protocol::{Message, ThreadId, UserId};

/// Message history owned by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    pub id: ThreadId,
    pub user_id: UserId,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Thread storage shared by all turns of the assistant.
#[derive(Clone, Default)]
pub struct ThreadStore {
    threads: Arc<RwLock<HashMap<ThreadId, Thread>>>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the thread history for `user_id`.
    ///
    /// Unknown thread ids yield an empty history; they are created on first append.
    pub fn history(
        &self,
        user_id: &str,
        thread_id: &str,
    ) -> Result<Vec<Message>, VitalisCoreError> {
        let threads = self.threads.read();
        match threads.get(thread_id) {
            Some(thread) if thread.user_id != user_id => {
                Err(VitalisCoreError::UnknownThread(thread_id.to_string()))
            }
            Some(thread) => Ok(thread.messages.clone()),
            None => Ok(Vec::new()),
        }
    }

    /// Append messages produced by a completed turn.
    pub fn append(
        &self,
        user_id: &str,
        thread_id: &str,
        messages: &[Message],
    ) -> Result<(), VitalisCoreError> {
        let mut threads = self.threads.write();
        let now = Utc::now();
        let thread = threads.entry(thread_id.to_string()).or_insert_with(|| {
            info!(
                "created thread (thread_id={}, user_id={})",
                thread_id, user_id
            );
            Thread {
                id: thread_id.to_string(),
                user_id: user_id.to_string(),
                messages: Vec::new(),
                created_at: now,
                updated_at: now,
            }
        });
        if thread.user_id != user_id {
            return Err(VitalisCoreError::UnknownThread(thread_id.to_string()));
        }
        debug!(
            "appending messages (thread_id={}, count={})",
            thread_id,
            messages.len()
        );
        thread.messages.extend_from_slice(messages);
        thread.updated_at = now;
        Ok(())
    }

    pub fn get(&self, thread_id: &str) -> Option<Thread> {
        self.threads.read().get(thread_id).cloned()
    }

    /// Drop every thread owned by `user_id`, returning how many were removed.
    pub fn remove_user(&self, user_id: &str) -> usize {
        let mut threads = self.threads.write();
        let before = threads.len();
        threads.retain(|_, thread| thread.user_id != user_id);
        let removed = before - threads.len();
        info!(
            "removed threads (user_id={}, count={})",
            user_id, removed
        );
        removed
    }
}
