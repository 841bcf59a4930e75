//! Per-chat event dispatch.
//!
//! The state machine's correctness requires processing one inbound event to
//! completion (including its upstream round trip) before the next event for
//! the same chat; events for different chats are independent. The dispatcher
//! therefore owns one queue and worker task per chat, created lazily, while
//! cross-chat traffic runs fully in parallel.

use super::engine::DialogueEngine;
use super::event::InboundEvent;
use crate::error::Result;
use crate::session::ChatId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};

/// Queue depth per chat; a chat flooding faster than its handlers complete
/// gets backpressure instead of unbounded buffering.
const CHAT_QUEUE_DEPTH: usize = 32;

/// Routes inbound events to per-chat serial workers.
pub struct Dispatcher {
    engine: Arc<DialogueEngine>,
    workers: Arc<RwLock<HashMap<ChatId, mpsc::Sender<InboundEvent>>>>,
}

impl Dispatcher {
    /// Creates a dispatcher over the shared engine.
    pub fn new(engine: Arc<DialogueEngine>) -> Self {
        Self {
            engine,
            workers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Pulls events from the gateway until it fails terminally.
    ///
    /// Transient polling errors are logged and retried after a short pause
    /// so one bad poll cannot take the whole bot down.
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.engine.gateway().next_event().await {
                Ok(event) => self.dispatch(event).await,
                Err(err) => {
                    tracing::warn!(error = %err, "event polling failed, retrying");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    /// Enqueues one event onto its chat's serial queue.
    ///
    /// The top-level cancel command additionally bypasses the queue: the
    /// session is terminated immediately, so a handler currently awaiting an
    /// upstream call finds its epoch stale and drops its state commit. Its
    /// reply may still be delivered, which is acceptable per the ordering
    /// contract.
    pub async fn dispatch(&self, event: InboundEvent) {
        let chat_id = event.chat_id;
        if event.is_cancel() {
            self.engine.store().terminate(chat_id).await;
        }

        let sender = self.worker_for(chat_id).await;
        if sender.send(event).await.is_err() {
            // The worker exited; drop the stale handle so the next event
            // spawns a fresh one.
            tracing::warn!(chat_id, "chat worker gone, dropping event");
            self.workers.write().await.remove(&chat_id);
        }
    }

    /// Returns the chat's queue sender, spawning the worker on first use.
    async fn worker_for(&self, chat_id: ChatId) -> mpsc::Sender<InboundEvent> {
        if let Some(sender) = self.workers.read().await.get(&chat_id) {
            return sender.clone();
        }

        let mut workers = self.workers.write().await;
        // Double-checked: another dispatch may have raced us here.
        if let Some(sender) = workers.get(&chat_id) {
            return sender.clone();
        }

        let (tx, mut rx) = mpsc::channel::<InboundEvent>(CHAT_QUEUE_DEPTH);
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(err) = engine.handle_event(event).await {
                    tracing::error!(chat_id, error = %err, "event handling failed");
                }
            }
            tracing::debug!(chat_id, "chat worker stopped");
        });

        workers.insert(chat_id, tx.clone());
        tracing::debug!(chat_id, "chat worker started");
        tx
    }
}
