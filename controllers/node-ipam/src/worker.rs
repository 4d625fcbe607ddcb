//! Single worker draining the node event queue.
//!
//! Every IPPool mutation goes through this one task, so writes to the pool
//! are serialized. Failed events are requeued after a per-key Fibonacci
//! backoff; a requeued event is dropped if a newer event for the same key
//! arrived in the meantime.

use crate::backoff::FibonacciBackoff;
use crate::reconciler::Reconciler;
use crds::IPPool;
use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info};

/// Minimum requeue delay in seconds
const BACKOFF_MIN_SECONDS: u64 = 5;
/// Maximum requeue delay in seconds
const BACKOFF_MAX_SECONDS: u64 = 300;

/// Work item for the node IPAM worker.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// Node added or updated
    Upsert(Node),
    /// Node deleted
    Remove(String),
    /// Realized subnets of the pool changed
    PoolChanged(IPPool),
}

impl NodeEvent {
    /// Events with the same key supersede each other.
    pub fn key(&self) -> String {
        match self {
            NodeEvent::Upsert(node) => format!("node/{}", node.name_any()),
            NodeEvent::Remove(name) => format!("node/{}", name),
            NodeEvent::PoolChanged(pool) => format!("ippool/{}", pool.name_any()),
        }
    }
}

/// Backoff state for a key
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new() -> Self {
        Self {
            backoff: FibonacciBackoff::new(BACKOFF_MIN_SECONDS, BACKOFF_MAX_SECONDS),
            error_count: 0,
        }
    }
}

#[derive(Debug)]
struct QueueItem {
    event: NodeEvent,
    /// Set on requeued items: the generation of the key when it failed
    generation: Option<u64>,
}

/// Outcome of processing one queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processed {
    Succeeded,
    Requeued { after_seconds: u64 },
    Superseded,
}

pub struct Worker {
    reconciler: Arc<Reconciler>,
    events: UnboundedReceiver<NodeEvent>,
    requeue_tx: UnboundedSender<QueueItem>,
    requeue_rx: UnboundedReceiver<QueueItem>,
    /// Per-key event generation, kept only while a retry for the key is pending
    generations: HashMap<String, u64>,
    pending_retries: HashMap<String, u32>,
    backoff: HashMap<String, BackoffState>,
}

impl Worker {
    pub fn new(reconciler: Arc<Reconciler>, events: UnboundedReceiver<NodeEvent>) -> Self {
        let (requeue_tx, requeue_rx) = mpsc::unbounded_channel();
        Self {
            reconciler,
            events,
            requeue_tx,
            requeue_rx,
            generations: HashMap::new(),
            pending_retries: HashMap::new(),
            backoff: HashMap::new(),
        }
    }

    /// Process events until the event channel closes.
    pub async fn run(mut self) {
        info!("Node IPAM worker running");
        loop {
            let item = tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => QueueItem { event, generation: None },
                    None => break,
                },
                Some(item) = self.requeue_rx.recv() => item,
            };
            self.process(item).await;
        }
        info!("Node IPAM worker stopped");
    }

    async fn process(&mut self, item: QueueItem) -> Processed {
        let key = item.event.key();
        if item.generation.is_some() {
            self.finish_retry(&key);
        }

        let processed = self.dispatch(&key, item).await;
        if !self.pending_retries.contains_key(&key) {
            self.generations.remove(&key);
        }
        processed
    }

    fn finish_retry(&mut self, key: &str) {
        if let Some(pending) = self.pending_retries.get_mut(key) {
            *pending -= 1;
            if *pending == 0 {
                self.pending_retries.remove(key);
            }
        }
    }

    async fn dispatch(&mut self, key: &str, item: QueueItem) -> Processed {
        let generation = match item.generation {
            None => {
                let generation = self.generations.entry(key.to_string()).or_insert(0);
                *generation += 1;
                *generation
            }
            Some(generation) => {
                if self.generations.get(key).copied().unwrap_or(0) > generation {
                    debug!("Dropping requeued {}: superseded by a newer event", key);
                    return Processed::Superseded;
                }
                generation
            }
        };

        match self.reconciler.handle(&item.event).await {
            Ok(()) => {
                if let Some(state) = self.backoff.remove(key)
                    && state.error_count > 0
                {
                    info!("{} reconciled after {} failed attempts", key, state.error_count);
                }
                Processed::Succeeded
            }
            Err(e) => {
                let state = self.backoff.entry(key.to_string()).or_insert_with(BackoffState::new);
                state.error_count += 1;
                let delay = state.backoff.next_backoff();
                error!(
                    "Failed to reconcile {} (attempt {}), retrying in {}s: {}",
                    key,
                    state.error_count,
                    delay.as_secs(),
                    e
                );

                *self.pending_retries.entry(key.to_string()).or_insert(0) += 1;
                let requeue_tx = self.requeue_tx.clone();
                let requeued = QueueItem {
                    event: item.event,
                    generation: Some(generation),
                };
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    // Receiver gone means the worker stopped
                    let _ = requeue_tx.send(requeued);
                });
                Processed::Requeued {
                    after_seconds: delay.as_secs(),
                }
            }
        }
    }
}

#[cfg(test)]
impl Worker {
    /// Process a fresh event directly, bypassing the channel
    pub(crate) async fn process_event(&mut self, event: NodeEvent) -> Processed {
        self.process(QueueItem { event, generation: None }).await
    }

    /// Process an event as if it were requeued after failing at `generation`
    pub(crate) async fn process_retry(&mut self, event: NodeEvent, generation: u64) -> Processed {
        self.process(QueueItem {
            event,
            generation: Some(generation),
        })
        .await
    }

    /// Whether any per-key state is held for `key`
    pub(crate) fn is_tracked(&self, key: &str) -> bool {
        self.generations.contains_key(key)
            || self.pending_retries.contains_key(key)
            || self.backoff.contains_key(key)
    }
}
