//! Shadow queues: handlers waiting for a contested pattern.
//!
//! # Responsibilities
//! - Keep, per pattern, the handlers that lost the conflict
//! - Hand out failover candidates in the configured order
//!
//! # Design Decisions
//! - Each queue is kept sorted by priority ascending
//! - Not synchronized: the registry write lock owns all queues
//! - Empty queues are dropped so `len()` reflects contested patterns only

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::routing::handler::{Handler, HandlerId};

/// Which waiting handler is tried first when the active one goes away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailoverOrder {
    /// Head of the ascending queue: the lowest priority waiting handler.
    #[default]
    LowestFirst,
    /// Tail of the ascending queue: the highest priority waiting handler.
    HighestFirst,
}

/// Handlers waiting for one pattern, sorted by priority ascending.
#[derive(Debug)]
pub struct ShadowQueue<H: ?Sized> {
    entries: Vec<Arc<H>>,
}

impl<H: Handler + ?Sized> ShadowQueue<H> {
    fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert keeping ascending priority order.
    pub fn push(&mut self, handler: Arc<H>) {
        let priority = handler.priority();
        let idx = self.entries.partition_point(|h| h.priority() <= priority);
        self.entries.insert(idx, handler);
    }

    /// Take the next failover candidate.
    pub fn pop(&mut self, order: FailoverOrder) -> Option<Arc<H>> {
        if self.entries.is_empty() {
            return None;
        }
        match order {
            FailoverOrder::LowestFirst => Some(self.entries.remove(0)),
            FailoverOrder::HighestFirst => self.entries.pop(),
        }
    }

    /// Remove the entry for `id`, if queued.
    pub fn remove(&mut self, id: HandlerId) -> Option<Arc<H>> {
        let idx = self.entries.iter().position(|h| h.id() == id)?;
        Some(self.entries.remove(idx))
    }

    pub fn ids(&self) -> Vec<HandlerId> {
        self.entries.iter().map(|h| h.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All shadow queues, keyed by pattern.
#[derive(Debug)]
pub struct ShadowQueues<H: ?Sized> {
    queues: HashMap<String, ShadowQueue<H>>,
}

impl<H: ?Sized> Default for ShadowQueues<H> {
    fn default() -> Self {
        Self { queues: HashMap::new() }
    }
}

impl<H: Handler + ?Sized> ShadowQueues<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pattern: &str, handler: Arc<H>) {
        self.queues
            .entry(pattern.to_string())
            .or_insert_with(ShadowQueue::new)
            .push(handler);
    }

    pub fn get_mut(&mut self, pattern: &str) -> Option<&mut ShadowQueue<H>> {
        self.queues.get_mut(pattern)
    }

    pub fn get(&self, pattern: &str) -> Option<&ShadowQueue<H>> {
        self.queues.get(pattern)
    }

    /// Remove `id` from the queue of `pattern`, dropping the queue if it
    /// becomes empty.
    pub fn remove(&mut self, pattern: &str, id: HandlerId) -> Option<Arc<H>> {
        let queue = self.queues.get_mut(pattern)?;
        let removed = queue.remove(id);
        if queue.is_empty() {
            self.queues.remove(pattern);
        }
        removed
    }

    /// Drop the queue of `pattern` if it is empty.
    pub fn prune(&mut self, pattern: &str) {
        if self.queues.get(pattern).is_some_and(|q| q.is_empty()) {
            self.queues.remove(pattern);
        }
    }

    /// Queued handler ids per pattern, in queue order.
    pub fn snapshot(&self) -> HashMap<String, Vec<HandlerId>> {
        self.queues
            .iter()
            .map(|(pattern, q)| (pattern.clone(), q.ids()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}
