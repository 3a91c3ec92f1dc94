//! Shared utilities for integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use route_registry::routing::{FailureReason, Handler, HandlerId};

/// Handler recording lifecycle calls, with scripted `init` results.
#[derive(Debug)]
pub struct MockHandler {
    id: u64,
    rank: i32,
    patterns: Option<Vec<String>>,
    name: Option<String>,
    /// Results handed out by successive `init` calls; `Ok` once exhausted.
    script: Mutex<VecDeque<Result<(), FailureReason>>>,
    inits: AtomicUsize,
    disposals: AtomicUsize,
}

#[allow(dead_code)]
impl MockHandler {
    pub fn new(id: u64, rank: i32, patterns: &[&str]) -> Self {
        Self {
            id,
            rank,
            patterns: Some(patterns.iter().map(|p| p.to_string()).collect()),
            name: None,
            script: Mutex::new(VecDeque::new()),
            inits: AtomicUsize::new(0),
            disposals: AtomicUsize::new(0),
        }
    }

    pub fn without_patterns(id: u64) -> Self {
        Self {
            patterns: None,
            ..Self::new(id, 0, &[])
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Make the next `init` call fail with `reason`.
    pub fn failing(self, reason: FailureReason) -> Self {
        self.script.lock().unwrap().push_back(Err(reason));
        self
    }

    pub fn fail_next(&self, reason: FailureReason) {
        self.script.lock().unwrap().push_back(Err(reason));
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

impl Handler for MockHandler {
    fn id(&self) -> HandlerId {
        HandlerId(self.id)
    }

    fn patterns(&self) -> Option<&[String]> {
        self.patterns.as_deref()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn rank(&self) -> i32 {
        self.rank
    }

    fn init(&self) -> Result<(), FailureReason> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    fn dispose(&self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}
