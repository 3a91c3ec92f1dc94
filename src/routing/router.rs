//! Routing table and path resolution.
//!
//! # Responsibilities
//! - Store the single active registration per pattern
//! - Resolve a request path to the matching registration
//!
//! # Design Decisions
//! - `DashMap` keyed by pattern: inserts replace atomically, so readers
//!   never see a pattern with zero or two registrations mid-replace
//! - O(n) scan over active patterns (acceptable for typical counts)
//! - Longest pattern string wins; equal lengths go to the pattern that
//!   became active first (lowest sequence number)
//! - The sequence number belongs to the pattern slot: a takeover or
//!   failover that replaces the registration in place keeps it, only a
//!   pattern that went inactive and comes back gets a new one

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::routing::handler::{Handler, HandlerId};
use crate::routing::matcher::PathPattern;

/// A live binding of one pattern to one handler.
#[derive(Debug)]
pub struct Registration<H: ?Sized> {
    pattern: PathPattern,
    handler: Arc<H>,
    seq: u64,
}

impl<H: Handler + ?Sized> Registration<H> {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    pub fn handler_id(&self) -> HandlerId {
        self.handler.id()
    }
}

/// A resolved request path.
#[derive(Debug)]
pub struct PathResolution<H: ?Sized> {
    pub registration: Arc<Registration<H>>,
    /// Part of the path that selected the handler.
    pub servlet_path: String,
    /// Remainder after the servlet path, if any.
    pub path_info: Option<String>,
}

impl<H: ?Sized> Clone for PathResolution<H> {
    fn clone(&self) -> Self {
        Self {
            registration: self.registration.clone(),
            servlet_path: self.servlet_path.clone(),
            path_info: self.path_info.clone(),
        }
    }
}

impl<H: Handler + ?Sized> PathResolution<H> {
    pub fn pattern(&self) -> &str {
        self.registration.pattern()
    }

    pub fn handler(&self) -> &Arc<H> {
        self.registration.handler()
    }
}

/// Active pattern mappings.
#[derive(Debug)]
pub struct RoutingTable<H: ?Sized> {
    active: DashMap<String, Arc<Registration<H>>>,
    next_seq: AtomicU64,
}

impl<H: ?Sized> Default for RoutingTable<H> {
    fn default() -> Self {
        Self {
            active: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }
}

impl<H: Handler + ?Sized> RoutingTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `handler` the active registration for `pattern`, replacing and
    /// returning any previous one.
    ///
    /// A replacement inherits the sequence number of the registration it
    /// replaces, so equal-length tie breaks survive takeover and failover.
    pub fn insert(&self, pattern: PathPattern, handler: Arc<H>) -> Option<Arc<Registration<H>>> {
        match self.active.entry(pattern.as_str().to_string()) {
            Entry::Occupied(mut slot) => {
                let seq = slot.get().seq;
                Some(slot.insert(Arc::new(Registration { pattern, handler, seq })))
            }
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(Arc::new(Registration { pattern, handler, seq }));
                None
            }
        }
    }

    pub fn remove(&self, pattern: &str) -> Option<Arc<Registration<H>>> {
        self.active.remove(pattern).map(|(_, reg)| reg)
    }

    pub fn get(&self, pattern: &str) -> Option<Arc<Registration<H>>> {
        self.active.get(pattern).map(|r| r.value().clone())
    }

    /// Handler id holding `pattern`, if active.
    pub fn holder(&self, pattern: &str) -> Option<HandlerId> {
        self.active.get(pattern).map(|r| r.handler_id())
    }

    /// Find the registration serving `path`.
    pub fn resolve(&self, path: &str) -> Option<PathResolution<H>> {
        let mut best: Option<(usize, u64, Arc<Registration<H>>)> = None;

        for entry in self.active.iter() {
            let reg = entry.value();
            if !reg.pattern.matches(path) {
                continue;
            }
            let len = entry.key().len();
            let is_better = match &best {
                None => true,
                Some((best_len, best_seq, _)) => {
                    len > *best_len || (len == *best_len && reg.seq < *best_seq)
                }
            };
            if is_better {
                best = Some((len, reg.seq, reg.clone()));
            }
        }

        let (_, _, registration) = best?;
        let split = registration.pattern.resolve(path)?;
        Some(PathResolution {
            registration,
            servlet_path: split.servlet_path,
            path_info: split.path_info,
        })
    }

    /// Active pattern → handler id, sorted by pattern.
    pub fn mappings(&self) -> Vec<(String, HandlerId)> {
        let mut out: Vec<_> = self
            .active
            .iter()
            .map(|r| (r.key().clone(), r.handler_id()))
            .collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
