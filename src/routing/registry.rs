//! Handler registry: conflict resolution and failover.
//!
//! # Responsibilities
//! - Activate (pattern, handler) pairs and record the outcome
//! - Arbitrate contested patterns by handler priority
//! - Promote a shadowed handler when the active one is removed
//! - Serve path and name lookups from the live tables
//!
//! # Concurrency
//! ```text
//! add / remove  → write lock (shadow queues + known handlers)
//!               → routing table / ledger / name index (per-key atomic)
//! resolve       → routing table only, no write lock
//! status        → ledger only, no write lock
//! ```
//!
//! # Design Decisions
//! - Patterns are compiled only when about to become active
//! - Activation failures never escape `add`/`remove`; they land in the ledger
//! - A replacement is inserted before the evicted handler is disposed, and
//!   a removed handler stays resolvable until its successor is in place
//! - An evicted handler still active on other patterns is initialized
//!   again once `add` finishes; if that fails, those patterns fail over
//!   as if the handler had been removed from them
//! - Handlers must not call back into the registry from `init`/`dispose`

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::RegistryConfig;
use crate::observability::metrics;
use crate::routing::handler::{FailureReason, Handler, HandlerId, Outcome};
use crate::routing::matcher::PathPattern;
use crate::routing::names::NameIndex;
use crate::routing::router::{PathResolution, Registration, RoutingTable};
use crate::routing::shadow::{FailoverOrder, ShadowQueues};
use crate::routing::status::{StatusLedger, StatusRecord};

/// State only touched while holding the write lock.
#[derive(Debug)]
struct WriteState<H: ?Sized> {
    shadows: ShadowQueues<H>,
    handlers: HashMap<HandlerId, Arc<H>>,
}

/// Maps request paths to the single active handler per pattern.
#[derive(Debug)]
pub struct Registry<H: ?Sized = dyn Handler> {
    table: RoutingTable<H>,
    status: StatusLedger,
    names: NameIndex<H>,
    state: Mutex<WriteState<H>>,
    failover_order: FailoverOrder,
}

impl<H: Handler + ?Sized> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handler + ?Sized> Registry<H> {
    /// Create an empty registry with the default failover order.
    pub fn new() -> Self {
        Self::with_failover_order(FailoverOrder::default())
    }

    pub fn with_failover_order(failover_order: FailoverOrder) -> Self {
        Self {
            table: RoutingTable::new(),
            status: StatusLedger::new(),
            names: NameIndex::new(),
            state: Mutex::new(WriteState {
                shadows: ShadowQueues::new(),
                handlers: HashMap::new(),
            }),
            failover_order,
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::with_failover_order(config.failover_order)
    }

    pub fn failover_order(&self) -> FailoverOrder {
        self.failover_order
    }

    /// Register a handler for every pattern it declares.
    ///
    /// Handlers without patterns are ignored. Adding an id that is already
    /// registered removes the previous registration first.
    pub fn add(&self, handler: Arc<H>) {
        let id = handler.id();
        let patterns = match handler.patterns() {
            Some(p) if !p.is_empty() => unique(p),
            _ => {
                tracing::debug!(handler_id = %id, "Handler declares no patterns, not registered");
                return;
            }
        };

        let mut state = self.state.lock();
        if state.handlers.contains_key(&id) {
            tracing::debug!(handler_id = %id, "Handler already registered, replacing");
            self.remove_locked(&mut state, id);
        }
        state.handlers.insert(id, handler.clone());

        let mut status = StatusRecord::new();
        let mut evicted: Vec<Arc<H>> = Vec::new();
        for pattern in &patterns {
            let Some(current) = self.table.get(pattern) else {
                self.activate(pattern, &handler, &mut status);
                continue;
            };

            let old = current.handler().clone();
            if handler.priority() > old.priority() {
                if self.activate(pattern, &handler, &mut status) {
                    old.dispose();
                    state.shadows.push(pattern, old.clone());
                    self.status.record(old.id(), pattern, shadowed());
                    self.refresh_name(&old);
                    if !evicted.iter().any(|h| h.id() == old.id()) {
                        evicted.push(old.clone());
                    }
                    metrics::record_eviction();
                    tracing::info!(
                        pattern = %pattern,
                        handler_id = %id,
                        evicted_id = %old.id(),
                        "Pattern taken over by higher priority handler"
                    );
                }
            } else {
                state.shadows.push(pattern, handler.clone());
                status.shadowed(pattern);
                metrics::record_activation(shadowed().label());
                tracing::debug!(
                    pattern = %pattern,
                    handler_id = %id,
                    active_id = %old.id(),
                    "Handler shadowed"
                );
            }
        }

        self.status.insert(id, status);
        self.names.insert(handler.clone(), self.holds_any(&handler));
        for old in evicted {
            self.revive(&mut state, &old);
        }
        metrics::set_active_patterns(self.table.len());
    }

    /// Bring an evicted handler back up for the patterns it still holds.
    fn revive(&self, state: &mut WriteState<H>, handler: &Arc<H>) {
        let id = handler.id();
        let held: Vec<String> = unique(handler.patterns().unwrap_or_default())
            .into_iter()
            .filter(|p| self.table.holder(p) == Some(id))
            .collect();
        if held.is_empty() {
            return;
        }

        match handler.init() {
            Ok(()) => {
                tracing::info!(handler_id = %id, patterns = held.len(), "Evicted handler re-initialized");
            }
            Err(reason) => {
                tracing::warn!(
                    handler_id = %id,
                    reason = %reason,
                    "Evicted handler failed to re-initialize, releasing its patterns"
                );
                for pattern in &held {
                    self.status.record(id, pattern, Outcome::Failure(reason));
                    metrics::record_activation(Outcome::Failure(reason).label());
                    self.vacate(&mut state.shadows, pattern, id);
                }
                self.refresh_name(handler);
            }
        }
    }

    /// Unregister the handler with `id`. Unknown ids are ignored.
    pub fn remove(&self, id: HandlerId) {
        let mut state = self.state.lock();
        if self.remove_locked(&mut state, id) {
            metrics::set_active_patterns(self.table.len());
        }
    }

    /// Returns false if `id` was not registered.
    fn remove_locked(&self, state: &mut WriteState<H>, id: HandlerId) -> bool {
        let Some(handler) = state.handlers.remove(&id) else {
            tracing::debug!(handler_id = %id, "Remove of unknown handler ignored");
            return false;
        };

        self.status.remove(id);
        if let Some(name) = handler.name() {
            self.names.remove(name, id);
        }

        for pattern in unique(handler.patterns().unwrap_or_default()) {
            if self.table.holder(&pattern) != Some(id) {
                state.shadows.remove(&pattern, id);
                continue;
            }

            self.vacate(&mut state.shadows, &pattern, id);
        }

        handler.dispose();
        tracing::info!(handler_id = %id, "Handler removed");
        true
    }

    /// Hand `pattern`, currently held by `leaving`, to the next shadowed
    /// handler that activates, or drop it from the table.
    ///
    /// Failed candidates are discarded. The old registration stays in
    /// place until a successor replaces it.
    fn vacate(&self, shadows: &mut ShadowQueues<H>, pattern: &str, leaving: HandlerId) {
        let mut promoted = None;
        let mut tried = 0usize;
        if let Some(queue) = shadows.get_mut(pattern) {
            while let Some(candidate) = queue.pop(self.failover_order) {
                tried += 1;
                if self.activate_recorded(pattern, &candidate) {
                    promoted = Some(candidate);
                    break;
                }
                tracing::debug!(
                    pattern = %pattern,
                    handler_id = %candidate.id(),
                    "Failover candidate failed to activate, discarded"
                );
            }
        }
        shadows.prune(pattern);

        match promoted {
            Some(candidate) => {
                self.refresh_name(&candidate);
                metrics::record_failover("promoted");
                tracing::info!(
                    pattern = %pattern,
                    removed_id = %leaving,
                    handler_id = %candidate.id(),
                    "Shadowed handler promoted"
                );
            }
            None => {
                self.table.remove(pattern);
                if tried > 0 {
                    metrics::record_failover("exhausted");
                }
                tracing::debug!(pattern = %pattern, removed_id = %leaving, "Pattern released");
            }
        }
    }

    /// Try to make `handler` the active registration for `pattern`.
    ///
    /// Records the outcome in `status` and returns true on success. Calls
    /// `init` at most once and never `dispose`.
    fn activate(&self, pattern: &str, handler: &Arc<H>, status: &mut StatusRecord) -> bool {
        let compiled = match PathPattern::compile(pattern) {
            Ok(compiled) => compiled,
            Err(e) => {
                tracing::warn!(handler_id = %handler.id(), error = %e, "Pattern rejected");
                let outcome = Outcome::Failure(FailureReason::ValidationFailed);
                status.set(pattern, outcome);
                metrics::record_activation(outcome.label());
                return false;
            }
        };

        let outcome = Outcome::from(handler.init());
        status.set(pattern, outcome);
        metrics::record_activation(outcome.label());

        match outcome {
            Outcome::Success => {
                self.table.insert(compiled, handler.clone());
                tracing::info!(pattern = %pattern, handler_id = %handler.id(), "Handler activated");
                true
            }
            Outcome::Failure(reason) => {
                tracing::warn!(
                    pattern = %pattern,
                    handler_id = %handler.id(),
                    reason = %reason,
                    "Handler failed to activate"
                );
                false
            }
        }
    }

    /// `activate` for a handler whose record already lives in the ledger.
    fn activate_recorded(&self, pattern: &str, handler: &Arc<H>) -> bool {
        let mut scratch = StatusRecord::new();
        let ok = self.activate(pattern, handler, &mut scratch);
        if let Some(outcome) = scratch.get(pattern) {
            self.status.record(handler.id(), pattern, outcome);
        }
        ok
    }

    fn holds_any(&self, handler: &Arc<H>) -> bool {
        let id = handler.id();
        handler
            .patterns()
            .unwrap_or_default()
            .iter()
            .any(|p| self.table.holder(p) == Some(id))
    }

    fn refresh_name(&self, handler: &Arc<H>) {
        if let Some(name) = handler.name() {
            self.names.set_active(name, handler.id(), self.holds_any(handler));
        }
    }

    /// Find the registration serving `path`.
    pub fn resolve(&self, path: &str) -> Option<PathResolution<H>> {
        self.table.resolve(path)
    }

    /// The active registration for exactly `pattern`.
    pub fn registration(&self, pattern: &str) -> Option<Arc<Registration<H>>> {
        self.table.get(pattern)
    }

    /// The highest priority handler named `name`, if it is serving.
    pub fn resolve_by_name(&self, name: &str) -> Option<Arc<H>> {
        self.names.resolve(name)
    }

    /// Snapshot of every handler's outcomes.
    pub fn status(&self) -> BTreeMap<HandlerId, StatusRecord> {
        self.status.snapshot()
    }

    pub fn status_of(&self, id: HandlerId) -> Option<StatusRecord> {
        self.status.get(id)
    }

    /// Active pattern → handler id.
    pub fn mappings(&self) -> Vec<(String, HandlerId)> {
        self.table.mappings()
    }

    /// Waiting handler ids per contested pattern, in queue order.
    pub fn shadowed(&self) -> HashMap<String, Vec<HandlerId>> {
        self.state.lock().shadows.snapshot()
    }

    /// The registered handler with `id`, active or not.
    pub fn handler(&self, id: HandlerId) -> Option<Arc<H>> {
        self.state.lock().handlers.get(&id).cloned()
    }

    pub fn is_registered(&self, id: HandlerId) -> bool {
        self.state.lock().handlers.contains_key(&id)
    }

    /// Ids of every registered handler, sorted.
    pub fn handler_ids(&self) -> Vec<HandlerId> {
        let mut ids: Vec<_> = self.state.lock().handlers.keys().copied().collect();
        ids.sort();
        ids
    }
}

fn shadowed() -> Outcome {
    Outcome::Failure(FailureReason::ShadowedByOtherService)
}

/// Patterns in declaration order without repeats.
fn unique(patterns: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(patterns.len());
    for p in patterns {
        if !out.contains(p) {
            out.push(p.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Probe {
        id: u64,
        rank: i32,
        patterns: Vec<String>,
        name: Option<&'static str>,
        fail: AtomicBool,
        inits: AtomicUsize,
        disposals: AtomicUsize,
    }

    impl Probe {
        fn new(id: u64, rank: i32, patterns: &[&str]) -> Arc<Self> {
            Arc::new(Self::build(id, rank, patterns, None))
        }

        fn named(id: u64, rank: i32, patterns: &[&str], name: &'static str) -> Arc<Self> {
            Arc::new(Self::build(id, rank, patterns, Some(name)))
        }

        fn build(id: u64, rank: i32, patterns: &[&str], name: Option<&'static str>) -> Self {
            Self {
                id,
                rank,
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
                name,
                fail: AtomicBool::new(false),
                inits: AtomicUsize::new(0),
                disposals: AtomicUsize::new(0),
            }
        }
    }

    impl Handler for Probe {
        fn id(&self) -> HandlerId {
            HandlerId(self.id)
        }
        fn patterns(&self) -> Option<&[String]> {
            Some(&self.patterns)
        }
        fn name(&self) -> Option<&str> {
            self.name
        }
        fn rank(&self) -> i32 {
            self.rank
        }
        fn init(&self) -> Result<(), FailureReason> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(FailureReason::ExceptionOnInit)
            } else {
                Ok(())
            }
        }
        fn dispose(&self) {
            self.disposals.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_add_without_patterns_is_noop() {
        let registry: Registry<Probe> = Registry::new();
        registry.add(Probe::new(1, 0, &[]));
        assert!(registry.status().is_empty());
        assert!(!registry.is_registered(HandlerId(1)));
    }

    #[test]
    fn test_lower_priority_never_initialized_when_shadowed() {
        let registry: Registry<Probe> = Registry::new();
        let high = Probe::new(1, 10, &["/a"]);
        let low = Probe::new(2, 1, &["/a"]);
        registry.add(high.clone());
        registry.add(low.clone());

        assert_eq!(low.inits.load(Ordering::SeqCst), 0);
        assert_eq!(registry.mappings(), vec![("/a".to_string(), HandlerId(1))]);
        assert_eq!(registry.shadowed()["/a"], vec![HandlerId(2)]);
    }

    #[test]
    fn test_invalid_pattern_skips_init() {
        let registry: Registry<Probe> = Registry::new();
        let h = Probe::new(1, 0, &["bad", "/good"]);
        registry.add(h.clone());

        let status = registry.status_of(HandlerId(1)).unwrap();
        assert_eq!(status.get("bad"), Some(Outcome::Failure(FailureReason::ValidationFailed)));
        assert_eq!(status.get("/good"), Some(Outcome::Success));
        assert_eq!(h.inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_patterns_collapse() {
        let registry: Registry<Probe> = Registry::new();
        registry.add(Probe::new(1, 0, &["/a", "/a"]));
        assert!(registry.shadowed().is_empty());
        assert_eq!(registry.status_of(HandlerId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_readd_replaces_previous_registration() {
        let registry: Registry<Probe> = Registry::new();
        let first = Probe::new(1, 0, &["/a"]);
        first.fail.store(true, Ordering::SeqCst);
        registry.add(first.clone());
        assert!(registry.resolve("/a").is_none());

        let second = Probe::new(1, 0, &["/a"]);
        registry.add(second.clone());
        assert_eq!(first.disposals.load(Ordering::SeqCst), 1);
        assert_eq!(registry.resolve("/a").unwrap().handler().id(), HandlerId(1));
        assert_eq!(registry.status_of(HandlerId(1)).unwrap().get("/a"), Some(Outcome::Success));
    }

    #[test]
    fn test_name_follows_activation() {
        let registry: Registry<Probe> = Registry::new();
        let low = Probe::named(1, 1, &["/a"], "svc");
        let high = Probe::named(2, 5, &["/a"], "svc");
        registry.add(low.clone());
        assert_eq!(registry.resolve_by_name("svc").unwrap().id(), HandlerId(1));

        registry.add(high.clone());
        assert_eq!(registry.resolve_by_name("svc").unwrap().id(), HandlerId(2));

        registry.remove(HandlerId(2));
        assert_eq!(registry.resolve_by_name("svc").unwrap().id(), HandlerId(1));

        registry.remove(HandlerId(1));
        assert!(registry.resolve_by_name("svc").is_none());
    }

    #[test]
    fn test_highest_first_failover() {
        let registry: Registry<Probe> = Registry::with_failover_order(FailoverOrder::HighestFirst);
        registry.add(Probe::new(3, 3, &["/foo"]));
        registry.add(Probe::new(1, 1, &["/foo"]));
        registry.add(Probe::new(2, 2, &["/foo"]));

        registry.remove(HandlerId(3));
        assert_eq!(registry.resolve("/foo").unwrap().handler().id(), HandlerId(2));
        assert_eq!(registry.shadowed()["/foo"], vec![HandlerId(1)]);
    }
}
