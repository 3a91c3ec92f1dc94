//! Lookup of handlers by logical name.
//!
//! # Responsibilities
//! - Keep, per name, every registered handler carrying that name
//! - Track whether each entry currently serves at least one pattern
//!
//! # Design Decisions
//! - Each name queue is sorted by priority descending (head = strongest)
//! - Lookup only inspects the head; an inactive head hides the name even
//!   if a later entry is active
//! - The registry flips the active flag; callers never do

use std::sync::Arc;

use dashmap::DashMap;

use crate::routing::handler::{Handler, HandlerId};

#[derive(Debug)]
struct NameEntry<H: ?Sized> {
    handler: Arc<H>,
    active: bool,
}

/// Handlers indexed by name.
#[derive(Debug)]
pub struct NameIndex<H: ?Sized> {
    names: DashMap<String, Vec<NameEntry<H>>>,
}

impl<H: ?Sized> Default for NameIndex<H> {
    fn default() -> Self {
        Self { names: DashMap::new() }
    }
}

impl<H: Handler + ?Sized> NameIndex<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler under its name. No-op for unnamed handlers.
    pub fn insert(&self, handler: Arc<H>, active: bool) {
        let Some(name) = handler.name().map(str::to_string) else {
            return;
        };
        let priority = handler.priority();
        let mut entries = self.names.entry(name).or_default();
        let idx = entries.partition_point(|e| e.handler.priority() > priority);
        entries.insert(idx, NameEntry { handler, active });
    }

    /// Remove the entry for `id` under `name`, dropping empty names.
    pub fn remove(&self, name: &str, id: HandlerId) {
        let now_empty = match self.names.get_mut(name) {
            Some(mut entries) => {
                entries.retain(|e| e.handler.id() != id);
                entries.is_empty()
            }
            None => return,
        };
        if now_empty {
            self.names.remove_if(name, |_, entries| entries.is_empty());
        }
    }

    pub fn set_active(&self, name: &str, id: HandlerId, active: bool) {
        if let Some(mut entries) = self.names.get_mut(name) {
            if let Some(entry) = entries.iter_mut().find(|e| e.handler.id() == id) {
                entry.active = active;
            }
        }
    }

    /// The head handler for `name`, if it is active.
    pub fn resolve(&self, name: &str) -> Option<Arc<H>> {
        let entries = self.names.get(name)?;
        let head = entries.first()?;
        head.active.then(|| head.handler.clone())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
