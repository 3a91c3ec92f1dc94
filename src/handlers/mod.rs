//! Concrete handlers served by the HTTP layer.
//!
//! # Data Flow
//! ```text
//! [[handlers]] in config / POST /admin/handlers
//!     → ResponseHandler (response.rs)
//!     → Registry::add
//!
//! Config reload:
//!     previous [[handlers]] vs next [[handlers]]
//!     → removed ids: Registry::remove
//!     → new or changed ids: Registry::add (replaces the old registration)
//!     → unchanged ids: left alone
//! ```

pub mod response;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::HandlerConfig;
use crate::routing::{HandlerId, Registry};

pub use response::ResponseHandler;

/// Registry specialised to the handlers the server can serve.
pub type HandlerRegistry = Registry<ResponseHandler>;

/// What a reload changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

/// Bring the registry from `previous` to `next` handler definitions.
pub fn sync_handlers(
    registry: &HandlerRegistry,
    previous: &[HandlerConfig],
    next: &[HandlerConfig],
) -> SyncSummary {
    let mut summary = SyncSummary::default();
    let next_by_id: HashMap<u64, &HandlerConfig> = next.iter().map(|h| (h.id, h)).collect();
    let prev_by_id: HashMap<u64, &HandlerConfig> = previous.iter().map(|h| (h.id, h)).collect();

    for old in previous {
        if !next_by_id.contains_key(&old.id) {
            registry.remove(HandlerId(old.id));
            summary.removed += 1;
        }
    }

    for new in next {
        if prev_by_id.get(&new.id) == Some(&new) {
            summary.unchanged += 1;
            continue;
        }
        registry.add(Arc::new(ResponseHandler::new(new.clone())));
        summary.added += 1;
    }

    tracing::info!(
        added = summary.added,
        removed = summary.removed,
        unchanged = summary.unchanged,
        "Handlers synchronized"
    );
    summary
}
