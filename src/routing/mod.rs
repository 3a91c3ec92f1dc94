//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (add):
//!     Handler (patterns, priority)
//!     → registry.rs (per pattern: free, contested, or shadowed)
//!     → matcher.rs (compile pattern, only when activating)
//!     → router.rs (insert live Registration)
//!     → status.rs (record outcome per pattern)
//!
//! Deregistration (remove):
//!     → registry.rs (drop active registration)
//!     → shadow.rs (pop waiting handlers until one activates)
//!     → Handler::dispose
//!
//! Incoming Request (path)
//!     → router.rs (longest matching pattern)
//!     → Return: PathResolution or NoMatch
//! ```
//!
//! # Design Decisions
//! - Registrations change at runtime; lookups never take the write lock
//! - One active handler per pattern; losers wait in priority order
//! - Deterministic: equal-length matches go to the earliest activation

pub mod handler;
pub mod matcher;
pub mod names;
pub mod registry;
pub mod router;
pub mod shadow;
pub mod status;

pub use handler::{FailureReason, Handler, HandlerId, Outcome, Priority};
pub use matcher::{InvalidPatternError, PathPattern};
pub use registry::Registry;
pub use router::{PathResolution, Registration};
pub use shadow::FailoverOrder;
pub use status::StatusRecord;
