//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Register handlers → Start listeners → Watch config
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → servers drain → reload loop exits
//! ```
//!
//! # Design Decisions
//! - Registered handlers are not disposed on shutdown; the process exits

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
