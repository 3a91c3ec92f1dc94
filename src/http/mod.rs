//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → Registry::resolve (longest matching pattern)
//!     → ResponseHandler::respond
//!     → Send to client
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
