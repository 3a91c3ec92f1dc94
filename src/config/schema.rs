//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::FailoverOrder;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Registry behaviour.
    pub registry: RegistryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Handlers registered at startup and on every reload.
    pub handlers: Vec<HandlerConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Registry configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Which shadowed handler is promoted first when the active one is
    /// removed. `lowest_first` keeps the historical behaviour.
    pub failover_order: FailoverOrder,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// A handler serving a fixed response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HandlerConfig {
    /// Unique handler identifier.
    pub id: u64,

    /// Logical name for by-name lookup.
    #[serde(default)]
    pub name: Option<String>,

    /// Ranking against competing handlers (higher wins).
    #[serde(default)]
    pub rank: i32,

    /// Path patterns to serve.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// HTTP status code of the response.
    #[serde(default = "default_status")]
    pub status: u16,

    /// Content-Type header of the response.
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Inline response body.
    #[serde(default)]
    pub body: Option<String>,

    /// File read at activation and served as the body.
    #[serde(default)]
    pub body_file: Option<String>,
}

fn default_status() -> u16 {
    200
}

fn default_content_type() -> String {
    "text/plain; charset=utf-8".to_string()
}

impl HandlerConfig {
    /// Minimal handler with an inline body.
    pub fn new(id: u64, patterns: &[&str], body: &str) -> Self {
        Self {
            id,
            name: None,
            rank: 0,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            status: default_status(),
            content_type: default_content_type(),
            body: Some(body.to_string()),
            body_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.registry.failover_order, FailoverOrder::LowestFirst);
    }

    #[test]
    fn test_handler_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [registry]
            failover_order = "highest_first"

            [[handlers]]
            id = 1
            patterns = ["/docs/*"]
            body = "docs"
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.failover_order, FailoverOrder::HighestFirst);
        let h = &config.handlers[0];
        assert_eq!(h.status, 200);
        assert_eq!(h.rank, 0);
        assert!(h.content_type.starts_with("text/plain"));
        assert_eq!(h, &HandlerConfig::new(1, &["/docs/*"], "docs"));
    }
}
