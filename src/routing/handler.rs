//! Handler capability consumed by the registry.
//!
//! # Responsibilities
//! - Define the `Handler` trait (identity, priority, patterns, lifecycle)
//! - Define the total order used to arbitrate contested patterns
//! - Define the outcome codes recorded in the status ledger
//!
//! # Design Decisions
//! - Priority is a plain `Ord` value, not a comparator object
//! - Equal ranks are broken by identity: the lower id wins
//! - `dispose` must be idempotent (an evicted handler is disposed on
//!   eviction and again on removal)

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerId(pub u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for HandlerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Ranking of a handler when several compete for the same pattern.
///
/// Greater wins. Higher `rank` is greater; for equal ranks the handler with
/// the lower id is greater, so the earlier registrant keeps the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Priority {
    pub rank: i32,
    pub id: HandlerId,
}

impl Priority {
    pub fn new(rank: i32, id: HandlerId) -> Self {
        Self { rank, id }
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Why a handler does not serve a pattern it asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Unknown,
    ExceptionOnInit,
    ServiceNotGettable,
    ShadowedByOtherService,
    ValidationFailed,
    ServiceInUse,
}

impl FailureReason {
    /// Numeric reporting code.
    pub fn code(self) -> i32 {
        match self {
            FailureReason::Unknown => 0,
            FailureReason::ExceptionOnInit => 1,
            FailureReason::ServiceNotGettable => 3,
            FailureReason::ShadowedByOtherService => 5,
            FailureReason::ValidationFailed => 6,
            FailureReason::ServiceInUse => 7,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureReason::Unknown => "unknown failure",
            FailureReason::ExceptionOnInit => "exception on init",
            FailureReason::ServiceNotGettable => "service not gettable",
            FailureReason::ShadowedByOtherService => "shadowed by other service",
            FailureReason::ValidationFailed => "validation failed",
            FailureReason::ServiceInUse => "service in use",
        };
        f.write_str(s)
    }
}

/// Result of a handler's request for one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure(FailureReason),
}

impl Outcome {
    pub const SUCCESS_CODE: i32 = -1;

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn code(&self) -> i32 {
        match self {
            Outcome::Success => Self::SUCCESS_CODE,
            Outcome::Failure(reason) => reason.code(),
        }
    }

    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure(FailureReason::ShadowedByOtherService) => "shadowed",
            Outcome::Failure(_) => "failure",
        }
    }
}

impl From<Result<(), FailureReason>> for Outcome {
    fn from(res: Result<(), FailureReason>) -> Self {
        match res {
            Ok(()) => Outcome::Success,
            Err(reason) => Outcome::Failure(reason),
        }
    }
}

/// A servable unit that can own path patterns.
///
/// The registry never creates or destroys the resource behind a handler;
/// it only calls `init` when the handler is about to serve a pattern and
/// `dispose` when it stops serving.
pub trait Handler: Send + Sync + fmt::Debug {
    /// Stable identity, unique among registered handlers.
    fn id(&self) -> HandlerId;

    /// Patterns this handler wants to own. `None` for handlers that are
    /// not path-addressable.
    fn patterns(&self) -> Option<&[String]>;

    /// Logical name for by-name lookup.
    fn name(&self) -> Option<&str> {
        None
    }

    fn rank(&self) -> i32 {
        0
    }

    fn priority(&self) -> Priority {
        Priority::new(self.rank(), self.id())
    }

    /// Prepare to serve. Called once per activation attempt.
    fn init(&self) -> Result<(), FailureReason>;

    /// Release the underlying resource. Must tolerate repeated calls.
    fn dispose(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_rank_wins() {
        let low = Priority::new(5, HandlerId(1));
        let high = Priority::new(10, HandlerId(2));
        assert!(high > low);
    }

    #[test]
    fn test_priority_tie_lower_id_wins() {
        let older = Priority::new(0, HandlerId(1));
        let newer = Priority::new(0, HandlerId(2));
        assert!(older > newer);
        assert_eq!(older.cmp(&older), Ordering::Equal);
    }

    #[test]
    fn test_outcome_codes() {
        assert_eq!(Outcome::Success.code(), -1);
        assert_eq!(Outcome::Failure(FailureReason::ShadowedByOtherService).code(), 5);
        assert_eq!(Outcome::from(Err(FailureReason::ExceptionOnInit)).code(), 1);
        assert!(Outcome::from(Ok(())).is_success());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&Outcome::Failure(FailureReason::ValidationFailed)).unwrap();
        assert_eq!(json, r#"{"outcome":"failure","reason":"validation_failed"}"#);
        let json = serde_json::to_string(&Outcome::Success).unwrap();
        assert_eq!(json, r#"{"outcome":"success"}"#);
    }
}
