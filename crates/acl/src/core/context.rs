//! Caller context
//!
//! Identity of an already-authenticated caller, plus tracing metadata.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Authenticated caller of an access-control operation
///
/// Authentication happens upstream; this crate only reads `actor`.
///
/// # Examples
///
/// ```
/// use credgate_acl::CallerContext;
///
/// let ctx = CallerContext::new("uaa-user:alice");
/// assert_eq!(ctx.actor, "uaa-user:alice");
/// ```
#[derive(Debug, Clone)]
pub struct CallerContext {
    /// Actor identifier of the caller
    pub actor: String,

    /// Trace ID for distributed tracing
    pub trace_id: Uuid,

    /// Timestamp of the request
    pub timestamp: DateTime<Utc>,
}

impl CallerContext {
    /// Create new context for an actor
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            trace_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }

    /// Set trace ID for this context (builder pattern)
    pub fn with_trace_id(mut self, trace_id: Uuid) -> Self {
        self.trace_id = trace_id;
        self
    }
}
