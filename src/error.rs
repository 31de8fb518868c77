//! Error taxonomy for the graph state core (§7, §4.H).
//!
//! Every fallible public operation returns `Result<T, GraphStateError>`.
//! There is deliberately no `From<anyhow::Error>` or catch-all variant:
//! callers need to match on kind to decide whether to show a dialog, retry,
//! or treat the call as a no-op.

use crate::id::EntityId;
use thiserror::Error;

/// A single invariant violation found by the validator (§3, invariants 1-8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Which of invariants 1-8 (§3) this violates.
    pub invariant: u8,
    pub message: String,
}

impl Violation {
    pub fn new(invariant: u8, message: impl Into<String>) -> Self {
        Violation { invariant, message: message.into() }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invariant {}: {}", self.invariant, self.message)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphStateError {
    /// Creating an edge whose source or target does not exist, or any other
    /// structurally malformed argument to a mutation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A caller attempted to create a hyperedge directly through the public
    /// API. Hyperedges are system-managed and only ever produced by collapse.
    #[error("hyperedges cannot be created directly; they are produced by collapse")]
    HyperedgeCreationForbidden,

    /// The post-mutation validator found one or more violations of
    /// invariants 1-8. Carries every violation found, not just the first.
    #[error("{} invariant violation(s) found", .violations.len())]
    InvariantViolation { violations: Vec<Violation> },

    /// Operating on an entity id that does not exist in the store, in a
    /// context where the operation cannot be treated as a no-op (e.g.
    /// collapsing a container that was never created).
    #[error("no such entity: {0}")]
    NotFound(EntityId),

    /// The same visual-channel tag value was declared under more than one
    /// channel in a style configuration (§3.1, §4.J).
    #[error("{} semantic conflict(s) in style config: {}", .conflicts.len(), .conflicts.join("; "))]
    SemanticConflict { conflicts: Vec<String> },
}

impl GraphStateError {
    pub fn invariant_violation(violations: Vec<Violation>) -> Self {
        GraphStateError::InvariantViolation { violations }
    }

    /// Every individual violation message, one per line, for the single
    /// aggregated dialog the UI shell is expected to show (§7).
    pub fn aggregated_message(&self) -> String {
        match self {
            GraphStateError::InvariantViolation { violations } => violations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }
}
