//! Opaque entity identifiers shared by every entity kind in the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// An opaque, caller-assigned identifier. Unique across the whole store,
/// not namespaced per entity kind — a node, a container, and an edge can
/// never share an id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(Arc<str>);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the canonical hyperedge id for a directed pair of endpoints.
    pub fn hyperedge_id(from: &EntityId, to: &EntityId) -> EntityId {
        EntityId::from(format!("hyper_{}_to_{}", from.as_str(), to.as_str()))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId(Arc::from(s))
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId(Arc::from(s.as_str()))
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
