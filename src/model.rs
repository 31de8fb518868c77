//! Entity records for the five kinds in the data model (§3).

use crate::id::EntityId;
use serde::{Deserialize, Serialize};

/// A caller-created graph node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: EntityId,
    pub label: String,
    pub hidden: bool,
    /// Free-form semantic tags (not interpreted by the core beyond §4.E).
    pub tags: Vec<String>,
    pub position: Option<(f64, f64)>,
    pub dimensions: Option<(f64, f64)>,
}

impl Node {
    pub fn new(id: impl Into<EntityId>, label: impl Into<String>) -> Self {
        Node {
            id: id.into(),
            label: label.into(),
            hidden: false,
            tags: Vec::new(),
            position: None,
            dimensions: None,
        }
    }
}

/// A caller-created container: a named, orderable group of nodes and/or
/// other containers that can be collapsed into a single opaque vertex.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Container {
    pub id: EntityId,
    pub label: String,
    pub collapsed: bool,
    pub hidden: bool,
    /// Insertion-ordered, duplicate-free children. Order matters for
    /// downstream layout and for the recursion tie-break of §4.D.1 step 1.
    pub children: indexmap::IndexSet<EntityId>,
    pub parent: Option<EntityId>,
    pub position: Option<(f64, f64)>,
    pub dimensions: Option<(f64, f64)>,
}

impl Container {
    pub fn new(id: impl Into<EntityId>, label: impl Into<String>) -> Self {
        Container {
            id: id.into(),
            label: label.into(),
            collapsed: false,
            hidden: false,
            children: indexmap::IndexSet::new(),
            parent: None,
            position: None,
            dimensions: None,
        }
    }
}

/// A caller-created directed edge between two existing entities (node or
/// container). Endpoints are validated to exist at insertion time by the
/// facade (§4.G), not by this record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub id: EntityId,
    pub source: EntityId,
    pub target: EntityId,
    pub hidden: bool,
    /// Semantic tags drawn from the visual-channel vocabulary (§3.1).
    pub tags: Vec<String>,
}

impl GraphEdge {
    pub fn new(id: impl Into<EntityId>, source: impl Into<EntityId>, target: impl Into<EntityId>) -> Self {
        GraphEdge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            hidden: false,
            tags: Vec::new(),
        }
    }
}

/// A system-created aggregate edge, produced only during collapse. Always
/// visible the instant it exists (`hidden` is kept only for symmetry with
/// `GraphEdge` so the two can share validator logic).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hyperedge {
    pub id: EntityId,
    pub source: EntityId,
    pub target: EntityId,
    pub tags: Vec<String>,
    pub hidden: bool,
}

impl Hyperedge {
    pub fn new(source: EntityId, target: EntityId, tags: Vec<String>) -> Self {
        let id = EntityId::hyperedge_id(&source, &target);
        Hyperedge { id, source, target, tags, hidden: false }
    }
}

/// A coarse directional hint for which side of an endpoint an edge should
/// attach to, derived from the two endpoints' relative layout position
/// (§6). Handle selection itself is a renderer concern; this is only the
/// positional input to that decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleHint {
    Top,
    Right,
    Bottom,
    Left,
}

/// A tagged union over the two edge kinds, used at the adjacency index and
/// everywhere else an id could be either, so the two are never silently
/// mixed (§9 "Dynamic typing removal").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EdgeRef {
    Graph(EntityId),
    Hyper(EntityId),
}

impl EdgeRef {
    pub fn id(&self) -> &EntityId {
        match self {
            EdgeRef::Graph(id) | EdgeRef::Hyper(id) => id,
        }
    }

    pub fn is_hyper(&self) -> bool {
        matches!(self, EdgeRef::Hyper(_))
    }
}

/// A resolved edge of either kind, returned by query methods that expose
/// both uniformly (e.g. `visibleEdges`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Edge {
    Graph(GraphEdge),
    Hyper(Hyperedge),
}

impl Edge {
    pub fn id(&self) -> &EntityId {
        match self {
            Edge::Graph(e) => &e.id,
            Edge::Hyper(e) => &e.id,
        }
    }

    pub fn source(&self) -> &EntityId {
        match self {
            Edge::Graph(e) => &e.source,
            Edge::Hyper(e) => &e.source,
        }
    }

    pub fn target(&self) -> &EntityId {
        match self {
            Edge::Graph(e) => &e.target,
            Edge::Hyper(e) => &e.target,
        }
    }

    pub fn hidden(&self) -> bool {
        match self {
            Edge::Graph(e) => e.hidden,
            Edge::Hyper(e) => e.hidden,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Edge::Graph(e) => &e.tags,
            Edge::Hyper(e) => &e.tags,
        }
    }
}
