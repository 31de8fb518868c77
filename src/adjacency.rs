//! Adjacency & Covered-Edges Indices (component B, §4.B).
//!
//! Both indices are pure derivations maintained incrementally alongside the
//! entity store — never recomputed from scratch on a hot path. Reverse
//! lookup (edge -> covering hyperedge) is rare per spec; `covering_of` is a
//! second map kept in step with `covered_by` so `covering_hyperedge_of` is
//! O(1) instead of a scan.

use crate::id::EntityId;
use crate::model::EdgeRef;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};

/// endpoint-id -> set of incident edges (Graph and Hyper mixed, per §9's
/// tagged-union requirement).
#[derive(Debug, Default)]
pub struct AdjacencyIndex {
    incident: HashMap<EntityId, HashSet<EdgeRef>>,
}

impl AdjacencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_graph_edge(&mut self, id: &EntityId, source: &EntityId, target: &EntityId) {
        self.incident.entry(source.clone()).or_default().insert(EdgeRef::Graph(id.clone()));
        self.incident.entry(target.clone()).or_default().insert(EdgeRef::Graph(id.clone()));
    }

    pub fn remove_graph_edge(&mut self, id: &EntityId, source: &EntityId, target: &EntityId) {
        self.remove_ref(source, &EdgeRef::Graph(id.clone()));
        self.remove_ref(target, &EdgeRef::Graph(id.clone()));
    }

    pub fn insert_hyperedge(&mut self, id: &EntityId, source: &EntityId, target: &EntityId) {
        self.incident.entry(source.clone()).or_default().insert(EdgeRef::Hyper(id.clone()));
        self.incident.entry(target.clone()).or_default().insert(EdgeRef::Hyper(id.clone()));
    }

    pub fn remove_hyperedge(&mut self, id: &EntityId, source: &EntityId, target: &EntityId) {
        self.remove_ref(source, &EdgeRef::Hyper(id.clone()));
        self.remove_ref(target, &EdgeRef::Hyper(id.clone()));
    }

    fn remove_ref(&mut self, endpoint: &EntityId, edge_ref: &EdgeRef) {
        if let Some(set) = self.incident.get_mut(endpoint) {
            set.remove(edge_ref);
            if set.is_empty() {
                self.incident.remove(endpoint);
            }
        }
    }

    /// All edges (Graph or Hyper) incident to `id`, in no particular order.
    pub fn incident_to(&self, id: &EntityId) -> impl Iterator<Item = &EdgeRef> {
        self.incident.get(id).into_iter().flatten()
    }
}

/// hyperedge id -> ordered set of Graph-edge ids it currently represents.
/// Treated as the single source of truth for which original edges are
/// hidden behind which hyperedge (§9 "Covered-edges index, not inline").
#[derive(Debug, Default)]
pub struct CoveredEdgesIndex {
    covered_by: HashMap<EntityId, IndexSet<EntityId>>,
    /// reverse map, maintained alongside for O(1) "is this edge covered"
    /// and "by whom" queries; the spec allows this lookup to be computed
    /// on demand, but maintaining it costs nothing extra here since every
    /// mutation already touches both sides.
    covering_of: HashMap<EntityId, EntityId>,
}

impl CoveredEdgesIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register that `hyperedge` covers `edges`, replacing any covering set
    /// it already had. `create_or_merge_hyperedge` relies on this to extend
    /// an existing hyperedge's coverage, not just to cover a fresh one.
    pub fn cover(&mut self, hyperedge: EntityId, edges: impl IntoIterator<Item = EntityId>) {
        let set: IndexSet<EntityId> = edges.into_iter().collect();
        for edge in &set {
            self.covering_of.insert(edge.clone(), hyperedge.clone());
        }
        self.covered_by.insert(hyperedge, set);
    }

    /// Release a hyperedge's covering, returning the edges it used to
    /// cover so the caller can decide whether to un-hide or re-cover them.
    pub fn release(&mut self, hyperedge: &EntityId) -> IndexSet<EntityId> {
        let set = self.covered_by.remove(hyperedge).unwrap_or_default();
        for edge in &set {
            self.covering_of.remove(edge);
        }
        set
    }

    pub fn covered_edges(&self, hyperedge: &EntityId) -> Option<&IndexSet<EntityId>> {
        self.covered_by.get(hyperedge)
    }

    pub fn covering_hyperedge_of(&self, edge: &EntityId) -> Option<&EntityId> {
        self.covering_of.get(edge)
    }

    pub fn is_covered(&self, edge: &EntityId) -> bool {
        self.covering_of.contains_key(edge)
    }

    pub fn all_covered(&self) -> impl Iterator<Item = &EntityId> {
        self.covering_of.keys()
    }

    pub fn hyperedges(&self) -> impl Iterator<Item = &EntityId> {
        self.covered_by.keys()
    }
}
