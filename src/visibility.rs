//! Visibility Manager (component C, §4.C): derives and incrementally
//! updates the `visible*` caches from current entity-store state.
//!
//! This module is policy-free by design (§4.C: "The manager does not
//! enforce policy; D calls into it to express the policy"). It exposes
//! `on_*_changed` entry points that recompute exactly the cache entries
//! that could have been affected by one flag flip, plus `rebuild` for
//! bootstrapping or for the validator's independent re-derivation.

use crate::adjacency::AdjacencyIndex;
use crate::id::EntityId;
use crate::model::EdgeRef;
use crate::store::EntityStore;
use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct VisibilityCache {
    pub nodes: HashSet<EntityId>,
    pub containers: HashSet<EntityId>,
    pub edges: HashSet<EntityId>,
    pub hyperedges: HashSet<EntityId>,
}

impl VisibilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of visible Graph-edges and visible hyperedges (§3 "Derived
    /// caches").
    pub fn visible_edges_union(&self) -> impl Iterator<Item = &EntityId> {
        self.edges.iter().chain(self.hyperedges.iter())
    }

    pub(crate) fn is_vertex_visible(&self, id: &EntityId) -> bool {
        self.nodes.contains(id) || self.containers.contains(id)
    }
}

/// Full rebuild from scratch. O(entities + edges); used at construction
/// time and by the validator, never on the hot incremental path.
pub fn rebuild(store: &EntityStore) -> VisibilityCache {
    let mut cache = VisibilityCache::new();

    for node in store.all_nodes() {
        if !node.hidden {
            cache.nodes.insert(node.id.clone());
        }
    }
    for container in store.all_containers() {
        if !container.hidden {
            cache.containers.insert(container.id.clone());
        }
    }
    for edge in store.all_edges() {
        if !edge.hidden && cache.is_vertex_visible(&edge.source) && cache.is_vertex_visible(&edge.target) {
            cache.edges.insert(edge.id.clone());
        }
    }
    for hyperedge in store.all_hyperedges() {
        if cache.is_vertex_visible(&hyperedge.source) && cache.is_vertex_visible(&hyperedge.target) {
            cache.hyperedges.insert(hyperedge.id.clone());
        }
    }

    cache
}

fn recompute_graph_edge(store: &EntityStore, cache: &mut VisibilityCache, id: &EntityId) {
    let Some(edge) = store.edge(id) else {
        cache.edges.remove(id);
        return;
    };
    let visible = !edge.hidden && cache.is_vertex_visible(&edge.source) && cache.is_vertex_visible(&edge.target);
    if visible {
        cache.edges.insert(id.clone());
    } else {
        cache.edges.remove(id);
    }
}

fn recompute_hyperedge(store: &EntityStore, cache: &mut VisibilityCache, id: &EntityId) {
    let Some(hyperedge) = store.hyperedge(id) else {
        cache.hyperedges.remove(id);
        return;
    };
    let visible = !hyperedge.hidden
        && cache.is_vertex_visible(&hyperedge.source)
        && cache.is_vertex_visible(&hyperedge.target);
    if visible {
        cache.hyperedges.insert(id.clone());
    } else {
        cache.hyperedges.remove(id);
    }
}

/// Re-check every edge/hyperedge incident to `vertex` after its own
/// visibility flag changed. O(degree(vertex)).
fn recompute_incident(store: &EntityStore, adjacency: &AdjacencyIndex, cache: &mut VisibilityCache, vertex: &EntityId) {
    let incident: Vec<EdgeRef> = adjacency.incident_to(vertex).cloned().collect();
    for edge_ref in incident {
        match edge_ref {
            EdgeRef::Graph(id) => recompute_graph_edge(store, cache, &id),
            EdgeRef::Hyper(id) => recompute_hyperedge(store, cache, &id),
        }
    }
}

/// Entry point: a node's `hidden` flag was just flipped in the store.
pub fn on_node_changed(store: &EntityStore, adjacency: &AdjacencyIndex, cache: &mut VisibilityCache, id: &EntityId) {
    match store.node(id) {
        Some(node) if !node.hidden => {
            cache.nodes.insert(id.clone());
        }
        _ => {
            cache.nodes.remove(id);
        }
    }
    recompute_incident(store, adjacency, cache, id);
}

/// Entry point: a container's `hidden` flag was just flipped in the store.
/// Does not cascade to children — the caller (component D) is responsible
/// for visiting the subtree and calling this once per affected entity.
pub fn on_container_changed(
    store: &EntityStore,
    adjacency: &AdjacencyIndex,
    cache: &mut VisibilityCache,
    id: &EntityId,
) {
    match store.container(id) {
        Some(container) if !container.hidden => {
            cache.containers.insert(id.clone());
        }
        _ => {
            cache.containers.remove(id);
        }
    }
    recompute_incident(store, adjacency, cache, id);
}

/// Entry point: a Graph-edge's own `hidden` flag was just flipped.
pub fn on_edge_changed(store: &EntityStore, cache: &mut VisibilityCache, id: &EntityId) {
    recompute_graph_edge(store, cache, id);
}

/// Entry point: a hyperedge was just inserted or its endpoints changed
/// visibility. Hyperedges are never individually hidden by the caller
/// (§3), so this only ever reacts to endpoint visibility.
pub fn on_hyperedge_changed(store: &EntityStore, cache: &mut VisibilityCache, id: &EntityId) {
    recompute_hyperedge(store, cache, id);
}

/// Entry point: a hyperedge was removed from the store. Drop it from the
/// cache directly rather than looking it up (it is already gone).
pub fn on_hyperedge_removed(cache: &mut VisibilityCache, id: &EntityId) {
    cache.hyperedges.remove(id);
}

/// Entry point: a Graph-edge was removed from the store.
pub fn on_edge_removed(cache: &mut VisibilityCache, id: &EntityId) {
    cache.edges.remove(id);
}
