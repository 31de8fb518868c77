//! Container Operations (component D, §4.D) — the hardest component.
//!
//! Collapse and expand are implemented as free functions over borrowed
//! store/index/cache state, following the same shape as `visibility.rs`,
//! since the recursive algorithms here need to mutate all three together.
//! Validation is not touched here: the public facade (component G) disables
//! it for the duration of a top-level call and runs it once on return.

use crate::adjacency::{AdjacencyIndex, CoveredEdgesIndex};
use crate::aggregation;
use crate::error::GraphStateError;
use crate::id::EntityId;
use crate::model::GraphEdge;
use crate::store::EntityStore;
use crate::style::ChannelRegistry;
use crate::visibility::{self, VisibilityCache};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Walks parent pointers; O(depth) (§4.D.4).
pub fn is_inside(store: &EntityStore, id: &EntityId, container_id: &EntityId) -> bool {
    let mut current = store.parent_of(id).cloned();
    while let Some(parent) = current {
        if &parent == container_id {
            return true;
        }
        current = store.parent_of(&parent).cloned();
    }
    false
}

/// The nearest ancestor of `id` (or `id` itself) that is currently visible
/// (§4.D.3).
pub fn lowest_visible_ancestor(store: &EntityStore, id: &EntityId) -> EntityId {
    if store.is_visible(id) {
        return id.clone();
    }
    let mut current = store.parent_of(id).cloned();
    while let Some(parent) = current {
        if store.is_visible(&parent) {
            return parent;
        }
        current = store.parent_of(&parent).cloned();
    }
    id.clone()
}

/// Graph-edges with exactly one endpoint inside `container_id`'s subtree.
pub fn crossing_edges(store: &EntityStore, container_id: &EntityId) -> Vec<EntityId> {
    store
        .all_edges()
        .filter(|edge| is_inside(store, &edge.source, container_id) != is_inside(store, &edge.target, container_id))
        .map(|edge| edge.id.clone())
        .collect()
}

fn in_subtree_or_self(store: &EntityStore, id: &EntityId, container_id: &EntityId) -> bool {
    id == container_id || is_inside(store, id, container_id)
}

/// Graph-edges that will never get a hyperedge when `container_id` is
/// collapsed: both endpoints inside its subtree (§9 Open Questions: "edges
/// whose endpoints are both inside the same collapsed container remain
/// hidden and uncovered"), or one endpoint is `container_id` itself — a
/// direct edge between an entity and its own container, the "self-
/// reference" case `build_outer_hyperedges` skips (§4.D.1 step 5). Either
/// way these edges still need their own `hidden` flag flipped on
/// collapse/expand, since no hyperedge will ever carry that for them.
fn interior_edges(store: &EntityStore, container_id: &EntityId) -> Vec<EntityId> {
    store
        .all_edges()
        .filter(|edge| {
            in_subtree_or_self(store, &edge.source, container_id) && in_subtree_or_self(store, &edge.target, container_id)
        })
        .map(|edge| edge.id.clone())
        .collect()
}

/// Collapse `container_id`: §4.D.1.
pub fn collapse(
    store: &mut EntityStore,
    adjacency: &mut AdjacencyIndex,
    covered: &mut CoveredEdgesIndex,
    cache: &mut VisibilityCache,
    registry: Option<&ChannelRegistry>,
    container_id: &EntityId,
) -> Result<(), GraphStateError> {
    let Some(container) = store.container(container_id) else {
        return Err(GraphStateError::NotFound(container_id.clone()));
    };
    if container.collapsed {
        tracing::trace!(container = %container_id, "collapse no-op: already collapsed");
        return Ok(());
    }

    tracing::debug!(container = %container_id, "collapsing container");
    let children: Vec<EntityId> = container.children.iter().cloned().collect();

    // Step 1: recursive child collapse, insertion order, before this
    // container's own crossing edges are computed.
    for child in &children {
        if store.container(child).is_some_and(|c| !c.collapsed) {
            collapse(store, adjacency, covered, cache, registry, child)?;
        }
    }

    // Step 2: hide direct children.
    for child in &children {
        if store.node_exists(child) {
            if let Some(node) = store.node_mut(child) {
                node.hidden = true;
            }
            visibility::on_node_changed(store, adjacency, cache, child);
        } else if store.container_exists(child) {
            if let Some(c) = store.container_mut(child) {
                c.hidden = true;
            }
            visibility::on_container_changed(store, adjacency, cache, child);
        }
    }

    // Step 3: hide every Graph-edge fully inside the subtree. Edges entirely
    // within one child's own subtree are already hidden by that child's
    // recursive collapse in step 1; this catches the rest (edges between
    // two different children of C).
    for edge_id in interior_edges(store, container_id) {
        let already_hidden = store.edge(&edge_id).is_some_and(|edge| edge.hidden);
        if already_hidden {
            continue;
        }
        if let Some(edge) = store.edge_mut(&edge_id) {
            edge.hidden = true;
        }
        visibility::on_edge_changed(store, cache, &edge_id);
    }

    // Step 4: any hyperedge incident to a now-hidden child is stale; drop it
    // and leave its covered edges hidden for step 5 to re-cover.
    for child in &children {
        purge_invalid_hyperedges_incident_to(store, adjacency, covered, cache, child);
    }

    // Step 5: construct outer hyperedges from the crossing edges of C.
    build_outer_hyperedges(store, adjacency, covered, cache, registry, container_id);

    // Step 6: mark collapsed; the container itself stays visible.
    if let Some(c) = store.container_mut(container_id) {
        c.collapsed = true;
    }
    visibility::on_container_changed(store, adjacency, cache, container_id);

    tracing::debug!(container = %container_id, "collapse complete");
    Ok(())
}

/// Shallow expand of `container_id`: §4.D.2.
pub fn expand(
    store: &mut EntityStore,
    adjacency: &mut AdjacencyIndex,
    covered: &mut CoveredEdgesIndex,
    cache: &mut VisibilityCache,
    registry: Option<&ChannelRegistry>,
    container_id: &EntityId,
) -> Result<(), GraphStateError> {
    let Some(container) = store.container(container_id) else {
        return Err(GraphStateError::NotFound(container_id.clone()));
    };
    if !container.collapsed {
        tracing::trace!(container = %container_id, "expand no-op: already expanded");
        return Ok(());
    }

    tracing::debug!(container = %container_id, "expanding container");

    // Step 1: mark expanded first; downstream checks test container state.
    if let Some(c) = store.container_mut(container_id) {
        c.collapsed = false;
    }

    // Step 2: an expanded container cannot be a hyperedge endpoint.
    let released = remove_hyperedges_with_endpoint(store, adjacency, covered, cache, container_id);

    // Step 3: un-hide direct children; child containers retain their own
    // `collapsed` state.
    let children: Vec<EntityId> = store.container(container_id).unwrap().children.iter().cloned().collect();
    for child in &children {
        if store.node_exists(child) {
            if let Some(node) = store.node_mut(child) {
                node.hidden = false;
            }
            visibility::on_node_changed(store, adjacency, cache, child);
        } else if store.container_exists(child) {
            if let Some(c) = store.container_mut(child) {
                c.hidden = false;
            }
            visibility::on_container_changed(store, adjacency, cache, child);
        }
    }

    // Step 4: restore crossing Graph-edges whose endpoints are now both
    // visible; leave the rest hidden for step 6 to re-cover.
    for edge_id in &released {
        let visible_now = store
            .edge(edge_id)
            .map(|edge| store.is_visible(&edge.source) && store.is_visible(&edge.target))
            .unwrap_or(false);
        if visible_now {
            if let Some(edge) = store.edge_mut(edge_id) {
                edge.hidden = false;
            }
            visibility::on_edge_changed(store, cache, edge_id);
        }
    }

    // Step 5: reveal interior Graph-edges (both endpoints inside C) whose
    // endpoints are now both visible; the rest stay hidden behind a still-
    // collapsed nested container.
    for edge_id in interior_edges(store, container_id) {
        let should_reveal = store
            .edge(&edge_id)
            .is_some_and(|edge| edge.hidden && store.is_visible(&edge.source) && store.is_visible(&edge.target));
        if should_reveal {
            if let Some(edge) = store.edge_mut(&edge_id) {
                edge.hidden = false;
            }
            visibility::on_edge_changed(store, cache, &edge_id);
        }
    }

    // Step 6: re-cover still-collapsed neighbors. Rather than walking
    // adjacency to pick out exactly the affected neighbors (ambiguous in
    // the source for the nested case — see DESIGN.md), recompute outer
    // hyperedges for every *visible* container still collapsed; a collapsed
    // container hidden under a different still-collapsed ancestor is not a
    // hyperedge endpoint candidate and must be skipped, or this creates a
    // hyperedge with a hidden endpoint and double-covers edges already
    // covered by the ancestor's own hyperedge.
    let collapsed_containers: Vec<EntityId> = store
        .all_containers()
        .filter(|c| c.collapsed && !c.hidden)
        .map(|c| c.id.clone())
        .collect();
    for collapsed_id in collapsed_containers {
        build_outer_hyperedges(store, adjacency, covered, cache, registry, &collapsed_id);
    }

    visibility::on_container_changed(store, adjacency, cache, container_id);

    tracing::debug!(container = %container_id, "expand complete");
    Ok(())
}

/// Recursive expand: §4.D.2.1. Expands `container_id`, then recurses into
/// every direct child container still collapsed after the shallow expand,
/// in insertion order.
pub fn expand_recursive(
    store: &mut EntityStore,
    adjacency: &mut AdjacencyIndex,
    covered: &mut CoveredEdgesIndex,
    cache: &mut VisibilityCache,
    registry: Option<&ChannelRegistry>,
    container_id: &EntityId,
) -> Result<(), GraphStateError> {
    expand(store, adjacency, covered, cache, registry, container_id)?;

    let Some(container) = store.container(container_id) else {
        return Ok(());
    };
    let children: Vec<EntityId> = container.children.iter().cloned().collect();
    for child in &children {
        if store.container(child).is_some_and(|c| c.collapsed) {
            expand_recursive(store, adjacency, covered, cache, registry, child)?;
        }
    }
    Ok(())
}

/// Find `container_id`'s crossing edges, group by direction and the lowest
/// visible ancestor of the external endpoint, and create or extend the
/// corresponding hyperedges (§4.D.1 step 5, reused by §4.D.2 step 6).
fn build_outer_hyperedges(
    store: &mut EntityStore,
    adjacency: &mut AdjacencyIndex,
    covered: &mut CoveredEdgesIndex,
    cache: &mut VisibilityCache,
    registry: Option<&ChannelRegistry>,
    container_id: &EntityId,
) {
    let mut outgoing: IndexMap<EntityId, Vec<EntityId>> = IndexMap::new();
    let mut incoming: IndexMap<EntityId, Vec<EntityId>> = IndexMap::new();

    for edge_id in crossing_edges(store, container_id) {
        let Some(edge) = store.edge(&edge_id) else { continue };
        let source_inside = is_inside(store, &edge.source, container_id);
        if source_inside {
            let ancestor = lowest_visible_ancestor(store, &edge.target);
            if &ancestor == container_id {
                continue; // self-reference, skip (§9 Open Questions)
            }
            outgoing.entry(ancestor).or_default().push(edge_id);
        } else {
            let ancestor = lowest_visible_ancestor(store, &edge.source);
            if &ancestor == container_id {
                continue;
            }
            incoming.entry(ancestor).or_default().push(edge_id);
        }
    }

    for (ancestor, edge_ids) in outgoing {
        create_or_merge_hyperedge(store, adjacency, covered, cache, registry, container_id, &ancestor, edge_ids);
    }
    for (ancestor, edge_ids) in incoming {
        create_or_merge_hyperedge(store, adjacency, covered, cache, registry, &ancestor, container_id, edge_ids);
    }
}

/// Create a new hyperedge for `from -> to`, or extend the existing one's
/// covered-edges set and recompute its aggregated tags (keeps P9 "no
/// duplicate hyperedges" true across repeated collapse/expand on
/// overlapping boundaries).
fn create_or_merge_hyperedge(
    store: &mut EntityStore,
    adjacency: &mut AdjacencyIndex,
    covered: &mut CoveredEdgesIndex,
    cache: &mut VisibilityCache,
    registry: Option<&ChannelRegistry>,
    from: &EntityId,
    to: &EntityId,
    new_edge_ids: Vec<EntityId>,
) {
    if new_edge_ids.is_empty() {
        return;
    }

    let hyperedge_id = match store.hyperedge_between(from, to) {
        Some(existing) => {
            let id = existing.id.clone();
            let mut all: Vec<EntityId> =
                covered.covered_edges(&id).map(|set| set.iter().cloned().collect()).unwrap_or_default();
            let mut seen: HashSet<EntityId> = all.iter().cloned().collect();
            for edge_id in &new_edge_ids {
                if seen.insert(edge_id.clone()) {
                    all.push(edge_id.clone());
                }
            }
            let refs: Vec<&GraphEdge> = all.iter().filter_map(|id| store.edge(id)).collect();
            let tags = aggregation::aggregate_tags(&refs, registry);
            if let Some(hyperedge) = store.hyperedge_mut(&id) {
                hyperedge.tags = tags;
            }
            covered.cover(id.clone(), all);
            id
        }
        None => {
            let refs: Vec<&GraphEdge> = new_edge_ids.iter().filter_map(|id| store.edge(id)).collect();
            let hyperedge = aggregation::build_hyperedge(from.clone(), to.clone(), &refs, registry);
            let id = hyperedge.id.clone();
            adjacency.insert_hyperedge(&id, from, to);
            store.insert_hyperedge(hyperedge);
            covered.cover(id.clone(), new_edge_ids.clone());
            tracing::debug!(source = %from, target = %to, "hyperedge created");
            id
        }
    };

    for edge_id in &new_edge_ids {
        if let Some(edge) = store.edge_mut(edge_id) {
            edge.hidden = true;
        }
        visibility::on_edge_changed(store, cache, edge_id);
    }
    visibility::on_hyperedge_changed(store, cache, &hyperedge_id);
}

/// Remove every hyperedge incident to `vertex` whose endpoints are no
/// longer both visible (collapse step 3).
fn purge_invalid_hyperedges_incident_to(
    store: &mut EntityStore,
    adjacency: &mut AdjacencyIndex,
    covered: &mut CoveredEdgesIndex,
    cache: &mut VisibilityCache,
    vertex: &EntityId,
) {
    let incident: Vec<EntityId> = adjacency.incident_to(vertex).filter(|r| r.is_hyper()).map(|r| r.id().clone()).collect();
    for hyperedge_id in incident {
        let Some(hyperedge) = store.hyperedge(&hyperedge_id) else { continue };
        if !store.is_visible(&hyperedge.source) || !store.is_visible(&hyperedge.target) {
            remove_hyperedge(store, adjacency, covered, cache, &hyperedge_id);
        }
    }
}

/// Unconditionally remove every hyperedge with an endpoint at `vertex`
/// (expand step 2: an expanded container can never be a hyperedge
/// endpoint). Returns the union of edges these hyperedges used to cover.
fn remove_hyperedges_with_endpoint(
    store: &mut EntityStore,
    adjacency: &mut AdjacencyIndex,
    covered: &mut CoveredEdgesIndex,
    cache: &mut VisibilityCache,
    vertex: &EntityId,
) -> Vec<EntityId> {
    let incident: Vec<EntityId> = adjacency.incident_to(vertex).filter(|r| r.is_hyper()).map(|r| r.id().clone()).collect();
    let mut released = Vec::new();
    for hyperedge_id in incident {
        released.extend(remove_hyperedge(store, adjacency, covered, cache, &hyperedge_id));
    }
    released
}

fn remove_hyperedge(
    store: &mut EntityStore,
    adjacency: &mut AdjacencyIndex,
    covered: &mut CoveredEdgesIndex,
    cache: &mut VisibilityCache,
    hyperedge_id: &EntityId,
) -> Vec<EntityId> {
    let Some(hyperedge) = store.remove_hyperedge(hyperedge_id) else {
        return Vec::new();
    };
    adjacency.remove_hyperedge(hyperedge_id, &hyperedge.source, &hyperedge.target);
    let released = covered.release(hyperedge_id);
    visibility::on_hyperedge_removed(cache, hyperedge_id);
    tracing::debug!(hyperedge = %hyperedge_id, "hyperedge destroyed");
    released.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, GraphEdge, Node};

    struct Fixture {
        store: EntityStore,
        adjacency: AdjacencyIndex,
        covered: CoveredEdgesIndex,
        cache: VisibilityCache,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                store: EntityStore::new(),
                adjacency: AdjacencyIndex::new(),
                covered: CoveredEdgesIndex::new(),
                cache: VisibilityCache::new(),
            }
        }

        fn add_node(&mut self, id: &str) {
            self.store.insert_node(Node::new(id, id));
            self.cache.nodes.insert(EntityId::from(id));
        }

        fn add_container(&mut self, id: &str, parent: Option<&str>, children: &[&str]) {
            let mut container = Container::new(id, id);
            for child in children {
                let child_id = EntityId::from(*child);
                container.children.insert(child_id.clone());
                self.store.attach_child(&EntityId::from(id), child_id);
            }
            self.store.insert_container(container);
            self.cache.containers.insert(EntityId::from(id));
            if let Some(p) = parent {
                self.store.attach_child(&EntityId::from(p), EntityId::from(id));
            }
        }

        fn add_edge(&mut self, id: &str, source: &str, target: &str) {
            let edge = GraphEdge::new(id, source, target);
            self.adjacency.insert_graph_edge(&edge.id, &edge.source, &edge.target);
            self.store.insert_edge(edge);
            self.cache.edges.insert(EntityId::from(id));
        }

        fn collapse(&mut self, id: &str) {
            collapse(&mut self.store, &mut self.adjacency, &mut self.covered, &mut self.cache, None, &EntityId::from(id)).unwrap();
        }

        fn expand(&mut self, id: &str) {
            expand(&mut self.store, &mut self.adjacency, &mut self.covered, &mut self.cache, None, &EntityId::from(id)).unwrap();
        }
    }

    // Scenario 1 of §8.
    #[test]
    fn basic_collapse() {
        let mut f = Fixture::new();
        f.add_node("internal");
        f.add_node("external");
        f.add_container("M", None, &["internal"]);
        f.add_edge("e1", "internal", "external");

        f.collapse("M");

        assert_eq!(f.cache.nodes, HashSet::from([EntityId::from("external")]));
        assert_eq!(f.cache.containers, HashSet::from([EntityId::from("M")]));
        assert_eq!(f.cache.hyperedges, HashSet::from([EntityId::from("hyper_M_to_external")]));
        assert!(f.store.edge(&EntityId::from("e1")).unwrap().hidden);
        assert_eq!(f.covered.covering_hyperedge_of(&EntityId::from("e1")), Some(&EntityId::from("hyper_M_to_external")));
    }

    // Scenario 6 of §8.
    #[test]
    fn double_expand_is_idempotent() {
        let mut f = Fixture::new();
        f.add_node("a");
        f.add_container("M", None, &["a"]);
        let before = f.cache.clone();

        f.expand("M");

        assert_eq!(f.cache.nodes, before.nodes);
        assert_eq!(f.cache.containers, before.containers);
    }

    // Scenario 4 of §8: nested collapse then shallow expand.
    #[test]
    fn nested_collapse_then_shallow_expand() {
        let mut f = Fixture::new();
        f.add_node("x");
        f.add_node("y");
        f.add_node("external");
        f.add_container("inner", Some("outer"), &["x", "y"]);
        f.add_container("outer", None, &["inner"]);
        f.add_edge("e1", "x", "external");

        f.collapse("outer");
        assert_eq!(f.cache.nodes, HashSet::from([EntityId::from("external")]));
        assert_eq!(f.cache.containers, HashSet::from([EntityId::from("outer")]));
        assert_eq!(f.cache.hyperedges, HashSet::from([EntityId::from("hyper_outer_to_external")]));

        f.expand("outer");
        assert_eq!(
            f.cache.containers,
            HashSet::from([EntityId::from("outer"), EntityId::from("inner")])
        );
        assert_eq!(f.cache.hyperedges, HashSet::from([EntityId::from("hyper_inner_to_external")]));
    }

    #[test]
    fn collapse_of_unknown_container_fails_loudly() {
        let mut f = Fixture::new();
        let err = collapse(
            &mut f.store,
            &mut f.adjacency,
            &mut f.covered,
            &mut f.cache,
            None,
            &EntityId::from("ghost"),
        )
        .unwrap_err();
        assert_eq!(err, GraphStateError::NotFound(EntityId::from("ghost")));
    }
}
