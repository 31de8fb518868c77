//! Public API Facade (component G, §4.G): the externally callable surface.
//!
//! Every mutation here validates arguments at entry and invariants 1-8 at
//! exit (§4.G). Internal cross-calls between D, C, and E (in `containers`,
//! `visibility`, `aggregation`) go through the un-validated paths directly;
//! only this module runs the validator.

use crate::adjacency::{AdjacencyIndex, CoveredEdgesIndex};
use crate::containers;
use crate::error::GraphStateError;
use crate::id::EntityId;
use crate::model::{Container, Edge, EdgeRef, GraphEdge, HandleHint, Hyperedge, Node};
use crate::store::EntityStore;
use crate::style::ChannelRegistry;
use crate::validation::{self, ValidationContext, Validator};
use crate::visibility::{self, VisibilityCache};
use std::collections::HashMap;

/// The whole of the in-memory graph visualization state: the five entity
/// maps, their derived indices and visibility cache, and the invariant
/// validator. This is the type external collaborators (layout, rendering)
/// hold a reference to.
pub struct GraphState {
    store: EntityStore,
    adjacency: AdjacencyIndex,
    covered: CoveredEdgesIndex,
    cache: VisibilityCache,
    validator: Validator,
    registry: Option<ChannelRegistry>,
}

impl Default for GraphState {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphState {
    pub fn new() -> Self {
        GraphState {
            store: EntityStore::new(),
            adjacency: AdjacencyIndex::new(),
            covered: CoveredEdgesIndex::new(),
            cache: VisibilityCache::new(),
            validator: Validator::new(),
            registry: None,
        }
    }

    /// Construct with a channel registry already ingested (§4.J). The
    /// out-of-scope JSON loader is expected to build this from a document's
    /// `edgeStyleConfig`/`legend` section before handing control to the
    /// core (§6).
    pub fn with_channel_registry(registry: ChannelRegistry) -> Self {
        GraphState { registry: Some(registry), ..Self::new() }
    }

    fn revalidate(&mut self) -> Result<(), GraphStateError> {
        if !self.validator.is_enabled() {
            return Ok(());
        }
        let ctx = ValidationContext {
            store: &self.store,
            adjacency: &self.adjacency,
            covered: &self.covered,
            cache: &self.cache,
        };
        validation::validate(&ctx)
    }

    // ---- mutations: creation -------------------------------------------

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphStateError> {
        if self.store.exists(&node.id) {
            return Err(GraphStateError::InvalidArgument(format!("entity {} already exists", node.id)));
        }
        let id = node.id.clone();
        self.store.insert_node(node);
        visibility::on_node_changed(&self.store, &self.adjacency, &mut self.cache, &id);
        self.revalidate()
    }

    /// A new container must start with no children; build hierarchy with
    /// [`GraphState::attach_to_container`] after both sides exist.
    pub fn add_container(&mut self, container: Container) -> Result<(), GraphStateError> {
        if self.store.exists(&container.id) {
            return Err(GraphStateError::InvalidArgument(format!("entity {} already exists", container.id)));
        }
        if !container.children.is_empty() {
            return Err(GraphStateError::InvalidArgument(
                "a new container must start with no children".to_string(),
            ));
        }
        let id = container.id.clone();
        self.store.insert_container(container);
        visibility::on_container_changed(&self.store, &self.adjacency, &mut self.cache, &id);
        self.revalidate()
    }

    pub fn attach_to_container(&mut self, parent: &EntityId, child: &EntityId) -> Result<(), GraphStateError> {
        let Some(container) = self.store.container(parent) else {
            return Err(GraphStateError::NotFound(parent.clone()));
        };
        if !self.store.is_vertex(child) {
            return Err(GraphStateError::NotFound(child.clone()));
        }
        if self.store.parent_of(child).is_some() {
            return Err(GraphStateError::InvalidArgument(format!("{child} already has a parent")));
        }
        if parent == child || containers::is_inside(&self.store, parent, child) {
            return Err(GraphStateError::InvalidArgument(format!("{parent} cannot become a descendant of {child}")));
        }
        if container.collapsed {
            return Err(GraphStateError::InvalidArgument(format!(
                "{parent} is collapsed; expand it before attaching {child}"
            )));
        }
        if self.store.is_hidden(parent) {
            return Err(GraphStateError::InvalidArgument(format!(
                "{parent} is hidden inside a collapsed ancestor; expand it before attaching {child}"
            )));
        }
        self.store.attach_child(parent, child.clone());
        self.revalidate()
    }

    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<(), GraphStateError> {
        if self.store.exists(&edge.id) {
            return Err(GraphStateError::InvalidArgument(format!("entity {} already exists", edge.id)));
        }
        if !self.store.is_vertex(&edge.source) {
            return Err(GraphStateError::InvalidArgument(format!("edge source {} does not exist", edge.source)));
        }
        if !self.store.is_vertex(&edge.target) {
            return Err(GraphStateError::InvalidArgument(format!("edge target {} does not exist", edge.target)));
        }
        if self.store.is_hidden(&edge.source) || self.store.is_hidden(&edge.target) {
            return Err(GraphStateError::InvalidArgument(format!(
                "edge {} has an endpoint hidden inside a collapsed container; expand it before adding this edge",
                edge.id
            )));
        }
        let (id, source, target) = (edge.id.clone(), edge.source.clone(), edge.target.clone());
        self.store.insert_edge(edge);
        self.adjacency.insert_graph_edge(&id, &source, &target);
        visibility::on_edge_changed(&self.store, &mut self.cache, &id);
        self.revalidate()
    }

    /// Hyperedges are system-managed; this always fails (§7, §4.H).
    pub fn add_hyperedge(&mut self, _source: EntityId, _target: EntityId, _tags: Vec<String>) -> Result<(), GraphStateError> {
        Err(GraphStateError::HyperedgeCreationForbidden)
    }

    // ---- mutations: removal ---------------------------------------------

    pub fn remove_node(&mut self, id: &EntityId) -> Result<(), GraphStateError> {
        if !self.store.node_exists(id) {
            return Err(GraphStateError::NotFound(id.clone()));
        }
        if self.adjacency.incident_to(id).next().is_some() {
            return Err(GraphStateError::InvalidArgument(format!("node {id} still has incident edges")));
        }
        if let Some(parent) = self.store.parent_of(id).cloned() {
            self.store.detach_child(&parent, id);
        }
        self.store.remove_node(id);
        self.cache.nodes.remove(id);
        self.revalidate()
    }

    pub fn remove_container(&mut self, id: &EntityId) -> Result<(), GraphStateError> {
        let Some(container) = self.store.container(id) else {
            return Err(GraphStateError::NotFound(id.clone()));
        };
        if !container.children.is_empty() {
            return Err(GraphStateError::InvalidArgument(format!("container {id} still has children")));
        }
        if self.adjacency.incident_to(id).next().is_some() {
            return Err(GraphStateError::InvalidArgument(format!("container {id} still has incident edges")));
        }
        if let Some(parent) = self.store.parent_of(id).cloned() {
            self.store.detach_child(&parent, id);
        }
        self.store.remove_container(id);
        self.cache.containers.remove(id);
        self.revalidate()
    }

    pub fn remove_edge(&mut self, id: &EntityId) -> Result<(), GraphStateError> {
        let Some(edge) = self.store.edge(id).cloned() else {
            return Err(GraphStateError::NotFound(id.clone()));
        };
        if edge.hidden {
            return Err(GraphStateError::InvalidArgument(format!(
                "{id} is hidden behind a collapsed container; expand it before removing this edge"
            )));
        }
        self.adjacency.remove_graph_edge(id, &edge.source, &edge.target);
        self.store.remove_edge(id);
        visibility::on_edge_removed(&mut self.cache, id);
        self.revalidate()
    }

    // ---- mutations: container operations (§4.D) --------------------------

    /// `collapse`, `expand`, and `expand_recursive` all reject a target
    /// hidden beneath a different, still-collapsed ancestor up front: the
    /// container op has no notion of "expanded but hidden" or "collapsed
    /// with a hidden hyperedge endpoint", both of which this would produce,
    /// and there is no rollback once the op has partially mutated state.
    fn reject_if_hidden(&self, id: &EntityId) -> Result<(), GraphStateError> {
        if self.store.is_hidden(id) {
            return Err(GraphStateError::InvalidArgument(format!(
                "{id} is hidden inside a collapsed ancestor; expand that ancestor before operating on {id}"
            )));
        }
        Ok(())
    }

    pub fn collapse(&mut self, id: &EntityId) -> Result<(), GraphStateError> {
        self.reject_if_hidden(id)?;
        let token = self.validator.disable();
        let result = containers::collapse(
            &mut self.store,
            &mut self.adjacency,
            &mut self.covered,
            &mut self.cache,
            self.registry.as_ref(),
            id,
        );
        self.validator.reset(token);
        result?;
        self.revalidate()
    }

    pub fn expand(&mut self, id: &EntityId) -> Result<(), GraphStateError> {
        self.reject_if_hidden(id)?;
        let token = self.validator.disable();
        let result = containers::expand(
            &mut self.store,
            &mut self.adjacency,
            &mut self.covered,
            &mut self.cache,
            self.registry.as_ref(),
            id,
        );
        self.validator.reset(token);
        result?;
        self.revalidate()
    }

    pub fn expand_recursive(&mut self, id: &EntityId) -> Result<(), GraphStateError> {
        self.reject_if_hidden(id)?;
        let token = self.validator.disable();
        let result = containers::expand_recursive(
            &mut self.store,
            &mut self.adjacency,
            &mut self.covered,
            &mut self.cache,
            self.registry.as_ref(),
            id,
        );
        self.validator.reset(token);
        result?;
        self.revalidate()
    }

    // ---- queries: entity lookup ------------------------------------------

    pub fn node(&self, id: &EntityId) -> Option<&Node> {
        self.store.node(id)
    }

    pub fn container(&self, id: &EntityId) -> Option<&Container> {
        self.store.container(id)
    }

    pub fn edge(&self, id: &EntityId) -> Option<&GraphEdge> {
        self.store.edge(id)
    }

    pub fn hyperedge(&self, id: &EntityId) -> Option<&Hyperedge> {
        self.store.hyperedge(id)
    }

    // ---- queries: visibility (§3 derived caches) --------------------------

    pub fn visible_nodes(&self) -> impl Iterator<Item = &EntityId> {
        self.cache.nodes.iter()
    }

    pub fn visible_containers(&self) -> impl Iterator<Item = &EntityId> {
        self.cache.containers.iter()
    }

    pub fn visible_edges(&self) -> impl Iterator<Item = &EntityId> {
        self.cache.edges.iter()
    }

    pub fn visible_hyperedges(&self) -> impl Iterator<Item = &EntityId> {
        self.cache.hyperedges.iter()
    }

    /// The union of visible Graph-edges and visible hyperedges, resolved to
    /// owned records for layout/rendering collaborators (§6).
    pub fn resolved_visible_edges(&self) -> Vec<Edge> {
        self.cache
            .visible_edges_union()
            .filter_map(|id| {
                self.store
                    .edge(id)
                    .map(|e| Edge::Graph(e.clone()))
                    .or_else(|| self.store.hyperedge(id).map(|h| Edge::Hyper(h.clone())))
            })
            .collect()
    }

    // ---- queries: indices (§4.G query surface) ----------------------------

    pub fn get_covered_edges(&self, hyperedge_id: &EntityId) -> Vec<EntityId> {
        self.covered.covered_edges(hyperedge_id).map(|set| set.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn get_adjacent_edges(&self, id: &EntityId) -> Vec<EdgeRef> {
        self.adjacency.incident_to(id).cloned().collect()
    }

    pub fn get_crossing_edges(&self, container_id: &EntityId) -> Vec<EntityId> {
        containers::crossing_edges(&self.store, container_id)
    }

    /// Every Graph-edge id currently in the store, visible or not. Mainly
    /// useful to test harnesses checking coverage invariants (P2, P3, §8).
    pub fn all_graph_edge_ids(&self) -> Vec<EntityId> {
        self.store.all_edges().map(|edge| edge.id.clone()).collect()
    }

    // ---- queries: layout collaborator interface (§6) ----------------------

    pub fn get_collapsed_containers_as_nodes(&self) -> Vec<&Container> {
        self.cache.containers.iter().filter_map(|id| self.store.container(id)).filter(|c| c.collapsed).collect()
    }

    pub fn get_top_level_entities(&self) -> Vec<EntityId> {
        self.cache
            .nodes
            .iter()
            .chain(self.cache.containers.iter())
            .filter(|id| self.store.parent_of(id).is_none())
            .cloned()
            .collect()
    }

    pub fn get_parent_child_map(&self) -> HashMap<EntityId, Vec<EntityId>> {
        let mut map = HashMap::new();
        for container_id in &self.cache.containers {
            let Some(container) = self.store.container(container_id) else { continue };
            if container.collapsed {
                continue;
            }
            let visible_children: Vec<EntityId> = container
                .children
                .iter()
                .filter(|child| self.cache.nodes.contains(*child) || self.cache.containers.contains(*child))
                .cloned()
                .collect();
            if !visible_children.is_empty() {
                map.insert(container_id.clone(), visible_children);
            }
        }
        map
    }

    pub fn set_layout_position(&mut self, id: &EntityId, x: f64, y: f64) {
        if let Some(node) = self.store.node_mut(id) {
            node.position = Some((x, y));
        } else if let Some(container) = self.store.container_mut(id) {
            container.position = Some((x, y));
        }
    }

    pub fn set_layout_dimensions(&mut self, id: &EntityId, w: f64, h: f64) {
        if let Some(node) = self.store.node_mut(id) {
            node.dimensions = Some((w, h));
        } else if let Some(container) = self.store.container_mut(id) {
            container.dimensions = Some((w, h));
        }
    }

    // ---- queries: rendering collaborator interface (§6) --------------------

    /// `(sourceId, targetId, sourceHandleHint, targetHandleHint)` (§6). The
    /// hints are `None` until both endpoints have a known layout position.
    pub fn get_edge_endpoints(
        &self,
        edge_id: &EntityId,
    ) -> Option<(EntityId, EntityId, Option<HandleHint>, Option<HandleHint>)> {
        let (source, target) = if let Some(edge) = self.store.edge(edge_id) {
            (edge.source.clone(), edge.target.clone())
        } else {
            let hyperedge = self.store.hyperedge(edge_id)?;
            (hyperedge.source.clone(), hyperedge.target.clone())
        };
        let (source_hint, target_hint) = self.handle_hints(&source, &target);
        Some((source, target, source_hint, target_hint))
    }

    fn position_of(&self, id: &EntityId) -> Option<(f64, f64)> {
        self.store
            .node(id)
            .and_then(|n| n.position)
            .or_else(|| self.store.container(id).and_then(|c| c.position))
    }

    fn handle_hints(&self, source: &EntityId, target: &EntityId) -> (Option<HandleHint>, Option<HandleHint>) {
        let (Some((sx, sy)), Some((tx, ty))) = (self.position_of(source), self.position_of(target)) else {
            return (None, None);
        };
        let (dx, dy) = (tx - sx, ty - sy);
        let (source_hint, target_hint) = if dx.abs() >= dy.abs() {
            if dx >= 0.0 { (HandleHint::Right, HandleHint::Left) } else { (HandleHint::Left, HandleHint::Right) }
        } else if dy >= 0.0 {
            (HandleHint::Bottom, HandleHint::Top)
        } else {
            (HandleHint::Top, HandleHint::Bottom)
        };
        (Some(source_hint), Some(target_hint))
    }
}
