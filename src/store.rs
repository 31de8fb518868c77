//! Entity Store (component A, §4.A): five maps keyed by id, plus the
//! parent map recording each node/child-container's single direct parent.
//!
//! Removal here is cascade-free by design — collapsing, hiding, and
//! detaching children are policy decisions that belong to the container
//! operations (`containers.rs`) and visibility manager (`visibility.rs`).

use crate::id::EntityId;
use crate::model::{Container, GraphEdge, Hyperedge, Node};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct EntityStore {
    nodes: HashMap<EntityId, Node>,
    containers: HashMap<EntityId, Container>,
    edges: HashMap<EntityId, GraphEdge>,
    hyperedges: HashMap<EntityId, Hyperedge>,
    /// Direct parent of every node or child container currently assigned
    /// to a container. Entities with no entry are top-level.
    parent_of: HashMap<EntityId, EntityId>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- existence, spanning all four entity kinds --------------------

    pub fn exists(&self, id: &EntityId) -> bool {
        self.nodes.contains_key(id)
            || self.containers.contains_key(id)
            || self.edges.contains_key(id)
            || self.hyperedges.contains_key(id)
    }

    /// True for a node or a container — the two kinds that can be edge
    /// endpoints or container members.
    pub fn is_vertex(&self, id: &EntityId) -> bool {
        self.nodes.contains_key(id) || self.containers.contains_key(id)
    }

    // ---- nodes ----------------------------------------------------------

    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn node(&self, id: &EntityId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &EntityId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn remove_node(&mut self, id: &EntityId) -> Option<Node> {
        self.parent_of.remove(id);
        self.nodes.remove(id)
    }

    pub fn node_exists(&self, id: &EntityId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ---- containers -------------------------------------------------------

    pub fn insert_container(&mut self, container: Container) {
        self.containers.insert(container.id.clone(), container);
    }

    pub fn container(&self, id: &EntityId) -> Option<&Container> {
        self.containers.get(id)
    }

    pub fn container_mut(&mut self, id: &EntityId) -> Option<&mut Container> {
        self.containers.get_mut(id)
    }

    pub fn remove_container(&mut self, id: &EntityId) -> Option<Container> {
        self.parent_of.remove(id);
        self.containers.remove(id)
    }

    pub fn container_exists(&self, id: &EntityId) -> bool {
        self.containers.contains_key(id)
    }

    pub fn all_containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    // ---- graph edges --------------------------------------------------------

    pub fn insert_edge(&mut self, edge: GraphEdge) {
        self.edges.insert(edge.id.clone(), edge);
    }

    pub fn edge(&self, id: &EntityId) -> Option<&GraphEdge> {
        self.edges.get(id)
    }

    pub fn edge_mut(&mut self, id: &EntityId) -> Option<&mut GraphEdge> {
        self.edges.get_mut(id)
    }

    pub fn remove_edge(&mut self, id: &EntityId) -> Option<GraphEdge> {
        self.edges.remove(id)
    }

    pub fn edge_exists(&self, id: &EntityId) -> bool {
        self.edges.contains_key(id)
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ---- hyperedges -----------------------------------------------------

    pub fn insert_hyperedge(&mut self, hyperedge: Hyperedge) {
        self.hyperedges.insert(hyperedge.id.clone(), hyperedge);
    }

    pub fn hyperedge(&self, id: &EntityId) -> Option<&Hyperedge> {
        self.hyperedges.get(id)
    }

    pub fn hyperedge_mut(&mut self, id: &EntityId) -> Option<&mut Hyperedge> {
        self.hyperedges.get_mut(id)
    }

    pub fn remove_hyperedge(&mut self, id: &EntityId) -> Option<Hyperedge> {
        self.hyperedges.remove(id)
    }

    pub fn hyperedge_exists(&self, id: &EntityId) -> bool {
        self.hyperedges.contains_key(id)
    }

    pub fn all_hyperedges(&self) -> impl Iterator<Item = &Hyperedge> {
        self.hyperedges.values()
    }

    pub fn hyperedge_count(&self) -> usize {
        self.hyperedges.len()
    }

    /// Find an existing hyperedge between this ordered endpoint pair, if
    /// any ("at most one hyperedge per ordered endpoint pair", §3).
    pub fn hyperedge_between(&self, source: &EntityId, target: &EntityId) -> Option<&Hyperedge> {
        let id = EntityId::hyperedge_id(source, target);
        self.hyperedges.get(&id)
    }

    // ---- hierarchy --------------------------------------------------------

    pub fn parent_of(&self, id: &EntityId) -> Option<&EntityId> {
        self.parent_of.get(id)
    }

    /// Record `child`'s direct parent and append it to `parent`'s ordered
    /// children set. Caller is responsible for ensuring `child` was not
    /// already a member of a different container.
    pub fn attach_child(&mut self, parent: &EntityId, child: EntityId) {
        self.parent_of.insert(child.clone(), parent.clone());
        if let Some(child_container) = self.containers.get_mut(&child) {
            child_container.parent = Some(parent.clone());
        }
        if let Some(container) = self.containers.get_mut(parent) {
            container.children.insert(child);
        }
    }

    pub fn detach_child(&mut self, parent: &EntityId, child: &EntityId) {
        self.parent_of.remove(child);
        if let Some(child_container) = self.containers.get_mut(child) {
            child_container.parent = None;
        }
        if let Some(container) = self.containers.get_mut(parent) {
            container.children.shift_remove(child);
        }
    }

    pub fn is_hidden(&self, id: &EntityId) -> bool {
        self.nodes.get(id).map(|n| n.hidden).unwrap_or(false)
            || self.containers.get(id).map(|c| c.hidden).unwrap_or(false)
    }

    pub fn is_visible(&self, id: &EntityId) -> bool {
        self.is_vertex(id) && !self.is_hidden(id)
    }
}
