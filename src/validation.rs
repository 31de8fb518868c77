//! Invariant Validator (component F, §4.F).
//!
//! Checks invariants 1-8 (§3) against the current store/index/cache state.
//! Validation can be temporarily suspended with stack discipline so a
//! multi-step collapse/expand runs as a single atomic mutation externally
//! while its intermediate steps may violate invariants (§9 "Validation
//! toggle").

use crate::adjacency::{AdjacencyIndex, CoveredEdgesIndex};
use crate::error::{GraphStateError, Violation};
use crate::id::EntityId;
use crate::model::EdgeRef;
use crate::store::EntityStore;
use crate::visibility::VisibilityCache;

/// Opaque proof that validation was disabled. Must be handed back to
/// [`Validator::reset`]; there is no way to re-enable validation without
/// one, which rules out the "boolean flag left off by an early return"
/// bug class called out in §9.
#[must_use]
pub struct ValidationToken(u32);

#[derive(Debug, Default)]
pub struct Validator {
    disabled_depth: u32,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable(&mut self) -> ValidationToken {
        let token = ValidationToken(self.disabled_depth);
        self.disabled_depth += 1;
        token
    }

    pub fn reset(&mut self, token: ValidationToken) {
        debug_assert!(token.0 < self.disabled_depth, "validation token does not match current nesting depth");
        self.disabled_depth = self.disabled_depth.saturating_sub(1);
    }

    pub fn is_enabled(&self) -> bool {
        self.disabled_depth == 0
    }
}

/// Everything the validator needs a read-only view of.
pub struct ValidationContext<'a> {
    pub store: &'a EntityStore,
    pub adjacency: &'a AdjacencyIndex,
    pub covered: &'a CoveredEdgesIndex,
    pub cache: &'a VisibilityCache,
}

/// Run invariants 1-8 and return a single aggregated error if any failed.
pub fn validate(ctx: &ValidationContext) -> Result<(), GraphStateError> {
    let mut violations = Vec::new();

    check_endpoint_existence(ctx, &mut violations);
    check_endpoint_visibility(ctx, &mut violations);
    check_hidden_container_consistency(ctx, &mut violations);
    check_collapsed_container_consistency(ctx, &mut violations);
    check_hyperedge_well_formedness(ctx, &mut violations);
    check_covering_completeness(ctx, &mut violations);
    check_no_orphan_covering(ctx, &mut violations);
    check_adjacency_consistency(ctx, &mut violations);

    if violations.is_empty() {
        Ok(())
    } else {
        for v in &violations {
            tracing::error!(invariant = v.invariant, message = %v.message, "invariant violation");
        }
        Err(GraphStateError::invariant_violation(violations))
    }
}

// Invariant 1: every visible edge's source and target exist.
fn check_endpoint_existence(ctx: &ValidationContext, out: &mut Vec<Violation>) {
    for id in ctx.cache.edges.iter().chain(ctx.cache.hyperedges.iter()) {
        let (source, target) = match (ctx.store.edge(id), ctx.store.hyperedge(id)) {
            (Some(e), _) => (e.source.clone(), e.target.clone()),
            (_, Some(h)) => (h.source.clone(), h.target.clone()),
            (None, None) => {
                out.push(Violation::new(1, format!("visible edge {id} has no backing record")));
                continue;
            }
        };
        if !ctx.store.is_vertex(&source) {
            out.push(Violation::new(1, format!("edge {id} source {source} does not exist")));
        }
        if !ctx.store.is_vertex(&target) {
            out.push(Violation::new(1, format!("edge {id} target {target} does not exist")));
        }
    }
}

// Invariant 2: every visible edge's source and target are visible.
fn check_endpoint_visibility(ctx: &ValidationContext, out: &mut Vec<Violation>) {
    for id in ctx.cache.edges.iter().chain(ctx.cache.hyperedges.iter()) {
        let (source, target) = match (ctx.store.edge(id), ctx.store.hyperedge(id)) {
            (Some(e), _) => (e.source.clone(), e.target.clone()),
            (_, Some(h)) => (h.source.clone(), h.target.clone()),
            (None, None) => continue, // already reported by invariant 1
        };
        if !ctx.cache.is_vertex_visible(&source) {
            out.push(Violation::new(2, format!("edge {id} is visible but source {source} is not")));
        }
        if !ctx.cache.is_vertex_visible(&target) {
            out.push(Violation::new(2, format!("edge {id} is visible but target {target} is not")));
        }
    }
}

fn assert_subtree_hidden(ctx: &ValidationContext, container_id: &EntityId, out: &mut Vec<Violation>) {
    let Some(container) = ctx.store.container(container_id) else { return };
    for child in &container.children {
        if let Some(node) = ctx.store.node(child) {
            if !node.hidden {
                out.push(Violation::new(
                    3,
                    format!("node {child} is a descendant of hidden container {container_id} but is not hidden"),
                ));
            }
        } else if let Some(child_container) = ctx.store.container(child) {
            if !child_container.hidden {
                out.push(Violation::new(
                    3,
                    format!(
                        "container {child} is a descendant of hidden container {container_id} but is not hidden"
                    ),
                ));
            }
            assert_subtree_hidden(ctx, child, out);
        }
    }
}

// Invariant 3: container hidden => collapsed, and all descendants hidden.
fn check_hidden_container_consistency(ctx: &ValidationContext, out: &mut Vec<Violation>) {
    for container in ctx.store.all_containers() {
        if container.hidden {
            if !container.collapsed {
                out.push(Violation::new(3, format!("container {} is hidden but not collapsed", container.id)));
            }
            assert_subtree_hidden(ctx, &container.id, out);
        }
    }
}

/// All container ids strictly above `id` in the parent chain, innermost first.
fn ancestor_containers(store: &EntityStore, id: &EntityId) -> Vec<EntityId> {
    let mut chain = Vec::new();
    let mut current = store.parent_of(id).cloned();
    while let Some(parent) = current {
        current = store.parent_of(&parent).cloned();
        chain.push(parent);
    }
    chain
}

// Invariant 4: container collapsed => direct children hidden, and no
// Graph-edge with an endpoint inside its subtree is visible.
fn check_collapsed_container_consistency(ctx: &ValidationContext, out: &mut Vec<Violation>) {
    for container in ctx.store.all_containers() {
        if !container.collapsed {
            continue;
        }
        for child in &container.children {
            let hidden = ctx.store.node(child).map(|n| n.hidden).or(ctx.store.container(child).map(|c| c.hidden));
            if hidden == Some(false) {
                out.push(Violation::new(
                    4,
                    format!("container {} is collapsed but direct child {child} is not hidden", container.id),
                ));
            }
        }
    }

    for edge_id in &ctx.cache.edges {
        let Some(edge) = ctx.store.edge(edge_id) else { continue };
        for endpoint in [&edge.source, &edge.target] {
            for ancestor in ancestor_containers(ctx.store, endpoint) {
                if ctx.store.container(&ancestor).is_some_and(|c| c.collapsed) {
                    out.push(Violation::new(
                        4,
                        format!(
                            "edge {edge_id} is visible but endpoint {endpoint} is inside collapsed container {ancestor}"
                        ),
                    ));
                }
            }
        }
    }
}

// Invariant 5: every hyperedge has both endpoints existing and visible,
// and at least one endpoint is a collapsed container.
fn check_hyperedge_well_formedness(ctx: &ValidationContext, out: &mut Vec<Violation>) {
    for hyperedge in ctx.store.all_hyperedges() {
        let source_ok = ctx.store.is_vertex(&hyperedge.source) && ctx.cache.is_vertex_visible(&hyperedge.source);
        let target_ok = ctx.store.is_vertex(&hyperedge.target) && ctx.cache.is_vertex_visible(&hyperedge.target);
        if !source_ok {
            out.push(Violation::new(5, format!("hyperedge {} source {} missing or hidden", hyperedge.id, hyperedge.source)));
        }
        if !target_ok {
            out.push(Violation::new(5, format!("hyperedge {} target {} missing or hidden", hyperedge.id, hyperedge.target)));
        }
        let source_collapsed = ctx.store.container(&hyperedge.source).is_some_and(|c| c.collapsed);
        let target_collapsed = ctx.store.container(&hyperedge.target).is_some_and(|c| c.collapsed);
        if !source_collapsed && !target_collapsed {
            out.push(Violation::new(
                5,
                format!("hyperedge {} has neither endpoint as a collapsed container", hyperedge.id),
            ));
        }
    }
}

/// Whether `source`/`target` both lie inside the subtree of some common
/// collapsed ancestor of `source` — i.e. the edge between them never
/// crosses a collapsed boundary and is exempt from invariant 6 (§9 Open
/// Questions: "edges whose endpoints are both inside the same collapsed
/// container remain hidden and uncovered"). A direct edge from an entity to
/// its own collapsed container counts too: the container is the ancestor
/// here, not a descendant of itself, so this also checks `target ==
/// ancestor` (the self-reference case `build_outer_hyperedges` skips).
fn shares_a_collapsed_ancestor(store: &EntityStore, source: &EntityId, target: &EntityId) -> bool {
    let mut current = store.parent_of(source).cloned();
    while let Some(ancestor) = current {
        if store.container(&ancestor).is_some_and(|c| c.collapsed)
            && (target == &ancestor || crate::containers::is_inside(store, target, &ancestor))
        {
            return true;
        }
        current = store.parent_of(&ancestor).cloned();
    }
    false
}

// Invariant 6: every Graph-edge hidden because it crosses a collapsed
// boundary is covered by exactly one hyperedge. Edges fully inside a single
// collapsed container's subtree are hidden but never covered (§9).
fn check_covering_completeness(ctx: &ValidationContext, out: &mut Vec<Violation>) {
    for edge in ctx.store.all_edges() {
        if !edge.hidden || ctx.covered.covering_hyperedge_of(&edge.id).is_some() {
            continue;
        }
        if shares_a_collapsed_ancestor(ctx.store, &edge.source, &edge.target)
            || shares_a_collapsed_ancestor(ctx.store, &edge.target, &edge.source)
        {
            continue;
        }
        out.push(Violation::new(6, format!("hidden edge {} is not covered by any hyperedge", edge.id)));
    }
}

// Invariant 7: every covered-edges entry references an existing Graph-edge.
fn check_no_orphan_covering(ctx: &ValidationContext, out: &mut Vec<Violation>) {
    for edge_id in ctx.covered.all_covered() {
        if !ctx.store.edge_exists(edge_id) {
            out.push(Violation::new(7, format!("covered-edges index references nonexistent edge {edge_id}")));
        }
    }
}

// Invariant 8: the adjacency index agrees with current edges and hyperedges.
fn check_adjacency_consistency(ctx: &ValidationContext, out: &mut Vec<Violation>) {
    for edge in ctx.store.all_edges() {
        let at_source = ctx.adjacency.incident_to(&edge.source).any(|r| *r == EdgeRef::Graph(edge.id.clone()));
        let at_target = ctx.adjacency.incident_to(&edge.target).any(|r| *r == EdgeRef::Graph(edge.id.clone()));
        if !at_source || !at_target {
            out.push(Violation::new(8, format!("adjacency index missing entries for edge {}", edge.id)));
        }
    }
    for hyperedge in ctx.store.all_hyperedges() {
        let at_source =
            ctx.adjacency.incident_to(&hyperedge.source).any(|r| *r == EdgeRef::Hyper(hyperedge.id.clone()));
        let at_target =
            ctx.adjacency.incident_to(&hyperedge.target).any(|r| *r == EdgeRef::Hyper(hyperedge.id.clone()));
        if !at_source || !at_target {
            out.push(Violation::new(8, format!("adjacency index missing entries for hyperedge {}", hyperedge.id)));
        }
    }
}
