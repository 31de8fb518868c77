//! The six concrete end-to-end scenarios of §8, run against the public
//! facade. Module-level unit tests exercise individual components; these
//! are literal-input, literal-output regression tests for the assembled
//! system.

use hypergraph_core::{Container, EntityId, GraphEdge, GraphState, GraphStateError, Node};
use std::collections::HashSet;

fn id(s: &str) -> EntityId {
    EntityId::from(s)
}

fn ids<const N: usize>(items: [&str; N]) -> HashSet<EntityId> {
    items.into_iter().map(id).collect()
}

/// Scenario 1: basic collapse.
#[test]
fn basic_collapse() {
    let mut state = GraphState::new();
    state.add_node(Node::new("internal", "internal")).unwrap();
    state.add_node(Node::new("external", "external")).unwrap();
    state.add_container(Container::new("M", "M")).unwrap();
    state.attach_to_container(&id("M"), &id("internal")).unwrap();
    state.add_edge(GraphEdge::new("e1", "internal", "external")).unwrap();

    state.collapse(&id("M")).unwrap();

    assert_eq!(state.visible_nodes().cloned().collect::<HashSet<_>>(), ids(["external"]));
    assert_eq!(state.visible_containers().cloned().collect::<HashSet<_>>(), ids(["M"]));
    assert!(state.container(&id("M")).unwrap().collapsed);
    assert_eq!(state.visible_hyperedges().cloned().collect::<HashSet<_>>(), ids(["hyper_M_to_external"]));
    assert_eq!(state.get_covered_edges(&id("hyper_M_to_external")).into_iter().collect::<HashSet<_>>(), ids(["e1"]));
    assert!(state.edge(&id("e1")).unwrap().hidden);
}

struct TwoContainers;

impl TwoContainers {
    fn build() -> GraphState {
        let mut state = GraphState::new();
        for n in ["a1", "a2", "b1", "b2"] {
            state.add_node(Node::new(n, n)).unwrap();
        }
        state.add_container(Container::new("A", "A")).unwrap();
        state.add_container(Container::new("B", "B")).unwrap();
        state.attach_to_container(&id("A"), &id("a1")).unwrap();
        state.attach_to_container(&id("A"), &id("a2")).unwrap();
        state.attach_to_container(&id("B"), &id("b1")).unwrap();
        state.attach_to_container(&id("B"), &id("b2")).unwrap();

        state.add_edge(GraphEdge::new("A1_B1", "a1", "b1")).unwrap();
        state.add_edge(GraphEdge::new("A2_B2", "a2", "b2")).unwrap();
        state.add_edge(GraphEdge::new("B1_A1", "b1", "a1")).unwrap();
        state.add_edge(GraphEdge::new("B2_A2", "b2", "a2")).unwrap();
        state.add_edge(GraphEdge::new("a1_a2", "a1", "a2")).unwrap();
        state.add_edge(GraphEdge::new("b1_b2", "b1", "b2")).unwrap();
        state
    }
}

/// Scenario 2: two collapsed containers, bidirectional.
#[test]
fn two_collapsed_containers_bidirectional() {
    let mut state = TwoContainers::build();

    state.collapse(&id("A")).unwrap();
    state.collapse(&id("B")).unwrap();

    assert_eq!(state.visible_hyperedges().cloned().collect::<HashSet<_>>(), ids(["hyper_A_to_B", "hyper_B_to_A"]));
    assert_eq!(
        state.get_covered_edges(&id("hyper_A_to_B")).into_iter().collect::<HashSet<_>>(),
        ids(["A1_B1", "A2_B2"])
    );
    assert_eq!(
        state.get_covered_edges(&id("hyper_B_to_A")).into_iter().collect::<HashSet<_>>(),
        ids(["B1_A1", "B2_A2"])
    );
    for internal in ["a1", "a2", "b1", "b2"] {
        assert!(state.node(&id(internal)).unwrap().hidden);
    }
    for covered in ["A1_B1", "A2_B2", "B1_A1", "B2_A2", "a1_a2", "b1_b2"] {
        assert!(state.edge(&id(covered)).unwrap().hidden);
    }
}

/// Scenario 3: symmetric round trip.
#[test]
fn symmetric_round_trip() {
    let mut state = TwoContainers::build();
    state.collapse(&id("A")).unwrap();
    state.collapse(&id("B")).unwrap();

    state.expand(&id("A")).unwrap();
    state.expand(&id("B")).unwrap();

    assert_eq!(
        state.visible_nodes().cloned().collect::<HashSet<_>>(),
        ids(["a1", "a2", "b1", "b2"])
    );
    assert_eq!(state.visible_edges().count(), 6);
    assert!(state.visible_hyperedges().next().is_none());
}

/// Scenario 4: nested collapse, then shallow (non-recursive) expand.
#[test]
fn nested_collapse_then_shallow_expand() {
    let mut state = GraphState::new();
    state.add_node(Node::new("x", "x")).unwrap();
    state.add_node(Node::new("y", "y")).unwrap();
    state.add_node(Node::new("external", "external")).unwrap();
    state.add_container(Container::new("outer", "outer")).unwrap();
    state.add_container(Container::new("inner", "inner")).unwrap();
    state.attach_to_container(&id("outer"), &id("inner")).unwrap();
    state.attach_to_container(&id("inner"), &id("x")).unwrap();
    state.attach_to_container(&id("inner"), &id("y")).unwrap();
    state.add_edge(GraphEdge::new("e1", "x", "external")).unwrap();

    state.collapse(&id("outer")).unwrap();
    assert_eq!(state.visible_nodes().cloned().collect::<HashSet<_>>(), ids(["external"]));
    assert_eq!(state.visible_containers().cloned().collect::<HashSet<_>>(), ids(["outer"]));
    assert_eq!(state.visible_hyperedges().cloned().collect::<HashSet<_>>(), ids(["hyper_outer_to_external"]));

    state.expand(&id("outer")).unwrap();
    assert_eq!(state.visible_containers().cloned().collect::<HashSet<_>>(), ids(["outer", "inner"]));
    assert!(state.container(&id("inner")).unwrap().collapsed);
    assert_eq!(state.visible_hyperedges().cloned().collect::<HashSet<_>>(), ids(["hyper_inner_to_external"]));
}

/// Scenario 5: partial expand with a still-collapsed peer.
#[test]
fn partial_expand_with_still_collapsed_peer() {
    let mut state = TwoContainers::build();
    state.collapse(&id("A")).unwrap();
    state.collapse(&id("B")).unwrap();

    state.expand(&id("A")).unwrap();

    assert_eq!(
        state.visible_nodes().cloned().collect::<HashSet<_>>(),
        ids(["a1", "a2"])
    );
    assert_eq!(state.visible_containers().cloned().collect::<HashSet<_>>(), ids(["A", "B"]));
    assert!(!state.container(&id("A")).unwrap().collapsed);
    assert!(state.container(&id("B")).unwrap().collapsed);
    for hidden in ["b1", "b2"] {
        assert!(state.node(&id(hidden)).unwrap().hidden);
    }
    assert_eq!(
        state.visible_hyperedges().cloned().collect::<HashSet<_>>(),
        ids(["hyper_a1_to_B", "hyper_a2_to_B", "hyper_B_to_a1", "hyper_B_to_a2"])
    );
    for (hyperedge, edge) in [
        ("hyper_a1_to_B", "A1_B1"),
        ("hyper_a2_to_B", "A2_B2"),
        ("hyper_B_to_a1", "B1_A1"),
        ("hyper_B_to_a2", "B2_A2"),
    ] {
        assert_eq!(state.get_covered_edges(&id(hyperedge)), vec![id(edge)]);
    }
}

/// Scenario 6: idempotent double expand.
#[test]
fn idempotent_double_expand() {
    let mut state = GraphState::new();
    state.add_node(Node::new("a", "a")).unwrap();
    state.add_container(Container::new("M", "M")).unwrap();
    state.attach_to_container(&id("M"), &id("a")).unwrap();

    let before_nodes: HashSet<_> = state.visible_nodes().cloned().collect();
    let before_containers: HashSet<_> = state.visible_containers().cloned().collect();

    state.expand(&id("M")).unwrap();

    assert_eq!(state.visible_nodes().cloned().collect::<HashSet<_>>(), before_nodes);
    assert_eq!(state.visible_containers().cloned().collect::<HashSet<_>>(), before_containers);
}

/// §9 Open Questions: an edge fully inside a collapsed container's subtree
/// stays hidden and is never covered by a hyperedge.
#[test]
fn fully_interior_edge_stays_hidden_and_uncovered() {
    let mut state = GraphState::new();
    state.add_node(Node::new("x", "x")).unwrap();
    state.add_node(Node::new("y", "y")).unwrap();
    state.add_container(Container::new("M", "M")).unwrap();
    state.attach_to_container(&id("M"), &id("x")).unwrap();
    state.attach_to_container(&id("M"), &id("y")).unwrap();
    state.add_edge(GraphEdge::new("xy", "x", "y")).unwrap();

    state.collapse(&id("M")).unwrap();

    assert!(state.edge(&id("xy")).unwrap().hidden);
    assert!(state.get_adjacent_edges(&id("M")).is_empty());
    assert!(state.visible_hyperedges().next().is_none());
}

/// A direct edge between an entity and its own container is the
/// "self-reference" case `build_outer_hyperedges` skips — it must still be
/// marked `hidden`, not just orphaned with a stale `hidden=false` while its
/// endpoint disappears from the visible cache.
#[test]
fn self_reference_edge_to_own_container_is_hidden_and_uncovered() {
    let mut state = GraphState::new();
    state.add_node(Node::new("child", "child")).unwrap();
    state.add_container(Container::new("M", "M")).unwrap();
    state.attach_to_container(&id("M"), &id("child")).unwrap();
    state.add_edge(GraphEdge::new("e1", "child", "M")).unwrap();

    state.collapse(&id("M")).unwrap();

    assert!(state.edge(&id("e1")).unwrap().hidden);
    assert!(state.visible_hyperedges().next().is_none());
    assert!(state.remove_edge(&id("e1")).is_err());

    state.expand(&id("M")).unwrap();

    assert!(!state.edge(&id("e1")).unwrap().hidden);
}

/// Adding an edge with an endpoint hidden inside a collapsed container must
/// be rejected, not silently accepted and left outside the covering index.
#[test]
fn add_edge_with_hidden_endpoint_is_rejected() {
    let mut state = GraphState::new();
    state.add_node(Node::new("internal", "internal")).unwrap();
    state.add_node(Node::new("external", "external")).unwrap();
    state.add_node(Node::new("external2", "external2")).unwrap();
    state.add_container(Container::new("M", "M")).unwrap();
    state.attach_to_container(&id("M"), &id("internal")).unwrap();
    state.add_edge(GraphEdge::new("e1", "internal", "external")).unwrap();

    state.collapse(&id("M")).unwrap();

    assert!(state.add_edge(GraphEdge::new("e2", "internal", "external2")).is_err());
}

/// Attaching to a container that is hidden beneath a different, still-
/// collapsed ancestor must be rejected even though the parent itself isn't
/// `collapsed` — otherwise the newly attached child stays visible inside a
/// hidden subtree, violating invariant 3.
#[test]
fn attach_to_hidden_nested_container_is_rejected() {
    let mut state = GraphState::new();
    state.add_node(Node::new("x", "x")).unwrap();
    state.add_node(Node::new("new_node", "new_node")).unwrap();
    state.add_container(Container::new("outer", "outer")).unwrap();
    state.add_container(Container::new("inner", "inner")).unwrap();
    state.attach_to_container(&id("outer"), &id("inner")).unwrap();
    state.attach_to_container(&id("inner"), &id("x")).unwrap();

    state.collapse(&id("outer")).unwrap();

    assert!(state.attach_to_container(&id("inner"), &id("new_node")).is_err());
}

/// Calling `expand` directly on a container that is hidden beneath a
/// different, still-collapsed ancestor must be rejected up front — the
/// container is never left mutated.
#[test]
fn expanding_hidden_nested_container_is_rejected() {
    let mut state = GraphState::new();
    state.add_node(Node::new("x", "x")).unwrap();
    state.add_container(Container::new("outer", "outer")).unwrap();
    state.add_container(Container::new("inner", "inner")).unwrap();
    state.attach_to_container(&id("outer"), &id("inner")).unwrap();
    state.attach_to_container(&id("inner"), &id("x")).unwrap();

    state.collapse(&id("inner")).unwrap();
    state.collapse(&id("outer")).unwrap();

    assert!(state.expand(&id("inner")).is_err());
    assert!(state.expand_recursive(&id("inner")).is_err());
    assert!(state.container(&id("inner")).unwrap().collapsed);
    assert!(state.container(&id("inner")).unwrap().hidden);
}

/// Calling `collapse` directly on a container hidden beneath a different,
/// still-collapsed ancestor must likewise be rejected up front.
#[test]
fn collapsing_hidden_nested_container_is_rejected() {
    let mut state = GraphState::new();
    state.add_node(Node::new("x", "x")).unwrap();
    state.add_container(Container::new("outer", "outer")).unwrap();
    state.add_container(Container::new("inner", "inner")).unwrap();
    state.attach_to_container(&id("outer"), &id("inner")).unwrap();
    state.attach_to_container(&id("inner"), &id("x")).unwrap();

    state.collapse(&id("outer")).unwrap();

    assert!(state.collapse(&id("inner")).is_err());
}

#[test]
fn collapsing_nonexistent_container_fails_loudly() {
    let mut state = GraphState::new();
    assert_eq!(state.collapse(&id("ghost")).unwrap_err(), GraphStateError::NotFound(id("ghost")));
}
