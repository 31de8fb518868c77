//! Hyperedge Factory & Aggregation (component E, §4.E).
//!
//! Builds a hyperedge's semantic properties from the Graph-edges it will
//! cover. Two independent rules are unioned: a whole-tag-list intersection
//! (rule 2), and a per-visual-channel intersection that only fires when
//! every edge in the group has at least one value in that channel (rule 1).
//! The channel rule needs a `ChannelRegistry`; with none configured every
//! tag is free-form and only rule 2 applies (§4.E "degrades gracefully").

use crate::id::EntityId;
use crate::model::{GraphEdge, Hyperedge};
use crate::style::{ChannelRegistry, VisualChannel};
use indexmap::IndexSet;
use std::collections::HashSet;

/// Aggregate the tag sets of a non-empty group of edges that share a
/// direction between two visible endpoints.
pub fn aggregate_tags(edges: &[&GraphEdge], registry: Option<&ChannelRegistry>) -> Vec<String> {
    if edges.is_empty() {
        return Vec::new();
    }

    let mut result: IndexSet<String> = IndexSet::new();

    // Rule 2: a tag present on every edge's full property list.
    let mut common: IndexSet<String> = edges[0].tags.iter().cloned().collect();
    for edge in &edges[1..] {
        let present: HashSet<&String> = edge.tags.iter().collect();
        common.retain(|tag| present.contains(tag));
    }
    result.extend(common);

    // Rule 1: per-channel intersection, only when every edge contributes
    // at least one value in that channel.
    if let Some(registry) = registry {
        for channel in VisualChannel::ALL {
            let mut per_edge_values: Vec<HashSet<&String>> = Vec::with_capacity(edges.len());
            let mut every_edge_has_a_value = true;

            for edge in edges {
                let values: HashSet<&String> =
                    edge.tags.iter().filter(|tag| registry.channel_of(tag) == Some(channel)).collect();
                if values.is_empty() {
                    every_edge_has_a_value = false;
                    break;
                }
                per_edge_values.push(values);
            }

            if !every_edge_has_a_value {
                continue;
            }

            let mut intersection = per_edge_values[0].clone();
            for values in &per_edge_values[1..] {
                intersection.retain(|tag| values.contains(tag));
            }

            result.extend(intersection.into_iter().cloned());
        }
    }

    result.into_iter().collect()
}

/// Build a hyperedge covering `edges`, all sharing the direction
/// `source -> target` at the resolved (possibly collapsed-container)
/// endpoints.
pub fn build_hyperedge(
    source: EntityId,
    target: EntityId,
    edges: &[&GraphEdge],
    registry: Option<&ChannelRegistry>,
) -> Hyperedge {
    Hyperedge::new(source, target, aggregate_tags(edges, registry))
}
