//! Visual-channel vocabulary and style-config ingest (§3.1, §4.J).
//!
//! The aggregation engine (`aggregation.rs`) needs to know which tags on an
//! edge belong to the same semantic dimension so it can keep a value common
//! to a group of edges even when other dimensions disagree. That mapping —
//! tag value -> channel — is the `ChannelRegistry`, built once from the
//! caller's style configuration and validated eagerly.

use crate::error::GraphStateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sealed set of semantic dimensions a hyperedge can aggregate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualChannel {
    LinePattern,
    LineWidth,
    Animation,
    LineStyle,
    Halo,
    Arrowhead,
    Waviness,
}

impl VisualChannel {
    pub const ALL: [VisualChannel; 7] = [
        VisualChannel::LinePattern,
        VisualChannel::LineWidth,
        VisualChannel::Animation,
        VisualChannel::LineStyle,
        VisualChannel::Halo,
        VisualChannel::Arrowhead,
        VisualChannel::Waviness,
    ];
}

/// Validated mapping from tag value to the single channel it belongs to.
///
/// Tags that were never declared in any group are treated as free-form by
/// the aggregation engine: they only ever participate in whole-tag-set
/// intersection, never in a per-channel intersection.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channel_of: HashMap<String, VisualChannel>,
}

impl ChannelRegistry {
    /// Build a registry from `(channel, tag values)` groups, as the JSON
    /// style-config loader (out of scope) is expected to produce from
    /// `edgeStyleConfig`/`legend`. Every conflict — a tag value declared
    /// under more than one channel — is collected and reported together.
    pub fn from_groups<I, V>(groups: I) -> Result<ChannelRegistry, GraphStateError>
    where
        I: IntoIterator<Item = (VisualChannel, V)>,
        V: IntoIterator<Item = String>,
    {
        let mut channel_of: HashMap<String, VisualChannel> = HashMap::new();
        let mut conflicts: Vec<String> = Vec::new();

        for (channel, values) in groups {
            for value in values {
                match channel_of.get(&value) {
                    Some(existing) if *existing != channel => {
                        conflicts.push(format!(
                            "tag {value:?} declared under both {existing:?} and {channel:?}"
                        ));
                    }
                    Some(_) => {
                        // Same channel declared twice for the same value: harmless.
                    }
                    None => {
                        channel_of.insert(value, channel);
                    }
                }
            }
        }

        if !conflicts.is_empty() {
            return Err(GraphStateError::SemanticConflict { conflicts });
        }

        Ok(ChannelRegistry { channel_of })
    }

    /// The channel a tag belongs to, if it was declared in the config.
    pub fn channel_of(&self, tag: &str) -> Option<VisualChannel> {
        self.channel_of.get(tag).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.channel_of.is_empty()
    }
}
