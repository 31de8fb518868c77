//! Hierarchical graph visualization state: a directed multigraph whose
//! nodes may be grouped into arbitrarily nested containers, where any
//! container may be collapsed into a single opaque vertex or expanded to
//! reveal its interior, while a consistent visible view is maintained for
//! downstream layout and rendering collaborators.

pub mod adjacency;
pub mod aggregation;
pub mod containers;
pub mod error;
pub mod facade;
pub mod id;
pub mod model;
pub mod store;
pub mod style;
pub mod validation;
pub mod visibility;


pub use error::{GraphStateError, Violation};
pub use facade::GraphState;
pub use id::EntityId;
pub use model::{Container, Edge, EdgeRef, GraphEdge, HandleHint, Hyperedge, Node};
pub use style::{ChannelRegistry, VisualChannel};
