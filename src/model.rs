pub mod node;
pub mod tree;

pub use node::{
    Ephemerality, ExpandState, GroupData, GroupLayout, LayoutNode, NodeData,
};
pub use tree::{NodeId, NodeMap, Observer, OwnedNode, Tree};
