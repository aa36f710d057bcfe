//! Merge tree: slotmap-backed node arena with reference stacks, dirty
//! propagation, path addressing, and markup serialization.

pub mod arena;
pub mod node;
pub mod path;
pub mod print;

pub use arena::MergeTree;
pub use node::{KindMismatch, MergeId, NodeData, NodeId, NodeKind, NodeReference};
