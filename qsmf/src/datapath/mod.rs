//! datapath - per subscriber user plane topology and its branching points

mod branching;
mod error;
mod graph;
mod node;

pub use branching::Traversal;
pub use error::DataPathError;
pub use graph::{Ancestors, UeDataPathGraph};
pub use node::{DataPathLink, DataPathNode, NodeIndex};
