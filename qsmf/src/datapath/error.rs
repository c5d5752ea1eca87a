//! Errors raised while building a subscriber's data path graph.

use std::net::IpAddr;

/// Errors that abort the construction of a data path graph.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataPathError {
    /// A routing path names a UPF that is not in the UPF inventory.
    #[error("UPF {0} is in the routing configuration but not in the UPF inventory")]
    UnknownNode(String),

    /// A UPF's node address has no identifier in the address table.
    #[error("UPF address {0} has no identifier, the configuration files are out of sync")]
    UnresolvedAddress(IpAddr),

    /// Setting the parent would make a node its own ancestor.
    #[error("making {parent} the parent of {node} would create a loop")]
    ParentCycle {
        /// Node being given a parent.
        node: String,
        /// Rejected parent.
        parent: String,
    },

    /// A routing path with fewer than two UPFs.
    #[error("routing path {0} has fewer than two UPFs")]
    DegeneratePath(usize),

    /// The subscriber has no preconfigured routing paths.
    #[error("no routing paths configured for {0}")]
    NoRoutingPaths(String),
}
