use crate::{TrafficEndpoint, UpfDescriptor, UpfId};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Position of a node in its graph's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

impl std::fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Directed edge between two nodes of the same graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPathLink {
    pub to: NodeIndex,

    // Only set on child edges that belong to a configured routing path.
    pub destination: Option<TrafficEndpoint>,
}

impl DataPathLink {
    pub fn new(to: NodeIndex) -> Self {
        DataPathLink {
            to,
            destination: None,
        }
    }
}

/// One UPF within one subscriber's data path topology.
#[derive(Debug)]
pub struct DataPathNode {
    pub(super) upf: Arc<UpfDescriptor>,
    pub(super) next: HashMap<UpfId, DataPathLink>,
    pub(super) prev: Option<DataPathLink>,
    pub(super) is_branching_point: bool,
}

impl DataPathNode {
    pub(super) fn new(upf: Arc<UpfDescriptor>) -> Self {
        DataPathNode {
            upf,
            next: HashMap::new(),
            prev: None,
            is_branching_point: false,
        }
    }

    pub fn upf(&self) -> &Arc<UpfDescriptor> {
        &self.upf
    }

    pub fn name(&self) -> &str {
        &self.upf.name
    }

    pub fn node_ip(&self) -> IpAddr {
        self.upf.node_ip()
    }

    /// Outgoing edges, keyed by the identifier of the child UPF.
    pub fn next(&self) -> &HashMap<UpfId, DataPathLink> {
        &self.next
    }

    pub fn prev(&self) -> Option<&DataPathLink> {
        self.prev.as_ref()
    }

    pub fn is_branching_point(&self) -> bool {
        self.is_branching_point
    }

    /// Number of adjacent nodes, counting the parent and each child once.
    pub fn degree(&self) -> usize {
        self.next.len() + usize::from(self.prev.is_some())
    }

    /// Adjacent nodes: children in identifier order, then the parent.
    pub(super) fn neighbors(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut children: Vec<_> = self.next.iter().collect();
        children.sort_by(|a, b| a.0.cmp(b.0));
        children
            .into_iter()
            .map(|(_, link)| link.to)
            .chain(self.prev.iter().map(|link| link.to))
    }
}
