use super::{DataPathError, DataPathLink, DataPathNode, NodeIndex};
use crate::{NodeDirectory, RoutingPath, TrafficEndpoint, UpfDescriptor, UpfId};
use slog::{Logger, debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// The user plane topology of one subscriber: a forest of UPF nodes.
///
/// Nodes live in an arena in creation order and refer to each other by
/// [`NodeIndex`].  Each node has at most one parent, and following parents
/// never leads back to the starting node.
#[derive(Debug)]
pub struct UeDataPathGraph {
    supi: String,
    pub(super) nodes: Vec<DataPathNode>,
}

impl UeDataPathGraph {
    pub fn new(supi: &str) -> Self {
        UeDataPathGraph {
            supi: supi.to_string(),
            nodes: Vec::new(),
        }
    }

    /// Build the graph for a subscriber from its routing paths.
    ///
    /// A UPF named in several paths becomes a single shared node, as do UPFs with
    /// different names whose addresses resolve to the same identifier.  Every child
    /// edge walked by a path is tagged with that path's traffic endpoint, so a
    /// later path through the same edge overwrites the endpoint.  A node's parent
    /// is set by the first path that reaches it.
    ///
    /// Any error aborts the whole build.  Branching points are not computed here,
    /// see [`UeDataPathGraph::mark_branching_points`].
    pub fn build<D: NodeDirectory>(
        supi: &str,
        paths: &[RoutingPath],
        directory: &D,
        logger: &Logger,
    ) -> Result<Self, DataPathError> {
        let mut graph = UeDataPathGraph::new(supi);
        let mut created = CreatedNodes::default();

        for (path_idx, path) in paths.iter().enumerate() {
            if path.upfs.len() < 2 {
                return Err(DataPathError::DegeneratePath(path_idx));
            }
            let upfs = &path.upfs;
            let endpoint = path.endpoint();
            let last = upfs.len() - 1;

            for (idx, name) in upfs.iter().enumerate() {
                let node = graph.node_for_name(name, &mut created, directory)?;

                if idx < last {
                    let child = graph.node_for_name(&upfs[idx + 1], &mut created, directory)?;
                    graph.add_child(node, child, directory)?;
                    graph.attach_endpoint(node, child, endpoint, directory)?;
                    debug!(
                        logger,
                        "Path {path_idx}: {} -> {} towards {endpoint}",
                        name,
                        upfs[idx + 1]
                    );
                }

                if idx > 0 {
                    let parent = graph.node_for_name(&upfs[idx - 1], &mut created, directory)?;
                    if !graph.add_parent(node, parent, directory)? {
                        match graph.nodes[node.0].prev.as_ref() {
                            Some(existing) if existing.to != parent => warn!(
                                logger,
                                "Path {path_idx}: {} already has parent {}, ignoring {}",
                                name,
                                graph.nodes[existing.to.0].name(),
                                upfs[idx - 1]
                            ),
                            _ => (),
                        }
                    }
                }
            }
        }

        Ok(graph)
    }

    fn node_for_name<'a, D: NodeDirectory>(
        &mut self,
        name: &'a str,
        created: &mut CreatedNodes<'a>,
        directory: &D,
    ) -> Result<NodeIndex, DataPathError> {
        if let Some(idx) = created.by_name.get(name) {
            return Ok(*idx);
        }
        let upf = directory
            .lookup_node(name)
            .ok_or_else(|| DataPathError::UnknownNode(name.to_string()))?;

        // An unresolvable address is reported when the node is linked.
        let idx = match directory.resolve_id(&upf.node_ip()) {
            Some(id) => match created.by_id.get(id) {
                Some(idx) => *idx,
                None => {
                    let idx = self.push_node(upf.clone());
                    created.by_id.insert(id.clone(), idx);
                    idx
                }
            },
            None => self.push_node(upf.clone()),
        };
        created.by_name.insert(name, idx);
        Ok(idx)
    }

    /// Create a new node for the named UPF.  No deduplication is done here.
    pub fn add_node<D: NodeDirectory>(
        &mut self,
        name: &str,
        directory: &D,
    ) -> Result<NodeIndex, DataPathError> {
        let upf = directory
            .lookup_node(name)
            .ok_or_else(|| DataPathError::UnknownNode(name.to_string()))?;
        Ok(self.push_node(upf.clone()))
    }

    fn push_node(&mut self, upf: Arc<UpfDescriptor>) -> NodeIndex {
        self.nodes.push(DataPathNode::new(upf));
        NodeIndex(self.nodes.len() - 1)
    }

    fn upf_id<D: NodeDirectory>(
        &self,
        idx: NodeIndex,
        directory: &D,
    ) -> Result<UpfId, DataPathError> {
        let ip = self.nodes[idx.0].node_ip();
        directory
            .resolve_id(&ip)
            .cloned()
            .ok_or(DataPathError::UnresolvedAddress(ip))
    }

    /// Add an edge from `node` to `child` unless one to the same UPF exists.
    pub fn add_child<D: NodeDirectory>(
        &mut self,
        node: NodeIndex,
        child: NodeIndex,
        directory: &D,
    ) -> Result<(), DataPathError> {
        let child_id = self.upf_id(child, directory)?;
        self.nodes[node.0]
            .next
            .entry(child_id)
            .or_insert_with(|| DataPathLink::new(child));
        Ok(())
    }

    /// Set the traffic endpoint on the edge from `node` to `child`.
    ///
    /// Returns false, changing nothing, if there is no such edge.
    pub fn attach_endpoint<D: NodeDirectory>(
        &mut self,
        node: NodeIndex,
        child: NodeIndex,
        endpoint: TrafficEndpoint,
        directory: &D,
    ) -> Result<bool, DataPathError> {
        let child_id = self.upf_id(child, directory)?;
        match self.nodes[node.0].next.get_mut(&child_id) {
            Some(link) => {
                link.destination = Some(endpoint);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Make `parent` the parent of `node`, if `node` has no parent yet.
    ///
    /// Returns whether the parent was set.  A node keeps its first parent: a
    /// later call naming a different parent changes nothing.  A node can never be
    /// its own parent.
    pub fn add_parent<D: NodeDirectory>(
        &mut self,
        node: NodeIndex,
        parent: NodeIndex,
        directory: &D,
    ) -> Result<bool, DataPathError> {
        let parent_ip = self.nodes[parent.0].node_ip();
        if directory.resolve_id(&parent_ip).is_none() {
            return Err(DataPathError::UnresolvedAddress(parent_ip));
        }
        if parent == node {
            return Err(self.parent_cycle(node, parent));
        }
        if self.nodes[node.0].prev.is_some() {
            return Ok(false);
        }
        if self.ancestors(parent).any(|a| a == node) {
            return Err(self.parent_cycle(node, parent));
        }
        self.nodes[node.0].prev = Some(DataPathLink::new(parent));
        Ok(true)
    }

    fn parent_cycle(&self, node: NodeIndex, parent: NodeIndex) -> DataPathError {
        DataPathError::ParentCycle {
            node: self.nodes[node.0].name().to_string(),
            parent: self.nodes[parent.0].name().to_string(),
        }
    }

    pub fn supi(&self) -> &str {
        &self.supi
    }

    /// The first node created, which is the head of the first routing path.
    ///
    /// # Panics
    ///
    /// Panics if the graph has no nodes.
    pub fn root(&self) -> &DataPathNode {
        &self.nodes[0]
    }

    pub fn try_root(&self) -> Option<&DataPathNode> {
        self.nodes.first()
    }

    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    pub fn node(&self, idx: NodeIndex) -> &DataPathNode {
        &self.nodes[idx.0]
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&DataPathNode> {
        self.nodes.get(idx.0)
    }

    pub fn nodes(&self) -> &[DataPathNode] {
        &self.nodes
    }

    /// Index of the node for the named UPF.
    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .position(|node| node.name() == name)
            .map(NodeIndex)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn branching_points(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_branching_point)
            .map(|(idx, _)| NodeIndex(idx))
    }

    /// Walk up the parent edges from `idx`, nearest first.
    pub fn ancestors(&self, idx: NodeIndex) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            current: idx,
        }
    }
}

/// Nodes created so far in one build, by UPF name and by resolved identifier.
#[derive(Default)]
struct CreatedNodes<'a> {
    by_name: HashMap<&'a str, NodeIndex>,
    by_id: HashMap<UpfId, NodeIndex>,
}

pub struct Ancestors<'a> {
    graph: &'a UeDataPathGraph,
    current: NodeIndex,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let parent = self.graph.nodes[self.current.0].prev.as_ref()?.to;
        self.current = parent;
        Some(parent)
    }
}

impl std::fmt::Display for UeDataPathGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SUPI: {}", self.supi)?;
        for node in &self.nodes {
            writeln!(
                f,
                "  UPF {} ({}) branching point: {}",
                node.name(),
                node.node_ip(),
                node.is_branching_point
            )?;
            if let Some(prev) = &node.prev {
                writeln!(f, "    parent: {}", self.nodes[prev.to.0].node_ip())?;
            }
            let mut children: Vec<_> = node.next.iter().collect();
            children.sort_by(|a, b| a.0.cmp(b.0));
            for (_, link) in children {
                write!(f, "    child: {}", self.nodes[link.to.0].node_ip())?;
                match &link.destination {
                    Some(endpoint) => writeln!(f, " destination {endpoint}")?,
                    None => writeln!(f)?,
                }
            }
        }
        Ok(())
    }
}
