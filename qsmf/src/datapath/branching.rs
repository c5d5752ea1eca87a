//! Branching point detection.
//!
//! A breadth first search is run from every node not yet reached, so each
//! disjoint component of the forest gets its own traversal.  A node is a
//! branching point when it has two or more adjacent nodes, parent and children
//! combined.

use super::{NodeIndex, UeDataPathGraph};
use std::collections::VecDeque;

/// Outcome of a breadth first search over every component of a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    /// The node each component was entered from, in discovery order.
    pub roots: Vec<NodeIndex>,

    /// Hops from the root of the node's component, indexed by node.
    pub distance: Vec<usize>,

    /// Branching point classification, indexed by node.
    pub branching: Vec<bool>,
}

impl Traversal {
    pub fn components(&self) -> usize {
        self.roots.len()
    }

    pub fn max_distance(&self) -> usize {
        self.distance.iter().copied().max().unwrap_or(0)
    }
}

impl UeDataPathGraph {
    /// Recompute the branching point flag of every node.  Returns the traversal
    /// the flags were taken from.
    pub fn mark_branching_points(&mut self) -> Traversal {
        let traversal = self.traverse();
        for (node, branching) in self.nodes.iter_mut().zip(&traversal.branching) {
            node.is_branching_point = *branching;
        }
        traversal
    }

    pub fn traverse(&self) -> Traversal {
        let num_nodes = self.nodes.len();
        let mut discovered = vec![false; num_nodes];
        let mut distance = vec![num_nodes + 1; num_nodes];
        let mut branching = vec![false; num_nodes];
        let mut roots = Vec::new();
        let mut queue = VecDeque::with_capacity(num_nodes);

        for start in 0..num_nodes {
            if discovered[start] {
                continue;
            }
            roots.push(NodeIndex(start));
            discovered[start] = true;
            distance[start] = 0;
            queue.push_back(NodeIndex(start));

            while let Some(n) = queue.pop_front() {
                let mut branching_count = 0;
                for neighbor in self.nodes[n.0].neighbors() {
                    if !discovered[neighbor.0] {
                        discovered[neighbor.0] = true;
                        distance[neighbor.0] = distance[n.0] + 1;
                        queue.push_back(neighbor);
                    }
                    // Includes the neighbor that discovered n.
                    branching_count += 1;
                }
                branching[n.0] = branching_count >= 2;
            }
        }

        Traversal {
            roots,
            distance,
            branching,
        }
    }
}
