/// The active node pool.
///
/// Nodes are stored once, in mesh order, and never move. Claiming a node for
/// a region flips its liveness bit; coordinates and elevations stay readable
/// so visualization and onset lookups can still address every node by index.

use crate::geometry::Point;
use crate::model::{Mesh, Node, Result, SurgeError};

#[derive(Debug, Clone)]
pub struct NodePool {
    nodes: Vec<Node>,
    live: Vec<bool>,
    live_count: usize,
}

impl NodePool {
    /// Builds a pool from positions and elevations given in node order
    /// (element 0 is node 1).
    pub fn new(positions: Vec<Point>, elevations: Vec<f64>) -> Result<Self> {
        if positions.len() != elevations.len() {
            return Err(SurgeError::Inconsistent(format!(
                "{} node positions but {} elevation values",
                positions.len(),
                elevations.len()
            )));
        }
        let nodes: Vec<Node> = positions
            .into_iter()
            .zip(elevations)
            .enumerate()
            .map(|(i, (position, elevation))| Node {
                index: i + 1,
                position,
                elevation,
            })
            .collect();
        let live_count = nodes.len();
        Ok(Self {
            live: vec![true; live_count],
            nodes,
            live_count,
        })
    }

    /// Joins a parsed mesh with its per-node maximum elevations.
    pub fn from_mesh(mesh: &Mesh, elevations: Vec<f64>) -> Result<Self> {
        Self::new(mesh.nodes.iter().map(|n| n.position).collect(), elevations)
    }

    /// Total number of nodes, live or consumed.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes still available to regions.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Looks up a node by its 1-based index.
    pub fn get(&self, index: usize) -> Option<&Node> {
        index.checked_sub(1).and_then(|i| self.nodes.get(i))
    }

    pub fn is_live(&self, index: usize) -> bool {
        index
            .checked_sub(1)
            .and_then(|i| self.live.get(i).copied())
            .unwrap_or(false)
    }

    /// Every node in index order, consumed or not.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Nodes not yet claimed by any region, in index order.
    pub fn live_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes
            .iter()
            .zip(&self.live)
            .filter_map(|(node, &live)| live.then_some(node))
    }

    /// Permanently removes nodes from the pool. Returns how many were live.
    ///
    /// Unknown and already-consumed indices are ignored.
    pub fn consume(&mut self, indices: &[usize]) -> usize {
        let mut removed = 0;
        for &index in indices {
            if let Some(slot) = index.checked_sub(1).and_then(|i| self.live.get_mut(i)) {
                if *slot {
                    *slot = false;
                    removed += 1;
                }
            }
        }
        self.live_count -= removed;
        removed
    }
}
