// SPDX-License-Identifier: MIT OR Apache-2.0
//! The ordered set of selected nodes.
//!
//! Insertion order is focus order. A node's selection flag and its
//! membership here only ever change together, through [`Selection::insert`]
//! and [`Selection::remove`].

use crate::node::NodeId;
use crate::node_manager::NodeManager;
use glam::Vec3;

/// Currently selected nodes
#[derive(Debug, Clone, Default)]
pub struct Selection {
    nodes: Vec<NodeId>,
}

impl Selection {
    /// Create a new empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a live node at `slot` (clamped; `None` appends).
    /// Returns the index it now occupies, or `None` if the node is not live.
    pub fn insert(&mut self, nodes: &mut NodeManager, id: NodeId, slot: Option<usize>) -> Option<usize> {
        let node = nodes.get_mut(id)?;
        node.set_selected(true);
        if let Some(index) = self.index_of(id) {
            return Some(index);
        }
        let index = slot.unwrap_or(self.nodes.len()).min(self.nodes.len());
        self.nodes.insert(index, id);
        Some(index)
    }

    /// Deselect a node. Returns the index it occupied.
    pub fn remove(&mut self, nodes: &mut NodeManager, id: NodeId) -> Option<usize> {
        if let Some(node) = nodes.get_mut(id) {
            node.set_selected(false);
        }
        let index = self.index_of(id)?;
        self.nodes.remove(index);
        Some(index)
    }

    /// Drop handles of nodes that no longer exist
    pub fn prune(&mut self, nodes: &NodeManager) {
        self.nodes.retain(|id| nodes.contains(*id));
    }

    /// Check if a node is selected
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Position of a node within the selection
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| *n == id)
    }

    /// Check if the selection is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the number of selected nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over selected nodes in focus order
    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    /// Snapshot of the selected handles
    pub fn to_vec(&self) -> Vec<NodeId> {
        self.nodes.clone()
    }

    /// Get the first selected node
    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    /// Arithmetic mean of the selected nodes' positions
    pub fn centroid(&self, nodes: &NodeManager) -> Option<Vec3> {
        let positions: Vec<Vec3> = self
            .nodes
            .iter()
            .filter_map(|id| nodes.get(*id))
            .map(|n| n.position())
            .collect();
        if positions.is_empty() {
            return None;
        }
        Some(positions.iter().copied().sum::<Vec3>() / positions.len() as f32)
    }
}
