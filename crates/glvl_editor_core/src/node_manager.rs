// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node manager: owns every editor node and the object → node lookup.
//!
//! The rendering engine is reached only through [`RenderSink`], which is
//! told about node lifecycle and transform changes by [`NodeId`].

use crate::level::{Level, ObjectId};
use crate::node::{EditorNode, NodeCategory, NodeId, NodeKind};
use glam::{Quat, Vec3};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Receiver of node changes on the rendering side
pub trait RenderSink: Send {
    /// A node was created
    fn node_created(&mut self, _id: NodeId, _kind: &NodeKind, _position: Vec3, _rotation: Quat) {}
    /// A node's transform changed
    fn node_moved(&mut self, _id: NodeId, _position: Vec3, _rotation: Quat) {}
    /// A node became visible or hidden
    fn node_visibility(&mut self, _id: NodeId, _visible: bool) {}
    /// A node's hover highlight changed
    fn node_highlight(&mut self, _id: NodeId, _highlighted: bool) {}
    /// A node was destroyed
    fn node_destroyed(&mut self, _id: NodeId) {}
}

/// Render sink that ignores everything
#[derive(Debug, Default)]
pub struct NullRenderSink;

impl RenderSink for NullRenderSink {}

/// Owner of all editor nodes
pub struct NodeManager {
    nodes: IndexMap<NodeId, EditorNode>,
    object_nodes: HashMap<ObjectId, NodeId>,
    next_id: u32,
    sink: Box<dyn RenderSink>,
}

impl std::fmt::Debug for NodeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeManager")
            .field("nodes", &self.nodes.len())
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl NodeManager {
    /// Create a node manager without a renderer
    pub fn new() -> Self {
        Self::with_sink(Box::new(NullRenderSink))
    }

    /// Create a node manager reporting to `sink`
    pub fn with_sink(sink: Box<dyn RenderSink>) -> Self {
        Self {
            nodes: IndexMap::new(),
            object_nodes: HashMap::new(),
            next_id: 1,
            sink,
        }
    }

    /// Create a node of any kind
    pub fn create_node(&mut self, kind: NodeKind, position: Vec3, rotation: Quat) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.sink.node_created(id, &kind, position, rotation);
        self.nodes.insert(id, EditorNode::new(id, kind, position, rotation));
        id
    }

    /// Create (or reveal) the node for an object, plus one proxy per multi-set entry
    pub fn create_object_node(&mut self, level: &Level, object: ObjectId) -> Option<NodeId> {
        if let Some(&existing) = self.object_nodes.get(&object) {
            self.hide_object_node(object, false);
            return Some(existing);
        }

        let data = level.object(object)?;
        let id = self.create_node(NodeKind::Object { object }, data.position, data.rotation);
        self.object_nodes.insert(object, id);

        for (index, entry) in data.multi_set.iter().enumerate() {
            self.create_node(
                NodeKind::MultiSetProxy { object, index },
                entry.position,
                entry.rotation,
            );
        }

        Some(id)
    }

    /// Hide or reveal an object's node and its multi-set proxies
    pub fn hide_object_node(&mut self, object: ObjectId, hidden: bool) {
        let sink = &mut self.sink;
        for node in self.nodes.values_mut() {
            if node.kind().object() == Some(object) && node.detached != hidden {
                node.detached = hidden;
                sink.node_visibility(node.id(), node.is_visible());
            }
        }
    }

    /// Destroy a node. Its handle is dead afterwards.
    pub fn destroy_node(&mut self, id: NodeId) -> Option<EditorNode> {
        let node = self.nodes.shift_remove(&id)?;
        if let NodeKind::Object { object } = node.kind() {
            self.object_nodes.remove(object);
        }
        self.sink.node_destroyed(id);
        Some(node)
    }

    /// Whether the handle refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get a node
    pub fn get(&self, id: NodeId) -> Option<&EditorNode> {
        self.nodes.get(&id)
    }

    /// Get a node mutably
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut EditorNode> {
        self.nodes.get_mut(&id)
    }

    /// Node standing for an object
    pub fn object_node(&self, object: ObjectId) -> Option<NodeId> {
        self.object_nodes.get(&object).copied()
    }

    /// All live nodes in creation order
    pub fn iter(&self) -> impl Iterator<Item = &EditorNode> {
        self.nodes.values()
    }

    /// Live object nodes in creation order
    pub fn object_node_ids(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| matches!(n.kind(), NodeKind::Object { .. }))
            .map(EditorNode::id)
            .collect()
    }

    /// Node count
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes exist
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Set a node's transform and notify the renderer
    pub(crate) fn place(&mut self, id: NodeId, position: Vec3, rotation: Quat) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        node.set_position_raw(position);
        node.set_rotation_raw(rotation);
        self.sink.node_moved(id, position, rotation);
        true
    }

    /// Set the hover highlight flag
    pub fn set_highlight(&mut self, id: NodeId, highlighted: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            if node.is_highlighted() != highlighted {
                node.set_highlighted(highlighted);
                self.sink.node_highlight(id, highlighted);
            }
        }
    }

    /// Force-hide or reveal every node of a category
    pub fn set_category_hidden(&mut self, category: NodeCategory, hidden: bool) {
        let sink = &mut self.sink;
        for node in self.nodes.values_mut() {
            if node.kind().category() == category && node.force_hidden != hidden {
                node.force_hidden = hidden;
                sink.node_visibility(node.id(), node.is_visible());
            }
        }
    }

    /// Mark a terrain node streamed in or out
    pub fn set_streamed_out(&mut self, id: NodeId, streamed_out: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            if node.streamed_out != streamed_out {
                node.streamed_out = streamed_out;
                self.sink.node_visibility(id, node.is_visible());
            }
        }
    }

    /// Advance every node's animation clock
    pub fn add_time(&mut self, dt: f32) {
        for node in self.nodes.values_mut() {
            node.animation_time += dt;
        }
    }
}

impl Default for NodeManager {
    fn default() -> Self {
        Self::new()
    }
}
