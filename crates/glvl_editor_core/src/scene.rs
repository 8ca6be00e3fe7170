// SPDX-License-Identifier: MIT OR Apache-2.0
//! The editable scene: level data plus the nodes that stand for it.
//!
//! Node transform changes go through here so object-backed nodes write
//! their new transform through to the level.

use crate::level::{Level, ObjectId};
use crate::node::{NodeId, NodeKind};
use crate::node_manager::NodeManager;
use glam::{Quat, Vec3};

/// Level data and its editor nodes
#[derive(Debug, Default)]
pub struct Scene {
    /// Level data
    pub level: Level,
    /// Editor nodes
    pub nodes: NodeManager,
}

impl Scene {
    /// Create a scene and realize a node for every attached object and terrain block
    pub fn new(level: Level, nodes: NodeManager) -> Self {
        let mut scene = Self { level, nodes };
        let attached: Vec<ObjectId> = scene.level.attached_objects().map(|o| o.id).collect();
        for object in attached {
            scene.nodes.create_object_node(&scene.level, object);
        }
        for (block, terrain) in scene.level.terrain.iter().enumerate() {
            scene
                .nodes
                .create_node(NodeKind::Terrain { block }, terrain.center, Quat::IDENTITY);
        }
        for (path, data) in scene.level.paths.iter().enumerate() {
            let anchor = data.knots.first().copied().unwrap_or(Vec3::ZERO);
            scene
                .nodes
                .create_node(NodeKind::Path { path }, anchor, Quat::IDENTITY);
        }
        scene
    }

    /// Set a node's position. Returns false if the node is not live.
    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> bool {
        let Some(rotation) = self.nodes.get(id).map(|n| n.rotation()) else {
            return false;
        };
        self.set_transform(id, position, rotation)
    }

    /// Set a node's rotation. Returns false if the node is not live.
    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) -> bool {
        let Some(position) = self.nodes.get(id).map(|n| n.position()) else {
            return false;
        };
        self.set_transform(id, position, rotation)
    }

    /// Set a node's full transform, writing through to the level
    pub fn set_transform(&mut self, id: NodeId, position: Vec3, rotation: Quat) -> bool {
        let Some(kind) = self.nodes.get(id).map(|n| n.kind().clone()) else {
            return false;
        };
        self.nodes.place(id, position, rotation);

        match kind {
            NodeKind::Object { object } => {
                if let Some(data) = self.level.object_mut(object) {
                    data.position = position;
                    data.rotation = rotation;
                }
            }
            NodeKind::MultiSetProxy { object, index } => {
                if let Some(entry) = self
                    .level
                    .object_mut(object)
                    .and_then(|o| o.multi_set.get_mut(index))
                {
                    entry.position = position;
                    entry.rotation = rotation;
                }
            }
            _ => {}
        }
        true
    }

    /// Name of the object behind a node, if any
    pub fn object_name(&self, id: NodeId) -> Option<&str> {
        let object = self.nodes.get(id)?.kind().object()?;
        self.level.object(object).map(|o| o.name.as_str())
    }
}
