// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor nodes: the selectable, transformable stand-ins for level entities.

use crate::level::ObjectId;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Stable handle of an editor node. Renderers store this, never a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// What an editor node stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A placed object
    Object {
        /// Underlying object
        object: ObjectId,
    },
    /// One instance of a multi-set object
    MultiSetProxy {
        /// Owning object
        object: ObjectId,
        /// Index into the object's multi-set entries
        index: usize,
    },
    /// A terrain instance
    Terrain {
        /// Index into the level's terrain blocks
        block: usize,
    },
    /// A path spline
    Path {
        /// Index into the level's paths
        path: usize,
    },
    /// The ghost recording playback node
    Ghost,
    /// A handle for one element of a vector property
    Vector {
        /// Element index within the edited property
        index: usize,
    },
}

impl NodeKind {
    /// Category used for visibility toggles
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::Object { .. } => NodeCategory::Object,
            Self::MultiSetProxy { .. } => NodeCategory::ObjectMultiSet,
            Self::Terrain { .. } => NodeCategory::Terrain,
            Self::Path { .. } => NodeCategory::Path,
            Self::Ghost => NodeCategory::Ghost,
            Self::Vector { .. } => NodeCategory::Vector,
        }
    }

    /// Object this node edits, directly or through a multi-set entry
    pub fn object(&self) -> Option<ObjectId> {
        match self {
            Self::Object { object } | Self::MultiSetProxy { object, .. } => Some(*object),
            _ => None,
        }
    }
}

/// Node categories (Ctrl+1..6 visibility toggles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Placed objects
    Object,
    /// Multi-set instances
    ObjectMultiSet,
    /// Terrain instances
    Terrain,
    /// Paths
    Path,
    /// Ghost playback
    Ghost,
    /// Vector property handles
    Vector,
}

/// An editor node
#[derive(Debug, Clone)]
pub struct EditorNode {
    id: NodeId,
    kind: NodeKind,
    position: Vec3,
    rotation: Quat,
    selected: bool,
    highlighted: bool,
    /// Hidden by a category visibility toggle
    pub force_hidden: bool,
    /// Hidden because its object was deleted from the level
    pub detached: bool,
    /// Terrain not currently streamed in
    pub streamed_out: bool,
    /// Animation clock in seconds
    pub animation_time: f32,
    last_position: Option<Vec3>,
    last_rotation: Option<Quat>,
}

impl EditorNode {
    /// Create a node at the given transform
    pub fn new(id: NodeId, kind: NodeKind, position: Vec3, rotation: Quat) -> Self {
        Self {
            id,
            kind,
            position,
            rotation,
            selected: false,
            highlighted: false,
            force_hidden: false,
            detached: false,
            streamed_out: false,
            animation_time: 0.0,
            last_position: None,
            last_rotation: None,
        }
    }

    /// Node handle
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node kind
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Current position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current rotation
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub(crate) fn set_position_raw(&mut self, position: Vec3) {
        self.position = position;
    }

    pub(crate) fn set_rotation_raw(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Selection flag. Only [`crate::selection::Selection`] changes it.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Hover highlight flag
    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub(crate) fn set_highlighted(&mut self, highlighted: bool) {
        self.highlighted = highlighted;
    }

    /// Whether the node should be drawn
    pub fn is_visible(&self) -> bool {
        !self.force_hidden && !self.detached && !self.streamed_out
    }

    /// Snapshot the transform before an edit gesture
    pub fn remember_transform(&mut self) {
        self.last_position = Some(self.position);
        self.last_rotation = Some(self.rotation);
    }

    /// Consume the gesture baseline. `None` if nothing was remembered.
    pub fn take_remembered(&mut self) -> Option<(Vec3, Quat)> {
        let position = self.last_position.take()?;
        let rotation = self.last_rotation.take()?;
        Some((position, rotation))
    }
}
