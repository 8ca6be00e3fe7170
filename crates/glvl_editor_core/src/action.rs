// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reversible editor actions.
//!
//! Each action carries just enough state to replay itself in either
//! direction. Actions that reference a node which no longer exists skip
//! their effect: undo/redo must keep working over a stale history.

use crate::level::{ObjectId, PropertyValue, SetId};
use crate::node::NodeId;
use crate::scene::Scene;
use crate::selection::Selection;
use glam::{Quat, Vec3};

/// Everything an action may touch while replaying
#[derive(Debug)]
pub struct ActionContext<'a> {
    /// Level and nodes
    pub scene: &'a mut Scene,
    /// The selection Select actions restore
    pub selection: &'a mut Selection,
}

/// A reversible edit
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    /// Node translation
    Move {
        /// Moved node
        node: NodeId,
        /// Position before the edit
        before: Vec3,
        /// Position after the edit
        after: Vec3,
    },
    /// Node rotation
    Rotate {
        /// Rotated node
        node: NodeId,
        /// Rotation before the edit
        before: Quat,
        /// Rotation after the edit
        after: Quat,
    },
    /// Selection membership change
    Select {
        /// Affected node
        node: NodeId,
        /// Membership before the edit
        was_selected: bool,
        /// Membership after the edit
        selected: bool,
        /// Index in the selection where the node was added or removed
        slot: usize,
    },
    /// An object was added to the level
    CreateNode {
        /// Created object
        object: ObjectId,
        /// Set the object belongs to
        set: SetId,
    },
    /// An object was removed from the level
    DeleteNode {
        /// Deleted object
        object: ObjectId,
        /// Set the object was removed from
        set: SetId,
    },
    /// An object parameter was replaced
    SetProperty {
        /// Edited object
        object: ObjectId,
        /// Parameter name
        name: String,
        /// Value before the edit
        before: PropertyValue,
        /// Value after the edit
        after: PropertyValue,
    },
    /// Children replayed as one unit: forward on redo, reversed on undo
    Wrapper(Vec<HistoryAction>),
}

impl HistoryAction {
    /// Wrap children into one unit. Returns `None` for an empty list so
    /// callers never record a step that does nothing.
    pub fn wrap(children: Vec<HistoryAction>) -> Option<Self> {
        if children.is_empty() {
            None
        } else {
            Some(Self::Wrapper(children))
        }
    }

    /// Revert the action
    pub fn undo(&self, ctx: &mut ActionContext<'_>) {
        match self {
            Self::Move { node, before, .. } => move_node(ctx, *node, *before),
            Self::Rotate { node, before, .. } => rotate_node(ctx, *node, *before),
            Self::Select { node, was_selected, slot, .. } => {
                set_membership(ctx, *node, *was_selected, *slot);
            }
            Self::CreateNode { object, set } => set_presence(ctx, *object, *set, false),
            Self::DeleteNode { object, set } => set_presence(ctx, *object, *set, true),
            Self::SetProperty { object, name, before, .. } => {
                set_property(ctx, *object, name, before);
            }
            Self::Wrapper(children) => {
                for child in children.iter().rev() {
                    child.undo(ctx);
                }
            }
        }
    }

    /// Re-apply the action
    pub fn redo(&self, ctx: &mut ActionContext<'_>) {
        match self {
            Self::Move { node, after, .. } => move_node(ctx, *node, *after),
            Self::Rotate { node, after, .. } => rotate_node(ctx, *node, *after),
            Self::Select { node, selected, slot, .. } => {
                set_membership(ctx, *node, *selected, *slot);
            }
            Self::CreateNode { object, set } => set_presence(ctx, *object, *set, true),
            Self::DeleteNode { object, set } => set_presence(ctx, *object, *set, false),
            Self::SetProperty { object, name, after, .. } => {
                set_property(ctx, *object, name, after);
            }
            Self::Wrapper(children) => {
                for child in children {
                    child.redo(ctx);
                }
            }
        }
    }

    /// Short description for menus and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Move { .. } => "Move",
            Self::Rotate { .. } => "Rotate",
            Self::Select { .. } => "Select",
            Self::CreateNode { .. } => "Create",
            Self::DeleteNode { .. } => "Delete",
            Self::SetProperty { .. } => "Edit Property",
            Self::Wrapper(_) => "Batch",
        }
    }

    /// Direct children of a wrapper; empty for leaf actions
    pub fn children(&self) -> &[HistoryAction] {
        match self {
            Self::Wrapper(children) => children,
            _ => &[],
        }
    }

    /// Number of leaf actions, descending into nested wrappers
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Wrapper(children) => children.iter().map(Self::leaf_count).sum(),
            _ => 1,
        }
    }
}

fn move_node(ctx: &mut ActionContext<'_>, node: NodeId, position: Vec3) {
    if !ctx.scene.set_position(node, position) {
        tracing::trace!("Skipping move of dead node {:?}", node);
    }
}

fn rotate_node(ctx: &mut ActionContext<'_>, node: NodeId, rotation: Quat) {
    if !ctx.scene.set_rotation(node, rotation) {
        tracing::trace!("Skipping rotation of dead node {:?}", node);
    }
}

fn set_membership(ctx: &mut ActionContext<'_>, node: NodeId, selected: bool, slot: usize) {
    if !ctx.scene.nodes.contains(node) {
        tracing::trace!("Skipping selection of dead node {:?}", node);
        return;
    }
    if selected {
        ctx.selection.insert(&mut ctx.scene.nodes, node, Some(slot));
    } else {
        ctx.selection.remove(&mut ctx.scene.nodes, node);
    }
}

fn set_presence(ctx: &mut ActionContext<'_>, object: ObjectId, set: SetId, present: bool) {
    let scene = &mut *ctx.scene;
    if present {
        if scene.level.attach_object(object, set) {
            scene.nodes.create_object_node(&scene.level, object);
        } else {
            tracing::trace!("Skipping re-attach of unknown object {:?}", object);
        }
    } else {
        scene.level.detach_object(object);
        scene.nodes.hide_object_node(object, true);
    }
}

fn set_property(ctx: &mut ActionContext<'_>, object: ObjectId, name: &str, value: &PropertyValue) {
    match ctx.scene.level.object_mut(object) {
        Some(data) => {
            data.params.insert(name.to_string(), value.clone());
        }
        None => tracing::trace!("Skipping property edit of unknown object {:?}", object),
    }
}
