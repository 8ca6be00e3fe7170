// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor session: the scene, the selection, the three history stacks and
//! the mode state machine that decides which stack an action goes to.
//!
//! - `ObjectEdit`, `TerrainEdit`, `GhostEdit` and `NodeQuery` record into
//!   the main history.
//! - `VectorQuery` records every action into both the vector history and
//!   the look-at history. Undo/redo use the look-at history while the
//!   look-at sub-editor is open, the vector history otherwise.
//!
//! Selection editing and gestures live in [`edit`].

mod edit;

pub use edit::ClickOutcome;

use crate::action::{ActionContext, HistoryAction};
use crate::config::{EditorConfig, PLACEMENT_SNAP_GRID};
use crate::error::{EditorError, Result};
use crate::history::History;
use crate::level::{Object, ObjectId, PropertyValue, SetId};
use crate::library::{ObjectLibrary, ObjectTemplate};
use crate::node::{NodeCategory, NodeId, NodeKind};
use crate::scene::Scene;
use crate::selection::Selection;
use crate::tools::{EditorCamera, GizmoMode, TransformGizmo};
use crate::trajectory::TrajectoryPreviews;
use glam::{Quat, Vec3};
use std::collections::HashSet;

/// Editor mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// Placing and transforming objects
    #[default]
    ObjectEdit,
    /// Selecting terrain instances
    TerrainEdit,
    /// Editing the elements of a vector property
    VectorQuery,
    /// Picking a node's position
    NodeQuery,
    /// Positioning the ghost recording
    GhostEdit,
}

impl EditorMode {
    /// Get the name of this mode
    pub fn name(&self) -> &'static str {
        match self {
            Self::ObjectEdit => "Object Edit",
            Self::TerrainEdit => "Terrain Edit",
            Self::VectorQuery => "Vector Query",
            Self::NodeQuery => "Node Query",
            Self::GhostEdit => "Ghost Edit",
        }
    }

    /// Modes where the gizmo edits the selection directly
    pub fn is_regular(&self) -> bool {
        matches!(self, Self::ObjectEdit | Self::TerrainEdit | Self::GhostEdit)
    }

    /// Whether a node of `category` can be clicked in this mode
    pub fn accepts(&self, category: NodeCategory) -> bool {
        use NodeCategory as C;
        match self {
            Self::ObjectEdit => matches!(category, C::Object | C::ObjectMultiSet),
            Self::TerrainEdit => category == C::Terrain,
            Self::VectorQuery => category == C::Vector,
            Self::NodeQuery => matches!(category, C::Object | C::ObjectMultiSet | C::Path | C::Ghost),
            Self::GhostEdit => category == C::Ghost,
        }
    }
}

/// Which history stack undo/redo currently address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryTarget {
    /// Main editing history
    Main,
    /// Vector property editor history
    Vector,
    /// Look-at point editor history
    LookAt,
}

/// What the next node click fills in instead of selecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    /// An object ID property field
    ObjectId,
    /// The look-at point, taken from the clicked object's position
    LookAtPosition,
}

/// Result of a pick-target or node-query click
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickResult {
    /// Picked object
    ObjectId(ObjectId),
    /// Picked position
    Position(Vec3),
}

/// Object placement preview following the cursor
#[derive(Debug, Clone, PartialEq)]
pub struct PalettePreview {
    /// Template being placed
    pub template: ObjectTemplate,
    /// Raw cursor point in the world
    pub target: Vec3,
    /// Placement position (snapped)
    pub position: Vec3,
    /// Placement rotation
    pub rotation: Quat,
}

#[derive(Debug, Clone)]
struct VectorQuery {
    object: ObjectId,
    property: String,
    original: PropertyValue,
    nodes: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Gesture {
    mode: GizmoMode,
    /// Clone wrapper held open until the gesture ends
    clone: Option<HistoryAction>,
}

/// Editing state for one open level
#[derive(Debug)]
pub struct EditorSession {
    /// Level data and nodes
    pub scene: Scene,
    /// Transform gizmo
    pub gizmo: TransformGizmo,
    /// Viewport camera
    pub camera: EditorCamera,
    selection: Selection,
    history: History,
    vector_history: History,
    look_at_history: History,
    mode: EditorMode,
    previews: TrajectoryPreviews,
    library: Option<ObjectLibrary>,
    palette: Option<PalettePreview>,
    pick_target: Option<PickTarget>,
    vector_query: Option<VectorQuery>,
    look_at: Option<NodeId>,
    gesture: Option<Gesture>,
    hovered: Option<NodeId>,
    hidden_categories: HashSet<NodeCategory>,
    clipboard: Vec<Object>,
    current_set: Option<SetId>,
    world_transform: bool,
    local_rotation: bool,
    placement_snap: f32,
    ignore_click_frames: u32,
    click_debounce_frames: u32,
}

impl EditorSession {
    /// Create a session over a scene
    pub fn new(scene: Scene, config: &EditorConfig, library: Option<ObjectLibrary>) -> Self {
        let current_set = scene.level.sets.keys().next().copied();
        Self {
            scene,
            gizmo: TransformGizmo::new(config.rotation_snap, config.rotation_snap_degrees),
            camera: EditorCamera::new(config.camera_speed, config.far_clip),
            selection: Selection::new(),
            history: History::with_max_depth(config.history_depth),
            vector_history: History::with_max_depth(config.history_depth),
            look_at_history: History::with_max_depth(config.history_depth),
            mode: EditorMode::ObjectEdit,
            previews: TrajectoryPreviews::new(),
            library,
            palette: None,
            pick_target: None,
            vector_query: None,
            look_at: None,
            gesture: None,
            hovered: None,
            hidden_categories: HashSet::new(),
            clipboard: Vec::new(),
            current_set,
            world_transform: config.world_transform,
            local_rotation: config.local_rotation,
            placement_snap: config.placement_snap,
            ignore_click_frames: 0,
            click_debounce_frames: config.click_debounce_frames,
        }
    }

    // ========== Accessors ==========

    /// Current mode
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Main editing history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Vector property history
    pub fn vector_history(&self) -> &History {
        &self.vector_history
    }

    /// Look-at point history
    pub fn look_at_history(&self) -> &History {
        &self.look_at_history
    }

    /// Trajectory previews of the selection
    pub fn previews(&self) -> &TrajectoryPreviews {
        &self.previews
    }

    /// Object library, if it loaded
    pub fn library(&self) -> Option<&ObjectLibrary> {
        self.library.as_ref()
    }

    /// Active placement preview
    pub fn palette(&self) -> Option<&PalettePreview> {
        self.palette.as_ref()
    }

    /// Armed pick target
    pub fn pick_target(&self) -> Option<PickTarget> {
        self.pick_target
    }

    /// Node under the cursor
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Nodes standing for the edited vector property elements
    pub fn vector_nodes(&self) -> &[NodeId] {
        self.vector_query.as_ref().map_or(&[], |q| q.nodes.as_slice())
    }

    /// Look-at point node, while the sub-editor is open
    pub fn look_at_node(&self) -> Option<NodeId> {
        self.look_at
    }

    /// Whether the look-at sub-editor is open
    pub fn is_look_at_open(&self) -> bool {
        self.look_at.is_some()
    }

    /// Whether a gizmo drag is in progress
    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Whether scene clicks are currently ignored
    pub fn clicks_ignored(&self) -> bool {
        self.ignore_click_frames > 0
    }

    /// Gizmo aligned to world axes
    pub fn world_transform(&self) -> bool {
        self.world_transform
    }

    /// Multi-selections rotate each node in place
    pub fn local_rotation(&self) -> bool {
        self.local_rotation
    }

    /// Placement grid snap (0 = off)
    pub fn placement_snap(&self) -> f32 {
        self.placement_snap
    }

    /// Set new objects are placed into
    pub fn current_set(&self) -> Option<SetId> {
        self.current_set
    }

    /// Objects waiting to be pasted
    pub fn clipboard(&self) -> &[Object] {
        &self.clipboard
    }

    /// Choose the set new objects are placed into
    pub fn set_current_set(&mut self, set: SetId) -> Result<()> {
        if !self.scene.level.sets.contains_key(&set) {
            return Err(EditorError::UnknownSet(set));
        }
        self.current_set = Some(set);
        Ok(())
    }

    // ========== History routing ==========

    /// Stack that undo/redo address in the current mode
    pub fn history_target(&self) -> HistoryTarget {
        match self.mode {
            EditorMode::VectorQuery if self.look_at.is_some() => HistoryTarget::LookAt,
            EditorMode::VectorQuery => HistoryTarget::Vector,
            _ => HistoryTarget::Main,
        }
    }

    /// Record an already-applied action in the stack(s) of the current mode
    pub fn push_history(&mut self, action: HistoryAction) {
        tracing::debug!("Push {} ({} actions) in {}", action.label(), action.leaf_count(), self.mode.name());
        if self.mode == EditorMode::VectorQuery {
            self.vector_history.push(action.clone());
            self.look_at_history.push(action);
        } else {
            self.history.push(action);
        }
    }

    /// Undo on the stack of the current mode
    pub fn undo(&mut self) -> bool {
        self.replay(false)
    }

    /// Redo on the stack of the current mode
    pub fn redo(&mut self) -> bool {
        self.replay(true)
    }

    fn replay(&mut self, redo: bool) -> bool {
        if self.gesture.is_some() {
            return false;
        }
        let history = match self.history_target() {
            HistoryTarget::Main => &mut self.history,
            HistoryTarget::Vector => &mut self.vector_history,
            HistoryTarget::LookAt => &mut self.look_at_history,
        };
        let mut ctx = ActionContext {
            scene: &mut self.scene,
            selection: &mut self.selection,
        };
        let done = if redo { history.redo(&mut ctx) } else { history.undo(&mut ctx) };
        self.update_selection();
        done
    }

    // ========== Modes ==========

    /// Switch modes, clearing the selection and mode-specific state.
    ///
    /// `VectorQuery` is entered through [`Self::open_vector_query`] only.
    pub fn set_mode(&mut self, mode: EditorMode) -> Result<()> {
        if mode == EditorMode::VectorQuery {
            return Err(EditorError::InvalidMode(
                "vector query mode opens on a property".to_string(),
            ));
        }
        if mode == self.mode {
            return Ok(());
        }
        if self.mode == EditorMode::VectorQuery {
            self.close_vector_query(false);
        }
        self.teardown_transient();
        self.clear_selection();
        self.mode = mode;
        self.ignore_click_frames = self.click_debounce_frames;
        self.update_selection();
        tracing::info!("Entered {} mode", mode.name());
        Ok(())
    }

    /// Toggle between `mode` and object editing (Ctrl+T, Ctrl+G)
    pub fn toggle_mode(&mut self, mode: EditorMode) -> Result<()> {
        let target = if self.mode == mode { EditorMode::ObjectEdit } else { mode };
        self.set_mode(target)
    }

    /// Drop the open gesture, palette preview and pick flags
    fn teardown_transient(&mut self) {
        self.abort_gesture();
        self.palette = None;
        self.pick_target = None;
        self.previews.clear();
    }

    /// Escape: leave every special placement state
    pub fn escape(&mut self) {
        self.abort_gesture();
        self.cancel_palette_preview();
        match self.mode {
            EditorMode::VectorQuery => {
                self.close_vector_query(false);
            }
            EditorMode::NodeQuery => {
                let _ = self.set_mode(EditorMode::ObjectEdit);
            }
            _ => {}
        }
        self.pick_target = None;
    }

    /// Per-frame click debounce countdown
    pub fn tick_debounce(&mut self) {
        self.ignore_click_frames = self.ignore_click_frames.saturating_sub(1);
    }

    // ========== Vector query ==========

    /// Enter vector query mode on a Vector or VectorList property
    pub fn open_vector_query(&mut self, object: ObjectId, property: &str) -> Result<()> {
        if self.mode != EditorMode::ObjectEdit {
            return Err(EditorError::InvalidMode(format!(
                "cannot edit a vector property from {} mode",
                self.mode.name()
            )));
        }
        let data = self.scene.level.object(object).ok_or(EditorError::UnknownObject(object))?;
        let original = data
            .params
            .get(property)
            .cloned()
            .ok_or_else(|| EditorError::UnknownProperty {
                object,
                name: property.to_string(),
            })?;
        let vectors = original.vectors().ok_or_else(|| EditorError::PropertyType {
            object,
            name: property.to_string(),
            expected: "vector",
        })?;

        self.teardown_transient();
        self.clear_selection();

        self.mode = EditorMode::VectorQuery;
        self.vector_history.clear();
        self.look_at_history.clear();
        let nodes = vectors
            .into_iter()
            .enumerate()
            .map(|(index, v)| self.scene.nodes.create_node(NodeKind::Vector { index }, v, Quat::IDENTITY))
            .collect();
        self.vector_query = Some(VectorQuery {
            object,
            property: property.to_string(),
            original,
            nodes,
        });
        self.ignore_click_frames = self.click_debounce_frames;
        self.update_selection();
        tracing::info!("Editing vector property {property} of {:?}", object);
        Ok(())
    }

    /// Leave vector query mode. With `commit`, the edited vectors are written
    /// back to the object as one action in the main history.
    pub fn close_vector_query(&mut self, commit: bool) -> bool {
        let Some(query) = self.vector_query.take() else {
            return false;
        };
        self.abort_gesture();
        self.close_look_at();
        self.pick_target = None;

        for id in self.selection.to_vec() {
            self.selection.remove(&mut self.scene.nodes, id);
        }
        self.previews.clear();

        let positions: Vec<Vec3> = query
            .nodes
            .iter()
            .filter_map(|id| self.scene.nodes.get(*id))
            .map(|n| n.position())
            .collect();
        for id in &query.nodes {
            self.scene.nodes.destroy_node(*id);
        }
        self.vector_history.clear();
        self.look_at_history.clear();
        self.mode = EditorMode::ObjectEdit;
        self.ignore_click_frames = self.click_debounce_frames;

        if commit {
            let after = match &query.original {
                PropertyValue::Vector(_) => positions.first().copied().map(PropertyValue::Vector),
                PropertyValue::VectorList(_) => Some(PropertyValue::VectorList(positions)),
                _ => None,
            };
            if let Some(after) = after.filter(|a| *a != query.original) {
                let action = HistoryAction::SetProperty {
                    object: query.object,
                    name: query.property,
                    before: query.original,
                    after,
                };
                action.redo(&mut ActionContext {
                    scene: &mut self.scene,
                    selection: &mut self.selection,
                });
                self.push_history(action);
            }
        }
        self.update_selection();
        true
    }

    /// Open the look-at point sub-editor with a handle at `point`
    pub fn open_look_at(&mut self, point: Vec3) -> Result<NodeId> {
        let Some(query) = &self.vector_query else {
            return Err(EditorError::InvalidMode(
                "the look-at editor needs an open vector query".to_string(),
            ));
        };
        if let Some(id) = self.look_at {
            return Ok(id);
        }
        let index = query.nodes.len();
        let id = self
            .scene
            .nodes
            .create_node(NodeKind::Vector { index }, point, Quat::IDENTITY);
        self.look_at = Some(id);
        Ok(id)
    }

    /// Close the look-at sub-editor, returning the final point
    pub fn close_look_at(&mut self) -> Option<Vec3> {
        let id = self.look_at.take()?;
        if self.selection.contains(id) {
            self.selection.remove(&mut self.scene.nodes, id);
        }
        let point = self.scene.nodes.destroy_node(id).map(|n| n.position());
        if self.pick_target == Some(PickTarget::LookAtPosition) {
            self.pick_target = None;
        }
        self.update_selection();
        point
    }

    // ========== Pick target ==========

    /// Arm the next node click to fill a field instead of selecting
    pub fn arm_pick_target(&mut self, target: PickTarget) {
        self.pick_target = Some(target);
    }

    /// Disarm pick-target mode
    pub fn disarm_pick_target(&mut self) {
        self.pick_target = None;
    }

    // ========== Palette ==========

    /// Start placing an object from the library
    pub fn begin_palette_preview(&mut self, name: &str) -> bool {
        if self.mode != EditorMode::ObjectEdit {
            return false;
        }
        let Some(library) = &self.library else {
            tracing::warn!("Object library unavailable, cannot place {name}");
            return false;
        };
        let Some(template) = library.get(name).cloned() else {
            tracing::warn!("No object template named {name}");
            return false;
        };
        self.abort_gesture();
        self.palette = Some(PalettePreview {
            template,
            target: Vec3::ZERO,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        });
        true
    }

    /// Whether a placement preview is active
    pub fn is_palette_preview_active(&self) -> bool {
        self.palette.is_some()
    }

    /// Move the placement preview toward a world point
    pub fn set_palette_cursor(&mut self, point: Vec3) {
        if let Some(preview) = &mut self.palette {
            preview.target = point;
        }
    }

    /// Per-frame placement preview refresh
    pub fn refresh_palette_preview(&mut self) {
        let snap = self.placement_snap;
        if let Some(preview) = &mut self.palette {
            preview.position = snap_to_grid(preview.target, snap);
        }
    }

    /// Place an object at the preview. The preview stays active.
    pub fn commit_palette_preview(&mut self) -> Option<ObjectId> {
        let preview = self.palette.clone()?;
        let set = self.current_set?;

        let id = self.scene.level.new_object_id();
        let mut object = preview.template.instantiate(id);
        object.position = snap_to_grid(preview.target, self.placement_snap);
        object.rotation = preview.rotation;
        if let Err(e) = self.scene.level.add_object(set, object) {
            tracing::warn!("Cannot place {}: {e}", preview.template.name);
            return None;
        }
        let node = self.scene.nodes.create_object_node(&self.scene.level, id)?;

        let mut children = Vec::new();
        children.extend(self.clear_selection_action());
        children.push(HistoryAction::CreateNode { object: id, set });
        children.extend(self.select_recorded(node));
        if let Some(action) = HistoryAction::wrap(children) {
            self.push_history(action);
        }
        self.update_selection();
        tracing::debug!("Placed {} as {:?}", preview.template.name, id);
        Some(id)
    }

    /// Discard the placement preview
    pub fn cancel_palette_preview(&mut self) {
        self.palette = None;
    }

    // ========== Toggles ==========

    /// Toggle world-aligned gizmo (Ctrl+E)
    pub fn toggle_world_transform(&mut self) -> bool {
        self.world_transform = !self.world_transform;
        self.refresh_gizmo();
        self.world_transform
    }

    /// Toggle per-node rotation of multi-selections
    pub fn toggle_local_rotation(&mut self) -> bool {
        self.local_rotation = !self.local_rotation;
        self.local_rotation
    }

    /// Toggle gizmo rotation snap (Ctrl+R)
    pub fn toggle_rotation_snap(&mut self) -> bool {
        self.gizmo.rotation_snap = !self.gizmo.rotation_snap;
        self.gizmo.rotation_snap
    }

    /// Toggle the placement grid between off and 0.5 units
    pub fn toggle_placement_snap(&mut self) -> f32 {
        self.placement_snap = if self.placement_snap > 0.0 { 0.0 } else { PLACEMENT_SNAP_GRID };
        self.placement_snap
    }

    /// Toggle force-hiding a node category. Objects and their multi-set
    /// instances toggle together. Returns whether the category is now hidden.
    pub fn toggle_category_visibility(&mut self, category: NodeCategory) -> bool {
        let hidden = !self.hidden_categories.contains(&category);
        let categories: &[NodeCategory] = match category {
            NodeCategory::Object | NodeCategory::ObjectMultiSet => {
                &[NodeCategory::Object, NodeCategory::ObjectMultiSet]
            }
            _ => std::slice::from_ref(&category),
        };
        for category in categories {
            if hidden {
                self.hidden_categories.insert(*category);
            } else {
                self.hidden_categories.remove(category);
            }
            self.scene.nodes.set_category_hidden(*category, hidden);
        }
        hidden
    }

    // ========== Per-frame ==========

    /// Hover highlight; at most one node is highlighted
    pub fn set_hover(&mut self, node: Option<NodeId>) {
        if self.hovered == node {
            return;
        }
        if let Some(previous) = self.hovered.take() {
            self.scene.nodes.set_highlight(previous, false);
        }
        if let Some(id) = node.filter(|id| self.scene.nodes.contains(*id)) {
            self.scene.nodes.set_highlight(id, true);
            self.hovered = Some(id);
        }
    }

    /// Recompute trajectory previews from the live selection transforms
    pub fn update_trajectories(&mut self, dt: f32) {
        if self.selection.is_empty() {
            return;
        }
        self.previews.update(&self.scene, dt);
    }

    /// Re-derive display state after a selection change: drop dead handles,
    /// sync trajectory previews and place the gizmo.
    pub fn update_selection(&mut self) {
        self.selection.prune(&self.scene.nodes);
        let ids = self.selection.to_vec();
        self.previews.retain(&ids);
        for id in &ids {
            self.previews.add(&self.scene, *id);
        }
        if let Some(hovered) = self.hovered {
            if !self.scene.nodes.contains(hovered) {
                self.hovered = None;
            }
        }
        self.refresh_gizmo();
    }

    fn refresh_gizmo(&mut self) {
        let count = self.selection.len();
        self.gizmo.visible = count > 0;
        self.gizmo.rotation_frozen = count > 1 || self.world_transform;
        if let Some(center) = self.selection.centroid(&self.scene.nodes) {
            self.gizmo.position = center;
        }
        self.gizmo.rotation = match self.selection.first() {
            Some(id) if count == 1 && !self.world_transform => self
                .scene
                .nodes
                .get(id)
                .map_or(Quat::IDENTITY, |n| n.rotation()),
            _ => Quat::IDENTITY,
        };
    }
}

fn snap_to_grid(point: Vec3, grid: f32) -> Vec3 {
    if grid > 0.0 {
        (point / grid).round() * grid
    } else {
        point
    }
}
