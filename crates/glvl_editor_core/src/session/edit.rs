// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selection editing: select, clear, select all, delete, clone, gizmo
//! gestures and snap-to-path.
//!
//! Every operation that changes the selection records the change as Select
//! actions. Gizmo drags mutate transforms in place every frame and record a
//! single entry when the gesture ends.

use super::{EditorMode, EditorSession, Gesture, PickResult, PickTarget};
use crate::action::{ActionContext, HistoryAction};
use crate::level::{Object, SetId};
use crate::node::{NodeCategory, NodeId, NodeKind};
use crate::tools::GizmoMode;
use glam::{Quat, Vec3};

/// What a click on a node did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// Click dropped (debounce, dead node, wrong mode)
    Ignored,
    /// Node is now selected
    Selected(NodeId),
    /// Pick target or node query filled
    Picked(PickResult),
}

impl EditorSession {
    /// Select a node and record it, keeping any current selection.
    /// Focuses the camera on the node.
    pub fn select_node(&mut self, id: NodeId) -> bool {
        let Some(action) = self.select_recorded(id) else {
            return false;
        };
        self.push_history(action);
        if let Some(node) = self.scene.nodes.get(id) {
            self.camera.focus(node.position());
        }
        self.update_selection();
        true
    }

    /// Left click on a node in the viewport
    pub fn click_node(&mut self, id: NodeId, additive: bool) -> ClickOutcome {
        if self.ignore_click_frames > 0 || self.gesture.is_some() {
            return ClickOutcome::Ignored;
        }
        let Some(category) = self
            .scene
            .nodes
            .get(id)
            .filter(|n| n.is_visible())
            .map(|n| n.kind().category())
        else {
            return ClickOutcome::Ignored;
        };

        if let Some(target) = self.pick_target {
            return self.pick(target, id);
        }

        if !self.mode.accepts(category) {
            return ClickOutcome::Ignored;
        }

        if self.mode == EditorMode::NodeQuery {
            let Some(position) = self.scene.nodes.get(id).map(|n| n.position()) else {
                return ClickOutcome::Ignored;
            };
            let _ = self.set_mode(EditorMode::ObjectEdit);
            return ClickOutcome::Picked(PickResult::Position(position));
        }

        if !additive {
            self.clear_selection();
        }
        if let Some(action) = self.select_recorded(id) {
            self.push_history(action);
        }
        self.update_selection();
        ClickOutcome::Selected(id)
    }

    fn pick(&mut self, target: PickTarget, id: NodeId) -> ClickOutcome {
        let Some(node) = self.scene.nodes.get(id) else {
            return ClickOutcome::Ignored;
        };
        let NodeKind::Object { object } = *node.kind() else {
            return ClickOutcome::Ignored;
        };
        let position = node.position();

        match target {
            PickTarget::ObjectId => ClickOutcome::Picked(PickResult::ObjectId(object)),
            PickTarget::LookAtPosition => {
                if let Some(look_at) = self.look_at {
                    let before = self.scene.nodes.get(look_at).map(|n| n.position());
                    if let Some(before) = before.filter(|b| *b != position) {
                        self.scene.set_position(look_at, position);
                        self.push_history(HistoryAction::Move {
                            node: look_at,
                            before,
                            after: position,
                        });
                    }
                }
                ClickOutcome::Picked(PickResult::Position(position))
            }
        }
    }

    /// Deselect everything as one history entry. Nothing is recorded when
    /// the selection is already empty.
    pub fn clear_selection(&mut self) -> bool {
        let recorded = match self.clear_selection_action() {
            Some(action) => {
                self.push_history(action);
                true
            }
            None => false,
        };
        self.update_selection();
        recorded
    }

    /// Deselect everything and return the unpushed record of it
    pub(super) fn clear_selection_action(&mut self) -> Option<HistoryAction> {
        self.selection.prune(&self.scene.nodes);
        let children = self
            .selection
            .to_vec()
            .into_iter()
            .filter_map(|id| self.deselect_recorded(id))
            .collect();
        self.previews.clear();
        HistoryAction::wrap(children)
    }

    pub(super) fn select_recorded(&mut self, id: NodeId) -> Option<HistoryAction> {
        if self.selection.contains(id) {
            return None;
        }
        let slot = self.selection.insert(&mut self.scene.nodes, id, None)?;
        self.previews.add(&self.scene, id);
        Some(HistoryAction::Select {
            node: id,
            was_selected: false,
            selected: true,
            slot,
        })
    }

    fn deselect_recorded(&mut self, id: NodeId) -> Option<HistoryAction> {
        let slot = self.selection.remove(&mut self.scene.nodes, id)?;
        Some(HistoryAction::Select {
            node: id,
            was_selected: true,
            selected: false,
            slot,
        })
    }

    /// Select every visible, unselected object node (Ctrl+A, object mode only)
    pub fn select_all(&mut self) -> bool {
        if self.mode != EditorMode::ObjectEdit {
            return false;
        }
        let candidates: Vec<NodeId> = self
            .scene
            .nodes
            .iter()
            .filter(|n| matches!(n.kind(), NodeKind::Object { .. }))
            .filter(|n| !n.is_selected() && !n.force_hidden && !n.detached)
            .map(|n| n.id())
            .collect();
        let children = candidates
            .into_iter()
            .filter_map(|id| self.select_recorded(id))
            .collect();

        let recorded = match HistoryAction::wrap(children) {
            Some(action) => {
                self.push_history(action);
                true
            }
            None => false,
        };
        self.update_selection();
        recorded
    }

    /// Delete the selected objects (Delete key, object mode only).
    ///
    /// Objects are detached from their set and their nodes hidden; multi-set
    /// instances are only deselected.
    pub fn delete_selection(&mut self) -> bool {
        if self.mode != EditorMode::ObjectEdit || self.selection.is_empty() {
            return false;
        }
        let mut children = Vec::new();
        for id in self.selection.to_vec() {
            let kind = self.scene.nodes.get(id).map(|n| n.kind().clone());
            if let Some(NodeKind::Object { object }) = kind {
                if let Some(set) = self.scene.level.detach_object(object) {
                    self.scene.nodes.hide_object_node(object, true);
                    children.push(HistoryAction::DeleteNode { object, set });
                }
            }
            children.extend(self.deselect_recorded(id));
        }
        self.previews.clear();

        let recorded = match HistoryAction::wrap(children) {
            Some(action) => {
                tracing::debug!("Deleted {} nodes", action.leaf_count());
                self.push_history(action);
                true
            }
            None => false,
        };
        self.update_selection();
        recorded
    }

    /// Clone the selected objects in place as one history entry
    pub fn clone_selection(&mut self) -> bool {
        let action = self.build_clone();
        let recorded = action.is_some();
        if let Some(action) = action {
            self.push_history(action);
        }
        self.update_selection();
        recorded
    }

    /// Clone the selected objects and select the clones, returning the
    /// unpushed record: the nested deselection first, then one Create and
    /// one Select per clone.
    fn build_clone(&mut self) -> Option<HistoryAction> {
        self.selection.prune(&self.scene.nodes);
        if self.selection.is_empty() {
            return None;
        }
        let sources = self.selection.to_vec();
        let deselect = self.clear_selection_action();
        let mut children: Vec<HistoryAction> = deselect.iter().cloned().collect();

        for id in sources {
            let Some(NodeKind::Object { object }) = self.scene.nodes.get(id).map(|n| n.kind().clone()) else {
                continue;
            };
            let Some(copy) = self.scene.level.object(object).cloned() else {
                continue;
            };
            let Some(set) = copy.parent_set else {
                continue;
            };
            children.extend(self.place_copy(copy, set));
        }

        // Nothing cloneable: give the selection back
        if children.len() == usize::from(deselect.is_some()) {
            if let Some(deselect) = deselect {
                deselect.undo(&mut ActionContext {
                    scene: &mut self.scene,
                    selection: &mut self.selection,
                });
            }
            return None;
        }
        HistoryAction::wrap(children)
    }

    /// Add a copy of `source` to `set` under a fresh ID and select it.
    /// Returns the unpushed Create and Select records.
    fn place_copy(&mut self, mut source: Object, set: SetId) -> Vec<HistoryAction> {
        let original = source.id;
        let id = self.scene.level.new_object_id();
        source.id = id;
        source.parent_set = None;
        if let Err(e) = self.scene.level.add_object(set, source) {
            tracing::warn!("Cannot copy {:?}: {e}", original);
            return Vec::new();
        }
        let Some(node) = self.scene.nodes.create_object_node(&self.scene.level, id) else {
            return Vec::new();
        };
        let mut records = vec![HistoryAction::CreateNode { object: id, set }];
        records.extend(self.select_recorded(node));
        records
    }

    /// Copy the selected objects to the clipboard (Ctrl+C). Returns how many
    /// were copied; an empty copy leaves the clipboard as it was.
    pub fn copy_selection(&mut self) -> usize {
        if self.mode != EditorMode::ObjectEdit {
            return 0;
        }
        let copied: Vec<Object> = self
            .selection
            .iter()
            .filter_map(|id| match self.scene.nodes.get(*id)?.kind() {
                NodeKind::Object { object } => self.scene.level.object(*object).cloned(),
                _ => None,
            })
            .collect();
        let count = copied.len();
        if count > 0 {
            tracing::debug!("Copied {count} objects");
            self.clipboard = copied;
        }
        count
    }

    /// Paste the clipboard in place into the current set (Ctrl+V).
    ///
    /// The selection is replaced by the pasted objects, recorded as one
    /// entry: the deselection, then one Create and one Select per object.
    pub fn paste_selection(&mut self) -> bool {
        if self.mode != EditorMode::ObjectEdit || self.clipboard.is_empty() {
            return false;
        }
        let Some(set) = self.current_set else {
            tracing::warn!("No object set to paste into");
            return false;
        };
        let mut children: Vec<HistoryAction> = self.clear_selection_action().into_iter().collect();
        for source in self.clipboard.clone() {
            children.extend(self.place_copy(source, set));
        }

        let recorded = match HistoryAction::wrap(children) {
            Some(action) => {
                self.push_history(action);
                true
            }
            None => false,
        };
        self.update_selection();
        recorded
    }

    /// Move every selected node by `delta`. Records nothing.
    pub fn translate_selection(&mut self, delta: Vec3) {
        for id in self.selection.to_vec() {
            if let Some(position) = self.scene.nodes.get(id).map(|n| n.position()) {
                self.scene.set_position(id, position + delta);
            }
        }
        self.refresh_gizmo();
    }

    /// Rotate the selection by `delta`. Records nothing.
    ///
    /// A single node turns about its own origin (in its local frame unless
    /// world transform is on). With local rotation on, every node turns in
    /// place. Otherwise the nodes orbit the centroid and keep their orientation.
    pub fn rotate_selection(&mut self, delta: Quat) {
        let ids = self.selection.to_vec();
        if ids.len() == 1 || self.local_rotation {
            let local_frame = ids.len() == 1 && !self.world_transform;
            for id in ids {
                if let Some(rotation) = self.scene.nodes.get(id).map(|n| n.rotation()) {
                    let rotation = if local_frame { rotation * delta } else { delta * rotation };
                    self.scene.set_rotation(id, rotation.normalize());
                }
            }
        } else if let Some(pivot) = self.selection.centroid(&self.scene.nodes) {
            for id in ids {
                if let Some(position) = self.scene.nodes.get(id).map(|n| n.position()) {
                    self.scene.set_position(id, pivot + delta * (position - pivot));
                }
            }
        }
        self.refresh_gizmo();
    }

    /// Snapshot position and rotation of every selected node
    pub fn remember_selection(&mut self) {
        for id in self.selection.to_vec() {
            if let Some(node) = self.scene.nodes.get_mut(id) {
                node.remember_transform();
            }
        }
    }

    /// Build the record of a finished gesture from the remembered baselines.
    ///
    /// Translate: a wrapper of one Move per node. Rotate with one node: a
    /// single Rotate. Rotate with several: a wrapper of one {Move, Rotate}
    /// wrapper per node. `None` when nothing moved.
    pub fn make_history_selection(&mut self, mode: GizmoMode) -> Option<HistoryAction> {
        let ids = self.selection.to_vec();
        let multi = ids.len() > 1;
        let mut children = Vec::new();
        let mut changed = false;

        for id in ids {
            let Some(node) = self.scene.nodes.get_mut(id) else {
                continue;
            };
            let Some((last_position, last_rotation)) = node.take_remembered() else {
                continue;
            };
            let (position, rotation) = (node.position(), node.rotation());
            changed |= position != last_position || rotation != last_rotation;

            let step = HistoryAction::Move {
                node: id,
                before: last_position,
                after: position,
            };
            let turn = HistoryAction::Rotate {
                node: id,
                before: last_rotation,
                after: rotation,
            };
            match mode {
                GizmoMode::Translate => children.push(step),
                GizmoMode::Rotate if !multi => return changed.then_some(turn),
                GizmoMode::Rotate => children.push(HistoryAction::Wrapper(vec![step, turn])),
            }
        }

        if !changed {
            return None;
        }
        HistoryAction::wrap(children)
    }

    /// Gizmo handle pressed. With `clone`, the selection is cloned first
    /// and the clone record is held open until the gesture ends.
    pub fn begin_gesture(&mut self, clone: bool) -> bool {
        if self.gesture.is_some() || self.ignore_click_frames > 0 || self.selection.is_empty() {
            return false;
        }
        let clone = if clone && self.mode == EditorMode::ObjectEdit {
            let action = self.build_clone();
            self.update_selection();
            action
        } else {
            None
        };
        self.remember_selection();
        self.gizmo.begin();
        self.gesture = Some(Gesture {
            mode: self.gizmo.mode,
            clone,
        });
        true
    }

    /// Translate drag step
    pub fn drag_translate(&mut self, delta: Vec3) {
        if self.gesture.is_some() {
            self.translate_selection(delta);
        }
    }

    /// Rotate drag step, filtered through rotation snap
    pub fn drag_rotate(&mut self, delta: Quat) {
        if self.gesture.is_none() {
            return;
        }
        let delta = self.gizmo.filter_rotation(delta);
        if delta != Quat::IDENTITY {
            self.rotate_selection(delta);
        }
    }

    /// Gizmo released: record the clone (if any), then the transform edit
    pub fn end_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        self.gizmo.end();
        let transform = self.make_history_selection(gesture.mode);
        let recorded = gesture.clone.is_some() || transform.is_some();
        if let Some(clone) = gesture.clone {
            self.push_history(clone);
        }
        if let Some(transform) = transform {
            self.push_history(transform);
        }
        self.update_selection();
        recorded
    }

    /// Escape during a drag: restore transforms, revert any clones and the
    /// prior selection, record nothing
    pub fn abort_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        self.gizmo.end();
        for id in self.selection.to_vec() {
            let remembered = self.scene.nodes.get_mut(id).and_then(|n| n.take_remembered());
            if let Some((position, rotation)) = remembered {
                self.scene.set_transform(id, position, rotation);
            }
        }
        if let Some(clone) = gesture.clone {
            clone.undo(&mut ActionContext {
                scene: &mut self.scene,
                selection: &mut self.selection,
            });
        }
        self.update_selection();
        tracing::debug!("Gesture aborted");
        true
    }

    /// Move each selected object onto the closest point of any path, as one entry
    pub fn snap_to_closest_path(&mut self) -> bool {
        let mut children = Vec::new();
        for id in self.selection.to_vec() {
            let Some(node) = self.scene.nodes.get(id) else {
                continue;
            };
            if !matches!(node.kind().category(), NodeCategory::Object | NodeCategory::ObjectMultiSet) {
                continue;
            }
            let before = node.position();
            let Some((after, _)) = self.scene.level.closest_path_point(before) else {
                continue;
            };
            self.scene.set_position(id, after);
            children.push(HistoryAction::Move { node: id, before, after });
        }

        let recorded = match HistoryAction::wrap(children) {
            Some(action) => {
                self.push_history(action);
                true
            }
            None => false,
        };
        self.update_selection();
        recorded
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{node_of, session_with};
    use super::*;
    use crate::level::{LevelPath, ObjectId};

    fn count(action: &HistoryAction, label: &str) -> usize {
        action.children().iter().filter(|c| c.label() == label).count()
    }

    #[test]
    fn test_clear_selection_records_one_wrapper() {
        let mut session = session_with(&[("Ring", Vec3::ZERO), ("Ring", Vec3::X), ("Ring", Vec3::Y)]);
        assert!(!session.clear_selection());
        assert!(session.history().actions().is_empty());

        for i in 1..=3 {
            session.select_node(node_of(&session, i));
        }
        let before = session.history().actions().len();
        let order = session.selection().to_vec();
        assert!(session.clear_selection());
        assert_eq!(session.history().actions().len(), before + 1);
        let last = session.history().actions().last().unwrap();
        assert_eq!(count(last, "Select"), 3);
        assert!(order.iter().all(|id| !session.scene.nodes.get(*id).unwrap().is_selected()));

        session.undo();
        assert_eq!(session.selection().to_vec(), order);
        assert!(order.iter().all(|id| session.scene.nodes.get(*id).unwrap().is_selected()));
    }

    #[test]
    fn test_click_replaces_or_adds() {
        let mut session = session_with(&[("Ring", Vec3::ZERO), ("Ring", Vec3::X)]);
        let (a, b) = (node_of(&session, 1), node_of(&session, 2));

        assert_eq!(session.click_node(a, false), ClickOutcome::Selected(a));
        assert_eq!(session.click_node(b, false), ClickOutcome::Selected(b));
        assert_eq!(session.selection().to_vec(), vec![b]);
        assert_eq!(session.click_node(a, true), ClickOutcome::Selected(a));
        assert_eq!(session.selection().to_vec(), vec![b, a]);
    }

    #[test]
    fn test_click_respects_mode_and_pick_target() {
        let mut session = session_with(&[("Ring", Vec3::new(4.0, 0.0, 0.0))]);
        let a = node_of(&session, 1);

        session.set_mode(EditorMode::TerrainEdit).unwrap();
        assert_eq!(session.click_node(a, false), ClickOutcome::Ignored);

        session.set_mode(EditorMode::ObjectEdit).unwrap();
        session.arm_pick_target(PickTarget::ObjectId);
        assert_eq!(
            session.click_node(a, false),
            ClickOutcome::Picked(PickResult::ObjectId(ObjectId(1)))
        );
        assert!(session.selection().is_empty());

        session.disarm_pick_target();
        session.set_mode(EditorMode::NodeQuery).unwrap();
        assert_eq!(
            session.click_node(a, false),
            ClickOutcome::Picked(PickResult::Position(Vec3::new(4.0, 0.0, 0.0)))
        );
        assert_eq!(session.mode(), EditorMode::ObjectEdit);
    }

    #[test]
    fn test_select_all_skips_hidden_and_selected() {
        let mut session = session_with(&[("Ring", Vec3::ZERO), ("Ring", Vec3::X), ("Ring", Vec3::Y)]);
        let (a, b, c) = (node_of(&session, 1), node_of(&session, 2), node_of(&session, 3));
        session.select_node(a);
        session.scene.nodes.get_mut(c).unwrap().force_hidden = true;

        assert!(session.select_all());
        assert_eq!(session.selection().to_vec(), vec![a, b]);
        assert_eq!(count(session.history().actions().last().unwrap(), "Select"), 1);

        assert!(!session.select_all());
    }

    #[test]
    fn test_delete_and_undo() {
        let mut session = session_with(&[("Ring", Vec3::ZERO), ("Ring", Vec3::X)]);
        let (a, b) = (node_of(&session, 1), node_of(&session, 2));
        session.select_node(a);
        session.select_node(b);

        assert!(session.delete_selection());
        assert!(session.selection().is_empty());
        assert!(session.scene.nodes.get(a).unwrap().detached);
        assert!(session.scene.level.sets.values().all(|s| s.objects.is_empty()));
        let last = session.history().actions().last().unwrap();
        assert_eq!(count(last, "Delete"), 2);
        assert_eq!(count(last, "Select"), 2);

        session.undo();
        assert_eq!(session.selection().to_vec(), vec![a, b]);
        assert!(!session.scene.nodes.get(a).unwrap().detached);
        assert_eq!(session.scene.level.object(ObjectId(2)).unwrap().parent_set, Some(crate::level::SetId(0)));

        session.redo();
        assert!(session.scene.nodes.get(b).unwrap().detached);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_clone_is_atomic_with_fresh_ids() {
        let mut session = session_with(&[("Ring", Vec3::ZERO), ("Spring", Vec3::X)]);
        let (a, b) = (node_of(&session, 1), node_of(&session, 2));
        session.select_node(a);
        session.select_node(b);
        let highest = session.scene.level.last_object_id;
        let entries = session.history().actions().len();

        assert!(session.clone_selection());
        assert_eq!(session.history().actions().len(), entries + 1);
        let record = session.history().actions().last().unwrap().clone();
        assert_eq!(count(&record, "Create"), 2);
        assert_eq!(count(&record, "Select"), 2);

        let clones = session.selection().to_vec();
        assert_eq!(clones.len(), 2);
        for clone in &clones {
            let object = session.scene.nodes.get(*clone).unwrap().kind().object().unwrap();
            assert!(object.0 > highest);
        }
        assert_eq!(session.previews().len(), 1);

        session.undo();
        assert_eq!(session.selection().to_vec(), vec![a, b]);
        for clone in &clones {
            assert!(session.scene.nodes.get(*clone).unwrap().detached);
        }
    }

    #[test]
    fn test_rotation_tie_break() {
        let quarter = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);

        // Two nodes orbit their centroid
        let mut group = session_with(&[("Ring", Vec3::new(-1.0, 0.0, 0.0)), ("Ring", Vec3::new(1.0, 0.0, 0.0))]);
        let (a, b) = (node_of(&group, 1), node_of(&group, 2));
        group.select_node(a);
        group.select_node(b);
        group.rotate_selection(quarter);
        let orbited = group.scene.nodes.get(b).unwrap().position();
        assert!(orbited.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
        assert_eq!(group.scene.nodes.get(a).unwrap().rotation(), Quat::IDENTITY);
        assert_eq!(group.scene.nodes.get(b).unwrap().rotation(), Quat::IDENTITY);

        // One node spins in place
        let mut single = session_with(&[("Ring", Vec3::new(-1.0, 0.0, 0.0)), ("Ring", Vec3::new(1.0, 0.0, 0.0))]);
        let b = node_of(&single, 2);
        single.select_node(b);
        single.rotate_selection(quarter);
        let node = single.scene.nodes.get(b).unwrap();
        assert_eq!(node.position(), Vec3::new(1.0, 0.0, 0.0));
        assert!(node.rotation().abs_diff_eq(quarter, 1e-5));
        assert_ne!(node.position(), orbited);

        // Local rotation keeps group members in place
        let mut local = session_with(&[("Ring", Vec3::new(-1.0, 0.0, 0.0)), ("Ring", Vec3::new(1.0, 0.0, 0.0))]);
        let (a, b) = (node_of(&local, 1), node_of(&local, 2));
        local.toggle_local_rotation();
        local.select_node(a);
        local.select_node(b);
        local.rotate_selection(quarter);
        assert_eq!(local.scene.nodes.get(b).unwrap().position(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_gesture_records_on_release() {
        let mut session = session_with(&[("Ring", Vec3::ZERO), ("Ring", Vec3::X)]);
        let (a, b) = (node_of(&session, 1), node_of(&session, 2));
        session.select_node(a);
        session.select_node(b);
        let entries = session.history().actions().len();

        // Translate: flat wrapper of Moves
        assert!(session.begin_gesture(false));
        session.drag_translate(Vec3::Y);
        session.drag_translate(Vec3::Y);
        assert!(session.end_gesture());
        let record = session.history().actions().last().unwrap().clone();
        assert_eq!(count(&record, "Move"), 2);
        assert_eq!(session.scene.nodes.get(a).unwrap().position(), Vec3::new(0.0, 2.0, 0.0));

        // Rotate, group: one {Move, Rotate} wrapper per node
        session.gizmo.mode = GizmoMode::Rotate;
        session.begin_gesture(false);
        session.drag_rotate(Quat::from_rotation_y(0.3));
        session.end_gesture();
        let record = session.history().actions().last().unwrap().clone();
        assert_eq!(record.children().len(), 2);
        assert!(record.children().iter().all(|c| c.leaf_count() == 2 && c.children().len() == 2));
        assert_eq!(session.history().actions().len(), entries + 2);

        // No movement, no entry
        session.begin_gesture(false);
        assert!(!session.end_gesture());
        assert_eq!(session.history().actions().len(), entries + 2);

        session.undo();
        session.undo();
        assert_eq!(session.scene.nodes.get(a).unwrap().position(), Vec3::ZERO);
        assert_eq!(session.scene.nodes.get(b).unwrap().position(), Vec3::X);
        assert!(session.scene.nodes.get(b).unwrap().rotation().abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn test_single_rotate_records_rotate() {
        let mut session = session_with(&[("Ring", Vec3::ZERO)]);
        let a = node_of(&session, 1);
        session.select_node(a);
        session.gizmo.mode = GizmoMode::Rotate;
        session.begin_gesture(false);
        session.drag_rotate(Quat::from_rotation_x(0.5));
        session.end_gesture();
        assert_eq!(session.history().undo_description(), Some("Rotate"));
    }

    #[test]
    fn test_clone_drag_and_abort() {
        let mut session = session_with(&[("Ring", Vec3::ZERO)]);
        let a = node_of(&session, 1);
        session.select_node(a);
        let entries = session.history().actions().len();

        // Aborted clone-drag leaves no trace
        assert!(session.begin_gesture(true));
        let clone = session.selection().first().unwrap();
        assert_ne!(clone, a);
        session.drag_translate(Vec3::X);
        assert!(session.abort_gesture());
        assert_eq!(session.selection().to_vec(), vec![a]);
        assert!(session.scene.nodes.get(clone).unwrap().detached);
        assert_eq!(session.scene.nodes.get(clone).unwrap().position(), Vec3::ZERO);
        assert_eq!(session.history().actions().len(), entries);

        // Completed clone-drag records clone then move
        session.begin_gesture(true);
        let clone = session.selection().first().unwrap();
        session.drag_translate(Vec3::X);
        session.end_gesture();
        assert_eq!(session.history().actions().len(), entries + 2);
        assert_eq!(session.scene.nodes.get(clone).unwrap().position(), Vec3::X);
        assert_eq!(session.scene.nodes.get(a).unwrap().position(), Vec3::ZERO);

        session.undo();
        session.undo();
        assert_eq!(session.selection().to_vec(), vec![a]);
        assert!(session.scene.nodes.get(clone).unwrap().detached);
    }

    #[test]
    fn test_mode_switch_discards_clone_drag() {
        let mut session = session_with(&[("Ring", Vec3::ZERO)]);
        let a = node_of(&session, 1);
        session.select_node(a);
        let entries = session.history().actions().len();

        assert!(session.begin_gesture(true));
        let clone = session.selection().first().unwrap();
        session.drag_translate(Vec3::X);
        session.set_mode(EditorMode::TerrainEdit).unwrap();

        assert!(session.gesture.is_none());
        assert!(session.selection().is_empty());
        assert!(session.scene.nodes.get(clone).unwrap().detached);
        assert_eq!(session.scene.nodes.get(clone).unwrap().position(), Vec3::ZERO);
        assert_eq!(session.scene.nodes.get(a).unwrap().position(), Vec3::ZERO);

        // Only the deselection of the original survives
        assert_eq!(session.history().actions().len(), entries + 1);
        let record = session.history().actions().last().unwrap();
        assert_eq!(record.label(), "Batch");
        assert_eq!(record.children().len(), 1);
        assert_eq!(count(record, "Select"), 1);
        assert!(matches!(record.children()[0], HistoryAction::Select { node, .. } if node == a));
    }

    #[test]
    fn test_copy_paste_in_place() {
        let mut session = session_with(&[("Ring", Vec3::new(1.0, 2.0, 3.0)), ("Spring", Vec3::X)]);
        let (a, b) = (node_of(&session, 1), node_of(&session, 2));

        // Nothing selected keeps the clipboard empty
        assert_eq!(session.copy_selection(), 0);
        assert!(!session.paste_selection());

        session.select_node(a);
        session.select_node(b);
        assert_eq!(session.copy_selection(), 2);
        assert_eq!(session.clipboard().len(), 2);

        // Later edits to the source do not reach the clipboard
        session.translate_selection(Vec3::Y);
        let highest = session.scene.level.last_object_id;
        let entries = session.history().actions().len();

        assert!(session.paste_selection());
        assert_eq!(session.history().actions().len(), entries + 1);
        let record = session.history().actions().last().unwrap().clone();
        assert_eq!(count(&record, "Batch"), 1);
        assert_eq!(count(&record, "Create"), 2);
        assert_eq!(count(&record, "Select"), 2);

        let pasted = session.selection().to_vec();
        assert_eq!(pasted.len(), 2);
        let set = session.current_set().unwrap();
        for (node, expected) in pasted.iter().zip([Vec3::new(1.0, 2.0, 3.0), Vec3::X]) {
            let node = session.scene.nodes.get(*node).unwrap();
            assert_eq!(node.position(), expected);
            let object = node.kind().object().unwrap();
            assert!(object.0 > highest);
            assert_eq!(session.scene.level.object(object).unwrap().parent_set, Some(set));
        }

        // A second paste allocates new IDs again
        assert!(session.paste_selection());
        let again = session.selection().to_vec();
        assert!(again.iter().all(|id| !pasted.contains(id)));

        session.undo();
        session.undo();
        assert_eq!(session.selection().to_vec(), vec![a, b]);
        for node in &pasted {
            assert!(session.scene.nodes.get(*node).unwrap().detached);
        }
    }

    #[test]
    fn test_paste_needs_object_mode() {
        let mut session = session_with(&[("Ring", Vec3::ZERO)]);
        let a = node_of(&session, 1);
        session.select_node(a);
        session.copy_selection();
        session.set_mode(EditorMode::TerrainEdit).unwrap();
        let entries = session.history().actions().len();

        assert_eq!(session.copy_selection(), 0);
        assert!(!session.paste_selection());
        assert_eq!(session.history().actions().len(), entries);
        assert_eq!(session.clipboard().len(), 1);
    }

    #[test]
    fn test_snap_to_closest_path() {
        let mut session = session_with(&[("Ring", Vec3::new(5.0, 3.0, 0.0))]);
        session.scene.level.paths.push(LevelPath {
            name: "main".to_string(),
            knots: vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 10.0)],
        });
        let a = node_of(&session, 1);
        assert!(!session.snap_to_closest_path());

        session.select_node(a);
        let entries = session.history().actions().len();
        assert!(session.snap_to_closest_path());
        assert!(session
            .scene
            .nodes
            .get(a)
            .unwrap()
            .position()
            .abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
        assert_eq!(session.history().actions().len(), entries + 1);

        session.undo();
        assert_eq!(session.scene.nodes.get(a).unwrap().position(), Vec3::new(5.0, 3.0, 0.0));
    }

    #[test]
    fn test_undo_redo_symmetry_over_mixed_edits() {
        let mut session = session_with(&[("Ring", Vec3::ZERO), ("Ring", Vec3::X)]);
        let (a, b) = (node_of(&session, 1), node_of(&session, 2));

        session.click_node(a, false);
        session.click_node(b, true);
        session.begin_gesture(false);
        session.drag_translate(Vec3::Z);
        session.end_gesture();
        session.clone_selection();
        session.clear_selection();

        let after: Vec<(Vec3, bool)> = [a, b]
            .iter()
            .map(|id| {
                let n = session.scene.nodes.get(*id).unwrap();
                (n.position(), n.is_selected())
            })
            .collect();
        let steps = session.history().cursor();

        while session.undo() {}
        assert!(session.selection().is_empty());
        assert_eq!(session.scene.nodes.get(a).unwrap().position(), Vec3::ZERO);
        assert_eq!(session.scene.nodes.get(b).unwrap().position(), Vec3::X);

        while session.redo() {}
        assert_eq!(session.history().cursor(), steps);
        for (id, (position, selected)) in [a, b].iter().zip(after) {
            let n = session.scene.nodes.get(*id).unwrap();
            assert_eq!(n.position(), position);
            assert_eq!(n.is_selected(), selected);
        }
    }
}
