// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor tools: the transform gizmo and the viewport camera.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Gizmo mode for transform operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GizmoMode {
    /// Translate (move) mode - T key
    #[default]
    Translate,
    /// Rotate mode - R key
    Rotate,
}

impl GizmoMode {
    /// Get the name of this mode
    pub fn name(&self) -> &'static str {
        match self {
            Self::Translate => "Translate",
            Self::Rotate => "Rotate",
        }
    }

    /// Get the hotkey for this mode
    pub fn hotkey(&self) -> char {
        match self {
            Self::Translate => 'T',
            Self::Rotate => 'R',
        }
    }
}

/// Transform gizmo display and drag state
#[derive(Debug, Clone)]
pub struct TransformGizmo {
    /// Current mode
    pub mode: GizmoMode,
    /// Shown when something is selected
    pub visible: bool,
    /// Anchor (selection centroid)
    pub position: Vec3,
    /// Orientation of the handles
    pub rotation: Quat,
    /// Handles stay world-aligned
    pub rotation_frozen: bool,
    /// Rotation deltas snap to `snap_step`
    pub rotation_snap: bool,
    /// Snap step in radians
    pub snap_step: f32,
    /// A handle is being dragged
    pub holding: bool,
    /// The cursor is over a handle
    pub highlighted: bool,
    /// On-screen scale, proportional to camera distance
    pub screen_scale: f32,
    /// Signed rotation about `drag_axis` not yet released by snapping
    pending_angle: f32,
    /// Axis of the current rotate drag, fixed by its first delta
    drag_axis: Option<Vec3>,
}

impl TransformGizmo {
    /// Create a hidden gizmo
    pub fn new(rotation_snap: bool, snap_degrees: f32) -> Self {
        Self {
            mode: GizmoMode::Translate,
            visible: false,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            rotation_frozen: false,
            rotation_snap,
            snap_step: snap_degrees.to_radians(),
            holding: false,
            highlighted: false,
            screen_scale: 1.0,
            pending_angle: 0.0,
            drag_axis: None,
        }
    }

    /// Begin a drag
    pub fn begin(&mut self) {
        self.holding = true;
        self.pending_angle = 0.0;
        self.drag_axis = None;
    }

    /// End a drag. Returns whether a drag was in progress.
    pub fn end(&mut self) -> bool {
        let was_holding = self.holding;
        self.holding = false;
        self.pending_angle = 0.0;
        self.drag_axis = None;
        was_holding
    }

    /// Filter a rotation delta through rotation snap.
    ///
    /// With snap enabled, the signed angle about the drag axis accumulates
    /// until it crosses a whole step and only whole steps are released.
    /// Turning back cancels pending rotation; a new axis starts over.
    pub fn filter_rotation(&mut self, delta: Quat) -> Quat {
        if !self.rotation_snap || self.snap_step <= 0.0 {
            return delta;
        }
        let (axis, angle) = delta.to_axis_angle();
        if angle.abs() <= f32::EPSILON {
            return Quat::IDENTITY;
        }

        let drag_axis = match self.drag_axis {
            Some(drag_axis) if axis.dot(drag_axis).abs() > 0.999 => drag_axis,
            _ => {
                self.pending_angle = 0.0;
                self.drag_axis = Some(axis);
                axis
            }
        };
        self.pending_angle += angle * axis.dot(drag_axis).signum();

        let steps = (self.pending_angle / self.snap_step).trunc();
        if steps == 0.0 {
            return Quat::IDENTITY;
        }
        let released = steps * self.snap_step;
        self.pending_angle -= released;
        Quat::from_axis_angle(drag_axis, released)
    }

    /// Per-frame refresh against the camera
    pub fn update(&mut self, camera: &EditorCamera) {
        self.screen_scale = (camera.position.distance(self.position) * 0.1).max(0.1);
    }
}

/// Editor camera controls
#[derive(Debug, Clone)]
pub struct EditorCamera {
    /// Camera position
    pub position: Vec3,
    /// Camera target (look-at point)
    pub target: Vec3,
    /// Far clip plane
    pub far: f32,
    /// Far plane change rate per second, while a key is held
    pub far_change: f32,
    /// Movement speed
    pub move_speed: f32,
    /// Current fly direction from held keys (camera space, unnormalized)
    pub move_input: Vec3,
    /// Distance kept from a focused point
    pub focus_distance: f32,
    /// Window focus; movement input is dropped without it
    pub has_focus: bool,
}

impl EditorCamera {
    /// Create a camera looking at the origin
    pub fn new(move_speed: f32, far: f32) -> Self {
        Self {
            position: Vec3::new(10.0, 10.0, 10.0),
            target: Vec3::ZERO,
            far,
            far_change: 0.0,
            move_speed,
            move_input: Vec3::ZERO,
            focus_distance: 10.0,
            has_focus: true,
        }
    }

    /// Get the camera forward direction
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Focus on a point, keeping the current viewing direction
    pub fn focus(&mut self, target: Vec3) {
        let mut direction = self.forward();
        if direction == Vec3::ZERO {
            direction = Vec3::NEG_Z;
        }
        self.target = target;
        self.position = target - direction * self.focus_distance;
    }

    /// Point `distance` units in front of the camera
    pub fn point_ahead(&self, distance: f32) -> Vec3 {
        self.position + self.forward() * distance
    }

    /// Per-frame update: fly movement and far plane adjustment
    pub fn update(&mut self, dt: f32) {
        if !self.has_focus {
            self.move_input = Vec3::ZERO;
        }

        if self.move_input != Vec3::ZERO {
            let forward = self.forward();
            let right = forward.cross(Vec3::Y).normalize_or_zero();
            let up = right.cross(forward);
            let direction = (right * self.move_input.x + up * self.move_input.y
                - forward * self.move_input.z)
                .normalize_or_zero();
            let offset = direction * self.move_speed * dt;
            self.position += offset;
            self.target += offset;
        }

        if self.far_change != 0.0 {
            self.far = (self.far + self.far_change * 100.0 * dt).max(1.0);
        }
    }
}
