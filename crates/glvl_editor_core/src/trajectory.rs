// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trajectory previews for launcher objects.
//!
//! Selected springs, jump panels and dash rings show the arc they would
//! launch the player along. Previews are recomputed every frame from the
//! live node transform and the object's parameters.

use crate::level::Object;
use crate::node::NodeId;
use crate::scene::Scene;
use glam::{Quat, Vec3};

/// Downward acceleration applied after the launch phase
pub const GRAVITY: f32 = 16.0;

/// Number of points sampled per preview
pub const SAMPLE_COUNT: usize = 64;

/// Time between samples (seconds)
pub const SAMPLE_STEP: f32 = 1.0 / 30.0;

/// Launch behavior implied by an object type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrajectoryMode {
    /// Vertical spring
    Spring,
    /// Wide spring
    WideSpring,
    /// Jump pole
    JumpPole,
    /// Jump panel (normal and boost arcs)
    JumpPanel,
    /// Dash ring
    DashRing,
}

impl TrajectoryMode {
    /// Classify an object type name
    pub fn from_object_name(name: &str) -> Option<Self> {
        match name {
            "Spring" | "AirSpring" | "SpringFake" | "SpringClassic" | "SpringClassicYellow" => {
                Some(Self::Spring)
            }
            "WideSpring" => Some(Self::WideSpring),
            "JumpPole" => Some(Self::JumpPole),
            "JumpBoard" | "JumpBoard3D" | "AdlibTrickJump" => Some(Self::JumpPanel),
            "DashRing" | "RainbowRing" => Some(Self::DashRing),
            _ => None,
        }
    }

    /// Preview nodes needed for this mode
    pub fn preview_count(&self) -> usize {
        match self {
            Self::JumpPanel => 2,
            _ => 1,
        }
    }
}

/// One preview arc
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPreview {
    /// Launch behavior
    pub mode: TrajectoryMode,
    /// Boost variant (second jump panel arc)
    pub boost: bool,
    /// Sampled arc in world space
    pub points: Vec<Vec3>,
    /// Clock driving the marker that travels along the arc
    pub time: f32,
}

impl TrajectoryPreview {
    fn new(mode: TrajectoryMode, boost: bool) -> Self {
        Self {
            mode,
            boost,
            points: Vec::new(),
            time: 0.0,
        }
    }

    /// Marker position along the arc at the current time
    pub fn marker(&self) -> Option<Vec3> {
        if self.points.is_empty() {
            return None;
        }
        let duration = SAMPLE_STEP * self.points.len() as f32;
        let t = self.time % duration;
        let index = ((t / SAMPLE_STEP) as usize).min(self.points.len() - 1);
        Some(self.points[index])
    }

    /// Rebuild the arc from an object transform and parameters
    pub fn compute(&mut self, position: Vec3, rotation: Quat, object: &Object) {
        let (direction, speed, keep_distance) = match self.mode {
            TrajectoryMode::Spring | TrajectoryMode::WideSpring => (
                rotation * Vec3::Y,
                object.param_f32("FirstSpeed", 20.0),
                object.param_f32("KeepVelocityDistance", 5.0),
            ),
            TrajectoryMode::JumpPole => (
                rotation * Quat::from_rotation_x(-object.param_f32("Pitch", 30.0).to_radians()) * Vec3::Z,
                object.param_f32("ImpulseSpeed", 20.0),
                0.0,
            ),
            TrajectoryMode::JumpPanel => {
                let speed = if self.boost {
                    object.param_f32("ImpulseSpeedOnBoost", 30.0)
                } else {
                    object.param_f32("ImpulseSpeedOnNormal", 20.0)
                };
                (
                    rotation * Quat::from_rotation_x(-object.param_f32("Pitch", 15.0).to_radians()) * Vec3::Z,
                    speed,
                    0.0,
                )
            }
            TrajectoryMode::DashRing => (
                rotation * Vec3::Z,
                object.param_f32("FirstSpeed", 30.0),
                object.param_f32("KeepVelocityDistance", 10.0),
            ),
        };
        self.points = sample_arc(position, direction.normalize_or_zero(), speed, keep_distance);
    }
}

/// Straight flight for `keep_distance`, then a ballistic fall
fn sample_arc(origin: Vec3, direction: Vec3, speed: f32, keep_distance: f32) -> Vec<Vec3> {
    let velocity = direction * speed;
    let keep_time = if speed > f32::EPSILON { keep_distance / speed } else { 0.0 };
    let release = origin + velocity * keep_time;

    (0..SAMPLE_COUNT)
        .map(|i| {
            let t = i as f32 * SAMPLE_STEP;
            if t <= keep_time {
                origin + velocity * t
            } else {
                let t = t - keep_time;
                release + velocity * t - Vec3::Y * (0.5 * GRAVITY * t * t)
            }
        })
        .collect()
}

/// Previews for the selected launcher objects, owned by the session
#[derive(Debug, Clone, Default)]
pub struct TrajectoryPreviews {
    previews: Vec<(NodeId, TrajectoryPreview)>,
}

impl TrajectoryPreviews {
    /// Create an empty preview set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add previews for a node if its object type implies a trajectory
    pub fn add(&mut self, scene: &Scene, node: NodeId) -> bool {
        if self.contains(node) {
            return false;
        }
        let Some(mode) = scene.object_name(node).and_then(TrajectoryMode::from_object_name) else {
            return false;
        };
        for i in 0..mode.preview_count() {
            self.previews.push((node, TrajectoryPreview::new(mode, i == 1)));
        }
        true
    }

    /// Drop previews of nodes not in `keep`
    pub fn retain(&mut self, keep: &[NodeId]) {
        self.previews.retain(|(node, _)| keep.contains(node));
    }

    /// Remove every preview
    pub fn clear(&mut self) {
        self.previews.clear();
    }

    /// Whether a node has previews
    pub fn contains(&self, node: NodeId) -> bool {
        self.previews.iter().any(|(n, _)| *n == node)
    }

    /// Number of preview arcs
    pub fn len(&self) -> usize {
        self.previews.len()
    }

    /// Whether there are no previews
    pub fn is_empty(&self) -> bool {
        self.previews.is_empty()
    }

    /// Iterate previews with their source node
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TrajectoryPreview)> {
        self.previews.iter().map(|(n, p)| (*n, p))
    }

    /// Advance clocks and recompute every arc from the live transforms
    pub fn update(&mut self, scene: &Scene, dt: f32) {
        for (node, preview) in &mut self.previews {
            preview.time += dt;
            let Some(editor_node) = scene.nodes.get(*node) else {
                preview.points.clear();
                continue;
            };
            let Some(object) = editor_node.kind().object().and_then(|o| scene.level.object(o)) else {
                preview.points.clear();
                continue;
            };
            preview.compute(editor_node.position(), editor_node.rotation(), object);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{Level, ObjectId, PropertyValue};
    use crate::node_manager::NodeManager;

    fn scene_with(names: &[&str]) -> Scene {
        let mut level = Level::new("test");
        let set = level.add_set("base");
        for (i, name) in names.iter().enumerate() {
            level.add_object(set, Object::new(ObjectId(i as u32 + 1), *name)).unwrap();
        }
        Scene::new(level, NodeManager::new())
    }

    #[test]
    fn test_classification() {
        assert_eq!(TrajectoryMode::from_object_name("AirSpring"), Some(TrajectoryMode::Spring));
        assert_eq!(TrajectoryMode::from_object_name("AdlibTrickJump"), Some(TrajectoryMode::JumpPanel));
        assert_eq!(TrajectoryMode::from_object_name("RainbowRing"), Some(TrajectoryMode::DashRing));
        assert_eq!(TrajectoryMode::from_object_name("Ring"), None);
        assert_eq!(TrajectoryMode::JumpPanel.preview_count(), 2);
    }

    #[test]
    fn test_jump_panel_gets_two_previews() {
        let scene = scene_with(&["JumpBoard", "Ring", "Spring"]);
        let mut previews = TrajectoryPreviews::new();
        let panel = scene.nodes.object_node(ObjectId(1)).unwrap();
        let ring = scene.nodes.object_node(ObjectId(2)).unwrap();
        let spring = scene.nodes.object_node(ObjectId(3)).unwrap();

        assert!(previews.add(&scene, panel));
        assert!(!previews.add(&scene, ring));
        assert!(previews.add(&scene, spring));
        assert_eq!(previews.len(), 3);
        assert!(previews.iter().any(|(n, p)| n == panel && p.boost));

        previews.retain(&[spring]);
        assert_eq!(previews.len(), 1);
    }

    #[test]
    fn test_spring_arc_follows_live_transform() {
        let mut scene = scene_with(&["Spring"]);
        scene
            .level
            .object_mut(ObjectId(1))
            .unwrap()
            .params
            .insert("KeepVelocityDistance".to_string(), PropertyValue::Float(10.0));
        let node = scene.nodes.object_node(ObjectId(1)).unwrap();
        let mut previews = TrajectoryPreviews::new();
        previews.add(&scene, node);

        previews.update(&scene, 0.1);
        let (_, preview) = previews.iter().next().unwrap();
        assert_eq!(preview.points.len(), SAMPLE_COUNT);
        assert_eq!(preview.points[0], Vec3::ZERO);
        // Straight up during the keep-velocity phase
        assert!(preview.points[5].x.abs() < 1e-5);
        assert!(preview.points[5].y > 0.0);

        scene.set_position(node, Vec3::new(100.0, 0.0, 0.0));
        previews.update(&scene, 0.1);
        let (_, preview) = previews.iter().next().unwrap();
        assert_eq!(preview.points[0], Vec3::new(100.0, 0.0, 0.0));
        assert!((preview.time - 0.2).abs() < 1e-6);
        assert!(preview.marker().is_some());
    }
}
