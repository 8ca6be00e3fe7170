// SPDX-License-Identifier: MIT OR Apache-2.0
//! Level data: object sets, placeable objects, paths and terrain blocks.
//!
//! The level owns every [`Object`] in a flat table keyed by its game ID.
//! Object sets only list membership, so detaching an object from its set
//! (deletion) keeps the object data alive for undo.

use crate::error::{EditorError, Result};
use glam::{Quat, Vec3};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;

/// Game-side unique object identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Identifier of an object set within the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetId(pub u32);

/// A typed object parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i32),
    /// Floating point value
    Float(f32),
    /// Free text
    String(String),
    /// Reference to another object
    Id(ObjectId),
    /// References to other objects
    IdList(Vec<ObjectId>),
    /// A single point
    Vector(Vec3),
    /// A list of points
    VectorList(Vec<Vec3>),
}

impl PropertyValue {
    /// Vectors held by this value, if it is a vector type
    pub fn vectors(&self) -> Option<Vec<Vec3>> {
        match self {
            Self::Vector(v) => Some(vec![*v]),
            Self::VectorList(list) => Some(list.clone()),
            _ => None,
        }
    }

    /// Float payload, if any
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f32),
            _ => None,
        }
    }
}

/// One instance of a multi-set object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiSetEntry {
    /// Position of the instance
    pub position: Vec3,
    /// Rotation of the instance
    pub rotation: Quat,
}

/// A placeable game object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Unique game ID
    pub id: ObjectId,
    /// Object type name (e.g. "Spring")
    pub name: String,
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// Named parameters
    #[serde(default)]
    pub params: IndexMap<String, PropertyValue>,
    /// Additional instances edited through proxy nodes
    #[serde(default)]
    pub multi_set: Vec<MultiSetEntry>,
    /// Set the object is attached to; `None` while deleted
    #[serde(default)]
    pub parent_set: Option<SetId>,
}

impl Object {
    /// Create an object with default transform
    pub fn new(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            params: IndexMap::new(),
            multi_set: Vec::new(),
            parent_set: None,
        }
    }

    /// Float parameter with fallback
    pub fn param_f32(&self, name: &str, default: f32) -> f32 {
        self.params
            .get(name)
            .and_then(PropertyValue::as_float)
            .unwrap_or(default)
    }
}

/// A named group of objects (one `.set.xml` in the game data)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectSet {
    /// Set name
    pub name: String,
    /// Attached objects in file order
    pub objects: Vec<ObjectId>,
}

/// A path spline approximated as a polyline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelPath {
    /// Path name
    pub name: String,
    /// Knots; consecutive knots form segments
    pub knots: Vec<Vec3>,
}

impl LevelPath {
    /// Number of segments
    pub fn segment_count(&self) -> usize {
        self.knots.len().saturating_sub(1)
    }

    /// Closest point on one segment and its distance to `point`
    pub fn find_closest_point(&self, segment: usize, point: Vec3) -> Option<(Vec3, f32)> {
        let a = *self.knots.get(segment)?;
        let b = *self.knots.get(segment + 1)?;
        let ab = b - a;
        let len_sq = ab.length_squared();
        let t = if len_sq > f32::EPSILON {
            ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = a + ab * t;
        Some((closest, closest.distance(point)))
    }
}

/// A streamable terrain block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainBlock {
    /// Instance name
    pub name: String,
    /// Bounding sphere center
    pub center: Vec3,
    /// Bounding sphere radius
    pub radius: f32,
}

/// Level data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Level {
    /// Level name
    pub name: String,
    /// Object sets by ID
    pub sets: IndexMap<SetId, ObjectSet>,
    /// Every object ever known to this level, attached or not
    pub objects: IndexMap<ObjectId, Object>,
    /// Paths
    #[serde(default)]
    pub paths: Vec<LevelPath>,
    /// Terrain blocks
    #[serde(default)]
    pub terrain: Vec<TerrainBlock>,
    /// Highest object ID handed out so far
    #[serde(default)]
    pub last_object_id: u32,
}

impl Level {
    /// Create an empty level
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load a level description from a RON file
    pub fn load(path: &FsPath) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut level: Level = ron::from_str(&content)?;
        level.normalize();
        tracing::info!(
            "Loaded level {} ({} sets, {} objects)",
            level.name,
            level.sets.len(),
            level.objects.len()
        );
        Ok(level)
    }

    /// Save the level description to a RON file. Detached (deleted) objects
    /// are left out.
    pub fn save(&self, path: &FsPath) -> Result<()> {
        let mut saved = self.clone();
        saved.objects.retain(|_, object| object.parent_set.is_some());
        let ron_str = ron::ser::to_string_pretty(&saved, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, ron_str)?;
        tracing::info!("Saved level to {:?}", path);
        Ok(())
    }

    /// Re-derive parent links and the ID allocator after deserialization
    fn normalize(&mut self) {
        for object in self.objects.values_mut() {
            object.parent_set = None;
        }
        for (set_id, set) in &self.sets {
            for id in &set.objects {
                if let Some(object) = self.objects.get_mut(id) {
                    object.parent_set = Some(*set_id);
                }
            }
        }
        let max_id = self.objects.keys().map(|id| id.0).max().unwrap_or(0);
        self.last_object_id = self.last_object_id.max(max_id);
    }

    /// Allocate a fresh object ID, strictly greater than any handed out before
    pub fn new_object_id(&mut self) -> ObjectId {
        self.last_object_id += 1;
        ObjectId(self.last_object_id)
    }

    /// Add a set and return its ID
    pub fn add_set(&mut self, name: impl Into<String>) -> SetId {
        let id = SetId(self.sets.keys().map(|s| s.0 + 1).max().unwrap_or(0));
        self.sets.insert(
            id,
            ObjectSet {
                name: name.into(),
                objects: Vec::new(),
            },
        );
        id
    }

    /// Insert an object into a set. The object's ID must be unique.
    pub fn add_object(&mut self, set: SetId, mut object: Object) -> Result<ObjectId> {
        let set_data = self.sets.get_mut(&set).ok_or(EditorError::UnknownSet(set))?;
        let id = object.id;
        set_data.objects.push(id);
        object.parent_set = Some(set);
        self.last_object_id = self.last_object_id.max(id.0);
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Get an object
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Get an object mutably
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Remove an object from its set, keeping its data. Returns the set it left.
    pub fn detach_object(&mut self, id: ObjectId) -> Option<SetId> {
        let object = self.objects.get_mut(&id)?;
        let set_id = object.parent_set.take()?;
        if let Some(set) = self.sets.get_mut(&set_id) {
            set.objects.retain(|o| *o != id);
        }
        Some(set_id)
    }

    /// Re-attach a detached object to `set`
    pub fn attach_object(&mut self, id: ObjectId, set: SetId) -> bool {
        let Some(object) = self.objects.get_mut(&id) else {
            return false;
        };
        let Some(set_data) = self.sets.get_mut(&set) else {
            return false;
        };
        if !set_data.objects.contains(&id) {
            set_data.objects.push(id);
        }
        object.parent_set = Some(set);
        true
    }

    /// Objects currently attached to a set, in set order
    pub fn attached_objects(&self) -> impl Iterator<Item = &Object> {
        self.sets
            .values()
            .flat_map(|set| set.objects.iter())
            .filter_map(|id| self.objects.get(id))
    }

    /// Closest point over every path segment, with its distance
    pub fn closest_path_point(&self, point: Vec3) -> Option<(Vec3, f32)> {
        let mut best: Option<(Vec3, f32)> = None;
        for path in &self.paths {
            for segment in 0..path.segment_count() {
                if let Some((candidate, distance)) = path.find_closest_point(segment, point) {
                    if best.map_or(true, |(_, d)| distance < d) {
                        best = Some((candidate, distance));
                    }
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_ids_are_monotonic() {
        let mut level = Level::new("ghz200");
        let set = level.add_set("base");
        level
            .add_object(set, Object::new(ObjectId(40), "Ring"))
            .unwrap();
        let a = level.new_object_id();
        let b = level.new_object_id();
        assert!(a.0 > 40);
        assert!(b.0 > a.0);
    }

    #[test]
    fn test_detach_and_attach() {
        let mut level = Level::new("test");
        let set = level.add_set("base");
        let id = level.add_object(set, Object::new(ObjectId(1), "Spring")).unwrap();

        assert_eq!(level.detach_object(id), Some(set));
        assert!(level.sets[&set].objects.is_empty());
        assert!(level.object(id).is_some());
        assert_eq!(level.attached_objects().count(), 0);

        assert!(level.attach_object(id, set));
        assert_eq!(level.sets[&set].objects, vec![id]);
        assert_eq!(level.object(id).unwrap().parent_set, Some(set));
    }

    #[test]
    fn test_closest_point_on_segment() {
        let path = LevelPath {
            name: "sv".to_string(),
            knots: vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)],
        };
        let (p, d) = path.find_closest_point(0, Vec3::new(4.0, 3.0, 0.0)).unwrap();
        assert!((p - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-5);
        assert!((d - 3.0).abs() < 1e-5);

        // Clamped to the segment end
        let (p, _) = path.find_closest_point(0, Vec3::new(15.0, 1.0, 0.0)).unwrap();
        assert!((p - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-5);
        assert!(path.find_closest_point(1, Vec3::ZERO).is_none());
    }

    #[test]
    fn test_level_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("level.ron");

        let mut level = Level::new("test");
        let set = level.add_set("base");
        let mut spring = Object::new(ObjectId(7), "Spring");
        spring.params.insert("FirstSpeed".to_string(), PropertyValue::Float(30.0));
        level.add_object(set, spring).unwrap();
        level.save(&file).unwrap();

        let loaded = Level::load(&file).unwrap();
        assert_eq!(loaded.object(ObjectId(7)).unwrap().parent_set, Some(set));
        assert_eq!(loaded.last_object_id, 7);
        assert_eq!(loaded.object(ObjectId(7)).unwrap().param_f32("FirstSpeed", 0.0), 30.0);
    }

    #[test]
    fn test_save_drops_detached_objects() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("level.ron");

        let mut level = Level::new("test");
        let set = level.add_set("base");
        level.add_object(set, Object::new(ObjectId(1), "Ring")).unwrap();
        level.add_object(set, Object::new(ObjectId(2), "Spring")).unwrap();
        assert_eq!(level.detach_object(ObjectId(2)), Some(set));
        level.save(&file).unwrap();

        // The live level keeps the detached object for undo
        assert!(level.object(ObjectId(2)).is_some());

        let loaded = Level::load(&file).unwrap();
        assert!(loaded.object(ObjectId(1)).is_some());
        assert!(loaded.object(ObjectId(2)).is_none());
        assert_eq!(loaded.objects.len(), 1);
        assert_eq!(loaded.last_object_id, 2);
    }
}
