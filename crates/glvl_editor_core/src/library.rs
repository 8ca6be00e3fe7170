// SPDX-License-Identifier: MIT OR Apache-2.0
//! Object library: the templates the placement palette offers.

use crate::error::Result;
use crate::level::{Object, ObjectId, PropertyValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Template for a placeable object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTemplate {
    /// Object type name
    pub name: String,
    /// Palette category (e.g. "Common", "Gimmick")
    #[serde(default)]
    pub category: String,
    /// Default parameters
    #[serde(default)]
    pub params: IndexMap<String, PropertyValue>,
}

impl ObjectTemplate {
    /// Instantiate a new object from this template
    pub fn instantiate(&self, id: ObjectId) -> Object {
        let mut object = Object::new(id, self.name.clone());
        object.params = self.params.clone();
        object
    }
}

/// Object templates by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectLibrary {
    /// Templates keyed by object type name
    pub templates: IndexMap<String, ObjectTemplate>,
}

impl ObjectLibrary {
    /// Load a library from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let library: ObjectLibrary = ron::from_str(&content)?;
        tracing::info!("Loaded {} object templates from {:?}", library.templates.len(), path);
        Ok(library)
    }

    /// Load a library, treating failure as an unavailable capability
    pub fn load_optional(path: Option<&Path>) -> Option<Self> {
        let path = path?;
        match Self::load(path) {
            Ok(library) => Some(library),
            Err(e) => {
                tracing::warn!("Object library unavailable ({:?}): {e}", path);
                None
            }
        }
    }

    /// Add a template
    pub fn insert(&mut self, template: ObjectTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Look up a template by name
    pub fn get(&self, name: &str) -> Option<&ObjectTemplate> {
        self.templates.get(name)
    }
}
