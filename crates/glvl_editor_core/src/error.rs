// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the editing core.
//!
//! History replay never produces errors. These only surface from
//! operations that touch the filesystem or the game pipe, and from
//! API misuse that the editor UI cannot produce on its own.

use crate::level::{ObjectId, SetId};
use thiserror::Error;

/// Editor errors
#[derive(Debug, Error)]
pub enum EditorError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    /// Binary (ghost recording) encoding error
    #[error("Binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Malformed game pipe message
    #[error("Game message decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Object is not part of the level
    #[error("Unknown object: {0:?}")]
    UnknownObject(ObjectId),

    /// Object set is not part of the level
    #[error("Unknown object set: {0:?}")]
    UnknownSet(SetId),

    /// Object has no property with this name
    #[error("Object {object:?} has no property {name}")]
    UnknownProperty {
        /// Object searched
        object: ObjectId,
        /// Property name
        name: String,
    },

    /// Property exists but does not hold the expected type
    #[error("Property {name} on {object:?} is not a {expected}")]
    PropertyType {
        /// Object owning the property
        object: ObjectId,
        /// Property name
        name: String,
        /// Expected type description
        expected: &'static str,
    },

    /// Requested mode transition is not allowed from the current state
    #[error("Invalid mode transition: {0}")]
    InvalidMode(String),
}

/// Result type for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;
