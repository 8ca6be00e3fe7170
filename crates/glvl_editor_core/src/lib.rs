// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing core for the GLvl level editor.
//!
//! This crate provides everything between input events and the renderer:
//! - Reversible actions and bounded undo/redo histories
//! - Editor nodes and the node manager (renderer reached by handle only)
//! - The ordered selection
//! - The editor session: modes, the three history stacks and gestures
//! - Trajectory previews, ghost playback and the palette preview
//! - The per-frame coordinator with the game pipe and terrain streamer
//!
//! ## Architecture
//!
//! All editing runs on one thread. The only asynchronous inputs are the
//! game pipe and the terrain streaming worker, both drained by
//! [`FrameCoordinator::tick`].

pub mod action;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod game_channel;
pub mod ghost;
pub mod history;
pub mod level;
pub mod library;
pub mod node;
pub mod node_manager;
pub mod scene;
pub mod selection;
pub mod session;
pub mod terrain_streamer;
pub mod tools;
pub mod trajectory;

pub use action::{ActionContext, HistoryAction};
pub use config::EditorConfig;
pub use coordinator::FrameCoordinator;
pub use error::{EditorError, Result};
pub use history::History;
pub use level::{Level, Object, ObjectId, SetId};
pub use node::{EditorNode, NodeCategory, NodeId, NodeKind};
pub use node_manager::{NodeManager, RenderSink};
pub use scene::Scene;
pub use selection::Selection;
pub use session::{ClickOutcome, EditorMode, EditorSession};
