// SPDX-License-Identifier: MIT OR Apache-2.0
//! GLvl Editor - headless host for the editing core
//!
//! Loads the configuration and a level, attaches the game pipe to stdin,
//! starts terrain streaming and drives the frame coordinator at a fixed
//! rate until the game pipe closes.
//!
//! Usage: `glvl_editor [LEVEL.ron]`

use glam::{Quat, Vec3};
use glvl_editor_core::config::CONFIG_FILE_NAME;
use glvl_editor_core::game_channel::GameChannel;
use glvl_editor_core::library::ObjectLibrary;
use glvl_editor_core::{EditorConfig, EditorSession, FrameCoordinator, Level, NodeId, NodeKind, NodeManager, RenderSink, Scene};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Target frame time
const FRAME_TIME: Duration = Duration::from_micros(16_667);

/// Render sink that reports node changes to the log
struct TracingRenderSink;

impl RenderSink for TracingRenderSink {
    fn node_created(&mut self, id: NodeId, kind: &NodeKind, position: Vec3, _rotation: Quat) {
        tracing::trace!("Node {:?} created ({:?}) at {position}", id, kind);
    }

    fn node_moved(&mut self, id: NodeId, position: Vec3, _rotation: Quat) {
        tracing::trace!("Node {:?} moved to {position}", id);
    }

    fn node_visibility(&mut self, id: NodeId, visible: bool) {
        tracing::trace!("Node {:?} visible: {visible}", id);
    }

    fn node_destroyed(&mut self, id: NodeId) {
        tracing::trace!("Node {:?} destroyed", id);
    }
}

fn load_config() -> EditorConfig {
    match EditorConfig::load(Path::new(CONFIG_FILE_NAME)) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load {CONFIG_FILE_NAME}: {e}, using defaults");
            EditorConfig::default()
        }
    }
}

fn load_level(path: Option<PathBuf>) -> Level {
    let Some(path) = path else {
        tracing::info!("No level given, starting with an empty level");
        return Level::new("untitled");
    };
    match Level::load(&path) {
        Ok(level) => level,
        Err(e) => {
            tracing::error!("Failed to load level {:?}: {e}", path);
            std::process::exit(1);
        }
    }
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("glvl_editor_core=debug,glvl_editor=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting GLvl Editor v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config();
    let level = load_level(std::env::args().nth(1).map(PathBuf::from));
    let library = ObjectLibrary::load_optional(config.object_library_path.as_deref());

    let scene = Scene::new(level, NodeManager::with_sink(Box::new(TracingRenderSink)));
    let session = EditorSession::new(scene, &config, library);
    let mut coordinator = FrameCoordinator::new(session, &config)
        .with_game_channel(GameChannel::spawn(BufReader::new(std::io::stdin())))
        .with_terrain_streaming(&config.streaming);

    let mut last = Instant::now();
    while coordinator.is_game_connected() {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        coordinator.tick(dt);

        if let Some(remaining) = FRAME_TIME.checked_sub(now.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    let stats = coordinator.session.history().stats();
    tracing::info!(
        "Game pipe closed after {} frames ({} undo steps recorded)",
        coordinator.frame_count(),
        stats.undo_count
    );
}
