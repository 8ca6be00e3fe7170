// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame coordinator: drives the editor session once per rendered frame.
//!
//! Each tick runs, in order:
//! 1. Click debounce countdown
//! 2. Camera and gizmo update
//! 3. Palette preview refresh
//! 4. Game messages and ghost playback
//! 5. Trajectory previews
//! 6. Terrain streamer hand-off (publish camera position, apply events)
//! 7. Node animation clocks

use crate::config::{EditorConfig, StreamingConfig};
use crate::error::Result;
use crate::game_channel::{GameChannel, GameMessage};
use crate::ghost::{GhostPlayer, GhostRecording};
use crate::node::{NodeId, NodeKind};
use crate::session::EditorSession;
use crate::terrain_streamer::{TerrainEvent, TerrainStreamer};
use glam::Vec3;
use std::path::Path;

/// Distance in front of the camera where the ghost is dropped
pub const GHOST_PLACE_DISTANCE: f32 = 10.0;

/// Owns the session and its asynchronous collaborators
#[derive(Debug)]
pub struct FrameCoordinator {
    /// Editing session
    pub session: EditorSession,
    /// Ghost playback
    pub ghost: GhostPlayer,
    game: Option<GameChannel>,
    streamer: Option<TerrainStreamer>,
    frame: u64,
}

impl FrameCoordinator {
    /// Create a coordinator without game pipe or streamer
    pub fn new(session: EditorSession, config: &EditorConfig) -> Self {
        Self {
            session,
            ghost: GhostPlayer::new(config.ghost_loop),
            game: None,
            streamer: None,
            frame: 0,
        }
    }

    /// Attach the game pipe
    pub fn with_game_channel(mut self, channel: GameChannel) -> Self {
        self.game = Some(channel);
        self
    }

    /// Start streaming the level's terrain, unless disabled or there is none.
    /// Terrain stays visible when no streamer runs; with one, every block
    /// starts streamed out until the worker reports it in range.
    pub fn with_terrain_streaming(mut self, config: &StreamingConfig) -> Self {
        let blocks = self.session.scene.level.terrain.clone();
        if !config.enabled || blocks.is_empty() {
            tracing::debug!("Terrain streaming disabled");
            return self;
        }
        let block_count = blocks.len();
        self.streamer = Some(TerrainStreamer::spawn(blocks, config));
        for block in 0..block_count {
            if let Some(id) = self.terrain_node(block) {
                self.session.scene.nodes.set_streamed_out(id, true);
            }
        }
        self
    }

    /// Whether a terrain streamer is running
    pub fn is_streaming(&self) -> bool {
        self.streamer.is_some()
    }

    /// Whether the game pipe is attached and connected
    pub fn is_game_connected(&self) -> bool {
        self.game.as_ref().is_some_and(GameChannel::is_connected)
    }

    /// Frames ticked so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Advance one frame
    pub fn tick(&mut self, dt: f32) {
        self.frame += 1;
        let session = &mut self.session;

        session.tick_debounce();

        session.camera.update(dt);
        session.gizmo.update(&session.camera);

        session.refresh_palette_preview();

        self.process_game_messages();
        self.ghost.check(dt, &mut self.session.scene);

        self.session.update_trajectories(dt);

        if let Some(streamer) = &self.streamer {
            streamer.set_position(self.session.camera.position);
            let events = streamer.poll();
            self.apply_terrain_events(&events);
        }

        self.session.scene.nodes.add_time(dt);
    }

    fn process_game_messages(&mut self) {
        let Some(game) = &mut self.game else {
            return;
        };
        for message in game.poll() {
            match message {
                GameMessage::SetRecording { enable } => {
                    tracing::info!("Game recording {}", if enable { "started" } else { "stopped" });
                    self.ghost.game_recording = enable;
                }
                GameMessage::SaveRecording { file_path } => {
                    self.ghost.game_recording = false;
                    if let Err(e) = self.load_ghost(&file_path) {
                        tracing::warn!("Cannot load ghost recording {:?}: {e}", file_path);
                    }
                }
            }
        }
    }

    fn apply_terrain_events(&mut self, events: &[TerrainEvent]) {
        for event in events {
            let (block, streamed_out) = match *event {
                TerrainEvent::Load(block) => (block, false),
                TerrainEvent::Unload(block) => (block, true),
            };
            match self.terrain_node(block) {
                Some(id) => self.session.scene.nodes.set_streamed_out(id, streamed_out),
                None => tracing::warn!("Streaming event for unknown terrain block {block}"),
            }
        }
    }

    fn terrain_node(&self, block: usize) -> Option<NodeId> {
        self.session
            .scene
            .nodes
            .iter()
            .find(|n| matches!(n.kind(), NodeKind::Terrain { block: b } if *b == block))
            .map(|n| n.id())
    }

    // ========== Ghost ==========

    /// Load a ghost recording and show it on the ghost node
    pub fn load_ghost(&mut self, path: &Path) -> Result<()> {
        let recording = GhostRecording::load(path)?;
        self.ghost.set_recording(recording, &mut self.session.scene);
        Ok(())
    }

    /// Save the current ghost recording. Returns false if there is none.
    pub fn save_ghost(&self, path: &Path) -> Result<bool> {
        match self.ghost.recording() {
            Some(recording) => {
                recording.save(path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop the ghost a fixed distance in front of the camera
    pub fn place_ghost_in_front_of_camera(&mut self) -> Vec3 {
        let point = self.session.camera.point_ahead(GHOST_PLACE_DISTANCE);
        self.ghost.place_at(point, &mut self.session.scene);
        point
    }

    /// Start ghost playback
    pub fn play_ghost(&mut self) {
        self.ghost.play();
    }

    /// Pause ghost playback
    pub fn stop_ghost(&mut self) {
        self.ghost.stop();
    }

    /// Stop and rewind ghost playback
    pub fn reset_ghost(&mut self) {
        self.ghost.reset(&mut self.session.scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::GhostFrame;
    use crate::level::{Level, Object, ObjectId, TerrainBlock};
    use crate::node_manager::NodeManager;
    use crate::scene::Scene;
    use crate::session::{ClickOutcome, EditorMode};
    use glam::Quat;
    use std::time::{Duration, Instant};

    fn coordinator(level: Level) -> FrameCoordinator {
        let config = EditorConfig {
            click_debounce_frames: 2,
            ..Default::default()
        };
        let scene = Scene::new(level, NodeManager::new());
        FrameCoordinator::new(EditorSession::new(scene, &config, None), &config)
    }

    fn recording() -> GhostRecording {
        GhostRecording::new(vec![
            GhostFrame { time: 0.0, position: Vec3::ZERO, rotation: Quat::IDENTITY },
            GhostFrame { time: 1.0, position: Vec3::new(10.0, 0.0, 0.0), rotation: Quat::IDENTITY },
        ])
    }

    #[test]
    fn test_tick_advances_clocks_and_debounce() {
        let mut level = Level::new("test");
        let set = level.add_set("base");
        level.add_object(set, Object::new(ObjectId(1), "Ring")).unwrap();
        let mut coordinator = coordinator(level);
        let node = coordinator.session.scene.nodes.object_node(ObjectId(1)).unwrap();

        coordinator.session.set_mode(EditorMode::TerrainEdit).unwrap();
        assert!(coordinator.session.clicks_ignored());
        coordinator.tick(0.5);
        coordinator.tick(0.25);
        assert!(!coordinator.session.clicks_ignored());

        assert_eq!(coordinator.frame_count(), 2);
        let time = coordinator.session.scene.nodes.get(node).unwrap().animation_time;
        assert!((time - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_far_plane_follows_held_rate() {
        let mut coordinator = coordinator(Level::new("test"));
        let far = coordinator.session.camera.far;
        coordinator.session.camera.far_change = 1.0;
        coordinator.tick(0.5);
        assert!((coordinator.session.camera.far - (far + 50.0)).abs() < 1e-3);
    }

    #[test]
    fn test_game_messages_drive_ghost() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("run.gst.bin");
        recording().save(&file).unwrap();

        let (tx, channel) = GameChannel::pair();
        let mut coordinator = coordinator(Level::new("test")).with_game_channel(channel);
        assert!(coordinator.is_game_connected());

        tx.send(GameMessage::SetRecording { enable: true }).unwrap();
        coordinator.tick(0.016);
        assert!(coordinator.ghost.game_recording);

        tx.send(GameMessage::SaveRecording { file_path: file }).unwrap();
        coordinator.tick(0.016);
        assert!(!coordinator.ghost.game_recording);
        assert_eq!(coordinator.ghost.recording(), Some(&recording()));
        assert!(coordinator.ghost.node().is_some());

        // Unreadable file is logged and ignored
        tx.send(GameMessage::SaveRecording {
            file_path: dir.path().join("missing.gst.bin"),
        })
        .unwrap();
        coordinator.tick(0.016);
        assert!(coordinator.ghost.recording().is_some());
    }

    #[test]
    fn test_ghost_playback_through_ticks() {
        let mut coordinator = coordinator(Level::new("test"));
        coordinator.ghost.set_recording(recording(), &mut coordinator.session.scene);
        let node = coordinator.ghost.node().unwrap();

        coordinator.play_ghost();
        coordinator.tick(0.5);
        let position = coordinator.session.scene.nodes.get(node).unwrap().position();
        assert!(position.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-4));

        coordinator.stop_ghost();
        coordinator.tick(0.5);
        assert!((coordinator.ghost.time - 0.5).abs() < 1e-6);

        coordinator.reset_ghost();
        assert_eq!(coordinator.session.scene.nodes.get(node).unwrap().position(), Vec3::ZERO);
    }

    #[test]
    fn test_place_ghost_in_front_of_camera() {
        let mut coordinator = coordinator(Level::new("test"));
        coordinator.ghost.set_recording(recording(), &mut coordinator.session.scene);
        let point = coordinator.place_ghost_in_front_of_camera();

        let expected = coordinator.session.camera.position
            + coordinator.session.camera.forward() * GHOST_PLACE_DISTANCE;
        assert!(point.abs_diff_eq(expected, 1e-4));
        let node = coordinator.ghost.node().unwrap();
        assert!(coordinator.session.scene.nodes.get(node).unwrap().position().abs_diff_eq(point, 1e-4));
    }

    #[test]
    fn test_save_ghost() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("copy.gst.bin");
        let mut coordinator = coordinator(Level::new("test"));
        assert!(!coordinator.save_ghost(&file).unwrap());

        coordinator.ghost.set_recording(recording(), &mut coordinator.session.scene);
        assert!(coordinator.save_ghost(&file).unwrap());
        assert_eq!(GhostRecording::load(&file).unwrap(), recording());
    }

    #[test]
    fn test_streamed_terrain_becomes_visible() {
        let mut level = Level::new("test");
        level.terrain.push(TerrainBlock {
            name: "near".to_string(),
            center: Vec3::ZERO,
            radius: 50.0,
        });
        level.terrain.push(TerrainBlock {
            name: "far".to_string(),
            center: Vec3::new(5000.0, 0.0, 0.0),
            radius: 50.0,
        });
        let streaming = StreamingConfig {
            enabled: true,
            radius: 100.0,
            poll_interval_ms: 5,
        };
        let mut coordinator = coordinator(level).with_terrain_streaming(&streaming);
        assert!(coordinator.is_streaming());

        let near = coordinator.terrain_node(0).unwrap();
        let far = coordinator.terrain_node(1).unwrap();
        assert!(!coordinator.session.scene.nodes.get(near).unwrap().is_visible());

        let deadline = Instant::now() + Duration::from_secs(5);
        while !coordinator.session.scene.nodes.get(near).unwrap().is_visible() && Instant::now() < deadline {
            coordinator.tick(0.016);
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(coordinator.session.scene.nodes.get(near).unwrap().is_visible());
        assert!(!coordinator.session.scene.nodes.get(far).unwrap().is_visible());
    }

    #[test]
    fn test_terrain_selectable_without_streaming() {
        let mut level = Level::new("test");
        level.terrain.push(TerrainBlock {
            name: "far".to_string(),
            center: Vec3::new(5000.0, 0.0, 0.0),
            radius: 50.0,
        });
        let streaming = StreamingConfig {
            enabled: false,
            ..Default::default()
        };
        let mut coordinator = coordinator(level).with_terrain_streaming(&streaming);
        assert!(!coordinator.is_streaming());

        for _ in 0..10 {
            coordinator.tick(0.016);
        }
        let terrain = coordinator.terrain_node(0).unwrap();
        assert!(coordinator.session.scene.nodes.get(terrain).unwrap().is_visible());

        coordinator.session.set_mode(EditorMode::TerrainEdit).unwrap();
        for _ in 0..2 {
            coordinator.tick(0.016);
        }
        assert_eq!(coordinator.session.click_node(terrain, false), ClickOutcome::Selected(terrain));
    }

    #[test]
    fn test_streaming_skipped_without_terrain() {
        let coordinator = coordinator(Level::new("test")).with_terrain_streaming(&StreamingConfig::default());
        assert!(!coordinator.is_streaming());
    }
}
