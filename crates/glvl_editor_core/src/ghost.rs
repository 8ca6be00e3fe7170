// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ghost recordings: a player trajectory captured by the running game,
//! replayed on a ghost node for comparison.
//!
//! This module handles:
//! - Loading and saving recordings (`.gst.bin`, bincode)
//! - Sampling an interpolated transform at any time
//! - Play / stop / reset of the playback clock

use crate::error::Result;
use crate::node::{NodeId, NodeKind};
use crate::scene::Scene;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Ghost recording file extension
pub const GHOST_EXTENSION: &str = "gst.bin";

/// One recorded sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GhostFrame {
    /// Seconds since the recording started
    pub time: f32,
    /// Player position
    pub position: Vec3,
    /// Player rotation
    pub rotation: Quat,
}

/// A recorded trajectory, frames in ascending time order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GhostRecording {
    /// Recorded samples
    pub frames: Vec<GhostFrame>,
}

impl GhostRecording {
    /// Create a recording from frames, sorting them by time
    pub fn new(mut frames: Vec<GhostFrame>) -> Self {
        frames.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { frames }
    }

    /// Load a recording
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let recording: GhostRecording = bincode::deserialize_from(reader)?;
        tracing::info!("Loaded ghost recording {:?} ({} frames)", path, recording.frames.len());
        Ok(Self::new(recording.frames))
    }

    /// Save the recording
    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        tracing::info!("Saved ghost recording to {:?}", path);
        Ok(())
    }

    /// Length in seconds
    pub fn duration(&self) -> f32 {
        self.frames.last().map_or(0.0, |f| f.time)
    }

    /// Interpolated transform at `time` (clamped to the recording)
    pub fn sample(&self, time: f32) -> Option<(Vec3, Quat)> {
        let first = self.frames.first()?;
        if time <= first.time {
            return Some((first.position, first.rotation));
        }
        let next = self.frames.partition_point(|f| f.time <= time);
        let Some(b) = self.frames.get(next) else {
            let last = self.frames[self.frames.len() - 1];
            return Some((last.position, last.rotation));
        };
        let a = self.frames[next - 1];
        let span = b.time - a.time;
        let t = if span > f32::EPSILON { (time - a.time) / span } else { 0.0 };
        Some((a.position.lerp(b.position, t), a.rotation.slerp(b.rotation, t)))
    }
}

/// Playback of the current ghost recording
#[derive(Debug, Clone, Default)]
pub struct GhostPlayer {
    recording: Option<GhostRecording>,
    node: Option<NodeId>,
    /// Playback clock in seconds
    pub time: f32,
    /// Clock is advancing
    pub playing: bool,
    /// Restart at the end instead of stopping
    pub looping: bool,
    /// The game reports that it is recording
    pub game_recording: bool,
    /// Offset applied on top of the recorded positions
    pub offset: Vec3,
}

impl GhostPlayer {
    /// Create an empty player
    pub fn new(looping: bool) -> Self {
        Self {
            looping,
            ..Default::default()
        }
    }

    /// Replace the recording, creating the ghost node on first use
    pub fn set_recording(&mut self, recording: GhostRecording, scene: &mut Scene) {
        self.recording = Some(recording);
        self.time = 0.0;
        self.playing = false;
        self.offset = Vec3::ZERO;
        self.ensure_node(scene);
        self.apply(scene);
    }

    /// Current recording
    pub fn recording(&self) -> Option<&GhostRecording> {
        self.recording.as_ref()
    }

    /// Ghost node, once a recording was set up
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Create the ghost node if it does not exist yet
    pub fn ensure_node(&mut self, scene: &mut Scene) -> NodeId {
        match self.node.filter(|id| scene.nodes.contains(*id)) {
            Some(id) => id,
            None => {
                let id = scene.nodes.create_node(NodeKind::Ghost, Vec3::ZERO, Quat::IDENTITY);
                self.node = Some(id);
                id
            }
        }
    }

    /// Start playback
    pub fn play(&mut self) {
        if self.recording.is_some() {
            self.playing = true;
            tracing::debug!("Ghost playback started at {:.2}s", self.time);
        }
    }

    /// Pause playback where it is
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Stop and rewind
    pub fn reset(&mut self, scene: &mut Scene) {
        self.playing = false;
        self.time = 0.0;
        self.apply(scene);
    }

    /// Move the ghost so its current sample sits at `point`
    pub fn place_at(&mut self, point: Vec3, scene: &mut Scene) {
        let sampled = self
            .recording
            .as_ref()
            .and_then(|r| r.sample(self.time))
            .map_or(Vec3::ZERO, |(p, _)| p);
        self.offset = point - sampled;
        self.ensure_node(scene);
        self.apply(scene);
    }

    /// Per-frame update: advance the clock and move the ghost node
    pub fn check(&mut self, dt: f32, scene: &mut Scene) {
        if !self.playing {
            return;
        }
        let Some(duration) = self.recording.as_ref().map(GhostRecording::duration) else {
            self.playing = false;
            return;
        };

        self.time += dt;
        if self.time >= duration {
            if self.looping && duration > 0.0 {
                self.time %= duration;
            } else {
                self.time = duration;
                self.playing = false;
                tracing::debug!("Ghost playback finished");
            }
        }
        self.apply(scene);
    }

    fn apply(&self, scene: &mut Scene) {
        let (Some(node), Some(recording)) = (self.node, self.recording.as_ref()) else {
            return;
        };
        if let Some((position, rotation)) = recording.sample(self.time) {
            scene.set_transform(node, position + self.offset, rotation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> GhostRecording {
        GhostRecording::new(vec![
            GhostFrame {
                time: 1.0,
                position: Vec3::new(10.0, 0.0, 0.0),
                rotation: Quat::from_rotation_y(1.0),
            },
            GhostFrame {
                time: 0.0,
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
            },
        ])
    }

    #[test]
    fn test_sample_interpolates_and_clamps() {
        let recording = recording();
        assert_eq!(recording.duration(), 1.0);
        let (position, _) = recording.sample(0.25).unwrap();
        assert!((position.x - 2.5).abs() < 1e-5);
        assert_eq!(recording.sample(-1.0).unwrap().0, Vec3::ZERO);
        assert_eq!(recording.sample(5.0).unwrap().0, Vec3::new(10.0, 0.0, 0.0));
        assert!(GhostRecording::default().sample(0.0).is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("run.{GHOST_EXTENSION}"));
        let recording = recording();
        recording.save(&path).unwrap();
        assert_eq!(GhostRecording::load(&path).unwrap(), recording);
    }

    #[test]
    fn test_playback_moves_node() {
        let mut scene = Scene::default();
        let mut player = GhostPlayer::new(false);
        player.check(0.5, &mut scene);
        assert!(player.node().is_none());

        player.set_recording(recording(), &mut scene);
        let node = player.node().unwrap();
        player.play();
        player.check(0.5, &mut scene);
        assert!((scene.nodes.get(node).unwrap().position().x - 5.0).abs() < 1e-4);

        player.check(1.0, &mut scene);
        assert!(!player.playing);
        assert_eq!(player.time, 1.0);

        player.reset(&mut scene);
        assert_eq!(scene.nodes.get(node).unwrap().position(), Vec3::ZERO);

        player.place_at(Vec3::new(0.0, 5.0, 0.0), &mut scene);
        assert_eq!(scene.nodes.get(node).unwrap().position(), Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn test_looping_wraps_clock() {
        let mut scene = Scene::default();
        let mut player = GhostPlayer::new(true);
        player.set_recording(recording(), &mut scene);
        player.play();
        player.check(1.25, &mut scene);
        assert!(player.playing);
        assert!((player.time - 0.25).abs() < 1e-5);
    }
}
