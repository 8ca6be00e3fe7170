// SPDX-License-Identifier: MIT OR Apache-2.0
//! Background terrain streaming.
//!
//! The frame loop publishes the camera position into a single-slot
//! [`PositionSlot`] every frame. The worker thread wakes up, takes the
//! latest position if the slot is dirty, and reports blocks entering or
//! leaving the streaming radius back over a channel. The slot is the only
//! state shared between the two threads.

use crate::config::StreamingConfig;
use crate::level::TerrainBlock;
use glam::Vec3;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Streaming change for one terrain block (index into the level's blocks)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerrainEvent {
    /// Block came within range
    Load(usize),
    /// Block went out of range
    Unload(usize),
}

#[derive(Debug, Default)]
struct SlotState {
    position: Vec3,
    check: bool,
    shutdown: bool,
}

/// Latest camera position plus a "check" flag, overwritten on every publish
#[derive(Debug, Default)]
pub struct PositionSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl PositionSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot and wake the worker
    pub fn publish(&self, position: Vec3) {
        {
            let mut state = self.state.lock();
            state.position = position;
            state.check = true;
        }
        self.ready.notify_one();
    }

    /// Take the position if it changed since the last take
    pub fn take(&self) -> Option<Vec3> {
        let mut state = self.state.lock();
        if state.check {
            state.check = false;
            Some(state.position)
        } else {
            None
        }
    }

    /// Wait up to `timeout` for a publish. `Err(())` once shut down.
    fn wait_take(&self, timeout: Duration) -> Result<Option<Vec3>, ()> {
        let mut state = self.state.lock();
        if !state.check && !state.shutdown {
            self.ready.wait_for(&mut state, timeout);
        }
        if state.shutdown {
            return Err(());
        }
        if state.check {
            state.check = false;
            Ok(Some(state.position))
        } else {
            Ok(None)
        }
    }

    fn shutdown(&self) {
        self.state.lock().shutdown = true;
        self.ready.notify_all();
    }
}

/// Blocks whose bounding sphere lies within `radius` of `position`
pub fn blocks_in_range(blocks: &[TerrainBlock], position: Vec3, radius: f32) -> HashSet<usize> {
    blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| b.center.distance(position) - b.radius <= radius)
        .map(|(i, _)| i)
        .collect()
}

/// Terrain streaming worker handle
#[derive(Debug)]
pub struct TerrainStreamer {
    slot: Arc<PositionSlot>,
    events: Receiver<TerrainEvent>,
    worker: Option<JoinHandle<()>>,
}

impl TerrainStreamer {
    /// Spawn the worker for a level's terrain blocks
    pub fn spawn(blocks: Vec<TerrainBlock>, config: &StreamingConfig) -> Self {
        let slot = Arc::new(PositionSlot::new());
        let (tx, events) = mpsc::channel();
        let worker_slot = Arc::clone(&slot);
        let radius = config.radius;
        let interval = Duration::from_millis(config.poll_interval_ms.max(1));

        let worker = std::thread::spawn(move || {
            stream_worker(blocks, radius, interval, worker_slot, tx);
        });
        tracing::debug!("Terrain streamer started (radius {radius})");

        Self {
            slot,
            events,
            worker: Some(worker),
        }
    }

    /// Hand the camera position to the worker. Never blocks beyond the slot lock.
    pub fn set_position(&self, position: Vec3) {
        self.slot.publish(position);
    }

    /// Drain streaming events (non-blocking)
    pub fn poll(&self) -> Vec<TerrainEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("Terrain streamer channel disconnected");
                    break;
                }
            }
        }
        events
    }
}

impl Drop for TerrainStreamer {
    fn drop(&mut self) {
        self.slot.shutdown();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("Terrain streamer worker panicked");
            }
        }
    }
}

fn stream_worker(
    blocks: Vec<TerrainBlock>,
    radius: f32,
    interval: Duration,
    slot: Arc<PositionSlot>,
    tx: Sender<TerrainEvent>,
) {
    let mut loaded: HashSet<usize> = HashSet::new();
    while let Ok(position) = slot.wait_take(interval) {
        let Some(position) = position else {
            continue;
        };
        let in_range = blocks_in_range(&blocks, position, radius);

        let mut unloads: Vec<usize> = loaded.difference(&in_range).copied().collect();
        let mut loads: Vec<usize> = in_range.difference(&loaded).copied().collect();
        unloads.sort_unstable();
        loads.sort_unstable();

        let sent = unloads
            .into_iter()
            .map(TerrainEvent::Unload)
            .chain(loads.into_iter().map(TerrainEvent::Load))
            .try_for_each(|event| tx.send(event));
        if sent.is_err() {
            break;
        }
        loaded = in_range;
    }
    tracing::debug!("Terrain streamer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn blocks() -> Vec<TerrainBlock> {
        (0..3)
            .map(|i| TerrainBlock {
                name: format!("block_{i}"),
                center: Vec3::new(i as f32 * 1000.0, 0.0, 0.0),
                radius: 50.0,
            })
            .collect()
    }

    fn collect_until(streamer: &TerrainStreamer, count: usize) -> Vec<TerrainEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.len() < count && Instant::now() < deadline {
            events.extend(streamer.poll());
            std::thread::sleep(Duration::from_millis(2));
        }
        events
    }

    #[test]
    fn test_slot_keeps_latest_only() {
        let slot = PositionSlot::new();
        assert_eq!(slot.take(), None);
        slot.publish(Vec3::X);
        slot.publish(Vec3::Y);
        assert_eq!(slot.take(), Some(Vec3::Y));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_range_uses_bounding_sphere() {
        let in_range = blocks_in_range(&blocks(), Vec3::new(500.0, 0.0, 0.0), 460.0);
        assert_eq!(in_range, HashSet::from([0, 1]));
    }

    #[test]
    fn test_worker_reports_load_and_unload() {
        let config = StreamingConfig {
            enabled: true,
            radius: 100.0,
            poll_interval_ms: 5,
        };
        let streamer = TerrainStreamer::spawn(blocks(), &config);

        streamer.set_position(Vec3::ZERO);
        assert_eq!(collect_until(&streamer, 1), vec![TerrainEvent::Load(0)]);

        streamer.set_position(Vec3::new(2000.0, 0.0, 0.0));
        assert_eq!(
            collect_until(&streamer, 2),
            vec![TerrainEvent::Unload(0), TerrainEvent::Load(2)]
        );
        drop(streamer);
    }
}
