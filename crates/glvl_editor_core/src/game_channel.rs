// SPDX-License-Identifier: MIT OR Apache-2.0
//! Messages from the running game process.
//!
//! The game writes one JSON object per line. A background thread decodes
//! them and forwards them over a channel; the frame loop drains the channel
//! once per frame, so message handling always runs on the editor thread.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

/// Message sent by the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameMessage {
    /// Ghost recording was started or stopped
    SetRecording {
        /// Whether the game is now recording
        enable: bool,
    },
    /// Ghost recording was written to disk
    SaveRecording {
        /// Location of the `.gst.bin` file
        file_path: PathBuf,
    },
}

impl GameMessage {
    /// Decode one line of the pipe
    pub fn decode(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// Encode as one line (no trailing newline)
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Receiving end of the game pipe
#[derive(Debug)]
pub struct GameChannel {
    rx: Receiver<GameMessage>,
    reader: Option<JoinHandle<()>>,
    connected: bool,
}

impl GameChannel {
    /// Spawn a reader thread decoding messages from `input`
    pub fn spawn<R>(input: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let reader = std::thread::spawn(move || read_messages(input, tx));
        Self {
            rx,
            reader: Some(reader),
            connected: true,
        }
    }

    /// Channel fed directly by a sender, without a reader thread
    pub fn pair() -> (Sender<GameMessage>, Self) {
        let (tx, rx) = mpsc::channel();
        (
            tx,
            Self {
                rx,
                reader: None,
                connected: true,
            },
        )
    }

    /// Whether the other end is still attached
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Drain pending messages (non-blocking)
    pub fn poll(&mut self) -> Vec<GameMessage> {
        let mut messages = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(message) => messages.push(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.connected {
                        tracing::info!("Game pipe disconnected");
                        self.connected = false;
                        if let Some(reader) = self.reader.take() {
                            if reader.join().is_err() {
                                tracing::warn!("Game pipe reader panicked");
                            }
                        }
                    }
                    break;
                }
            }
        }
        messages
    }
}

fn read_messages<R: BufRead>(input: R, tx: Sender<GameMessage>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Game pipe read failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match GameMessage::decode(&line) {
            Ok(message) => {
                if tx.send(message).is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!("Ignoring malformed game message: {e}"),
        }
    }
}
