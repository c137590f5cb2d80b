//! Small player types and handles.
//!
//! Defines the loop mode, the command set accepted by the control thread,
//! the typed error kinds and the snapshot the UI renders from.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use crate::library::Track;

use super::session::TransportState;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopMode {
    /// Do not wrap at the end of the queue.
    NoLoop,
    /// Wrap around to the start of the queue.
    LoopAll,
    /// Repeat the current track when it ends.
    LoopOne,
}

impl Default for LoopMode {
    fn default() -> Self {
        Self::NoLoop
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlayerError {
    /// Index-based queue mutation outside the valid range.
    #[error("index {index} out of range (queue length {len})")]
    OutOfRange { index: usize, len: usize },
    /// The engine cannot play this locator (bad file, unknown codec, remote URL).
    #[error("cannot play {0}")]
    UnsupportedSource(String),
}

/// Commands accepted by the player control thread. User-facing ones are
/// fire-and-forget; `Tick`/`TrackEnded` come from the engine side and carry
/// the playback session they were generated for, so notifications for a
/// superseded session are dropped.
#[derive(Debug)]
pub enum PlayerCmd {
    PlayCurrent,
    /// Start playing the queue entry at the given position.
    PlayAt(usize),
    PlayNext,
    PlayPrevious,
    TogglePlayPause,
    Stop,
    /// Seek by the specified number of seconds (positive or negative).
    SeekBy(i64),
    SetShuffle(bool),
    SetLoopMode(LoopMode),
    /// Set playback volume, clamped to [0, 1].
    SetVolume(f32),
    ToggleMute,
    /// Append a track to the end of the queue.
    Enqueue(Track),
    /// Insert a track right after the current one.
    EnqueueNext(Track),
    /// Remove the queue entry at the given position.
    Remove(usize),
    /// Move a queue entry to a new position.
    Reorder { from: usize, to: usize },
    /// Replace the whole queue, optionally starting playback at `start`.
    ReplaceQueue {
        tracks: Vec<Track>,
        start: Option<usize>,
    },
    Clear,
    /// Position report for the given playback session.
    Tick { session: u64, position: Duration },
    /// End-of-track report for the given playback session.
    TrackEnded { session: u64 },
    Quit,
}

/// Observable player state shared with the UI and MPRIS.
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    /// The queue contents, in play order.
    pub queue: Vec<Track>,
    /// Position of the current track in `queue`, if any.
    pub current: Option<usize>,
    pub state: TransportState,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub shuffle: bool,
    pub loop_mode: LoopMode,
    pub volume: f32,
    pub muted: bool,
    /// Identity of the active playback session; bumped on every track
    /// change and stop.
    pub session: u64,
    /// Last user-visible playback problem, if any.
    pub notice: Option<String>,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            queue: Vec::new(),
            current: None,
            state: TransportState::Stopped,
            position: Duration::ZERO,
            duration: None,
            shuffle: false,
            loop_mode: LoopMode::default(),
            volume: 1.0,
            muted: false,
            session: 0,
            notice: None,
        }
    }
}

pub type SnapshotHandle = Arc<Mutex<PlaybackSnapshot>>;
