//! Playback core: queue store, transport session and the controller that
//! owns both.
//!
//! The controller runs on its own thread behind a command channel; the UI
//! and the MPRIS bridge only ever send commands and read the published
//! snapshot. Audio output sits behind the `MediaEngine` trait.

mod controller;
mod engine;
mod queue;
mod session;
mod types;

pub use controller::{PlayerController, PlayerOptions};
pub use engine::{MediaEngine, RodioEngine};
pub use queue::{Cursor, QueueStore};
pub use session::{PlaybackSession, TransportState};
pub use types::{LoopMode, PlaybackSnapshot, PlayerCmd, PlayerError, SnapshotHandle};
