use std::time::Duration;

/// Transport state of the active playback session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
    Paused,
}

impl Default for TransportState {
    fn default() -> Self {
        Self::Stopped
    }
}

/// Transport state and elapsed position for the track being played.
///
/// A session is created fresh every time the current track changes and is
/// reset on stop. It never touches the engine itself; the control thread
/// keeps the two in step.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    state: TransportState,
    position: Duration,
    duration: Option<Duration>,
}

impl PlaybackSession {
    /// A session with nothing playing.
    pub fn idle() -> Self {
        Self {
            state: TransportState::Stopped,
            position: Duration::ZERO,
            duration: None,
        }
    }

    /// Start a session for a track of the given duration: playing, position 0.
    pub fn start(duration: Option<Duration>) -> Self {
        Self {
            state: TransportState::Playing,
            position: Duration::ZERO,
            duration,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Playing -> Paused; no-op in any other state.
    pub fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
        }
    }

    /// Paused -> Playing; no-op in any other state.
    pub fn resume(&mut self) {
        if self.state == TransportState::Paused {
            self.state = TransportState::Playing;
        }
    }

    /// Back to Stopped, position 0.
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.position = Duration::ZERO;
    }

    /// Move the position, clamping into [0, duration]. Out-of-range input is
    /// corrected, never an error.
    pub fn seek(&mut self, position: Duration) {
        self.position = match self.duration {
            Some(total) => position.min(total),
            None => position,
        };
    }

    /// Advance the position by `delta` while playing. Returns true when the
    /// track has run to its known end.
    pub fn tick(&mut self, delta: Duration) -> bool {
        if self.state != TransportState::Playing {
            return false;
        }

        self.position += delta;
        if let Some(total) = self.duration {
            if self.position >= total {
                self.position = total;
                return true;
            }
        }
        false
    }
}
