//! The seam between the player core and actual audio output.
//!
//! The control thread drives a `MediaEngine`; the production engine sits on
//! rodio, tests plug in a scripted stub instead.

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::library::Track;

use super::types::PlayerError;

/// What the controller needs from a playback backend. Decode and device I/O
/// stay behind this trait; the controller only issues transport commands.
pub trait MediaEngine: Send {
    /// Begin playing `track` from the start.
    fn start(&mut self, track: &Track) -> Result<(), PlayerError>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    /// Restart `track` at `position`, paused unless `resume` is set.
    fn seek(&mut self, track: &Track, position: Duration, resume: bool)
    -> Result<(), PlayerError>;
    /// Output volume in [0, 1].
    fn set_volume(&mut self, volume: f32);
    /// True once the active track has played to completion.
    fn finished(&self) -> bool;
}

/// Local-file playback through rodio.
pub struct RodioEngine {
    stream: OutputStream,
    sink: Option<Sink>,
    volume: f32,
}

impl RodioEngine {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in
        // debugging, but noisy for a TUI app.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            volume: 1.0,
        })
    }

    /// Build a paused sink for `track` skipped forward to `start_at`.
    fn build_sink(&self, track: &Track, start_at: Duration) -> Result<Sink, PlayerError> {
        let unsupported = || PlayerError::UnsupportedSource(track.source.describe());

        let Some(path) = track.source.as_local() else {
            // Remote sources belong to a streaming backend this engine
            // does not provide.
            return Err(unsupported());
        };

        let file = File::open(path).map_err(|_| unsupported())?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|_| unsupported())?
            // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
            .skip_duration(start_at);

        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        sink.append(source);
        sink.pause();
        Ok(sink)
    }

    fn replace_sink(&mut self, new_sink: Sink) {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.sink = Some(new_sink);
    }
}

impl MediaEngine for RodioEngine {
    fn start(&mut self, track: &Track) -> Result<(), PlayerError> {
        let sink = self.build_sink(track, Duration::ZERO)?;
        sink.play();
        self.replace_sink(sink);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.play();
        }
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
    }

    fn seek(
        &mut self,
        track: &Track,
        position: Duration,
        resume: bool,
    ) -> Result<(), PlayerError> {
        let sink = self.build_sink(track, position)?;
        if resume {
            sink.play();
        }
        self.replace_sink(sink);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(s) = self.sink.as_ref() {
            s.set_volume(volume);
        }
    }

    fn finished(&self) -> bool {
        self.sink.as_ref().map(|s| s.empty()).unwrap_or(false)
    }
}
