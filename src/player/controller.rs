use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::engine::MediaEngine;
use super::queue::QueueStore;
use super::session::{PlaybackSession, TransportState};
use super::types::{LoopMode, PlaybackSnapshot, PlayerCmd, PlayerError, SnapshotHandle};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Initial playback flags, usually taken from the config file.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub shuffle: bool,
    pub loop_mode: LoopMode,
    pub volume: f32,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            shuffle: false,
            loop_mode: LoopMode::default(),
            volume: 1.0,
        }
    }
}

/// Owner of the play queue and the transport session.
///
/// All mutations go through one command channel into one control thread, so
/// transport transitions are applied strictly one at a time. Observers read
/// the shared snapshot instead of poking at internals.
pub struct PlayerController {
    tx: Sender<PlayerCmd>,
    snapshot: SnapshotHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerController {
    pub fn new(engine: Box<dyn MediaEngine>, options: PlayerOptions) -> Self {
        let (tx, rx) = mpsc::channel::<PlayerCmd>();
        let snapshot: SnapshotHandle = Arc::new(Mutex::new(PlaybackSnapshot::default()));

        let handle = spawn_control_thread(engine, options, rx, snapshot.clone());

        Self {
            tx,
            snapshot,
            join: Mutex::new(Some(handle)),
        }
    }

    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshot.clone()
    }

    pub fn send(&self, cmd: PlayerCmd) -> Result<(), mpsc::SendError<PlayerCmd>> {
        self.tx.send(cmd)
    }

    /// Stop playback and wait for the control thread to finish.
    pub fn shutdown(&self) {
        let _ = self.send(PlayerCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

fn spawn_control_thread(
    engine: Box<dyn MediaEngine>,
    options: PlayerOptions,
    rx: Receiver<PlayerCmd>,
    snapshot: SnapshotHandle,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut core = Core::new(engine, options, snapshot);
        core.publish();

        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(PlayerCmd::Quit) => {
                    core.engine.stop();
                    break;
                }
                Ok(cmd) => core.apply(cmd),
                Err(RecvTimeoutError::Timeout) => core.poll(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

/// The state owned by the control thread.
struct Core {
    queue: QueueStore,
    session: PlaybackSession,
    /// Identity of the active playback run; bumped on every start, seek and
    /// stop so engine reports for a superseded run can be told apart.
    session_id: u64,
    engine: Box<dyn MediaEngine>,
    snapshot: SnapshotHandle,
    volume: f32,
    muted: bool,
    notice: Option<String>,
    last_tick: Instant,
}

impl Core {
    fn new(engine: Box<dyn MediaEngine>, options: PlayerOptions, snapshot: SnapshotHandle) -> Self {
        let mut queue = QueueStore::new();
        queue.set_shuffle(options.shuffle);
        queue.set_loop_mode(options.loop_mode);

        let mut core = Self {
            queue,
            session: PlaybackSession::idle(),
            session_id: 0,
            engine,
            snapshot,
            volume: options.volume.clamp(0.0, 1.0),
            muted: false,
            notice: None,
            last_tick: Instant::now(),
        };
        let v = core.effective_volume();
        core.engine.set_volume(v);
        core
    }

    fn apply(&mut self, cmd: PlayerCmd) {
        match cmd {
            PlayerCmd::PlayCurrent => self.play_current(),
            PlayerCmd::PlayAt(index) => match self.queue.select(index) {
                Ok(()) => self.start_current(),
                Err(e) => {
                    self.report(&e);
                    self.publish();
                }
            },
            PlayerCmd::PlayNext => {
                if self.queue.is_empty() {
                    return;
                }
                match self.queue.next() {
                    Some(_) => self.start_current(),
                    None => {
                        self.stop_session();
                        self.publish();
                    }
                }
            }
            PlayerCmd::PlayPrevious => {
                if self.queue.is_empty() {
                    return;
                }
                match self.queue.previous() {
                    Some(_) => self.start_current(),
                    None => {
                        self.stop_session();
                        self.publish();
                    }
                }
            }
            PlayerCmd::TogglePlayPause => {
                match self.session.state() {
                    TransportState::Playing => {
                        self.session.pause();
                        self.engine.pause();
                    }
                    TransportState::Paused => {
                        self.session.resume();
                        self.engine.resume();
                        self.last_tick = Instant::now();
                    }
                    TransportState::Stopped => {
                        self.play_current();
                        return;
                    }
                }
                self.publish();
            }
            PlayerCmd::Stop => {
                self.stop_session();
                self.publish();
            }
            PlayerCmd::SeekBy(secs) => self.seek_by(secs),
            PlayerCmd::SetShuffle(on) => {
                self.queue.set_shuffle(on);
                self.publish();
            }
            PlayerCmd::SetLoopMode(mode) => {
                self.queue.set_loop_mode(mode);
                self.publish();
            }
            PlayerCmd::SetVolume(v) => {
                self.volume = v.clamp(0.0, 1.0);
                let v = self.effective_volume();
                self.engine.set_volume(v);
                self.publish();
            }
            PlayerCmd::ToggleMute => {
                self.muted = !self.muted;
                let v = self.effective_volume();
                self.engine.set_volume(v);
                self.publish();
            }
            PlayerCmd::Enqueue(track) => {
                self.queue.append(track);
                self.publish();
            }
            PlayerCmd::EnqueueNext(track) => {
                match self.queue.current_index() {
                    Some(i) if i + 1 < self.queue.len() => {
                        let _ = self.queue.insert(track, i + 1);
                    }
                    _ => self.queue.append(track),
                }
                self.publish();
            }
            PlayerCmd::Remove(index) => match self.queue.remove(index) {
                Ok(true) => {
                    if self.queue.current_index().is_none() {
                        self.stop_session();
                        self.publish();
                    } else if self.session.state() != TransportState::Stopped {
                        self.start_current();
                    } else {
                        self.publish();
                    }
                }
                Ok(false) => self.publish(),
                Err(e) => {
                    self.report(&e);
                    self.publish();
                }
            },
            PlayerCmd::Reorder { from, to } => {
                if let Err(e) = self.queue.reorder(from, to) {
                    self.report(&e);
                }
                self.publish();
            }
            PlayerCmd::ReplaceQueue { tracks, start } => {
                self.queue.replace_all(tracks, start);
                if self.queue.current_index().is_some() {
                    self.start_current();
                } else {
                    self.stop_session();
                    self.publish();
                }
            }
            PlayerCmd::Clear => {
                self.queue.clear();
                self.stop_session();
                self.publish();
            }
            PlayerCmd::Tick { session, position } => {
                // Reports for a superseded run arrive late; drop them.
                if session == self.session_id && self.session.state() == TransportState::Playing {
                    self.session.seek(position);
                    self.publish_position();
                }
            }
            PlayerCmd::TrackEnded { session } => {
                if session == self.session_id && self.session.state() != TransportState::Stopped {
                    self.track_ended();
                }
            }
            PlayerCmd::Quit => {}
        }
    }

    /// Periodic upkeep between commands: advance the clock and notice
    /// natural end-of-track.
    fn poll(&mut self) {
        if self.session.state() != TransportState::Playing {
            return;
        }

        let now = Instant::now();
        let delta = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.session.tick(delta);

        if self.engine.finished() {
            self.track_ended();
        } else {
            self.publish_position();
        }
    }

    fn play_current(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        if self.queue.current_index().is_none() {
            self.queue.next();
        }
        if self.queue.current_index().is_some() {
            self.start_current();
        }
    }

    fn track_ended(&mut self) {
        match self.queue.next() {
            Some(_) => self.start_current(),
            None => {
                self.stop_session();
                self.publish();
            }
        }
    }

    /// Start a fresh session on the queue's current track. A track the
    /// engine rejects is skipped the same way a finished track is, bounded
    /// by one round over the queue.
    fn start_current(&mut self) {
        let mut attempts = self.queue.len();
        while attempts > 0 {
            let Some(track) = self.queue.current().cloned() else {
                break;
            };

            match self.engine.start(&track) {
                Ok(()) => {
                    self.session = PlaybackSession::start(track.duration);
                    self.session_id += 1;
                    self.last_tick = Instant::now();
                    self.notice = None;
                    self.publish();
                    return;
                }
                Err(e) => {
                    self.report(&e);
                    attempts -= 1;
                    if self.queue.next().is_none() {
                        break;
                    }
                }
            }
        }

        self.stop_session();
        self.publish();
    }

    fn seek_by(&mut self, secs: i64) {
        if self.session.state() == TransportState::Stopped {
            return;
        }
        let Some(track) = self.queue.current().cloned() else {
            return;
        };

        let step = Duration::from_secs(secs.unsigned_abs());
        let target = if secs >= 0 {
            self.session.position().saturating_add(step)
        } else {
            self.session.position().saturating_sub(step)
        };
        self.session.seek(target);

        let resume = self.session.state() == TransportState::Playing;
        if let Err(e) = self.engine.seek(&track, self.session.position(), resume) {
            self.report(&e);
        }
        // The rebuilt engine run is a new session as far as queued reports
        // are concerned.
        self.session_id += 1;
        self.last_tick = Instant::now();
        self.publish();
    }

    fn stop_session(&mut self) {
        self.engine.stop();
        self.session.stop();
        self.session_id += 1;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    fn report(&mut self, err: &PlayerError) {
        tracing::warn!(error = %err, "playback command failed");
        self.notice = Some(err.to_string());
    }

    fn publish(&self) {
        if let Ok(mut s) = self.snapshot.lock() {
            s.queue = self.queue.tracks().to_vec();
            s.current = self.queue.current_index();
            s.state = self.session.state();
            s.position = self.session.position();
            s.duration = self.session.duration();
            s.shuffle = self.queue.shuffle();
            s.loop_mode = self.queue.loop_mode();
            s.volume = self.volume;
            s.muted = self.muted;
            s.session = self.session_id;
            s.notice = self.notice.clone();
        }
    }

    fn publish_position(&self) {
        if let Ok(mut s) = self.snapshot.lock() {
            s.state = self.session.state();
            s.position = self.session.position();
        }
    }
}
