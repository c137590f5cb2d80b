use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, Pane};
use crate::config;
use crate::library::Track;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::player::{LoopMode, PlaybackSnapshot, PlayerCmd, PlayerController, TransportState};
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Last-known playing index as emitted to MPRIS.
    pub last_mpris_index: Option<usize>,
    /// Last-known transport state as emitted to MPRIS.
    pub last_mpris_state: TransportState,
}

impl EventLoopState {
    pub fn new() -> Self {
        Self {
            pending_gg: false,
            last_mpris_index: None,
            last_mpris_state: TransportState::Stopped,
        }
    }
}

/// Main terminal event loop: handles input, UI drawing, sync with the player
/// and MPRIS. Returns `Ok(())` when shutdown is requested.
#[allow(clippy::too_many_arguments)]
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &PlayerController,
    mpris: &MprisHandle,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let snapshot = app.latest_snapshot().unwrap_or_default();
        app.clamp_queue_selection(snapshot.queue.len());

        // Keep MPRIS in sync even when playback changes come from media keys
        // or auto-advance.
        if snapshot.current != state.last_mpris_index || snapshot.state != state.last_mpris_state {
            update_mpris(mpris, app);
            state.last_mpris_index = snapshot.current;
            state.last_mpris_state = snapshot.state;
        }

        let display = app.display_indices();
        terminal.draw(|f| {
            ui::draw(
                f,
                app,
                &display,
                &snapshot,
                &settings.ui,
                &settings.controls,
            )
        })?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, app, player, &snapshot) {
                player.shutdown();
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, player, control_tx, &snapshot, state)? {
                    player.shutdown();
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns true when the application should quit.
fn handle_control_cmd(
    cmd: ControlCmd,
    app: &mut App,
    player: &PlayerController,
    snapshot: &PlaybackSnapshot,
) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => match snapshot.state {
            TransportState::Paused => {
                let _ = player.send(PlayerCmd::TogglePlayPause);
            }
            TransportState::Stopped => {
                if snapshot.queue.is_empty() {
                    play_library_selection(app, player);
                } else {
                    let _ = player.send(PlayerCmd::PlayCurrent);
                }
            }
            TransportState::Playing => {}
        },
        ControlCmd::Pause => {
            if snapshot.state == TransportState::Playing {
                let _ = player.send(PlayerCmd::TogglePlayPause);
            }
        }
        ControlCmd::PlayPause => {
            if snapshot.state == TransportState::Stopped && snapshot.queue.is_empty() {
                play_library_selection(app, player);
            } else {
                let _ = player.send(PlayerCmd::TogglePlayPause);
            }
        }
        ControlCmd::Stop => {
            let _ = player.send(PlayerCmd::Stop);
        }
        ControlCmd::Next => {
            let _ = player.send(PlayerCmd::PlayNext);
        }
        ControlCmd::Prev => {
            let _ = player.send(PlayerCmd::PlayPrevious);
        }
    }
    false
}

/// Replace the queue with the library view and start at the selection.
fn play_library_selection(app: &App, player: &PlayerController) {
    let display = app.display_indices();
    if display.is_empty() {
        return;
    }

    let start = display
        .iter()
        .position(|&i| i == app.selected)
        .unwrap_or(0);
    let tracks: Vec<Track> = display.iter().map(|&i| app.tracks[i].clone()).collect();
    let _ = player.send(PlayerCmd::ReplaceQueue {
        tracks,
        start: Some(start),
    });
}

fn selected_track(app: &App) -> Option<Track> {
    app.tracks.get(app.selected).cloned()
}

fn cycle_loop_mode(mode: LoopMode) -> LoopMode {
    match mode {
        LoopMode::NoLoop => LoopMode::LoopAll,
        LoopMode::LoopAll => LoopMode::LoopOne,
        LoopMode::LoopOne => LoopMode::NoLoop,
    }
}

/// Returns Ok(true) when the application should quit.
fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    player: &PlayerController,
    control_tx: &mpsc::Sender<ControlCmd>,
    snapshot: &PlaybackSnapshot,
    state: &mut EventLoopState,
) -> Result<bool, Box<dyn std::error::Error>> {
    if app.filter_mode {
        state.pending_gg = false;
        match key.code {
            KeyCode::Esc => {
                app.clear_filter();
            }
            KeyCode::Backspace => {
                app.pop_filter_char();
            }
            KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.select_next();
            }
            KeyCode::Char('k') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.select_prev();
            }
            KeyCode::Char(c) => {
                if !c.is_control() {
                    app.push_filter_char(c);
                }
            }
            KeyCode::Enter => {
                if app.display_indices().is_empty() {
                    return Ok(false);
                }

                app.exit_filter_mode();
                play_library_selection(app, player);
            }
            _ => {}
        }

        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') => {
            state.pending_gg = false;
            return Ok(true);
        }
        KeyCode::Char('/') => {
            state.pending_gg = false;
            app.enter_filter_mode();
        }
        KeyCode::Tab => {
            state.pending_gg = false;
            app.toggle_pane();
        }
        KeyCode::Char('s') => {
            state.pending_gg = false;
            let _ = player.send(PlayerCmd::SetShuffle(!snapshot.shuffle));
        }
        KeyCode::Char('r') => {
            state.pending_gg = false;
            let _ = player.send(PlayerCmd::SetLoopMode(cycle_loop_mode(snapshot.loop_mode)));
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                match app.pane {
                    Pane::Library => {
                        let display = app.display_indices();
                        if let Some(&first) = display.first() {
                            app.set_selected(first);
                        }
                    }
                    Pane::Queue => {
                        app.queue_selected = 0;
                    }
                }
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            state.pending_gg = false;
            match app.pane {
                Pane::Library => {
                    let display = app.display_indices();
                    if let Some(&last) = display.last() {
                        app.set_selected(last);
                    }
                }
                Pane::Queue => {
                    if !snapshot.queue.is_empty() {
                        app.queue_selected = snapshot.queue.len() - 1;
                    }
                }
            }
        }
        KeyCode::Char('j') | KeyCode::Down => {
            state.pending_gg = false;
            match app.pane {
                Pane::Library => app.select_next(),
                Pane::Queue => app.queue_select_next(snapshot.queue.len()),
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.pending_gg = false;
            match app.pane {
                Pane::Library => app.select_prev(),
                Pane::Queue => app.queue_select_prev(snapshot.queue.len()),
            }
        }
        KeyCode::Enter => {
            state.pending_gg = false;
            match app.pane {
                Pane::Library => {
                    if app.has_tracks() {
                        play_library_selection(app, player);
                    }
                }
                Pane::Queue => {
                    if !snapshot.queue.is_empty() {
                        let _ = player.send(PlayerCmd::PlayAt(app.queue_selected));
                    }
                }
            }
        }
        KeyCode::Char('a') => {
            state.pending_gg = false;
            if let Some(track) = selected_track(app) {
                let _ = player.send(PlayerCmd::Enqueue(track));
            }
        }
        KeyCode::Char('A') => {
            state.pending_gg = false;
            if let Some(track) = selected_track(app) {
                let _ = player.send(PlayerCmd::EnqueueNext(track));
            }
        }
        KeyCode::Char('d') => {
            state.pending_gg = false;
            if app.pane == Pane::Queue && !snapshot.queue.is_empty() {
                let _ = player.send(PlayerCmd::Remove(app.queue_selected));
            }
        }
        KeyCode::Char('J') => {
            state.pending_gg = false;
            if app.pane == Pane::Queue && app.queue_selected + 1 < snapshot.queue.len() {
                let _ = player.send(PlayerCmd::Reorder {
                    from: app.queue_selected,
                    to: app.queue_selected + 1,
                });
                app.queue_selected += 1;
            }
        }
        KeyCode::Char('K') => {
            state.pending_gg = false;
            if app.pane == Pane::Queue && app.queue_selected > 0 {
                let _ = player.send(PlayerCmd::Reorder {
                    from: app.queue_selected,
                    to: app.queue_selected - 1,
                });
                app.queue_selected -= 1;
            }
        }
        KeyCode::Char('c') => {
            state.pending_gg = false;
            let _ = player.send(PlayerCmd::Clear);
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            state.pending_gg = false;
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('x') => {
            state.pending_gg = false;
            let _ = player.send(PlayerCmd::Stop);
        }
        KeyCode::Char('l') => {
            state.pending_gg = false;
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            state.pending_gg = false;
            let _ = control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => {
            state.pending_gg = false;
            let secs = settings.controls.seek_seconds.min(i64::MAX as u64) as i64;
            let _ = player.send(PlayerCmd::SeekBy(secs));
        }
        KeyCode::Char('H') => {
            state.pending_gg = false;
            let secs = settings.controls.seek_seconds.min(i64::MAX as u64) as i64;
            let _ = player.send(PlayerCmd::SeekBy(-secs));
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            state.pending_gg = false;
            let _ = player.send(PlayerCmd::SetVolume(
                snapshot.volume + settings.controls.volume_step,
            ));
        }
        KeyCode::Char('-') => {
            state.pending_gg = false;
            let _ = player.send(PlayerCmd::SetVolume(
                snapshot.volume - settings.controls.volume_step,
            ));
        }
        KeyCode::Char('m') => {
            state.pending_gg = false;
            let _ = player.send(PlayerCmd::ToggleMute);
        }
        KeyCode::Char('i') => {
            state.pending_gg = false;
            app.toggle_metadata_window();
        }
        KeyCode::Char(_) => {
            // g pending should clear on any other printable char
            state.pending_gg = false;
        }
        _ => {}
    }

    Ok(false)
}
