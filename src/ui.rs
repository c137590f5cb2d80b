//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, Pane};
use crate::config::{ControlsSettings, TimeField, TrackDisplayField, UiSettings};
use crate::library::{Track, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_GENRE};
use crate::player::{LoopMode, PlaybackSnapshot, TransportState};

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("tab".to_string(), "library/queue".to_string());
    map.insert("enter".to_string(), "play".to_string());
    map.insert("a/A".to_string(), "enqueue/next".to_string());
    map.insert("d".to_string(), "remove".to_string());
    map.insert("J/K".to_string(), "move entry".to_string());
    map.insert("c".to_string(), "clear queue".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("x".to_string(), "stop".to_string());
    map.insert("h/l".to_string(), "prev/next song".to_string());
    // H/L is filled dynamically from config.
    map.insert("/".to_string(), "filter".to_string());
    map.insert("s".to_string(), "shuffle".to_string());
    map.insert("r".to_string(), "loop mode".to_string());
    map.insert("+/-".to_string(), "volume".to_string());
    map.insert("m".to_string(), "mute".to_string());
    map.insert("i".to_string(), "metadata".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating seek seconds.
fn controls_text(seek_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "tab", "h/l", "H/L", "enter", "a/A", "d", "J/K", "c", "space/p", "x", "gg/G", "i",
        "/", "s", "r", "+/-", "m", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] seek -/+{}s", seek_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the "now playing" track text according to `ui` settings.
fn now_playing_track_text(track: &Track, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in &ui.now_playing_track_fields {
        match f {
            TrackDisplayField::Display => {
                if !track.display.trim().is_empty() {
                    parts.push(track.display.clone());
                }
            }
            TrackDisplayField::Title => {
                if !track.title.trim().is_empty() {
                    parts.push(track.title.clone());
                }
            }
            TrackDisplayField::Artist => {
                if let Some(a) = track
                    .artist
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Album => {
                if let Some(a) = track
                    .album
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Filename => {
                if let Some(stem) = track
                    .source
                    .as_local()
                    .and_then(|p| p.file_stem())
                    .and_then(|s| s.to_str())
                {
                    if !stem.trim().is_empty() {
                        parts.push(stem.to_string());
                    }
                }
            }
            TrackDisplayField::Path => {
                parts.push(track.source.describe());
            }
        }
    }

    if parts.is_empty() {
        track.display.clone()
    } else {
        parts.join(&ui.now_playing_track_separator)
    }
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    if ui.now_playing_time_fields.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

fn status_text(app: &App, snapshot: &PlaybackSnapshot, ui_settings: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    let state = match snapshot.state {
        TransportState::Stopped => "Stopped",
        TransportState::Playing => "Playing",
        TransportState::Paused => "Paused",
    };

    match snapshot.current.and_then(|i| snapshot.queue.get(i)) {
        Some(track) => {
            let song = now_playing_track_text(track, ui_settings);
            let time = now_playing_time_text(snapshot.position, track.duration, ui_settings);
            if let Some(time) = time {
                parts.push(format!("Song: {} [{}]", song, time));
            } else {
                parts.push(format!("Song: {}", song));
            }
            parts.push(state.to_string());
        }
        None => parts.push(state.to_string()),
    }

    let loop_text = match snapshot.loop_mode {
        LoopMode::NoLoop => "LOOP: Off",
        LoopMode::LoopAll => "LOOP: List",
        LoopMode::LoopOne => "LOOP: Single",
    };
    parts.push(loop_text.to_string());

    if snapshot.shuffle {
        parts.push("Shuffle: ON".to_string());
    } else {
        parts.push("Shuffle: OFF".to_string());
    }

    if snapshot.muted {
        parts.push("Vol: muted".to_string());
    } else {
        parts.push(format!("Vol: {:.0}%", snapshot.volume * 100.0));
    }

    if let Some(notice) = &snapshot.notice {
        parts.push(format!("!! {}", notice));
    }

    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        let mut filter_part = String::from("FILTER:");
        if !q.is_empty() {
            filter_part.push(' ');
            filter_part.push_str(q);
        }
        parts.push(filter_part);
    }

    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {}", dir));
    }

    parts.join(" • ")
}

fn draw_library(frame: &mut Frame, app: &App, display: &[usize], area: Rect) {
    let q = app.filter_query.trim();
    let query_lower = if q.is_empty() {
        None
    } else if app.uses_lower_titles() {
        Some(q.to_ascii_lowercase())
    } else {
        None
    };

    // Center the selected item when possible by creating a visible window.
    // Important: only build ListItems for the visible window (avoid allocating the entire list).
    let total = display.len();
    let list_height = area.height as usize;
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = if sel_pos > half { sel_pos - half } else { 0 };
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let visible_items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let title = &app.tracks[i].display;
            if q.is_empty() {
                ListItem::new(title.as_str())
            } else {
                let positions = match query_lower.as_deref() {
                    Some(ql) => app.fuzzy_match_positions_for_track_lower(i, ql),
                    None => App::fuzzy_match_positions(title, q),
                };

                if let Some(positions) = positions {
                    let mut rendered = String::new();
                    let mut pos_iter = positions.into_iter();
                    let mut next_pos = pos_iter.next();

                    for (ci, ch) in title.chars().enumerate() {
                        if next_pos == Some(ci) {
                            for up in ch.to_uppercase() {
                                rendered.push(up);
                            }
                            next_pos = pos_iter.next();
                        } else {
                            rendered.push(ch);
                        }
                    }
                    ListItem::new(rendered)
                } else {
                    ListItem::new(title.as_str())
                }
            }
        })
        .collect();

    let focused = app.pane == Pane::Library;
    let highlight = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::DIM | Modifier::REVERSED)
    };

    let list = List::new(visible_items)
        .block(Block::default().borders(Borders::ALL).title(" library "))
        .highlight_style(highlight)
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if total > 0 {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_queue(frame: &mut Frame, app: &App, snapshot: &PlaybackSnapshot, area: Rect) {
    let items: Vec<ListItem> = snapshot
        .queue
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let marker = if snapshot.current == Some(i) {
                "▶ "
            } else {
                "  "
            };
            ListItem::new(format!("{marker}{}", track.display))
        })
        .collect();

    let focused = app.pane == Pane::Queue;
    let highlight = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::DIM | Modifier::REVERSED)
    };

    let title = format!(" queue ({}) ", snapshot.queue.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(highlight)
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if !snapshot.queue.is_empty() {
        state.select(Some(app.queue_selected.min(snapshot.queue.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// Render the entire UI into the provided `frame` using `app` state, the
/// latest player `snapshot` and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    display: &[usize],
    snapshot: &PlaybackSnapshot,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" vivace ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let status_par = Paragraph::new(status_text(app, snapshot, ui_settings))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Main panes: library on the left, queue on the right.
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);

    draw_library(frame, app, display, panes[0]);
    draw_queue(frame, app, snapshot, panes[1]);

    // Overlay metadata popup (keeps list visible under it)
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 10, chunks[2]);
        frame.render_widget(Clear, popup_area);

        let track = app.tracks.get(app.selected);
        let meta = if let Some(track) = track {
            let dur = format_duration_mmss_ceil(track.duration);
            let year = track
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!(
                "Title: {}\nArtist: {}\nAlbum: {}\nYear: {}\nGenre: {}\nDuration: {}\nSource: {}",
                track.title,
                track.artist.as_deref().unwrap_or(UNKNOWN_ARTIST),
                track.album.as_deref().unwrap_or(UNKNOWN_ALBUM),
                year,
                track.genre.as_deref().unwrap_or(UNKNOWN_GENRE),
                dur,
                track.source.describe(),
            )
        } else {
            "No track selected".to_string()
        };
        let meta_paragraph = Paragraph::new(meta)
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 0,
                        top: 0,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .title(" metadata (i closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta_paragraph, popup_area);
    }

    let footer_text = controls_text(controls_settings.seek_seconds);
    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[3]);
}
