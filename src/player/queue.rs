use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::library::Track;

use super::types::{LoopMode, PlayerError};

/// Where the play cursor sits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// No current track (empty queue, or nothing selected yet).
    Unset,
    /// Current track at this position in the queue.
    At(usize),
    /// Playback ran off the end of the queue with looping disabled.
    Ended,
}

/// Ordered play queue with cursor, shuffle and loop policy.
///
/// Invariant: an `At` cursor always points inside the queue; mutations that
/// remove the current track reassign or clear it.
///
/// Shuffle keeps a visited set instead of a pre-shuffled order: each advance
/// picks a random not-yet-played entry, and once everything was played it
/// falls back to uniform random picks, so shuffle never runs dry on its own.
pub struct QueueStore {
    tracks: Vec<Track>,
    cursor: Cursor,
    shuffle: bool,
    loop_mode: LoopMode,
    visited: Vec<bool>,
    rng: StdRng,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// A store with a deterministic shuffle sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            tracks: Vec::new(),
            cursor: Cursor::Unset,
            shuffle: false,
            loop_mode: LoopMode::default(),
            visited: Vec::new(),
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.cursor {
            Cursor::At(i) => Some(i),
            Cursor::Unset | Cursor::Ended => None,
        }
    }

    pub fn current(&self) -> Option<&Track> {
        self.current_index().map(|i| &self.tracks[i])
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Turning shuffle on starts a fresh visited round; only the current
    /// track counts as already played.
    pub fn set_shuffle(&mut self, on: bool) {
        if self.shuffle == on {
            return;
        }
        self.shuffle = on;
        if on {
            self.visited.iter_mut().for_each(|v| *v = false);
            if let Cursor::At(i) = self.cursor {
                self.visited[i] = true;
            }
        }
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    pub fn append(&mut self, track: Track) {
        self.tracks.push(track);
        self.visited.push(false);
    }

    /// Insert before the entry at `position`. Appending is `append`'s job;
    /// a position at or past the end is out of range here.
    pub fn insert(&mut self, track: Track, position: usize) -> Result<(), PlayerError> {
        let len = self.tracks.len();
        if position >= len {
            return Err(PlayerError::OutOfRange {
                index: position,
                len,
            });
        }

        self.tracks.insert(position, track);
        self.visited.insert(position, false);
        if let Cursor::At(i) = self.cursor {
            if position <= i {
                self.cursor = Cursor::At(i + 1);
            }
        }
        Ok(())
    }

    /// Remove the entry at `index`. Returns true when the current track
    /// changed (removed, or playback must stop) so the caller can restart
    /// or tear down its session.
    pub fn remove(&mut self, index: usize) -> Result<bool, PlayerError> {
        let len = self.tracks.len();
        if index >= len {
            return Err(PlayerError::OutOfRange { index, len });
        }

        self.tracks.remove(index);
        self.visited.remove(index);

        match self.cursor {
            Cursor::At(i) if i == index => {
                // The current track went away: move on under the same
                // loop/shuffle rule as a normal advance.
                self.cursor = Cursor::Unset;
                if self.tracks.is_empty() {
                    return Ok(true);
                }
                if self.shuffle {
                    let n = self.pick_shuffled();
                    self.set_current(n);
                } else if index < self.tracks.len() {
                    self.set_current(index);
                } else if self.loop_mode == LoopMode::LoopAll {
                    self.set_current(0);
                } else {
                    self.cursor = Cursor::Ended;
                }
                Ok(true)
            }
            Cursor::At(i) if i > index => {
                self.cursor = Cursor::At(i - 1);
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    /// Move the entry at `from` so it ends up at position `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), PlayerError> {
        let len = self.tracks.len();
        if from >= len {
            return Err(PlayerError::OutOfRange { index: from, len });
        }
        if to >= len {
            return Err(PlayerError::OutOfRange { index: to, len });
        }
        if from == to {
            return Ok(());
        }

        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);
        let seen = self.visited.remove(from);
        self.visited.insert(to, seen);

        if let Cursor::At(c) = self.cursor {
            let new_c = if c == from {
                to
            } else if from < c && to >= c {
                c - 1
            } else if from > c && to <= c {
                c + 1
            } else {
                c
            };
            self.cursor = Cursor::At(new_c);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.visited.clear();
        self.cursor = Cursor::Unset;
    }

    /// Point the cursor at `index` (a user picked a queue entry directly).
    pub fn select(&mut self, index: usize) -> Result<(), PlayerError> {
        let len = self.tracks.len();
        if index >= len {
            return Err(PlayerError::OutOfRange { index, len });
        }
        self.set_current(index);
        Ok(())
    }

    /// Swap in a whole new queue, optionally with a starting position.
    pub fn replace_all(&mut self, tracks: Vec<Track>, start: Option<usize>) {
        self.visited = vec![false; tracks.len()];
        self.tracks = tracks;
        self.cursor = Cursor::Unset;
        if let Some(i) = start {
            if i < self.tracks.len() {
                self.set_current(i);
            }
        }
    }

    /// Advance the cursor. Returns the new current index, or `None` when
    /// playback should stop (queue empty, or end reached with looping off).
    pub fn next(&mut self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }

        if self.loop_mode == LoopMode::LoopOne {
            if let Cursor::At(i) = self.cursor {
                return Some(i);
            }
        }

        if self.shuffle {
            let i = self.pick_shuffled();
            self.set_current(i);
            return Some(i);
        }

        let candidate = match self.cursor {
            Cursor::At(i) => i + 1,
            Cursor::Unset | Cursor::Ended => 0,
        };

        if candidate >= self.tracks.len() {
            if self.loop_mode == LoopMode::LoopAll {
                self.set_current(0);
                Some(0)
            } else {
                self.cursor = Cursor::Ended;
                None
            }
        } else {
            self.set_current(candidate);
            Some(candidate)
        }
    }

    /// Step the cursor backwards; the at-list-start behavior mirrors what
    /// `next` does at the list end.
    pub fn previous(&mut self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }

        if self.loop_mode == LoopMode::LoopOne {
            if let Cursor::At(i) = self.cursor {
                return Some(i);
            }
        }

        if self.shuffle {
            let i = self.pick_shuffled();
            self.set_current(i);
            return Some(i);
        }

        match self.cursor {
            Cursor::At(0) => {
                if self.loop_mode == LoopMode::LoopAll {
                    let last = self.tracks.len() - 1;
                    self.set_current(last);
                    Some(last)
                } else {
                    self.cursor = Cursor::Ended;
                    None
                }
            }
            Cursor::At(i) => {
                self.set_current(i - 1);
                Some(i - 1)
            }
            Cursor::Unset | Cursor::Ended => {
                let last = self.tracks.len() - 1;
                self.set_current(last);
                Some(last)
            }
        }
    }

    fn set_current(&mut self, index: usize) {
        self.cursor = Cursor::At(index);
        self.visited[index] = true;
    }

    /// Random not-yet-played index; once the whole queue was played, any
    /// index goes (uniform).
    fn pick_shuffled(&mut self) -> usize {
        let current = self.current_index();
        let unvisited: Vec<usize> = (0..self.tracks.len())
            .filter(|&i| !self.visited[i] && Some(i) != current)
            .collect();

        if unvisited.is_empty() {
            self.rng.random_range(0..self.tracks.len())
        } else {
            unvisited[self.rng.random_range(0..unvisited.len())]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::TrackSource;
    use std::collections::HashSet;

    fn t(title: &str) -> Track {
        Track {
            id: 0,
            title: title.into(),
            artist: None,
            album: None,
            year: None,
            genre: None,
            source: TrackSource::Local(std::path::PathBuf::from(format!("/tmp/{title}.mp3"))),
            duration: None,
            display: title.into(),
        }
    }

    fn store(titles: &[&str]) -> QueueStore {
        let mut q = QueueStore::with_seed(7);
        for title in titles {
            q.append(t(title));
        }
        q
    }

    #[test]
    fn cursor_invariant_holds_under_appends() {
        let mut q = QueueStore::with_seed(1);
        assert_eq!(q.current_index(), None);
        assert!(q.is_empty());

        for i in 0..5 {
            q.append(t(&format!("s{i}")));
            if let Some(c) = q.current_index() {
                assert!(c < q.len());
            }
        }

        q.select(3).unwrap();
        q.append(t("tail"));
        assert_eq!(q.current_index(), Some(3));
    }

    #[test]
    fn next_then_previous_returns_to_the_same_index_mid_list() {
        let mut q = store(&["a", "b", "c", "d"]);
        q.select(1).unwrap();

        assert_eq!(q.next(), Some(2));
        assert_eq!(q.previous(), Some(1));
    }

    #[test]
    fn next_on_empty_store_is_a_noop() {
        let mut q = QueueStore::with_seed(1);
        assert_eq!(q.next(), None);
        assert_eq!(q.previous(), None);
        assert_eq!(q.cursor(), Cursor::Unset);
    }

    #[test]
    fn next_without_current_starts_at_the_front() {
        let mut q = store(&["a", "b"]);
        assert_eq!(q.next(), Some(0));
    }

    #[test]
    fn previous_without_current_starts_at_the_back() {
        let mut q = store(&["a", "b"]);
        assert_eq!(q.previous(), Some(1));
    }

    #[test]
    fn loop_off_parks_the_cursor_past_the_end() {
        let mut q = store(&["a", "b"]);
        q.select(1).unwrap();

        assert_eq!(q.next(), None);
        assert_eq!(q.cursor(), Cursor::Ended);
        assert_eq!(q.current(), None);
    }

    #[test]
    fn loop_off_mirrors_past_end_at_the_start() {
        let mut q = store(&["a", "b"]);
        q.select(0).unwrap();

        assert_eq!(q.previous(), None);
        assert_eq!(q.cursor(), Cursor::Ended);
    }

    #[test]
    fn loop_one_repeats_the_same_index_forever() {
        let mut q = store(&["a", "b", "c"]);
        q.set_loop_mode(LoopMode::LoopOne);
        q.select(1).unwrap();

        for _ in 0..10 {
            assert_eq!(q.next(), Some(1));
        }
        assert_eq!(q.previous(), Some(1));
    }

    #[test]
    fn loop_all_wraps_back_to_the_start_after_len_advances() {
        let mut q = store(&["a", "b", "c"]);
        q.set_loop_mode(LoopMode::LoopAll);
        q.select(0).unwrap();

        let mut idx = 0;
        for _ in 0..q.len() {
            idx = q.next().unwrap();
        }
        assert_eq!(idx, 0);
    }

    #[test]
    fn loop_all_previous_wraps_to_the_back() {
        let mut q = store(&["a", "b", "c"]);
        q.set_loop_mode(LoopMode::LoopAll);
        q.select(0).unwrap();

        assert_eq!(q.previous(), Some(2));
    }

    #[test]
    fn shuffle_visits_every_track_before_repeating() {
        let mut q = store(&["a", "b", "c", "d", "e"]);
        q.set_shuffle(true);

        let mut seen = HashSet::new();
        for _ in 0..q.len() {
            seen.insert(q.next().unwrap());
        }
        assert_eq!(seen.len(), q.len());
    }

    #[test]
    fn shuffle_keeps_going_once_everything_was_visited() {
        let mut q = store(&["a", "b", "c"]);
        q.set_shuffle(true);

        for _ in 0..3 {
            q.next().unwrap();
        }
        // All visited: further advances fall back to uniform picks.
        for _ in 0..5 {
            assert!(q.next().is_some());
        }
    }

    #[test]
    fn shuffle_ignores_loop_off_exhaustion() {
        let mut q = store(&["a", "b"]);
        q.set_shuffle(true);
        q.set_loop_mode(LoopMode::NoLoop);

        for _ in 0..10 {
            assert!(q.next().is_some());
        }
    }

    #[test]
    fn insert_at_or_past_end_is_out_of_range() {
        let mut q = store(&["a"]);
        assert_eq!(
            q.insert(t("x"), 1),
            Err(PlayerError::OutOfRange { index: 1, len: 1 })
        );

        let mut empty = QueueStore::with_seed(1);
        assert!(matches!(
            empty.insert(t("x"), 0),
            Err(PlayerError::OutOfRange { .. })
        ));
    }

    #[test]
    fn insert_before_current_shifts_the_cursor() {
        let mut q = store(&["a", "b", "c"]);
        q.select(1).unwrap();

        q.insert(t("x"), 0).unwrap();
        assert_eq!(q.current_index(), Some(2));
        assert_eq!(q.current().unwrap().title, "b");

        q.insert(t("y"), 3).unwrap();
        assert_eq!(q.current_index(), Some(2));
    }

    #[test]
    fn remove_past_end_is_out_of_range() {
        let mut q = store(&["a"]);
        assert_eq!(
            q.remove(3),
            Err(PlayerError::OutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn remove_before_current_shifts_the_cursor() {
        let mut q = store(&["a", "b", "c"]);
        q.select(2).unwrap();

        assert_eq!(q.remove(0), Ok(false));
        assert_eq!(q.current_index(), Some(1));
        assert_eq!(q.current().unwrap().title, "c");
    }

    #[test]
    fn remove_current_advances_to_the_successor() {
        let mut q = store(&["a", "b", "c"]);
        q.select(1).unwrap();

        assert_eq!(q.remove(1), Ok(true));
        assert_eq!(q.current().unwrap().title, "c");
    }

    #[test]
    fn remove_current_at_the_end_stops_under_loop_off() {
        let mut q = store(&["a", "b"]);
        q.select(1).unwrap();

        assert_eq!(q.remove(1), Ok(true));
        assert_eq!(q.cursor(), Cursor::Ended);
    }

    #[test]
    fn remove_current_at_the_end_wraps_under_loop_all() {
        let mut q = store(&["a", "b"]);
        q.set_loop_mode(LoopMode::LoopAll);
        q.select(1).unwrap();

        assert_eq!(q.remove(1), Ok(true));
        assert_eq!(q.current_index(), Some(0));
    }

    #[test]
    fn remove_last_track_clears_the_cursor() {
        let mut q = store(&["only"]);
        q.select(0).unwrap();

        assert_eq!(q.remove(0), Ok(true));
        assert!(q.is_empty());
        assert_eq!(q.cursor(), Cursor::Unset);
    }

    #[test]
    fn reorder_moves_entries_and_follows_the_current_track() {
        let mut q = store(&["a", "b", "c", "d"]);
        q.select(1).unwrap();

        q.reorder(1, 3).unwrap();
        let titles: Vec<&str> = q.tracks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c", "d", "b"]);
        assert_eq!(q.current_index(), Some(3));

        q.reorder(0, 3).unwrap();
        assert_eq!(q.current_index(), Some(2));
        assert_eq!(q.current().unwrap().title, "b");
    }

    #[test]
    fn reorder_out_of_range_errors() {
        let mut q = store(&["a", "b"]);
        assert!(matches!(
            q.reorder(0, 5),
            Err(PlayerError::OutOfRange { .. })
        ));
        assert!(matches!(
            q.reorder(5, 0),
            Err(PlayerError::OutOfRange { .. })
        ));
    }

    #[test]
    fn clear_empties_and_unsets() {
        let mut q = store(&["a", "b"]);
        q.select(0).unwrap();
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.cursor(), Cursor::Unset);
    }

    #[test]
    fn replace_all_sets_the_requested_start() {
        let mut q = store(&["old"]);
        q.replace_all(vec![t("x"), t("y")], Some(1));
        assert_eq!(q.current().unwrap().title, "y");

        q.replace_all(vec![t("z")], None);
        assert_eq!(q.cursor(), Cursor::Unset);

        q.replace_all(vec![t("w")], Some(9));
        assert_eq!(q.cursor(), Cursor::Unset);
    }
}
