use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the audio for a track actually lives.
///
/// Local files are decoded in-process; remote URLs belong to a streaming
/// backend and are rejected by the local engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    Local(PathBuf),
    Remote(String),
}

impl TrackSource {
    pub fn as_local(&self) -> Option<&Path> {
        match self {
            TrackSource::Local(p) => Some(p.as_path()),
            TrackSource::Remote(_) => None,
        }
    }

    /// A printable locator for logs and notices.
    pub fn describe(&self) -> String {
        match self {
            TrackSource::Local(p) => p.display().to_string(),
            TrackSource::Remote(url) => url.clone(),
        }
    }
}

/// One playable item. Immutable after the scanner builds it; missing
/// metadata stays `None` here and gets its "Unknown …" placeholder at
/// render time.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<u32>,
    pub genre: Option<String>,
    pub source: TrackSource,
    pub duration: Option<Duration>,
    pub display: String,
}
