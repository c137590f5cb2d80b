//! Library module: track model, metadata scanning and display helpers.
//!
//! The scanner walks a directory tree, reads tags and produces the
//! immutable `Track` values everything else works with.

mod display;
mod model;
mod scan;

pub use display::{UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_GENRE, display_from_fields};
pub use model::{Track, TrackSource};
pub use scan::scan;
