//! CUE playlist rendering
//!
//! Each track points at its own `cdda:///<n>` source so players can stream
//! straight from the disc.

use crate::models::DiscMetadata;
use std::fmt::Write;

/// Render the playlist for a disc.
///
/// REM lines are only written for fields that have a value.
pub fn render_playlist(metadata: &DiscMetadata) -> String {
    let mut out = String::new();

    if let Some(date) = present(metadata.release_date.as_deref()) {
        let _ = writeln!(out, "REM DATE \"{}\"", date);
    }
    if let Some(genre) = present(metadata.genre.as_deref()) {
        let _ = writeln!(out, "REM GENRE \"{}\"", genre);
    }
    if metadata.has_cover_art() {
        if let Some(cover) = &metadata.cover_art_path {
            let _ = writeln!(out, "REM COVER \"{}\"", cover.display());
        }
    }
    let _ = writeln!(out, "PERFORMER \"{}\"", metadata.artist);
    let _ = writeln!(out, "TITLE \"{}\"", metadata.title);

    for (idx, title) in metadata.tracks.iter().enumerate() {
        let number = idx + 1;
        let _ = writeln!(out, "FILE \"cdda:///{}\" WAVE", number);
        let _ = writeln!(out, "  TRACK {:02} AUDIO", number);
        let _ = writeln!(out, "    TITLE \"{}\"", title);
    }

    out
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
