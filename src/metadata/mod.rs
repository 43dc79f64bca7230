//! Track metadata extraction via lofty.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use lofty::prelude::*;
use lofty::probe::Probe;

/// One audio file and the tag fields the pipeline needs. Immutable once
/// read; the processing run owns the file at `path` exclusively.
#[derive(Debug, Clone)]
pub struct TrackRecord {
    pub path: PathBuf,
    pub title: String,
    /// Raw artist credit as tagged, possibly naming several artists.
    pub artist: String,
    pub album: String,
    pub duration_secs: u32,
}

impl fmt::Display for TrackRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({}, {}s)",
            self.artist, self.title, self.album, self.duration_secs
        )
    }
}

/// Read the tags of one audio file. Unreadable files, missing title, artist,
/// or album, and non-positive durations are errors; callers skip the track
/// and log a warning rather than aborting the run.
pub fn read_track(path: &Path) -> anyhow::Result<TrackRecord> {
    let tagged_file = Probe::open(path)
        .and_then(|p| p.read())
        .with_context(|| format!("read tags from {}", path.display()))?;

    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
        .with_context(|| format!("no tags in {}", path.display()))?;

    let title = tag.title().map(|s| s.trim().to_string()).unwrap_or_default();
    let artist = tag.artist().map(|s| s.trim().to_string()).unwrap_or_default();
    let album = tag.album().map(|s| s.trim().to_string()).unwrap_or_default();

    if title.is_empty() || artist.is_empty() || album.is_empty() {
        bail!("incomplete tags in {}", path.display());
    }

    let duration_secs = tagged_file.properties().duration().as_secs_f64().round() as i64;
    if duration_secs <= 0 {
        bail!("invalid duration in {}", path.display());
    }

    Ok(TrackRecord {
        path: path.to_path_buf(),
        title,
        artist,
        album,
        duration_secs: duration_secs as u32,
    })
}
