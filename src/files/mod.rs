//! Relocation of processed tracks and lyric files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;
use walkdir::WalkDir;

use crate::config::Config;

/// Inserted before the extension when the destination name is taken.
/// Single-level only; a second collision fails the move.
const DUP_SUFFIX: &str = "_dup";

/// Move a processed track (and its lyric file, when one was matched) into
/// the done areas, then prune empty directories left behind in the source
/// pools.
pub fn relocate(cfg: &Config, track: &Path, lyric: Option<&Path>) -> anyhow::Result<()> {
    if let Some(lyric) = lyric {
        let dest = move_into(lyric, &cfg.paths.done_lrc_dir)?;
        info!("lyric file moved to {}", dest.display());
    }
    let dest = move_into(track, &cfg.paths.done_tracks_dir)?;
    info!("track moved to {}", dest.display());

    prune_empty_dirs(&cfg.paths.tracks_dir)?;
    prune_empty_dirs(&cfg.paths.lrc_dir)?;
    Ok(())
}

/// Move `src` into `dest_dir`, creating it if needed. An existing file with
/// the same name is left untouched; the incoming file gets the duplicate
/// suffix instead.
pub fn move_into(src: &Path, dest_dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dest_dir)
        .with_context(|| format!("create dir {}", dest_dir.display()))?;

    let name = src
        .file_name()
        .with_context(|| format!("no file name in {}", src.display()))?;
    let mut dest = dest_dir.join(name);
    if dest.exists() {
        dest = dest_dir.join(dedup_name(&dest));
    }

    fs::rename(src, &dest)
        .with_context(|| format!("move {} to {}", src.display(), dest.display()))?;
    Ok(dest)
}

fn dedup_name(dest: &Path) -> String {
    let stem = dest
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    match dest.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{DUP_SUFFIX}.{ext}"),
        None => format!("{stem}{DUP_SUFFIX}"),
    }
}

/// Remove empty directories under `root`, deepest first. The root itself
/// is never removed.
pub fn prune_empty_dirs(root: &Path) -> anyhow::Result<()> {
    if !root.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(root)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        let path = entry.path();
        if path == root {
            continue;
        }
        let empty = fs::read_dir(path)
            .map(|mut it| it.next().is_none())
            .unwrap_or(false);
        if empty {
            fs::remove_dir(path).with_context(|| format!("remove dir {}", path.display()))?;
        }
    }
    Ok(())
}
