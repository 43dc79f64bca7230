//! Scores local lyric files against a track's metadata.
//!
//! Lyric files are expected to be named `Artist - Title.lrc`. A candidate
//! survives when at least one credited artist matches the track and the
//! titles agree loosely enough; survivors are ranked by title similarity.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::metadata::TrackRecord;
use crate::normalize::{normalize_loose, normalize_title_loose, split_artists};

/// Similarity assigned when one normalized title contains the other.
pub const SUBSTRING_SIMILARITY: f64 = 0.95;

/// Candidates scoring below this are discarded.
pub const MIN_TITLE_SIMILARITY: f64 = 0.6;

/// One lyric file that plausibly belongs to a track.
#[derive(Debug, Clone)]
pub struct LyricCandidate {
    pub path: PathBuf,
    pub artists: Vec<String>,
    pub raw_title: String,
    /// Title similarity in [0, 1] against the track this candidate was
    /// scored for.
    pub similarity: f64,
}

/// Split an `Artist - Title` file stem into its credited artists and the
/// raw title. The title is returned unnormalized so diagnostics can show
/// the file's own spelling; loose normalization happens at match time.
pub fn parse_filename(path: &Path) -> (Vec<String>, String) {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    match stem.split_once(" - ") {
        Some((artist_part, title_part)) => (split_artists(artist_part), title_part.to_string()),
        None => (Vec::new(), String::new()),
    }
}

/// True iff the two credit lists share at least one loosely-normalized
/// name. A multi-artist track matches a lyric file crediting any subset.
pub fn match_artists(track_artists: &[String], lyric_artists: &[String]) -> bool {
    let track_norm: HashSet<String> = track_artists.iter().map(|a| normalize_loose(a)).collect();
    lyric_artists
        .iter()
        .any(|a| track_norm.contains(&normalize_loose(a)))
}

/// Loose title similarity, or `None` when either side normalizes to
/// nothing comparable.
pub fn title_similarity(track_title: &str, raw_title: &str) -> Option<f64> {
    let a = normalize_title_loose(track_title);
    let b = normalize_title_loose(raw_title);
    if a.is_empty() || b.is_empty() {
        return None;
    }
    if a.contains(&b) || b.contains(&a) {
        return Some(SUBSTRING_SIMILARITY);
    }
    Some(gestalt_ratio(&a, &b))
}

/// Scan the lyric pool recursively and return every candidate for `track`
/// that clears [`MIN_TITLE_SIMILARITY`], best first. The sort is stable,
/// so equal scores keep traversal order.
pub fn find_candidates(track: &TrackRecord, pool: &Path) -> Vec<LyricCandidate> {
    let track_artists = split_artists(&track.artist);
    let mut candidates = Vec::new();

    for entry in WalkDir::new(pool)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "lrc"))
    {
        let path = entry.path();
        let (artists, raw_title) = parse_filename(path);
        if artists.is_empty() || raw_title.is_empty() {
            continue;
        }
        if !match_artists(&track_artists, &artists) {
            continue;
        }
        let Some(similarity) = title_similarity(&track.title, &raw_title) else {
            continue;
        };
        if similarity < MIN_TITLE_SIMILARITY {
            continue;
        }
        candidates.push(LyricCandidate {
            path: path.to_path_buf(),
            artists,
            raw_title,
            similarity,
        });
    }

    candidates.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}

/// Ratcliff/Obershelp similarity: twice the number of matching characters
/// over the combined length, where matches are found by recursively taking
/// the longest common block and repeating on the pieces either side of it.
pub fn gestalt_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let matched = matching_chars(&a, &b);
    2.0 * matched as f64 / (a.len() + b.len()) as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (ai, bi, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..ai], &b[..bi]) + matching_chars(&a[ai + len..], &b[bi + len..])
}

/// Longest common contiguous block, earliest in `a` (then `b`) on ties.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        let mut cur = vec![0usize; b.len() + 1];
        for (j, &cb) in b.iter().enumerate() {
            if ca == cb {
                let len = prev[j] + 1;
                cur[j + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        prev = cur;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, artist: &str) -> TrackRecord {
        TrackRecord {
            path: PathBuf::from("/tmp/test.mp3"),
            title: title.to_string(),
            artist: artist.to_string(),
            album: "Album".to_string(),
            duration_secs: 200,
        }
    }

    #[test]
    fn test_parse_filename_splits_on_first_separator() {
        let (artists, title) = parse_filename(Path::new("Alan Walker - Faded - 2016.lrc"));
        assert_eq!(artists, vec!["alan walker"]);
        assert_eq!(title, "Faded - 2016");
    }

    #[test]
    fn test_parse_filename_without_separator() {
        let (artists, title) = parse_filename(Path::new("Faded.lrc"));
        assert!(artists.is_empty());
        assert!(title.is_empty());
    }

    #[test]
    fn test_match_artists_case_insensitive_intersection() {
        let track = vec!["a".to_string(), "b".to_string()];
        let lyric = vec!["B".to_string()];
        assert!(match_artists(&track, &lyric));
        assert!(!match_artists(&track, &["c".to_string()]));
    }

    #[test]
    fn test_title_similarity_substring_shortcut() {
        // identical after bracket stripping -> substring path
        assert_eq!(title_similarity("Faded", "Faded (Remix)"), Some(SUBSTRING_SIMILARITY));
        assert_eq!(title_similarity("Faded", "faded"), Some(SUBSTRING_SIMILARITY));
    }

    #[test]
    fn test_title_similarity_disjoint_below_floor() {
        let sim = title_similarity("Faded", "Nevermind").unwrap();
        assert!(sim < MIN_TITLE_SIMILARITY, "got {sim}");
    }

    #[test]
    fn test_title_similarity_empty_normalized() {
        assert_eq!(title_similarity("(Remix)", "Faded"), None);
    }

    #[test]
    fn test_gestalt_ratio_bounds() {
        assert_eq!(gestalt_ratio("abc", "abc"), 1.0);
        assert_eq!(gestalt_ratio("abc", "xyz"), 0.0);
        let near = gestalt_ratio("sing me to sleep", "sing me to slep");
        assert!(near > 0.9 && near < 1.0);
    }

    #[test]
    fn test_find_candidates_filters_and_ranks() {
        let dir = tempfile::tempdir().unwrap();
        let pool = dir.path();
        for name in [
            "Alan Walker - Faded (Remix).lrc",
            "Alan Walker - Fadded.lrc",
            "Alan Walker - Alone.lrc",
            "Coldplay - Faded.lrc",
            "NotASong.lrc",
        ] {
            std::fs::write(pool.join(name), "").unwrap();
        }

        let t = track("Faded", "Alan Walker");
        let found = find_candidates(&t, pool);
        // "Alone" and the Coldplay file drop out; the substring match ranks
        // above the near-miss spelling.
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].raw_title, "Faded (Remix)");
        assert_eq!(found[0].similarity, SUBSTRING_SIMILARITY);
        assert_eq!(found[1].raw_title, "Fadded");
        assert!(found[1].similarity >= MIN_TITLE_SIMILARITY);
        assert!(found[1].similarity < SUBSTRING_SIMILARITY);
    }

    #[test]
    fn test_find_candidates_empty_pool() {
        let dir = tempfile::tempdir().unwrap();
        let t = track("Faded", "Alan Walker");
        assert!(find_candidates(&t, dir.path()).is_empty());
    }
}
