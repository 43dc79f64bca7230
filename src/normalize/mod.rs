//! String canonicalization for artist and title comparison.
//!
//! Lyric file names and audio tags rarely agree byte-for-byte, so matching
//! runs over canonicalized forms: lowercased, full-width punctuation folded
//! to ASCII, whitespace collapsed. Title comparison additionally discards
//! parenthetical qualifiers and version tags.

use once_cell::sync::Lazy;
use regex::Regex;

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Bracketed spans of each family, non-greedy so "(a) b (c)" loses both
/// spans but keeps "b".
static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(.*?\)|（.*?）|【.*?】|\[.*?\]").unwrap());

/// Version qualifiers stripped from titles. `version` must precede `ver`
/// in the alternation so the longer token wins.
static VERSION_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)remix|remaster|live|version|ver").unwrap());

/// `feat` / `featuring` / `ft`, optional trailing period, rewritten into a
/// separator before artist splitting.
static FEAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:featuring|feat|ft)\b\.?\s*").unwrap());

/// Connector tokens that separate artists in a credit string. Internal
/// spaces alone never split a name, so two-word stage names stay whole.
const ARTIST_SEPARATORS: &[&str] = &[
    "&", "和", "/", ";", "、", "，", "､", " x ", " X ", " × ",
];

/// Lowercase, trim, fold full-width punctuation to ASCII, collapse
/// whitespace runs. Idempotent.
pub fn normalize_loose(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let folded: String = lowered
        .chars()
        .map(|c| match c {
            '（' => '(',
            '）' => ')',
            '【' => '[',
            '】' => ']',
            '：' => ':',
            '。' => '.',
            '，' => ',',
            '！' => '!',
            '？' => '?',
            other => other,
        })
        .collect();
    MULTI_SPACE.replace_all(&folded, " ").trim().to_string()
}

/// Aggressive title canonicalization for fuzzy comparison only: on top of
/// [`normalize_loose`], strips bracketed spans and version tokens, then
/// reduces the string to alphanumerics, CJK ideographs, and single spaces.
/// Never use this for exact lookups.
pub fn normalize_title_loose(s: &str) -> String {
    let s = normalize_loose(s);
    let s = BRACKETED.replace_all(&s, " ");
    let s = VERSION_TOKENS.replace_all(&s, " ");
    let kept: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || is_cjk_ideograph(c) {
                c
            } else {
                ' '
            }
        })
        .collect();
    MULTI_SPACE.replace_all(&kept, " ").trim().to_string()
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c as u32, 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF)
}

/// Split a raw artist credit into individual names: lowercase, rewrite
/// feat-style credits into separators, split on the connector list, trim,
/// drop empties, dedup keeping first occurrence.
pub fn split_artists(s: &str) -> Vec<String> {
    let lowered = s.to_lowercase();
    let mut buf = FEAT.replace_all(&lowered, ",").into_owned();
    for sep in ARTIST_SEPARATORS {
        buf = buf.replace(sep, ",");
    }

    let mut artists: Vec<String> = Vec::new();
    for piece in buf.split(',') {
        let piece = piece.trim();
        if piece.is_empty() || artists.iter().any(|a| a == piece) {
            continue;
        }
        artists.push(piece.to_string());
    }
    artists
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_loose_folds_fullwidth() {
        assert_eq!(normalize_loose("Faded（Remix）"), "faded(remix)");
        assert_eq!(normalize_loose("晴天  ，  周杰伦！"), "晴天 , 周杰伦!");
    }

    #[test]
    fn test_normalize_loose_idempotent() {
        for raw in ["  Alan   Walker ", "告白気球（Live）", "A？B！C：D"] {
            let once = normalize_loose(raw);
            assert_eq!(normalize_loose(&once), once);
        }
    }

    #[test]
    fn test_normalize_title_loose_strips_brackets_and_versions() {
        assert_eq!(normalize_title_loose("Faded (Remix)"), "faded");
        assert_eq!(normalize_title_loose("Faded【2021 Remaster】"), "faded");
        assert_eq!(normalize_title_loose("Sing Me to Sleep - Live Ver."), "sing me to sleep");
    }

    #[test]
    fn test_normalize_title_loose_keeps_cjk() {
        assert_eq!(normalize_title_loose("晴天 (Live)"), "晴天");
    }

    #[test]
    fn test_normalize_title_loose_idempotent() {
        for raw in ["Faded (Remix)", "晴天【现场版】", "Alone Pt. II"] {
            let once = normalize_title_loose(raw);
            assert_eq!(normalize_title_loose(&once), once);
        }
    }

    #[test]
    fn test_split_artists_connectors() {
        assert_eq!(split_artists("Alan Walker & K-391"), vec!["alan walker", "k-391"]);
        assert_eq!(split_artists("周杰伦、蔡依林"), vec!["周杰伦", "蔡依林"]);
        assert_eq!(split_artists("A / B; C"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_artists_keeps_multi_word_names() {
        assert_eq!(split_artists("Alan Walker"), vec!["alan walker"]);
        assert_eq!(split_artists("Twenty One Pilots"), vec!["twenty one pilots"]);
    }

    #[test]
    fn test_split_artists_feat_variants() {
        assert_eq!(split_artists("Alan Walker feat. Iselin"), vec!["alan walker", "iselin"]);
        assert_eq!(split_artists("Drake ft Rihanna"), vec!["drake", "rihanna"]);
        assert_eq!(split_artists("Avicii featuring Aloe Blacc"), vec!["avicii", "aloe blacc"]);
        // "ft" inside a word is not a credit marker
        assert_eq!(split_artists("Taylor Swift"), vec!["taylor swift"]);
    }

    #[test]
    fn test_split_artists_dedup_first_seen() {
        assert_eq!(split_artists("Alan Walker & alan walker"), vec!["alan walker"]);
    }

    #[test]
    fn test_split_artists_x_connector_needs_spaces() {
        assert_eq!(split_artists("K-391 x Alan Walker"), vec!["k-391", "alan walker"]);
        // no split inside a name containing the letter x
        assert_eq!(split_artists("Xandria"), vec!["xandria"]);
    }
}
