//! LRC content parsing.
//!
//! Turns raw lyric-file text into a synced body (timestamps retained) and a
//! plain body (timestamps stripped), dropping credit lines injected by some
//! lyric sources and detecting instrumental-only content.

use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

/// `[mm:ss]` / `[mm:ss.f]` through `[mm:ss.fff]` timestamp tags.
static TIMESTAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d{2}:\d{2}(?:\.\d{1,3})?\]").unwrap());

/// Header tags like `[ar:...]`, `[ti:...]`, `[ver:...]`: 2-3 letters, then a
/// colon and the value. Carried in the synced body only.
static META_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[[A-Za-z]{2,3}:.+\]$").unwrap());

/// Credit lines: one leading timestamp tag, a short non-whitespace key, a
/// colon (ASCII or full-width), and a value. Matches the composer/lyricist/
/// mixing attribution lines some sources embed in the lyric stream.
static CREDIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[\d{2}:\d{2}(?:\.\d{1,3})?\]\s*[^\s:：]{1,10}\s*[:：].+$").unwrap()
});

/// Markers meaning the file carries no singable lyrics. Scanned against the
/// lowercased, tag-stripped residue of every line.
const INSTRUMENTAL_MARKERS: &[&str] = &[
    "纯音乐，请欣赏",
    "純音樂，請欣賞",
    "纯音乐",
    "純音樂",
    "pure music",
    "instrumental",
];

/// Parsed lyric content. When the source is instrumental-only, both bodies
/// are empty regardless of what else the file contained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricBody {
    /// Lines with their timestamp markers, blank-line structure preserved.
    pub synced: String,
    /// Timestamp-stripped lines, leading/trailing blanks trimmed.
    pub plain: String,
}

impl LyricBody {
    pub fn is_empty(&self) -> bool {
        self.synced.is_empty() && self.plain.is_empty()
    }
}

/// Parse raw LRC text into synced and plain bodies.
pub fn parse(raw: &str) -> LyricBody {
    let raw = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut synced: Vec<String> = Vec::new();
    let mut plain: Vec<String> = Vec::new();
    let mut instrumental = false;

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            synced.push(String::new());
            plain.push(String::new());
            continue;
        }

        let residue = TIMESTAMP.replace_all(trimmed, "").trim().to_string();
        let scan = residue.to_lowercase();
        if INSTRUMENTAL_MARKERS.iter().any(|m| scan.contains(m)) {
            instrumental = true;
        }

        if CREDIT.is_match(trimmed) {
            continue;
        }

        if META_TAG.is_match(trimmed) {
            synced.push(line.to_string());
            continue;
        }

        synced.push(line.to_string());
        plain.push(residue);
    }

    if instrumental {
        return LyricBody::default();
    }

    while plain.first().is_some_and(|l| l.is_empty()) {
        plain.remove(0);
    }
    while plain.last().is_some_and(|l| l.is_empty()) {
        plain.pop();
    }

    LyricBody {
        synced: synced.join("\n"),
        plain: plain.join("\n"),
    }
}

/// Read a lyric file, trying UTF-8 with BOM, plain UTF-8, then GB18030, and
/// finally lossy UTF-8. Decoding never fails; only the read itself can.
pub fn read_lyric_text(path: &Path) -> anyhow::Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read lyric file {}", path.display()))?;
    Ok(decode_lyric_bytes(&bytes))
}

fn decode_lyric_bytes(bytes: &[u8]) -> String {
    let stripped = bytes.strip_prefix(b"\xef\xbb\xbf");
    if let Some(rest) = stripped
        && let Ok(s) = std::str::from_utf8(rest)
    {
        return s.to_string();
    }
    if stripped.is_none()
        && let Ok(s) = std::str::from_utf8(bytes)
    {
        return s.to_string();
    }
    if let Some(s) = encoding_rs::GB18030.decode_without_bom_handling_and_without_replacement(bytes)
    {
        return s.into_owned();
    }
    String::from_utf8_lossy(stripped.unwrap_or(bytes)).into_owned()
}
