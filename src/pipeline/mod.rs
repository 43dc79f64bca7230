//! The source-precedence pipeline.
//!
//! Each track is resolved against three sources in fixed order: the
//! service's internal database, the service's external lookup, then the
//! local lyric-file pool. The first applicable branch is terminal and
//! decides which side effects run (upload, relocation, neither).

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::Config;
use crate::files;
use crate::lyrics::parser::{self, LyricBody};
use crate::lyrics::{LrclibClient, LyricRecord};
use crate::matcher::{self, LyricCandidate};
use crate::metadata::TrackRecord;
use crate::prompt::Prompter;

/// Record durations further than this from the track's are flagged. The
/// check is advisory and never blocks a branch.
const DURATION_TOLERANCE_SECS: i64 = 2;

/// Terminal state of processing one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// The internal database already had the lyrics; files were filed away
    /// without uploading.
    CachedHit,
    /// The external record was uploaded.
    ExternalUsed,
    /// A local lyric file was parsed and uploaded.
    LocalUsed,
    /// Nothing in the local pool matched.
    NoLocalMatch,
    /// The operator rejected the local upload.
    UserDeclined,
    /// The upload step failed; files stay in place for a future run.
    UploadFailed,
    /// Dry-run stopped after a preview.
    Previewed,
}

/// Lookup and publish capability. `LrclibClient` is the production
/// implementation; tests substitute deterministic fakes.
pub trait LyricSource {
    async fn get_cached(&self, track: &TrackRecord) -> anyhow::Result<Option<LyricRecord>>;
    async fn get_external(&self, track: &TrackRecord) -> anyhow::Result<Option<LyricRecord>>;
    async fn publish(
        &self,
        track: &TrackRecord,
        plain: &str,
        synced: &str,
    ) -> anyhow::Result<()>;
}

impl LyricSource for LrclibClient {
    async fn get_cached(&self, track: &TrackRecord) -> anyhow::Result<Option<LyricRecord>> {
        LrclibClient::get_cached(self, track).await
    }

    async fn get_external(&self, track: &TrackRecord) -> anyhow::Result<Option<LyricRecord>> {
        LrclibClient::get_external(self, track).await
    }

    async fn publish(
        &self,
        track: &TrackRecord,
        plain: &str,
        synced: &str,
    ) -> anyhow::Result<()> {
        LrclibClient::publish(self, track, plain, synced).await
    }
}

#[derive(Debug, Clone, Copy)]
enum LookupKind {
    Cached,
    External,
}

impl LookupKind {
    fn label(self) -> &'static str {
        match self {
            LookupKind::Cached => "internal database (get-cached)",
            LookupKind::External => "external lookup (get)",
        }
    }
}

pub struct Pipeline<'a, S, P> {
    cfg: &'a Config,
    source: &'a S,
    prompter: &'a P,
    auto_confirm: bool,
    dry_run: bool,
}

impl<'a, S: LyricSource, P: Prompter> Pipeline<'a, S, P> {
    pub fn new(
        cfg: &'a Config,
        source: &'a S,
        prompter: &'a P,
        auto_confirm: bool,
        dry_run: bool,
    ) -> Self {
        Self {
            cfg,
            source,
            prompter,
            auto_confirm,
            dry_run,
        }
    }

    /// Resolve lyrics for one track and run the side effects its terminal
    /// branch calls for.
    pub async fn process_track(&self, track: &TrackRecord) -> ResolutionOutcome {
        info!("processing {track}");

        // 1. internal database
        if let Some(record) = self.lookup(track, LookupKind::Cached).await {
            info!("lyrics already in the internal database, skipping upload");
            self.preview_record(&record);
            if self.dry_run {
                info!("dry-run: preview only");
                return ResolutionOutcome::Previewed;
            }
            let lyric = self.locate_local(track);
            self.relocate(track, lyric.as_deref());
            return ResolutionOutcome::CachedHit;
        }

        // 2. external lookup
        if let Some(record) = self.lookup(track, LookupKind::External).await {
            info!("external source has lyrics; they take precedence over the local pool");
            self.preview_record(&record);
            if self.dry_run {
                info!("dry-run: preview only");
                return ResolutionOutcome::Previewed;
            }
            if self.confirmed("Upload the external lyrics?") {
                let plain = record.plain_lyrics.unwrap_or_default();
                let synced = record.synced_lyrics.unwrap_or_default();
                match self.source.publish(track, &plain, &synced).await {
                    Ok(()) => {
                        info!("external lyrics uploaded");
                        let lyric = self.locate_local(track);
                        self.relocate(track, lyric.as_deref());
                        return ResolutionOutcome::ExternalUsed;
                    }
                    Err(err) => {
                        error!("upload failed: {err:#}");
                        return ResolutionOutcome::UploadFailed;
                    }
                }
            }
            info!("external lyrics declined, trying the local pool");
        }

        // 3. local pool
        let candidates = matcher::find_candidates(track, &self.cfg.paths.lrc_dir);
        if candidates.is_empty() {
            warn!("no local lyric file matches \"{}\", skipping track", track.title);
            return ResolutionOutcome::NoLocalMatch;
        }
        let chosen = self.select(&candidates);

        let body = match parser::read_lyric_text(&chosen.path) {
            Ok(raw) => parser::parse(&raw),
            Err(err) => {
                warn!("{err:#}, skipping track");
                return ResolutionOutcome::NoLocalMatch;
            }
        };
        info!(
            "matched {} (\"{}\" by {}, similarity {:.2})",
            chosen.path.display(),
            chosen.raw_title,
            chosen.artists.join(", "),
            chosen.similarity
        );
        if body.is_empty() {
            info!("content is instrumental-only, publishing empty lyrics");
        }
        self.preview_body(&body);

        if self.dry_run {
            info!("dry-run: preview only");
            return ResolutionOutcome::Previewed;
        }
        if !self.confirmed("Upload these lyrics?") {
            info!("upload declined by operator");
            return ResolutionOutcome::UserDeclined;
        }

        match self.source.publish(track, &body.plain, &body.synced).await {
            Ok(()) => {
                info!("lyrics uploaded");
                self.relocate(track, Some(&chosen.path));
                ResolutionOutcome::LocalUsed
            }
            Err(err) => {
                error!("upload failed: {err:#}");
                ResolutionOutcome::UploadFailed
            }
        }
    }

    /// Run one lookup, downgrading network failures to a miss. A record
    /// carrying a duration gets the advisory consistency check.
    async fn lookup(&self, track: &TrackRecord, kind: LookupKind) -> Option<LyricRecord> {
        let result = match kind {
            LookupKind::Cached => self.source.get_cached(track).await,
            LookupKind::External => self.source.get_external(track).await,
        };
        match result {
            Ok(Some(record)) => {
                self.check_duration(track, &record, kind.label());
                Some(record)
            }
            Ok(None) => None,
            Err(err) => {
                warn!("{} lookup failed: {err:#}", kind.label());
                None
            }
        }
    }

    fn check_duration(&self, track: &TrackRecord, record: &LyricRecord, label: &str) {
        let Some(duration) = record.duration else {
            return;
        };
        let record_secs = duration.round() as i64;
        let diff = (record_secs - i64::from(track.duration_secs)).abs();
        if diff <= DURATION_TOLERANCE_SECS {
            info!(
                "{label} duration check: remote={record_secs}s local={}s diff={diff}s",
                track.duration_secs
            );
        } else {
            warn!(
                "{label} duration check: remote={record_secs}s local={}s diff={diff}s exceeds {DURATION_TOLERANCE_SECS}s",
                track.duration_secs
            );
        }
    }

    /// Best-effort local candidate for relocation alongside the track.
    fn locate_local(&self, track: &TrackRecord) -> Option<PathBuf> {
        let candidates = matcher::find_candidates(track, &self.cfg.paths.lrc_dir);
        if candidates.is_empty() {
            return None;
        }
        Some(self.select(&candidates).path.clone())
    }

    fn select<'c>(&self, candidates: &'c [LyricCandidate]) -> &'c LyricCandidate {
        if candidates.len() == 1 {
            return &candidates[0];
        }
        let options: Vec<String> = candidates
            .iter()
            .map(|c| format!("{} (similarity {:.2})", c.path.display(), c.similarity))
            .collect();
        let idx = self
            .prompter
            .choose_one("Several lyric files match, pick one:", &options);
        candidates.get(idx).unwrap_or(&candidates[0])
    }

    fn confirmed(&self, prompt: &str) -> bool {
        self.auto_confirm || self.prompter.confirm(prompt)
    }

    fn relocate(&self, track: &TrackRecord, lyric: Option<&Path>) {
        if let Err(err) = files::relocate(self.cfg, &track.path, lyric) {
            warn!("relocation failed: {err:#}; files stay in place");
        }
    }

    fn preview_record(&self, record: &LyricRecord) {
        self.preview("plainLyrics", record.plain_lyrics.as_deref().unwrap_or_default());
        self.preview("syncedLyrics", record.synced_lyrics.as_deref().unwrap_or_default());
    }

    fn preview_body(&self, body: &LyricBody) {
        self.preview("plainLyrics", &body.plain);
        self.preview("syncedLyrics", &body.synced);
    }

    fn preview(&self, label: &str, text: &str) {
        println!("--- {label} ---");
        if text.is_empty() {
            println!("[empty]");
        } else {
            let lines: Vec<&str> = text.lines().collect();
            for line in lines.iter().take(self.cfg.ui.preview_lines) {
                println!("{line}");
            }
            if lines.len() > self.cfg.ui.preview_lines {
                println!("... {} lines total", lines.len());
            }
        }
        println!("{}", "-".repeat(40));
    }
}
