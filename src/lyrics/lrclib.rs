//! LRCLIB API client.
//!
//! Two lookup endpoints are used: `get-cached` answers from the service's
//! own database, `get` may reach out to external providers. Publishing is a
//! two-step exchange: request a proof-of-work challenge, then submit the
//! lyrics with the solved token.

use anyhow::{Context, bail};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::metadata::TrackRecord;

/// A lyric record returned by either lookup endpoint.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LyricRecord {
    #[serde(rename = "plainLyrics")]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    pub synced_lyrics: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Challenge {
    prefix: String,
    target: String,
}

/// LRCLIB API client.
#[derive(Debug, Clone)]
pub struct LrclibClient {
    http: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    const USER_AGENT: &'static str = "lrcpush/0.1.0 (https://github.com/lrcpush)";

    pub fn new(base_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Query the service's internal database.
    pub async fn get_cached(&self, track: &TrackRecord) -> anyhow::Result<Option<LyricRecord>> {
        self.get(track, "get-cached").await
    }

    /// Query with external providers allowed.
    pub async fn get_external(&self, track: &TrackRecord) -> anyhow::Result<Option<LyricRecord>> {
        self.get(track, "get").await
    }

    async fn get(&self, track: &TrackRecord, endpoint: &str) -> anyhow::Result<Option<LyricRecord>> {
        let url = format!(
            "{}/{}?track_name={}&artist_name={}&album_name={}&duration={}",
            self.base_url,
            endpoint,
            urlencoding::encode(&track.title),
            urlencoding::encode(&track.artist),
            urlencoding::encode(&track.album),
            track.duration_secs
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request {endpoint}"))?;

        if response.status().is_success() {
            let record: LyricRecord = response
                .json()
                .await
                .with_context(|| format!("parse {endpoint} response"))?;
            Ok(Some(record))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            bail!("{} returned {}", endpoint, response.status())
        }
    }

    /// Publish lyrics for a track: obtain a challenge, solve it, submit.
    pub async fn publish(
        &self,
        track: &TrackRecord,
        plain: &str,
        synced: &str,
    ) -> anyhow::Result<()> {
        let challenge: Challenge = self
            .http
            .post(format!("{}/request-challenge", self.base_url))
            .send()
            .await
            .context("request challenge")?
            .error_for_status()
            .context("challenge http status")?
            .json()
            .await
            .context("parse challenge")?;

        let nonce = solve_challenge(&challenge.prefix, &challenge.target)?;
        let token = format!("{}:{}", challenge.prefix, nonce);

        let body = json!({
            "trackName": track.title,
            "artistName": track.artist,
            "albumName": track.album,
            "duration": track.duration_secs,
            "plainLyrics": plain,
            "syncedLyrics": synced,
        });

        let response = self
            .http
            .post(format!("{}/publish", self.base_url))
            .header("X-Publish-Token", token)
            .json(&body)
            .send()
            .await
            .context("send publish request")?;

        if response.status().is_success() {
            Ok(())
        } else {
            bail!("publish rejected: {}", response.status())
        }
    }
}

/// Find a nonce whose SHA-256 digest of `prefix` + decimal nonce is at or
/// below the hex-encoded target.
fn solve_challenge(prefix: &str, target_hex: &str) -> anyhow::Result<u64> {
    let target = hex::decode(target_hex).context("decode challenge target")?;
    for nonce in 0..u64::MAX {
        let mut hasher = Sha256::new();
        hasher.update(prefix.as_bytes());
        hasher.update(nonce.to_string().as_bytes());
        let digest = hasher.finalize();
        if digest.as_slice() <= target.as_slice() {
            return Ok(nonce);
        }
    }
    bail!("challenge target unreachable")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_challenge_meets_target() {
        // an easy target: any digest starting with a low byte qualifies
        let target = format!("7f{}", "ff".repeat(31));
        let nonce = solve_challenge("abc", &target).unwrap();

        let mut hasher = Sha256::new();
        hasher.update(b"abc");
        hasher.update(nonce.to_string().as_bytes());
        let digest = hasher.finalize();
        assert!(digest.as_slice() <= hex::decode(&target).unwrap().as_slice());
    }

    #[test]
    fn test_solve_challenge_rejects_bad_target() {
        assert!(solve_challenge("abc", "not-hex").is_err());
    }

    #[test]
    fn test_record_deserializes_service_keys() {
        let raw = r#"{"plainLyrics":"la","syncedLyrics":"[00:01.00]la","duration":212.0}"#;
        let rec: LyricRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.plain_lyrics.as_deref(), Some("la"));
        assert_eq!(rec.synced_lyrics.as_deref(), Some("[00:01.00]la"));
        assert_eq!(rec.duration, Some(212.0));
    }
}
