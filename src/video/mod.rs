//! Video reference resolution.
//!
//! Turns whatever the user typed (watch URL, short link, embed URL or a bare
//! id) into a validated [`VideoId`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::{Error, Result};

/// Length of a YouTube video id
const VIDEO_ID_LEN: usize = 11;

/// Canonical YouTube video identifier: 11 characters of `[A-Za-z0-9_-]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Validate a candidate against the identifier grammar
    pub fn parse(candidate: &str) -> Result<Self> {
        if is_valid_id(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(Error::InvalidReference(format!(
                "'{}' is not a valid video id",
                candidate
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VideoId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

fn is_valid_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Resolve a user-supplied reference into a [`VideoId`].
///
/// Forms are tried in order: watch URL, `youtu.be` short link, embed (or legacy
/// `/v/`) URL, then a bare id. The extracted candidate is always re-validated.
pub fn resolve(reference: &str) -> Result<VideoId> {
    let reference = reference.trim();
    tracing::debug!("Resolving video reference: {}", reference);

    if let Some(url) = parse_youtube_url(reference) {
        let host = url.host_str().unwrap_or_default();
        let candidate = if is_youtube_host(host) {
            watch_id(&url).or_else(|| embed_id(&url))
        } else {
            short_link_id(&url)
        };

        return match candidate {
            Some(candidate) => VideoId::parse(&candidate),
            None => Err(Error::InvalidReference(format!(
                "unrecognized YouTube URL: {}",
                reference
            ))),
        };
    }

    VideoId::parse(reference).map_err(|_| {
        Error::InvalidReference(format!("not a YouTube URL or video id: {}", reference))
    })
}

/// Parse the reference as a URL on a YouTube host, tolerating a missing scheme
fn parse_youtube_url(reference: &str) -> Option<Url> {
    let parsed = match Url::parse(reference) {
        Ok(url) if url.has_host() => url,
        _ => Url::parse(&format!("https://{}", reference)).ok()?,
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let host = parsed.host_str()?;
    (is_youtube_host(host) || is_short_host(host)).then_some(parsed)
}

fn is_youtube_host(host: &str) -> bool {
    matches!(host, "youtube.com" | "www.youtube.com" | "m.youtube.com")
}

fn is_short_host(host: &str) -> bool {
    matches!(host, "youtu.be" | "www.youtu.be")
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// `/watch?v=<id>`
fn watch_id(url: &Url) -> Option<String> {
    if path_segments(url).as_slice() != ["watch"] {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
}

/// `/embed/<id>` or the legacy `/v/<id>`
fn embed_id(url: &Url) -> Option<String> {
    match path_segments(url).as_slice() {
        ["embed", id] | ["v", id] => Some((*id).to_string()),
        _ => None,
    }
}

/// `youtu.be/<id>`
fn short_link_id(url: &Url) -> Option<String> {
    path_segments(url).first().map(|id| (*id).to_string())
}

/// Caller's preferred caption language, e.g. `en`, `pt-BR` or `zh-Hans`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguagePreference(String);

impl LanguagePreference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LanguagePreference {
    type Err = String;

    fn from_str(tag: &str) -> std::result::Result<Self, Self::Err> {
        let tag = tag.trim();
        let mut subtags = tag.split('-');

        let primary_ok = subtags
            .next()
            .map(|p| (2..=3).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_alphabetic()))
            .unwrap_or(false);
        let rest_ok = subtags
            .all(|s| (2..=8).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_alphanumeric()));

        if primary_ok && rest_ok {
            Ok(Self(tag.to_string()))
        } else {
            Err(format!(
                "'{}' is not a language code (expected e.g. 'en', 'pt-BR')",
                tag
            ))
        }
    }
}

impl TryFrom<String> for LanguagePreference {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguagePreference> for String {
    fn from(lang: LanguagePreference) -> Self {
        lang.0
    }
}

impl fmt::Display for LanguagePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
