use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod retry;

use crate::config::RetryConfig;
use crate::provider::{CaptionProvider, CaptionTrack, ProviderError};
use crate::video::{LanguagePreference, VideoId};
use crate::{Error, Result};

/// Individual transcript segment with timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,

    /// Segment text
    pub text: String,
}

/// A fetched transcript with the metadata needed to name and label it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Display title of the video
    pub video_title: String,

    /// Language code of the track that was downloaded
    pub language_used: String,

    /// Segments in provider order
    pub segments: Vec<TranscriptSegment>,
}

impl TranscriptResult {
    /// End time of the last segment in seconds
    pub fn duration(&self) -> f64 {
        self.segments
            .last()
            .map(|segment| segment.start + segment.duration)
            .unwrap_or(0.0)
    }
}

/// Runs the transcript acquisition protocol against a [`CaptionProvider`]
#[derive(Clone)]
pub struct TranscriptFetcher {
    provider: Arc<dyn CaptionProvider>,
    retry: RetryConfig,
}

impl TranscriptFetcher {
    pub fn new(provider: Arc<dyn CaptionProvider>, retry: RetryConfig) -> Self {
        Self { provider, retry }
    }

    /// Fetch the transcript for `id`.
    ///
    /// With a preferred language only an exact match is accepted. Without one,
    /// the first manually created track wins over the first generated track.
    #[tracing::instrument(skip(self), fields(provider = self.provider.provider_name()))]
    pub async fn fetch(
        &self,
        id: &VideoId,
        preferred: Option<&LanguagePreference>,
    ) -> Result<TranscriptResult> {
        let listing = retry::with_retry(&self.retry, "list_tracks", || self.provider.list_tracks(id))
            .await
            .map_err(classify)?;

        tracing::debug!(
            title = %listing.video_title,
            available = ?listing.tracks.iter().map(|t| t.language_code.as_str()).collect::<Vec<_>>(),
            "Listed caption tracks"
        );

        let track = select_track(&listing.tracks, preferred)?;
        tracing::info!(
            language = %track.language_code,
            generated = track.is_generated,
            "Selected caption track"
        );

        let segments = retry::with_retry(&self.retry, "download", || self.provider.download(track))
            .await
            .map_err(classify)?;

        tracing::info!(segments = segments.len(), "Downloaded transcript");

        Ok(TranscriptResult {
            video_title: listing.video_title,
            language_used: track.language_code.clone(),
            segments,
        })
    }
}

/// Pick the track to download.
///
/// Manual tracks win over generated ones, both for an explicit language and
/// when any language will do.
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    preferred: Option<&LanguagePreference>,
) -> Result<&'a CaptionTrack> {
    match preferred {
        Some(lang) => {
            let matching = |track: &&CaptionTrack| track.language_code == lang.as_str();
            manual_first(tracks.iter().filter(matching)).ok_or_else(|| Error::LanguageUnavailable {
                requested: lang.to_string(),
            })
        }
        None => manual_first(tracks.iter())
            .ok_or_else(|| Error::NoTranscriptAvailable("the video has no caption tracks".to_string())),
    }
}

fn manual_first<'a, I>(mut candidates: I) -> Option<&'a CaptionTrack>
where
    I: Iterator<Item = &'a CaptionTrack> + Clone,
{
    candidates
        .clone()
        .find(|track| !track.is_generated)
        .or_else(|| candidates.next())
}

/// Map a provider failure onto the crate's error taxonomy
fn classify(error: ProviderError) -> Error {
    match error {
        ProviderError::VideoUnavailable(reason) => Error::VideoUnavailable(reason),
        ProviderError::TranscriptsDisabled => {
            Error::NoTranscriptAvailable("transcripts are disabled for this video".to_string())
        }
        ProviderError::Transport(reason) => Error::Network(reason),
        other @ (ProviderError::Blocked(_) | ProviderError::Malformed(_) | ProviderError::Http { .. }) => {
            Error::Unclassified(other.to_string())
        }
    }
}
