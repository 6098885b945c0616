use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod timedtext;
pub mod youtube;

pub use youtube::YoutubeProvider;

use crate::transcript::TranscriptSegment;
use crate::video::VideoId;

/// One caption track offered by the provider for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Language tag exactly as the provider reports it (`en`, `pt-BR`, ...)
    pub language_code: String,

    /// Display name of the language
    pub language_name: String,

    /// Whether the track was produced by automatic speech recognition
    pub is_generated: bool,

    /// Where the track's timed text can be downloaded from
    pub base_url: String,
}

/// Available tracks for one video, in provider order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackListing {
    /// Display title of the video
    pub video_title: String,

    pub tracks: Vec<CaptionTrack>,
}

/// Failures reported by a caption provider
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Private, deleted, region-blocked or otherwise unplayable
    #[error("video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("transcripts are disabled for this video")]
    TranscriptsDisabled,

    /// Connection reset/refused, timeout or a 5xx response
    #[error("transport failure: {0}")]
    Transport(String),

    /// The provider refused to serve us (bot check, rate limiting)
    #[error("request blocked by provider: {0}")]
    Blocked(String),

    /// The provider answered with something we could not interpret
    #[error("unexpected provider response: {0}")]
    Malformed(String),

    /// Non-success HTTP status that is not transient
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },
}

impl ProviderError {
    /// Only transport failures are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transport(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            let url = e.url().map(|u| u.to_string()).unwrap_or_default();
            return status_error(status, url);
        }

        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            ProviderError::Transport(e.to_string())
        } else {
            ProviderError::Malformed(e.to_string())
        }
    }
}

/// Classify a non-success HTTP status
pub(crate) fn status_error(status: reqwest::StatusCode, url: String) -> ProviderError {
    if status.is_server_error() {
        ProviderError::Transport(format!("HTTP {} from {}", status.as_u16(), url))
    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        ProviderError::Blocked(format!("too many requests (HTTP 429) from {}", url))
    } else {
        ProviderError::Http {
            status: status.as_u16(),
            url,
        }
    }
}

/// Remote captioning service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// List the caption tracks available for a video, along with its title
    async fn list_tracks(&self, id: &VideoId) -> Result<TrackListing, ProviderError>;

    /// Download one track's segments in chronological order
    async fn download(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSegment>, ProviderError>;

    /// Get the name of this provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_only_transport_is_transient() {
        assert!(ProviderError::Transport("reset".into()).is_transient());
        assert!(!ProviderError::VideoUnavailable("private".into()).is_transient());
        assert!(!ProviderError::TranscriptsDisabled.is_transient());
        assert!(!ProviderError::Blocked("bot".into()).is_transient());
        assert!(!ProviderError::Malformed("json".into()).is_transient());
        assert!(!ProviderError::Http { status: 404, url: String::new() }.is_transient());
    }

    #[test]
    fn test_status_classification() {
        let url = "https://www.youtube.com".to_string();
        assert!(status_error(StatusCode::BAD_GATEWAY, url.clone()).is_transient());
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, url.clone()).is_transient());
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, url.clone()),
            ProviderError::Blocked(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, url),
            ProviderError::Http { status: 404, .. }
        ));
    }
}
