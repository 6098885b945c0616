//! Transcript Extractor - pull YouTube caption tracks into plain-text files
//!
//! This library resolves a video reference (URL or bare id) to a canonical
//! identifier, fetches a caption track from the provider with language
//! selection and transient-failure retries, and writes the flattened text under
//! a filesystem-safe name derived from the video title.

pub mod cli;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod provider;
pub mod server;
pub mod transcript;
pub mod utils;
pub mod video;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use output::ArtifactWriter;
pub use pipeline::{Extraction, ExtractionPipeline};
pub use provider::{CaptionProvider, CaptionTrack, ProviderError, TrackListing};
pub use transcript::{TranscriptFetcher, TranscriptResult, TranscriptSegment};
pub use utils::{slugify, Slug};
pub use video::{resolve, LanguagePreference, VideoId};

use std::path::PathBuf;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Classified failure kinds surfaced to the CLI and web front end
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid video reference: {0}")]
    InvalidReference(String),

    #[error("No transcript available: {0}")]
    NoTranscriptAvailable(String),

    #[error("No transcript available in language '{requested}'")]
    LanguageUnavailable { requested: String },

    #[error("Video unavailable: {0}")]
    VideoUnavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to write transcript to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected error: {0}")]
    Unclassified(String),
}

impl Error {
    /// Process exit code for this failure kind
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Unclassified(_) | Error::Write { .. } => 1,
            Error::InvalidReference(_) => 2,
            Error::NoTranscriptAvailable(_) => 3,
            Error::LanguageUnavailable { .. } => 4,
            Error::VideoUnavailable(_) => 5,
            Error::Network(_) => 6,
        }
    }

    /// Short, stable name of the failure kind (used in JSON responses)
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidReference(_) => "invalid_reference",
            Error::NoTranscriptAvailable(_) => "no_transcript_available",
            Error::LanguageUnavailable { .. } => "language_unavailable",
            Error::VideoUnavailable(_) => "video_unavailable",
            Error::Network(_) => "network_error",
            Error::Write { .. } => "write_error",
            Error::Unclassified(_) => "unclassified",
        }
    }

    /// Fixed human-readable message for this failure kind.
    ///
    /// Unclassified failures omit their detail, which is only logged.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidReference(_) => "Invalid YouTube URL or video id. Expected formats: \
                youtube.com/watch?v=VIDEO_ID, youtu.be/VIDEO_ID, youtube.com/embed/VIDEO_ID or VIDEO_ID"
                .to_string(),
            Error::NoTranscriptAvailable(_) => "No transcript is available for this video".to_string(),
            Error::LanguageUnavailable { requested } => {
                format!("No transcript available in language '{}'", requested)
            }
            Error::VideoUnavailable(_) => "Video is private, deleted, or geo-blocked".to_string(),
            Error::Network(_) => "Network error while contacting YouTube, please try again later".to_string(),
            Error::Write { path, .. } => format!("Failed to write transcript to {}", path.display()),
            Error::Unclassified(_) => "An unexpected error occurred".to_string(),
        }
    }
}
