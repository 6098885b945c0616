//! End-to-end extraction: resolve, fetch, name, write.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, SegmentSeparator};
use crate::output::{artifact_file_name, render_text, ArtifactWriter};
use crate::provider::{CaptionProvider, YoutubeProvider};
use crate::transcript::{TranscriptFetcher, TranscriptResult};
use crate::utils::{slugify, Slug};
use crate::video::{resolve, LanguagePreference, VideoId};
use crate::{Error, Result};

/// A transcript that has been fetched and named but not persisted
#[derive(Debug, Clone)]
pub struct PreparedTranscript {
    pub video_id: VideoId,
    pub slug: Slug,
    pub transcript: TranscriptResult,
}

impl PreparedTranscript {
    /// Name the artifact would get when no collision occurs
    pub fn file_name(&self) -> String {
        artifact_file_name(&self.slug, 0)
    }

    /// Artifact body
    pub fn text(&self, separator: SegmentSeparator) -> String {
        render_text(&self.transcript.segments, separator)
    }
}

/// Outcome of a successful extraction
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub video_id: VideoId,
    pub title: String,
    pub language: String,
    pub path: PathBuf,
    pub segment_count: usize,
    /// Covered media time in seconds
    pub duration: f64,
}

/// Main extraction pipeline
#[derive(Clone)]
pub struct ExtractionPipeline {
    fetcher: TranscriptFetcher,
    writer: ArtifactWriter,
    separator: SegmentSeparator,
}

impl ExtractionPipeline {
    /// Create a pipeline talking to YouTube
    pub fn new(config: &Config) -> Result<Self> {
        let provider = YoutubeProvider::new(&config.network)
            .map_err(|e| Error::Unclassified(e.to_string()))?;
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Create a pipeline with a custom caption provider
    pub fn with_provider(config: &Config, provider: Arc<dyn CaptionProvider>) -> Self {
        Self {
            fetcher: TranscriptFetcher::new(provider, config.network.retry.clone()),
            writer: ArtifactWriter::new(config.output_dir(), config.output.separator),
            separator: config.output.separator,
        }
    }

    pub fn separator(&self) -> SegmentSeparator {
        self.separator
    }

    /// Resolve the reference, fetch the transcript and derive its slug
    #[tracing::instrument(skip(self, preferred), fields(language = preferred.map(|l| l.as_str())))]
    pub async fn prepare(
        &self,
        reference: &str,
        preferred: Option<&LanguagePreference>,
    ) -> Result<PreparedTranscript> {
        let video_id = resolve(reference)?;
        tracing::info!(video_id = %video_id, "Resolved video reference");

        let transcript = self.fetcher.fetch(&video_id, preferred).await?;
        let slug = slugify(&transcript.video_title, video_id.as_str());
        tracing::debug!(slug = %slug, "Derived artifact name");

        Ok(PreparedTranscript {
            video_id,
            slug,
            transcript,
        })
    }

    /// Run the full extraction and persist the transcript
    pub async fn run(
        &self,
        reference: &str,
        preferred: Option<&LanguagePreference>,
    ) -> Result<Extraction> {
        let prepared = self.prepare(reference, preferred).await?;
        let path = self.writer.write(&prepared.slug, &prepared.transcript.segments)?;

        Ok(Extraction {
            duration: prepared.transcript.duration(),
            segment_count: prepared.transcript.segments.len(),
            video_id: prepared.video_id,
            title: prepared.transcript.video_title,
            language: prepared.transcript.language_used,
            path,
        })
    }
}
