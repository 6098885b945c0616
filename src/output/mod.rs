use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::SegmentSeparator;
use crate::transcript::TranscriptSegment;
use crate::utils::Slug;
use crate::{Error, Result};

/// Suffix appended to every artifact name
const ARTIFACT_SUFFIX: &str = "_transcript";
const ARTIFACT_EXTENSION: &str = "txt";

/// Upper bound on numbered candidates tried for one slug
const MAX_COLLISION_SUFFIX: u32 = 10_000;

/// Render segments as the artifact's text body
pub fn render_text(segments: &[TranscriptSegment], separator: SegmentSeparator) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(separator.as_str())
}

/// File name for the `n`th candidate (0 = unnumbered)
pub fn artifact_file_name(slug: &Slug, n: u32) -> String {
    if n == 0 {
        format!("{}{}.{}", slug, ARTIFACT_SUFFIX, ARTIFACT_EXTENSION)
    } else {
        format!("{}{}_{}.{}", slug, ARTIFACT_SUFFIX, n, ARTIFACT_EXTENSION)
    }
}

/// Persists transcripts as `{slug}_transcript.txt` without ever overwriting
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    separator: SegmentSeparator,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>, separator: SegmentSeparator) -> Self {
        Self {
            output_dir: output_dir.into(),
            separator,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the transcript and return the path it was published under.
    ///
    /// The text goes to a temporary file in the output directory first and is
    /// then linked into place with a no-clobber primitive, so a reader never
    /// sees a partial file and two concurrent writers never share a name.
    pub fn write(&self, slug: &Slug, segments: &[TranscriptSegment]) -> Result<PathBuf> {
        let text = render_text(segments, self.separator);

        fs_err::create_dir_all(&self.output_dir).map_err(|source| self.write_error(source))?;

        let mut temp = NamedTempFile::new_in(&self.output_dir).map_err(|source| self.write_error(source))?;
        temp.write_all(text.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|source| self.write_error(source))?;

        for n in 0..MAX_COLLISION_SUFFIX {
            let path = self.output_dir.join(artifact_file_name(slug, n));

            match temp.persist_noclobber(&path) {
                Ok(_) => {
                    tracing::info!(path = %path.display(), bytes = text.len(), "Transcript written");
                    return Ok(path);
                }
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %path.display(), "Artifact name taken, trying next");
                    temp = e.file;
                }
                Err(e) => {
                    return Err(Error::Write {
                        path,
                        source: e.error,
                    });
                }
            }
        }

        Err(Error::Write {
            path: self.output_dir.join(artifact_file_name(slug, 0)),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("no free file name after {} attempts", MAX_COLLISION_SUFFIX),
            ),
        })
    }

    fn write_error(&self, source: io::Error) -> Error {
        Error::Write {
            path: self.output_dir.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::slugify;

    fn segments(texts: &[&str]) -> Vec<TranscriptSegment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| TranscriptSegment {
                start: i as f64,
                duration: 1.0,
                text: text.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_writes_segments_joined_by_newline() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path(), SegmentSeparator::Newline);
        let slug = slugify("Title Text", "id");

        let path = writer.write(&slug, &segments(&["first", "second", "third"])).unwrap();

        assert_eq!(path.file_name().unwrap(), "Title_Text_transcript.txt");
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "first\nsecond\nthird");
    }

    #[test]
    fn test_space_separator() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path(), SegmentSeparator::Space);
        let path = writer.write(&slugify("x", "id"), &segments(&["a", "b"])).unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "a b");
    }

    #[test]
    fn test_collision_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path(), SegmentSeparator::Newline);
        let slug = slugify("Same Title", "id");

        let first = writer.write(&slug, &segments(&["one"])).unwrap();
        let second = writer.write(&slug, &segments(&["two"])).unwrap();
        let third = writer.write(&slug, &segments(&["three"])).unwrap();

        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), "Same_Title_transcript_1.txt");
        assert_eq!(third.file_name().unwrap(), "Same_Title_transcript_2.txt");
        assert_eq!(fs_err::read_to_string(&first).unwrap(), "one");
        assert_eq!(fs_err::read_to_string(&second).unwrap(), "two");
    }

    #[test]
    fn test_no_temporary_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path(), SegmentSeparator::Newline);
        let slug = slugify("Tidy", "id");
        writer.write(&slug, &segments(&["a"])).unwrap();
        writer.write(&slug, &segments(&["b"])).unwrap();

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 2);
    }

    #[test]
    fn test_creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let writer = ArtifactWriter::new(&nested, SegmentSeparator::Newline);
        let path = writer.write(&slugify("x", "id"), &segments(&["a"])).unwrap();
        assert!(path.starts_with(&nested));
    }

    #[test]
    fn test_unwritable_destination_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs_err::write(&blocker, "file").unwrap();

        let writer = ArtifactWriter::new(&blocker, SegmentSeparator::Newline);
        let err = writer.write(&slugify("x", "id"), &segments(&["a"])).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_concurrent_writers_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path(), SegmentSeparator::Newline);
        let slug = slugify("Race", "id");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let writer = writer.clone();
                let slug = slug.clone();
                std::thread::spawn(move || writer.write(&slug, &segments(&[i.to_string().as_str()])).unwrap())
            })
            .collect();

        let mut paths: Vec<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);
    }
}
