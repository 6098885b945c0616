//! Artifact naming and display helpers.

use std::fmt;

/// Maximum slug length in characters
pub const MAX_SLUG_LEN: usize = 100;

/// Used when neither the title nor the fallback yield any usable characters
const DEFAULT_SLUG: &str = "transcript";

/// Filesystem-safe token derived from a video title.
///
/// Always non-empty, matches `[A-Za-z0-9_]+`, at most [`MAX_SLUG_LEN`]
/// characters, with no leading, trailing or doubled underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Convert a title into a [`Slug`], never failing.
///
/// Only ASCII letters and digits survive; every run of anything else (spaces,
/// punctuation, hyphens, non-ASCII letters) becomes one underscore. Case is
/// preserved. When nothing survives, `fallback` goes through the same rule,
/// and if that is empty too a fixed token is used.
pub fn slugify(title: &str, fallback: &str) -> Slug {
    let slug = sanitize(title);
    if !slug.is_empty() {
        return Slug(slug);
    }

    let slug = sanitize(fallback);
    if !slug.is_empty() {
        return Slug(slug);
    }

    Slug(DEFAULT_SLUG.to_string())
}

fn sanitize(text: &str) -> String {
    let mut slug = String::with_capacity(text.len().min(MAX_SLUG_LEN));
    let mut pending_separator = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            // Leading separators are dropped by only emitting once content exists
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }

        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
