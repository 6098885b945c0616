//! Timed-text caption payload parsing.
//!
//! YouTube serves caption tracks as XML of the form:
//! ```xml
//! <?xml version="1.0" encoding="utf-8" ?>
//! <transcript>
//!   <text start="0.5" dur="2.1">Hello &amp;amp; welcome</text>
//!   <text start="2.6" dur="1.8">to the &lt;i&gt;show&lt;/i&gt;</text>
//! </transcript>
//! ```
//! Text content is HTML inside XML, so it is unescaped twice and inline
//! formatting tags are stripped.

use regex::Regex;
use std::sync::OnceLock;

use super::ProviderError;
use crate::transcript::TranscriptSegment;

/// Parse a timed-text document into segments, preserving document order
pub fn parse_timedtext(xml: &str) -> Result<Vec<TranscriptSegment>, ProviderError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| ProviderError::Malformed(format!("caption XML parse error: {}", e)))?;

    let root = doc.root_element();
    if root.tag_name().name() != "transcript" {
        return Err(ProviderError::Malformed(format!(
            "caption root element must be <transcript>, found <{}>",
            root.tag_name().name()
        )));
    }

    let segments = root
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "text")
        .filter_map(|node| {
            let text = clean_text(node.text()?);
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                start: parse_seconds(node.attribute("start")),
                duration: parse_seconds(node.attribute("dur")),
                text,
            })
        })
        .collect();

    Ok(segments)
}

fn parse_seconds(value: Option<&str>) -> f64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0.0)
}

fn clean_text(raw: &str) -> String {
    let unescaped = unescape_html(raw);
    markup_regex().replace_all(&unescaped, "").trim().to_string()
}

fn markup_regex() -> &'static Regex {
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    MARKUP.get_or_init(|| Regex::new(r"(?i)</?[a-z][^>]*>").expect("static regex is valid"))
}

fn entity_regex() -> &'static Regex {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    ENTITY.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("static regex is valid")
    })
}

/// Decode the HTML entities that show up in caption text
fn unescape_html(text: &str) -> String {
    entity_regex()
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };

            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
