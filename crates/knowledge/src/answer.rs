//! Answer packaging and the consumer-side parser.
//!
//! An answer with sources travels as plain text:
//! `text + "\n\n___SOURCES___\n" + JSON array of labels`.

use crate::sources::dedupe_capped;
use serde::{Deserialize, Serialize};

/// Delimiter between the answer text and its sources.
pub const SOURCES_DELIMITER: &str = "___SOURCES___";

const TRAILER_PREFIX: &str = "\n\n___SOURCES___\n";

/// An answer and the labels of the passages it was grounded on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

impl Answer {
    pub fn new(text: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }

    /// Serialize to the wire format.
    pub fn package(&self) -> String {
        package(&self.text, &self.sources)
    }
}

/// Append the sources trailer to `text`. Empty sources leave `text` as is.
pub fn package(text: &str, sources: &[String]) -> String {
    let sources = dedupe_capped(sources.iter().cloned());
    if sources.is_empty() {
        return text.to_string();
    }

    let json = serde_json::Value::from(sources).to_string();
    format!("{}{}{}", text, TRAILER_PREFIX, json)
}

/// Split a packaged answer back into text and sources.
///
/// Never fails: a missing delimiter or a trailer that is not a JSON array
/// of strings yields the whole input as text with no sources.
pub fn parse_packaged(raw: &str) -> Answer {
    let Some(pos) = raw.rfind(SOURCES_DELIMITER) else {
        return Answer::new(raw, Vec::new());
    };

    let trailer = &raw[pos + SOURCES_DELIMITER.len()..];
    match serde_json::from_str::<Vec<String>>(trailer.trim()) {
        Ok(sources) => {
            let head = &raw[..pos];
            let text = head.strip_suffix("\n\n").unwrap_or(head.trim_end());
            Answer::new(text, sources)
        }
        Err(e) => {
            tracing::debug!("Ignoring malformed sources trailer: {}", e);
            Answer::new(raw, Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_package_format() {
        let packaged = package("Rest in awareness.", &labels(&["Teaching A", "Source 2"]));
        assert_eq!(
            packaged,
            "Rest in awareness.\n\n___SOURCES___\n[\"Teaching A\",\"Source 2\"]"
        );
    }

    #[test]
    fn test_empty_sources_is_identity() {
        assert_eq!(package("Just text.", &[]), "Just text.");
    }

    #[test]
    fn test_round_trip() {
        let text = "Line one.\n\nLine two with \"quotes\" and a trailing newline\n";
        let sources = labels(&["Teaching A", "Ünïcode label...", "Source 3"]);

        let parsed = parse_packaged(&package(text, &sources));
        assert_eq!(parsed.text, text);
        assert_eq!(parsed.sources, sources);
    }

    #[test]
    fn test_package_dedupes_and_caps() {
        let sources = labels(&["a", "b", "a", "c", "d", "e", "f"]);
        let parsed = parse_packaged(&package("t", &sources));
        assert_eq!(parsed.sources, labels(&["a", "b", "c", "d", "e"]));
    }

    #[test]
    fn test_parse_without_delimiter() {
        let parsed = parse_packaged("No sources here.");
        assert_eq!(parsed, Answer::new("No sources here.", Vec::new()));
    }

    #[test]
    fn test_parse_malformed_trailer_degrades() {
        let raw = "Answer\n\n___SOURCES___\n[\"unterminated";
        let parsed = parse_packaged(raw);
        assert_eq!(parsed.text, raw);
        assert!(parsed.sources.is_empty());

        let raw = "Answer\n\n___SOURCES___\n{\"not\": \"an array\"}";
        assert_eq!(parse_packaged(raw).text, raw);
    }

    #[test]
    fn test_answer_package_method() {
        let answer = Answer::new("text", labels(&["S"]));
        assert_eq!(parse_packaged(&answer.package()), answer);
    }
}
