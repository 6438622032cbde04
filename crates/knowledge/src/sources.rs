//! Human-readable source labels for retrieved passages.

use crate::types::RetrievedDocument;

/// Most labels attached to one answer.
pub const MAX_SOURCES: usize = 5;

/// Shortest line accepted as a body-derived label (exclusive).
const MIN_LABEL_LINE_CHARS: usize = 15;

/// Longest body-derived label before it is truncated.
const MAX_LABEL_CHARS: usize = 50;

const METADATA_LABEL_KEYS: [&str; 3] = ["title", "source", "name"];

/// Derive a label for `doc`, the `index`-th passage in ranked order.
///
/// Metadata `title`, `source` or `name` wins. Otherwise the first
/// meaningful line of the text is used, and failing that the position.
pub fn label_for(doc: &RetrievedDocument, index: usize) -> String {
    if let Some(label) = METADATA_LABEL_KEYS
        .iter()
        .find_map(|key| doc.metadata_str(key))
    {
        return label.to_string();
    }

    doc.text
        .lines()
        .map(str::trim)
        .find(|line| is_meaningful_line(line))
        .map(truncate_label)
        .unwrap_or_else(|| format!("Source {}", index + 1))
}

fn is_meaningful_line(line: &str) -> bool {
    line.chars().count() > MIN_LABEL_LINE_CHARS && line != "---" && !line.starts_with("http")
}

fn truncate_label(line: &str) -> String {
    if line.chars().count() > MAX_LABEL_CHARS {
        let head: String = line.chars().take(MAX_LABEL_CHARS).collect();
        format!("{}...", head)
    } else {
        line.to_string()
    }
}

/// Labels for the top passages: first five documents, deduplicated in
/// first-seen order, at most five entries.
pub fn extract_sources(docs: &[RetrievedDocument]) -> Vec<String> {
    let labels = docs
        .iter()
        .take(MAX_SOURCES)
        .enumerate()
        .map(|(idx, doc)| label_for(doc, idx));

    dedupe_capped(labels)
}

/// Drop repeated labels keeping the first occurrence, then cap.
pub(crate) fn dedupe_capped(labels: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for label in labels {
        if !unique.contains(&label) {
            unique.push(label);
        }
    }
    unique.truncate(MAX_SOURCES);
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_title_wins() {
        let doc = RetrievedDocument::new("A long enough body line that could be a label")
            .with_metadata("title", "Teaching A");
        assert_eq!(label_for(&doc, 0), "Teaching A");
    }

    #[test]
    fn test_metadata_priority_order() {
        let doc = RetrievedDocument::new("body")
            .with_metadata("name", "by name")
            .with_metadata("source", "by source");
        assert_eq!(label_for(&doc, 0), "by source");

        let doc = RetrievedDocument::new("body")
            .with_metadata("title", "")
            .with_metadata("name", "by name");
        assert_eq!(label_for(&doc, 0), "by name");
    }

    #[test]
    fn test_first_meaningful_line() {
        let doc = RetrievedDocument::new(
            "---\nshort\nThis is a sufficiently long meaningful line of text",
        );
        assert_eq!(
            label_for(&doc, 0),
            "This is a sufficiently long meaningful line of tex..."
        );

        let doc = RetrievedDocument::new("---\nshort\n   The heart sutra, verse one   \n");
        assert_eq!(label_for(&doc, 0), "The heart sutra, verse one");
    }

    #[test]
    fn test_urls_and_separators_skipped() {
        let doc = RetrievedDocument::new("https://example.com/very/long/link\n---\nok");
        assert_eq!(label_for(&doc, 2), "Source 3");
    }

    #[test]
    fn test_truncation_counts_chars() {
        let line = "é".repeat(60);
        let doc = RetrievedDocument::new(line);
        let label = label_for(&doc, 0);
        assert_eq!(label.chars().count(), 53);
        assert!(label.ends_with("..."));
    }

    #[test]
    fn test_exactly_fifteen_chars_is_too_short() {
        let doc = RetrievedDocument::new("fifteen chars!!");
        assert_eq!(label_for(&doc, 0), "Source 1");
    }

    #[test]
    fn test_duplicate_labels_collapse() {
        let docs = vec![
            RetrievedDocument::new("a").with_metadata("title", "Same"),
            RetrievedDocument::new("b").with_metadata("title", "Other"),
            RetrievedDocument::new("c").with_metadata("title", "Same"),
        ];
        assert_eq!(extract_sources(&docs), vec!["Same", "Other"]);
    }

    #[test]
    fn test_cap_at_five() {
        let docs: Vec<RetrievedDocument> = (0..8)
            .map(|i| RetrievedDocument::new("x").with_metadata("title", format!("T{}", i)))
            .collect();
        let sources = extract_sources(&docs);
        assert_eq!(sources, vec!["T0", "T1", "T2", "T3", "T4"]);
    }
}
