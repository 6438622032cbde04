//! Core data types for retrieval.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Embedding of a single user query. Ephemeral, owned by one request.
pub type QueryVector = Vec<f32>;

/// A passage returned by the vector store, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Passage text
    pub text: String,

    /// Arbitrary metadata; `title`, `source` and `name` are used for labels
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Similarity reported by the store, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl RetrievedDocument {
    /// Create a document with no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Map::new(),
            score: None,
        }
    }

    /// Set a metadata field.
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Set the similarity score.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// A metadata field as a non-blank string.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

/// A hit as the vector store sends it.
///
/// Passage text arrives in `document` or `text` depending on how it was
/// ingested; scores arrive as `score` or `similarity`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorHit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    #[serde(default, alias = "similarity", skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl VectorHit {
    /// Normalize into a document: `document` if non-empty, else `text`, else empty.
    pub fn into_document(self) -> RetrievedDocument {
        let text = self
            .document
            .filter(|d| !d.is_empty())
            .or(self.text)
            .unwrap_or_default();

        RetrievedDocument {
            text,
            metadata: self.metadata.unwrap_or_default(),
            score: self.score,
        }
    }
}

/// Parameters of one similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Maximum number of hits
    pub top_k: usize,

    /// Minimum similarity
    pub threshold: f32,

    /// Namespace to search
    pub namespace: String,

    /// Optional metadata equality filter
    pub metadata_filter: Option<Map<String, Value>>,
}

impl SearchParams {
    pub fn new(top_k: usize, threshold: f32, namespace: impl Into<String>) -> Self {
        Self {
            top_k,
            threshold,
            namespace: namespace.into(),
            metadata_filter: None,
        }
    }

    /// Restrict hits to those stored with the given similarity metric.
    pub fn with_similarity_metric(mut self, metric: Option<&str>) -> Self {
        self.metadata_filter = metric.map(|m| {
            let mut filter = Map::new();
            filter.insert("similarity_metric".to_string(), Value::String(m.to_string()));
            filter
        });
        self
    }
}
