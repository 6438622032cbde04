//! Grounded answering over a remote knowledge base.
//!
//! Embeds the user's question locally, searches the vector store, and asks
//! the completion model to answer only from what was found. Answers carry
//! a machine-readable trailer naming their sources.

pub mod answer;
pub mod embeddings;
pub mod pipeline;
pub mod retriever;
pub mod sources;
pub mod types;

#[cfg(test)]
mod tests;

pub use answer::{package, parse_packaged, Answer, SOURCES_DELIMITER};
pub use embeddings::{create_provider, EmbeddingError, EmbeddingProvider};
pub use pipeline::{
    ChatTurn, RagError, RagOutcome, RagPipeline, RagSettings, KNOWLEDGE_UNAVAILABLE_MESSAGE,
    NO_CONTEXT_APOLOGY,
};
pub use retriever::{HttpVectorStore, RetrievalError, Retriever, SearchRequest, VectorStore};
pub use sources::{extract_sources, label_for, MAX_SOURCES};
pub use types::{QueryVector, RetrievedDocument, SearchParams, VectorHit};
