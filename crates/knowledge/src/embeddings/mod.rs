//! Query embedding.
//!
//! A query is turned into a fixed-length unit vector by a pluggable
//! provider. Production uses a local ONNX model loaded once per process;
//! the trigram provider works offline.

pub mod lazy;
pub mod pooling;
pub mod provider;
pub mod providers;

pub use lazy::LazyModel;
pub use provider::{create_provider, EmbeddingError, EmbeddingProvider};
pub use providers::{LocalModelProvider, TrigramProvider};
