pub mod local;
pub mod trigram;

pub use local::LocalModelProvider;
pub use trigram::TrigramProvider;
