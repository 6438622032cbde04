//! Conversation history stored in a remote memory service.
//!
//! Conversations are written message by message under a UUID session key
//! and read back in creation order.

pub mod conversation;
pub mod http;
pub mod session;
pub mod store;
pub mod types;

pub use conversation::ConversationStore;
pub use http::HttpMemoryStore;
pub use session::{parse_uuid, resolve_session_id, session_key, Session};
pub use store::{MemoryStore, StoreError};
pub use types::{ConversationMessage, MemoryEntry, MemoryQuery, MemoryRecord, StoreAck};
