//! Session identifiers for stored conversations.
//!
//! The memory store keys entries by UUID. Conversation ids from older
//! clients are not always UUIDs; those get a freshly minted UUID and keep
//! their original id in metadata so fetches can still find them.

use uuid::Uuid;

/// Session a conversation is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Key used by the store
    pub uuid: Uuid,

    /// Conversation id as the client sent it
    pub original_id: String,
}

impl Session {
    /// True when `uuid` was generated rather than taken from the client.
    pub fn is_minted(&self) -> bool {
        parse_uuid(&self.original_id) != Some(self.uuid)
    }
}

/// Parse a well-formed UUID, or nothing.
///
/// Uppercase, simple, braced and URN forms are all accepted.
pub fn parse_uuid(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}

/// The store's key for `id`: the lowercase hyphenated form of a UUID id,
/// or nothing for a legacy id.
pub fn session_key(id: &str) -> Option<String> {
    parse_uuid(id).map(|uuid| uuid.hyphenated().to_string())
}

/// Use `conversation_id` as the session key when it is a UUID, otherwise
/// mint a new one.
pub fn resolve_session_id(conversation_id: &str) -> Session {
    let uuid = parse_uuid(conversation_id).unwrap_or_else(Uuid::new_v4);

    Session {
        uuid,
        original_id: conversation_id.to_string(),
    }
}
