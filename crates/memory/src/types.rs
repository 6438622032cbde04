//! Wire types for stored conversations.

use crate::session::session_key;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A chat message as the client sends and receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub role: String,

    #[serde(default)]
    pub content: String,
}

impl ConversationMessage {
    pub fn new(id: Option<String>, role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Metadata attached to each stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    pub message_id: Option<String>,
    pub original_conversation_id: String,
    /// RFC 3339
    pub timestamp: String,
}

/// Body of one memory write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub session_id: Uuid,
    pub agent_id: String,
    pub role: String,
    pub content: String,
    pub metadata: MemoryMetadata,
}

/// Filter for listing memories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub agent_id: String,
}

/// A memory as the store returns it. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    #[serde(default)]
    pub memory_id: Option<String>,

    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub memory_metadata: Option<Map<String, Value>>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl MemoryEntry {
    /// A metadata field as a non-empty string.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.memory_metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Whether this entry belongs to `conversation_id`, by session key or
    /// by the original id recorded at store time.
    ///
    /// A UUID id matches its canonical session key in whatever form the
    /// client spelled it.
    pub fn belongs_to(&self, conversation_id: &str) -> bool {
        let session_id = self.session_id.as_deref();
        let key = session_key(conversation_id);

        session_id == Some(conversation_id)
            || (key.is_some() && session_id == key.as_deref())
            || self.metadata_str("original_conversation_id") == Some(conversation_id)
    }
}

/// Result of storing a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAck {
    pub success: bool,
    pub count: usize,
    pub session_uuid: Uuid,
}
