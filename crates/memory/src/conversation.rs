//! Conversation persistence on top of a [`MemoryStore`].
//!
//! Writes are best effort: a message that fails to store is logged and
//! skipped. Reads reconstruct turn order from creation timestamps since the
//! store returns entries unordered.

use crate::session::{resolve_session_id, session_key};
use crate::store::{MemoryStore, StoreError};
use crate::types::{
    ConversationMessage, MemoryEntry, MemoryMetadata, MemoryQuery, MemoryRecord, StoreAck,
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

/// Stores and loads conversations for one agent.
#[derive(Clone)]
pub struct ConversationStore {
    store: Arc<dyn MemoryStore>,
    agent_id: String,
}

impl ConversationStore {
    pub fn new(store: Arc<dyn MemoryStore>, agent_id: impl Into<String>) -> Self {
        Self {
            store,
            agent_id: agent_id.into(),
        }
    }

    /// Store every message of a conversation concurrently.
    ///
    /// Individual failures are logged and swallowed; the ack counts the
    /// messages submitted.
    pub async fn store(&self, conversation_id: &str, messages: &[ConversationMessage]) -> StoreAck {
        let session = resolve_session_id(conversation_id);
        tracing::info!(
            "Storing conversation '{}' ({} messages, session {})",
            conversation_id,
            messages.len(),
            session.uuid
        );
        if session.is_minted() {
            tracing::debug!(
                "Conversation id '{}' is not a UUID, kept as original_conversation_id",
                conversation_id
            );
        }

        let timestamp = Utc::now().to_rfc3339();
        let records: Vec<MemoryRecord> = messages
            .iter()
            .map(|msg| MemoryRecord {
                session_id: session.uuid,
                agent_id: self.agent_id.clone(),
                role: msg.role.clone(),
                content: msg.content.clone(),
                metadata: MemoryMetadata {
                    message_id: msg.id.clone(),
                    original_conversation_id: conversation_id.to_string(),
                    timestamp: timestamp.clone(),
                },
            })
            .collect();

        let results = join_all(records.iter().map(|record| self.store.put(record))).await;

        let failed = results
            .iter()
            .zip(&records)
            .filter_map(|(result, record)| result.as_ref().err().map(|e| (e, record)))
            .inspect(|(e, record)| {
                tracing::warn!(
                    "Failed to store message {:?} of '{}': {}",
                    record.metadata.message_id,
                    conversation_id,
                    e
                )
            })
            .count();

        if failed > 0 {
            tracing::warn!("{} of {} messages were not stored", failed, records.len());
        }

        StoreAck {
            success: true,
            count: messages.len(),
            session_uuid: session.uuid,
        }
    }

    /// Load a conversation's messages in creation order.
    ///
    /// Entries match when their session key equals `conversation_id` or
    /// when they were stored under a minted key for that original id.
    pub async fn fetch(&self, conversation_id: &str) -> Result<Vec<ConversationMessage>, StoreError> {
        let query = MemoryQuery {
            // A non-UUID id can never equal a session key, so list the agent's
            // memories and match on the recorded original id
            session_id: session_key(conversation_id),
            agent_id: self.agent_id.clone(),
        };
        if query.session_id.is_none() {
            tracing::debug!(
                "Conversation id '{}' is not a UUID, matching on original id",
                conversation_id
            );
        }

        let entries = self.store.list(&query).await?;
        let total = entries.len();

        let mut matching: Vec<MemoryEntry> = entries
            .into_iter()
            .filter(|entry| entry.belongs_to(conversation_id))
            .collect();
        matching.sort_by_key(created_at);

        tracing::info!(
            "Loaded {} messages for '{}' ({} entries scanned)",
            matching.len(),
            conversation_id,
            total
        );

        Ok(matching.into_iter().map(into_message).collect())
    }
}

/// Creation time; missing or unparseable timestamps sort first.
fn created_at(entry: &MemoryEntry) -> DateTime<Utc> {
    entry
        .created_at
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn into_message(entry: MemoryEntry) -> ConversationMessage {
    let id = entry
        .metadata_str("message_id")
        .map(str::to_string)
        .or_else(|| entry.memory_id.clone().filter(|id| !id.is_empty()))
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    ConversationMessage {
        id: Some(id),
        role: entry.role.unwrap_or_default(),
        content: entry.content.unwrap_or_default(),
    }
}
