//! Prompt types for Sage.

use sage_llm::{ChatMessage, ChatRole};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A grounding instruction definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Handlebars template; `{{context}}` receives the sentinel-wrapped passages
    pub template: String,
}

/// A conversation message as supplied by the chat client.
///
/// Clients attach UI state (ids, processing flags, timestamps). It is
/// captured here so it can be dropped explicitly before transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub role: ChatRole,

    #[serde(default)]
    pub content: String,

    /// Any other client-side fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
            extra: Map::new(),
        }
    }

    /// Keep only role and content.
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: rag.grounded
title: Grounded guide
apiVersion: "1.0"
template: "Answer from {{context}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "rag.grounded");
        assert_eq!(def.api_version, "1.0");
        assert!(def.template.contains("{{context}}"));
    }

    #[test]
    fn test_history_message_captures_extra_fields() {
        let msg: HistoryMessage = serde_json::from_value(serde_json::json!({
            "id": "m-1",
            "role": "user",
            "content": "What is stillness?",
            "processing": true
        }))
        .unwrap();

        assert_eq!(msg.id.as_deref(), Some("m-1"));
        assert_eq!(msg.role, ChatRole::User);
        assert_eq!(msg.extra.get("processing"), Some(&Value::Bool(true)));
        assert_eq!(msg.to_chat_message(), ChatMessage::user("What is stillness?"));
    }
}
