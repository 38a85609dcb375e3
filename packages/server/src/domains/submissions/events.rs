//! Inbound chat events, as relayed from the platform gateway.
//!
//! Platform ids are 64-bit snowflakes; they are accepted either as JSON
//! numbers or as decimal strings.

use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    MessageCreated(MessageCreated),
    ReactionAdded(ReactionEvent),
    ReactionRemoved(ReactionEvent),
    MessageDeleted(MessageDeleted),
}

impl ChatEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::MessageCreated(_) => "message_created",
            ChatEvent::ReactionAdded(_) => "reaction_added",
            ChatEvent::ReactionRemoved(_) => "reaction_removed",
            ChatEvent::MessageDeleted(_) => "message_deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCreated {
    #[serde(deserialize_with = "snowflake")]
    pub message_id: i64,
    #[serde(deserialize_with = "snowflake")]
    pub channel_id: i64,
    pub channel_name: String,
    #[serde(deserialize_with = "snowflake")]
    pub author_id: i64,
    pub author_display_name: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub attachments: Vec<IncomingMedia>,
}

/// One media item of a creation event, in upload order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMedia {
    #[serde(deserialize_with = "snowflake")]
    pub attachment_id: i64,
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Where the bytes can be downloaded from.
    pub url: String,
}

impl IncomingMedia {
    /// Declared content type, or one guessed from the file name.
    pub fn resolved_content_type(&self) -> String {
        self.content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_string())
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&self.filename)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEvent {
    /// The message that was reacted to.
    #[serde(deserialize_with = "snowflake")]
    pub message_id: i64,
    #[serde(deserialize_with = "snowflake")]
    pub user_id: i64,
    pub emoji: String,
    #[serde(default)]
    pub user_display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDeleted {
    #[serde(deserialize_with = "snowflake")]
    pub message_id: i64,
}

pub(crate) fn snowflake<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(de::Error::custom),
    }
}
