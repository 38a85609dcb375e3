use serde::{Deserialize, Serialize};

use crate::error::{DiscordError, Result};

/// Parse a Discord snowflake (transmitted as a decimal string) into an `i64`.
pub fn parse_snowflake(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| DiscordError::InvalidSnowflake(raw.to_string()))
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateMessage<'a> {
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct StartThread<'a> {
    pub name: &'a str,
    /// Minutes of inactivity before the thread is archived.
    pub auto_archive_duration: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl GuildMember {
    /// Guild nickname, falling back to the global display name.
    pub fn display_name(&self) -> Option<&str> {
        self.nick
            .as_deref()
            .or_else(|| self.user.as_ref().map(User::display_name))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}
