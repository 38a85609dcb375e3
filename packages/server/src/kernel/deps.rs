//! Server dependencies (using traits for testability)
//!
//! This module provides the central dependency container used by the
//! submission and publishing domains. All external services sit behind trait
//! abstractions so tests can swap in the doubles from `test_dependencies`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use discord::{parse_snowflake, DiscordClient};
use std::sync::Arc;

use crate::config::Config;
use crate::domains::notifications::Notifier;
use crate::kernel::{BaseChatPlatform, BaseMediaStore, BasePublisher, BaseSubmissionRepository};

// =============================================================================
// DiscordClient Adapter (implements BaseChatPlatform trait)
// =============================================================================

/// Wrapper around DiscordClient scoped to one guild.
pub struct DiscordAdapter {
    client: Arc<DiscordClient>,
    guild_id: i64,
}

impl DiscordAdapter {
    pub fn new(client: Arc<DiscordClient>, guild_id: i64) -> Self {
        Self { client, guild_id }
    }
}

#[async_trait]
impl BaseChatPlatform for DiscordAdapter {
    async fn send_message(&self, channel_id: i64, text: &str) -> Result<i64> {
        let message = self.client.create_message(channel_id, text).await?;
        Ok(parse_snowflake(&message.id)?)
    }

    async fn create_thread(&self, channel_id: i64, message_id: i64, name: &str) -> Result<i64> {
        let thread = self
            .client
            .start_thread_from_message(channel_id, message_id, name)
            .await?;
        Ok(parse_snowflake(&thread.id)?)
    }

    async fn add_reaction(&self, channel_id: i64, message_id: i64, emoji: &str) -> Result<()> {
        self.client
            .create_reaction(channel_id, message_id, emoji)
            .await
            .map_err(Into::into)
    }

    async fn member_role_names(&self, user_id: i64) -> Result<Vec<String>> {
        let member = self
            .client
            .get_guild_member(self.guild_id, user_id)
            .await
            .context("Failed to fetch guild member")?;
        let roles = self
            .client
            .get_guild_roles(self.guild_id)
            .await
            .context("Failed to fetch guild roles")?;

        Ok(roles
            .into_iter()
            .filter(|role| member.roles.contains(&role.id))
            .map(|role| role.name)
            .collect())
    }

    async fn display_name(&self, user_id: i64) -> Result<String> {
        match self.client.get_guild_member(self.guild_id, user_id).await {
            Ok(member) => {
                if let Some(name) = member.display_name() {
                    return Ok(name.to_string());
                }
            }
            Err(e) => {
                tracing::debug!(
                    user_id,
                    error = %e,
                    "Guild member lookup failed, trying user lookup"
                );
            }
        }
        let user = self.client.get_user(user_id).await?;
        Ok(user.display_name().to_string())
    }

    async fn download_attachment(&self, url: &str) -> Result<Bytes> {
        self.client.download(url).await.map_err(Into::into)
    }
}

// =============================================================================
// Bot settings
// =============================================================================

/// Identity and policy knobs the intake guards and role checks need.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// The bot's own user id; events it authored are ignored.
    pub bot_user_id: i64,
    pub allowed_channels: Vec<String>,
    pub approver_role: String,
    pub command_prefix: String,
}

impl BotSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bot_user_id: config.discord_bot_user_id,
            allowed_channels: config.allowed_channels.clone(),
            approver_role: config.approver_role.clone(),
            command_prefix: config.command_prefix.clone(),
        }
    }

    pub fn is_allowed_channel(&self, channel_name: &str) -> bool {
        self.allowed_channels.iter().any(|c| c == channel_name)
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to domain activities (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub repository: Arc<dyn BaseSubmissionRepository>,
    pub media_store: Arc<dyn BaseMediaStore>,
    pub chat: Arc<dyn BaseChatPlatform>,
    pub publisher: Arc<dyn BasePublisher>,
    pub settings: BotSettings,
}

impl ServerDeps {
    pub fn new(
        repository: Arc<dyn BaseSubmissionRepository>,
        media_store: Arc<dyn BaseMediaStore>,
        chat: Arc<dyn BaseChatPlatform>,
        publisher: Arc<dyn BasePublisher>,
        settings: BotSettings,
    ) -> Self {
        Self {
            repository,
            media_store,
            chat,
            publisher,
            settings,
        }
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.chat.clone())
    }
}
