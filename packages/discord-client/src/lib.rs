//! Minimal Discord REST API client.
//!
//! Covers only what the submission bot needs: posting messages, opening a
//! thread on a message, adding reactions, looking up guild members and roles,
//! and downloading attachment bytes from the CDN.
//!
//! # Example
//!
//! ```rust,ignore
//! use discord_client::DiscordClient;
//!
//! let client = DiscordClient::new("bot-token".into());
//! let message = client.create_message(1234, "Hello!").await?;
//! client.create_reaction(1234, message.id.parse()?, "\u{2705}").await?;
//! ```

pub mod error;
pub mod types;

pub use error::{DiscordError, Result};
pub use types::{parse_snowflake, Channel, GuildMember, Message, Role, User};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use types::{CreateMessage, StartThread};

const BASE_URL: &str = "https://discord.com/api/v10";

/// Threads archive after a week of inactivity.
const THREAD_ARCHIVE_MINUTES: u32 = 10080;

pub struct DiscordClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl DiscordClient {
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, BASE_URL.to_string())
    }

    /// Point the client at a different API root (proxies, local fakes).
    pub fn with_base_url(token: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Post a plain-text message to a channel or thread.
    pub async fn create_message(&self, channel_id: i64, content: &str) -> Result<Message> {
        let url = format!("{}/channels/{}/messages", self.base_url, channel_id);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&CreateMessage { content })
            .send()
            .await?;

        Self::parse(resp).await
    }

    /// Start a thread anchored on an existing message.
    pub async fn start_thread_from_message(
        &self,
        channel_id: i64,
        message_id: i64,
        name: &str,
    ) -> Result<Channel> {
        let url = format!(
            "{}/channels/{}/messages/{}/threads",
            self.base_url, channel_id, message_id
        );
        // Thread names are capped at 100 characters.
        let name: String = name.chars().take(100).collect();
        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&StartThread {
                name: &name,
                auto_archive_duration: THREAD_ARCHIVE_MINUTES,
            })
            .send()
            .await?;

        Self::parse(resp).await
    }

    /// React to a message as the bot user.
    pub async fn create_reaction(
        &self,
        channel_id: i64,
        message_id: i64,
        emoji: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/channels/{}/messages/{}/reactions/{}/@me",
            self.base_url,
            channel_id,
            message_id,
            urlencoding::encode(emoji)
        );
        let resp = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header())
            .header("Content-Length", "0")
            .send()
            .await?;

        Self::check(resp).await.map(|_| ())
    }

    pub async fn get_guild_member(&self, guild_id: i64, user_id: i64) -> Result<GuildMember> {
        let url = format!("{}/guilds/{}/members/{}", self.base_url, guild_id, user_id);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        Self::parse(resp).await
    }

    pub async fn get_guild_roles(&self, guild_id: i64) -> Result<Vec<Role>> {
        let url = format!("{}/guilds/{}/roles", self.base_url, guild_id);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        Self::parse(resp).await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        let url = format!("{}/users/{}", self.base_url, user_id);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        Self::parse(resp).await
    }

    /// Download attachment bytes. CDN URLs are signed and need no bot token.
    pub async fn download(&self, url: &str) -> Result<Bytes> {
        let resp = self.client.get(url).send().await?;
        let resp = Self::check(resp).await?;
        tracing::debug!(url, "Downloaded attachment");
        Ok(resp.bytes().await?)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscordError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp)
    }

    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }
}
