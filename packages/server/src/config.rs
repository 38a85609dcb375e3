use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub discord_bot_token: String,
    pub discord_guild_id: i64,
    /// The bot's own user id; its messages and reactions are ignored.
    pub discord_bot_user_id: i64,
    pub allowed_channels: Vec<String>,
    pub approver_role: String,
    pub command_prefix: String,
    pub media_root: String,
    /// Public base URL under which `media_root` is served at `/media`.
    pub media_public_url: String,
    pub instagram_access_token: String,
    pub instagram_user_id: String,
    /// 6-field cron expression, evaluated in `publish_timezone`.
    pub publish_schedule: String,
    pub publish_timezone: Tz,
    pub ingress_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            discord_bot_token: env::var("DISCORD_BOT_TOKEN")
                .context("DISCORD_BOT_TOKEN must be set")?,
            discord_guild_id: env::var("DISCORD_GUILD_ID")
                .context("DISCORD_GUILD_ID must be set")?
                .parse()
                .context("DISCORD_GUILD_ID must be a numeric id")?,
            discord_bot_user_id: env::var("DISCORD_BOT_USER_ID")
                .context("DISCORD_BOT_USER_ID must be set")?
                .parse()
                .context("DISCORD_BOT_USER_ID must be a numeric id")?,
            allowed_channels: parse_list(
                &env::var("ALLOWED_CHANNELS").unwrap_or_else(|_| "social-media".to_string()),
            ),
            approver_role: env::var("APPROVER_ROLE")
                .unwrap_or_else(|_| "Social Media Approver".to_string()),
            command_prefix: env::var("COMMAND_PREFIX").unwrap_or_else(|_| "/".to_string()),
            media_root: env::var("MEDIA_ROOT").unwrap_or_else(|_| "./attachments".to_string()),
            media_public_url: env::var("MEDIA_PUBLIC_URL")
                .context("MEDIA_PUBLIC_URL must be set")?,
            instagram_access_token: env::var("INSTAGRAM_ACCESS_TOKEN")
                .context("INSTAGRAM_ACCESS_TOKEN must be set")?,
            instagram_user_id: env::var("INSTAGRAM_USER_ID")
                .context("INSTAGRAM_USER_ID must be set")?,
            publish_schedule: env::var("PUBLISH_SCHEDULE")
                .unwrap_or_else(|_| "0 0 8 * * *".to_string()),
            publish_timezone: parse_timezone(
                &env::var("PUBLISH_TIMEZONE").unwrap_or_else(|_| "America/New_York".to_string()),
            )?,
            ingress_token: env::var("INGRESS_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }
}

/// Split a comma separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_timezone(raw: &str) -> Result<Tz> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow!("PUBLISH_TIMEZONE must be an IANA zone name: {}", e))
}
