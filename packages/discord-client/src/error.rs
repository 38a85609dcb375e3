use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscordError>;

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid snowflake '{0}'")]
    InvalidSnowflake(String),
}
