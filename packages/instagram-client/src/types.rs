use serde::{Deserialize, Serialize};

/// The business/creator account a session publishes to.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IdResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatusResponse {
    #[serde(default)]
    pub status_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PermalinkResponse {
    #[serde(default)]
    pub permalink: Option<String>,
}

/// Kind of media a container wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// One item of a carousel, addressed by a publicly reachable URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselItem {
    pub kind: MediaKind,
    pub url: String,
}

impl CarouselItem {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            url: url.into(),
        }
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            url: url.into(),
        }
    }
}

/// Container processing state reported by `status_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    Finished,
    InProgress,
    Failed(String),
}

impl ContainerStatus {
    pub(crate) fn from_code(code: Option<&str>) -> Self {
        match code {
            // Image containers frequently omit the status entirely.
            None | Some("FINISHED") | Some("PUBLISHED") => Self::Finished,
            Some("IN_PROGRESS") => Self::InProgress,
            Some(other) => Self::Failed(other.to_string()),
        }
    }
}
