//! Minimal Instagram Graph API publishing client.
//!
//! Publishing is a two-step protocol: create a media container pointing at a
//! publicly reachable URL, then publish the container. Carousels create one
//! child container per item and a parent container referencing them.
//!
//! # Example
//!
//! ```rust,ignore
//! use instagram_client::InstagramClient;
//!
//! let client = InstagramClient::new("access-token".into(), "17841400000000000".into());
//! let session = client.login().await?;
//! let url = session.publish_photo("https://cdn.example.org/a.jpg", "Hello").await?;
//! ```

pub mod error;
pub mod types;

pub use error::{InstagramError, Result};
pub use types::{Account, CarouselItem, ContainerStatus, MediaKind};

use std::time::Duration;

use serde::de::DeserializeOwned;
use types::{IdResponse, PermalinkResponse, StatusResponse};

const BASE_URL: &str = "https://graph.facebook.com/v19.0";

const MAX_CAROUSEL_ITEMS: usize = 10;

/// Video containers are processed asynchronously; poll this often...
const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// ...and give up after this many attempts.
const STATUS_POLL_ATTEMPTS: u32 = 60;

pub struct InstagramClient {
    client: reqwest::Client,
    access_token: String,
    user_id: String,
    base_url: String,
}

impl InstagramClient {
    pub fn new(access_token: String, user_id: String) -> Self {
        Self::with_base_url(access_token, user_id, BASE_URL.to_string())
    }

    pub fn with_base_url(access_token: String, user_id: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token,
            user_id,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Verify the access token against the configured account and open a
    /// publishing session.
    pub async fn login(&self) -> Result<InstagramSession> {
        let url = format!("{}/{}", self.base_url, self.user_id);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("fields", "id,username"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;

        let account: Account = parse(resp).await?;
        tracing::info!(
            account_id = %account.id,
            username = ?account.username,
            "Instagram session opened"
        );

        Ok(InstagramSession {
            client: self.client.clone(),
            access_token: self.access_token.clone(),
            base_url: self.base_url.clone(),
            account,
            poll_interval: STATUS_POLL_INTERVAL,
        })
    }
}

/// An authenticated publishing session bound to one account.
pub struct InstagramSession {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    account: Account,
    poll_interval: Duration,
}

impl InstagramSession {
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Publish a single image. Returns the post permalink.
    pub async fn publish_photo(&self, image_url: &str, caption: &str) -> Result<String> {
        let container = self
            .create_container(&[("image_url", image_url), ("caption", caption)])
            .await?;
        self.publish_container(&container).await
    }

    /// Publish a single video as a reel. Returns the post permalink.
    pub async fn publish_video(&self, video_url: &str, caption: &str) -> Result<String> {
        let container = self
            .create_container(&[
                ("media_type", "REELS"),
                ("video_url", video_url),
                ("caption", caption),
            ])
            .await?;
        self.publish_container(&container).await
    }

    /// Publish 2..=10 items as one carousel post. Returns the post permalink.
    pub async fn publish_carousel(&self, items: &[CarouselItem], caption: &str) -> Result<String> {
        if items.len() < 2 || items.len() > MAX_CAROUSEL_ITEMS {
            return Err(InstagramError::CarouselSize(items.len()));
        }

        let mut children = Vec::with_capacity(items.len());
        for item in items {
            let child = match item.kind {
                MediaKind::Image => {
                    self.create_container(&[
                        ("image_url", item.url.as_str()),
                        ("is_carousel_item", "true"),
                    ])
                    .await?
                }
                MediaKind::Video => {
                    self.create_container(&[
                        ("media_type", "VIDEO"),
                        ("video_url", item.url.as_str()),
                        ("is_carousel_item", "true"),
                    ])
                    .await?
                }
            };
            self.wait_until_ready(&child).await?;
            children.push(child);
        }

        let children = children.join(",");
        let container = self
            .create_container(&[
                ("media_type", "CAROUSEL"),
                ("children", children.as_str()),
                ("caption", caption),
            ])
            .await?;
        self.publish_container(&container).await
    }

    async fn create_container(&self, params: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/{}/media", self.base_url, self.account.id);
        let resp = self
            .client
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .form(params)
            .send()
            .await?;

        let created: IdResponse = parse(resp).await?;
        tracing::debug!(container_id = %created.id, "Created media container");
        Ok(created.id)
    }

    pub async fn container_status(&self, container_id: &str) -> Result<ContainerStatus> {
        let url = format!("{}/{}", self.base_url, container_id);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("fields", "status_code"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;

        let status: StatusResponse = parse(resp).await?;
        Ok(ContainerStatus::from_code(status.status_code.as_deref()))
    }

    async fn wait_until_ready(&self, container_id: &str) -> Result<()> {
        for _ in 0..STATUS_POLL_ATTEMPTS {
            match self.container_status(container_id).await? {
                ContainerStatus::Finished => return Ok(()),
                ContainerStatus::InProgress => {
                    tracing::debug!(container_id, "Container still processing");
                    tokio::time::sleep(self.poll_interval).await;
                }
                ContainerStatus::Failed(status) => {
                    return Err(InstagramError::ContainerFailed {
                        id: container_id.to_string(),
                        status,
                    });
                }
            }
        }
        Err(InstagramError::ContainerTimeout(container_id.to_string()))
    }

    async fn publish_container(&self, container_id: &str) -> Result<String> {
        self.wait_until_ready(container_id).await?;

        let url = format!("{}/{}/media_publish", self.base_url, self.account.id);
        let resp = self
            .client
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .form(&[("creation_id", container_id)])
            .send()
            .await?;
        let media: IdResponse = parse(resp).await?;

        self.permalink(&media.id).await
    }

    async fn permalink(&self, media_id: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, media_id);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("fields", "permalink"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await?;

        let link: PermalinkResponse = parse(resp).await?;
        Ok(link
            .permalink
            .unwrap_or_else(|| format!("https://www.instagram.com/p/{}/", media_id)))
    }
}

async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(InstagramError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(resp.json().await?)
}
