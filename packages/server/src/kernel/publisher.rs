//! Instagram implementation of `BasePublisher`.
//!
//! The Graph API pulls media from public URLs, so storage references are
//! mapped onto `MEDIA_PUBLIC_URL` (where the server exposes the media root).

use anyhow::Result;
use async_trait::async_trait;
use instagram::{CarouselItem, InstagramClient, InstagramSession};
use std::sync::Arc;

use crate::kernel::{BasePublisher, PublishMedia, PublishSession};

pub struct InstagramPublisher {
    client: Arc<InstagramClient>,
    media_base_url: String,
}

impl InstagramPublisher {
    pub fn new(client: Arc<InstagramClient>, media_base_url: String) -> Self {
        Self {
            client,
            media_base_url: media_base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn public_url(base: &str, storage_ref: &str) -> String {
    format!("{}/{}", base, storage_ref.trim_start_matches('/'))
}

#[async_trait]
impl BasePublisher for InstagramPublisher {
    async fn login(&self) -> Result<Box<dyn PublishSession>> {
        let session = self.client.login().await?;
        Ok(Box::new(InstagramPublishSession {
            session,
            media_base_url: self.media_base_url.clone(),
        }))
    }
}

struct InstagramPublishSession {
    session: InstagramSession,
    media_base_url: String,
}

#[async_trait]
impl PublishSession for InstagramPublishSession {
    async fn publish_photo(&self, media: &PublishMedia, caption: &str) -> Result<String> {
        let url = public_url(&self.media_base_url, &media.storage_ref);
        Ok(self.session.publish_photo(&url, caption).await?)
    }

    async fn publish_video(&self, media: &PublishMedia, caption: &str) -> Result<String> {
        let url = public_url(&self.media_base_url, &media.storage_ref);
        Ok(self.session.publish_video(&url, caption).await?)
    }

    async fn publish_album(&self, media: &[PublishMedia], caption: &str) -> Result<String> {
        let items: Vec<CarouselItem> = media
            .iter()
            .map(|m| {
                let url = public_url(&self.media_base_url, &m.storage_ref);
                if m.is_video() {
                    CarouselItem::video(url)
                } else {
                    CarouselItem::image(url)
                }
            })
            .collect();
        Ok(self.session.publish_carousel(&items, caption).await?)
    }
}
