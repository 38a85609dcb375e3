//! The publishing platform only accepts JPEG images, so every image that is
//! not already JPEG gets a JPEG sibling before upload. Videos pass through.

use bytes::Bytes;
use image::ImageFormat;
use std::io::Cursor;
use std::sync::Arc;

use super::PublishError;
use crate::domains::submissions::models::Attachment;
use crate::kernel::{BaseMediaStore, PublishMedia};

const JPEG: &str = "image/jpeg";

fn is_jpeg(content_type: &str) -> bool {
    matches!(content_type, "image/jpeg" | "image/jpg" | "image/pjpeg")
}

/// Decode any supported image and re-encode it as an RGB JPEG.
///
/// CPU-bound; runs on the blocking pool.
pub async fn convert_to_jpeg(data: Bytes) -> Result<Bytes, PublishError> {
    tokio::task::spawn_blocking(move || {
        let decoded = image::load_from_memory(&data)
            .map_err(|e| PublishError::MediaConversion(format!("decode: {}", e)))?;
        let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());

        let mut out = Cursor::new(Vec::new());
        rgb.write_to(&mut out, ImageFormat::Jpeg)
            .map_err(|e| PublishError::MediaConversion(format!("encode: {}", e)))?;
        Ok(Bytes::from(out.into_inner()))
    })
    .await
    .map_err(|e| PublishError::MediaConversion(format!("conversion task failed: {}", e)))?
}

/// Map one attachment to publish media, converting non-JPEG images.
pub async fn normalize_attachment(
    attachment: &Attachment,
    store: &Arc<dyn BaseMediaStore>,
) -> Result<PublishMedia, PublishError> {
    if !attachment.is_image() || is_jpeg(&attachment.content_type) {
        return Ok(PublishMedia {
            storage_ref: attachment.storage_ref.clone(),
            content_type: attachment.content_type.clone(),
        });
    }

    let original = store.read(&attachment.storage_ref).await.map_err(|e| {
        PublishError::MediaConversion(format!("read {}: {:#}", attachment.storage_ref, e))
    })?;
    let converted = convert_to_jpeg(original).await?;
    let storage_ref = store
        .save_derived(&attachment.storage_ref, "jpg", converted)
        .await
        .map_err(|e| {
            PublishError::MediaConversion(format!(
                "store rendition of {}: {:#}",
                attachment.storage_ref, e
            ))
        })?;

    tracing::debug!(
        attachment_id = %attachment.id,
        from = %attachment.content_type,
        storage_ref = %storage_ref,
        "Converted image to JPEG"
    );
    Ok(PublishMedia {
        storage_ref,
        content_type: JPEG.to_string(),
    })
}

/// Map attachments to publish media for an album, in order.
pub async fn normalize_for_album(
    attachments: &[Attachment],
    store: &Arc<dyn BaseMediaStore>,
) -> Result<Vec<PublishMedia>, PublishError> {
    let mut media = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        media.push(normalize_attachment(attachment, store).await?);
    }
    Ok(media)
}
