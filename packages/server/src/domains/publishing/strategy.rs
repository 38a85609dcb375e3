use crate::domains::submissions::models::Attachment;

/// How a submission's media is handed to the publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStrategy {
    /// No attachments; skipped with a warning.
    Nothing,
    SinglePhoto,
    SingleVideo,
    /// Two or more items, images normalized to a common encoding.
    Album,
}

impl PublishStrategy {
    pub fn select(attachments: &[Attachment]) -> Self {
        match attachments {
            [] => PublishStrategy::Nothing,
            [only] if only.is_video() => PublishStrategy::SingleVideo,
            [_] => PublishStrategy::SinglePhoto,
            _ => PublishStrategy::Album,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{AttachmentId, SubmissionId};

    fn attachment(position: i32, content_type: &str) -> Attachment {
        Attachment {
            id: AttachmentId::new(),
            submission_id: SubmissionId::new(),
            position,
            external_attachment_id: position as i64,
            content_type: content_type.into(),
            storage_ref: format!("dir/{}", position),
        }
    }

    #[test]
    fn selects_by_count_and_content_type() {
        assert_eq!(PublishStrategy::select(&[]), PublishStrategy::Nothing);
        assert_eq!(
            PublishStrategy::select(&[attachment(0, "image/png")]),
            PublishStrategy::SinglePhoto
        );
        assert_eq!(
            PublishStrategy::select(&[attachment(0, "video/mp4")]),
            PublishStrategy::SingleVideo
        );
        assert_eq!(
            PublishStrategy::select(&[attachment(0, "image/png"), attachment(1, "video/mp4")]),
            PublishStrategy::Album
        );
    }
}
