use thiserror::Error;

/// Publishing failures.
///
/// `Authentication` aborts a whole sweep; everything else is scoped to one
/// submission and leaves it unposted for the next sweep.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Authentication with the publishing platform failed: {0:#}")]
    Authentication(anyhow::Error),

    #[error("Media conversion failed: {0}")]
    MediaConversion(String),

    #[error("Upload failed: {0:#}")]
    Upload(anyhow::Error),

    #[error("Submission already published")]
    AlreadyPublished,

    #[error("Submission has no attachments")]
    NoAttachments,

    #[error("Submission was withdrawn before it could be published")]
    Withdrawn,

    #[error("Repository error: {0:#}")]
    Repository(anyhow::Error),
}

impl PublishError {
    /// Outcomes that are not failures of the publish itself and get no
    /// failure notice.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            PublishError::AlreadyPublished | PublishError::NoAttachments | PublishError::Withdrawn
        )
    }
}
