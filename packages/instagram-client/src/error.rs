use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstagramError>;

#[derive(Debug, Error)]
pub enum InstagramError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Instagram API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Media container {id} failed with status {status}")]
    ContainerFailed { id: String, status: String },

    #[error("Media container {0} was not ready in time")]
    ContainerTimeout(String),

    #[error("Carousel needs between 2 and 10 items, got {0}")]
    CarouselSize(usize),
}
