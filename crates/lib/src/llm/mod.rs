//! External AI delegates: the text answer service and the image generator.
//!
//! Both are plain GET endpoints. The traits are the seam the dispatcher depends on, so tests and
//! alternative providers can stand in for the HTTP clients.

mod image;
mod text;

use async_trait::async_trait;
use std::time::Duration;

pub use image::ImageClient;
pub use text::TextClient;

#[derive(Debug, thiserror::Error)]
pub enum DelegateError {
    #[error("delegate request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("delegate timed out after {0:?}")]
    Timeout(Duration),
    #[error("delegate api error: {0}")]
    Api(String),
    #[error("delegate not configured: {0} is unset")]
    NotConfigured(&'static str),
    #[error("delegate response has no usable {0}")]
    MissingField(&'static str),
}

impl DelegateError {
    /// Map a transport error, keeping timeouts distinct.
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            DelegateError::Timeout(timeout)
        } else {
            DelegateError::Request(err)
        }
    }
}

/// Text answer service. Returns the raw response body; shaping it is the caller's job.
#[async_trait]
pub trait TextDelegate: Send + Sync {
    async fn ask(&self, text: &str) -> Result<String, DelegateError>;
}

/// Image generator. Returns the URL of the generated image.
#[async_trait]
pub trait ImageDelegate: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, DelegateError>;
}

/// Error for a non-success HTTP status, with whatever body the service sent.
async fn status_error(res: reqwest::Response) -> DelegateError {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    DelegateError::Api(format!("{} {}", status, body))
}
