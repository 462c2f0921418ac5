//! Outbound transport: how replies reach the user.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("page access token not configured")]
    MissingCredential,
    #[error("send request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("send api error: {0}")]
    Api(String),
}

/// Delivers replies to a recipient. Sends are not retried; callers log failures and move on.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), ChannelError>;
    async fn send_image(&self, recipient_id: &str, image_url: &str) -> Result<(), ChannelError>;
}
