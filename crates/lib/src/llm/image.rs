//! Image delegate client: `GET {url}?prompt=..&ratio=..&style=..`, answer `{"image": "<url>"}`.

use super::{status_error, DelegateError, ImageDelegate};
use async_trait::async_trait;
use std::time::Duration;

/// HTTP client for the image generator.
#[derive(Clone)]
pub struct ImageClient {
    url: Option<String>,
    aspect_ratio: String,
    style: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ImageClient {
    pub fn new(
        url: Option<String>,
        aspect_ratio: impl Into<String>,
        style: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            url: url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            aspect_ratio: aspect_ratio.into(),
            style: style.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &crate::config::DelegatesConfig) -> Self {
        Self::new(
            config.image_url.clone(),
            config.image_aspect_ratio.clone(),
            config.image_style.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl ImageDelegate for ImageClient {
    async fn generate(&self, prompt: &str) -> Result<String, DelegateError> {
        let url = self
            .url
            .as_deref()
            .ok_or(DelegateError::NotConfigured("imageUrl"))?;
        log::info!("calling image delegate: {}", url);
        let res = self
            .client
            .get(url)
            .query(&[
                ("prompt", prompt),
                ("ratio", self.aspect_ratio.as_str()),
                ("style", self.style.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DelegateError::from_reqwest(e, self.timeout))?;
        if !res.status().is_success() {
            return Err(status_error(res).await);
        }
        let body = res
            .text()
            .await
            .map_err(|e| DelegateError::from_reqwest(e, self.timeout))?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| DelegateError::Api(format!("image response is not JSON: {}", e)))?;
        value
            .get("image")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(DelegateError::MissingField("image"))
    }
}
