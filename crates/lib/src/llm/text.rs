//! Text delegate client: `GET {url}?{param}={text}`.

use super::{status_error, DelegateError, TextDelegate};
use async_trait::async_trait;
use std::time::Duration;

/// HTTP client for the text answer service.
#[derive(Clone)]
pub struct TextClient {
    url: String,
    query_param: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl TextClient {
    pub fn new(url: impl Into<String>, query_param: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            query_param: query_param.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &crate::config::DelegatesConfig) -> Self {
        Self::new(
            config.text_url.trim(),
            config.text_query_param.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl TextDelegate for TextClient {
    async fn ask(&self, text: &str) -> Result<String, DelegateError> {
        if self.url.is_empty() {
            return Err(DelegateError::NotConfigured("textUrl"));
        }
        log::info!("calling text delegate: {}", self.url);
        let res = self
            .client
            .get(&self.url)
            .query(&[(self.query_param.as_str(), text)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DelegateError::from_reqwest(e, self.timeout))?;
        if !res.status().is_success() {
            return Err(status_error(res).await);
        }
        res.text()
            .await
            .map_err(|e| DelegateError::from_reqwest(e, self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_text_as_query_param_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/openai.php"))
            .and(query_param("gpt-5-mini", "what is rust? & why"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"answer":"A language."}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = TextClient::new(
            format!("{}/api/openai.php", server.uri()),
            "gpt-5-mini",
            Duration::from_secs(5),
        );
        let body = client.ask("what is rust? & why").await.unwrap();
        assert_eq!(body, r#"{"answer":"A language."}"#);
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let client = TextClient::new(server.uri(), "q", Duration::from_secs(5));
        let err = client.ask("hi").await.unwrap_err();
        assert!(matches!(err, DelegateError::Api(ref m) if m.contains("503") && m.contains("busy")), "{err}");
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = TextClient::new(server.uri(), "q", Duration::from_millis(50));
        let err = client.ask("hi").await.unwrap_err();
        assert!(matches!(err, DelegateError::Timeout(_)), "{err}");
    }

    #[tokio::test]
    async fn empty_url_is_not_configured() {
        let client = TextClient::new("", "q", Duration::from_secs(1));
        assert!(matches!(
            client.ask("hi").await,
            Err(DelegateError::NotConfigured("textUrl"))
        ));
    }
}
