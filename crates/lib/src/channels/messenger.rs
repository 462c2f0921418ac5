//! Messenger channel: webhook payload types and the Send API client.

use crate::channels::inbound::{EventPayload, InboundEvent};
use crate::channels::outbound::{ChannelError, Outbound};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Webhook POST body. Entries are kept as raw JSON so one malformed event does not take its
/// siblings down with it.
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MessagingEvent {
    sender: Participant,
    #[serde(default)]
    message: Option<MessengerMessage>,
    #[serde(default)]
    postback: Option<Postback>,
}

#[derive(Debug, Deserialize)]
struct Participant {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessengerMessage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    quick_reply: Option<QuickReply>,
    /// Set on copies of messages the page itself sent.
    #[serde(default)]
    is_echo: bool,
}

#[derive(Debug, Deserialize)]
struct QuickReply {
    payload: String,
}

/// Persistent-menu and button presses arrive as postbacks. Only the image trigger is acted on.
#[derive(Debug, Deserialize)]
struct Postback {
    payload: String,
}

impl MessagingEvent {
    fn into_inbound(self, image_trigger: &str) -> Option<InboundEvent> {
        let sender_id = self.sender.id.trim().to_string();
        if sender_id.is_empty() {
            return None;
        }
        if let Some(postback) = self.postback {
            if postback.payload != image_trigger {
                log::debug!("messenger: ignoring postback {:?}", postback.payload);
                return None;
            }
            return Some(InboundEvent::quick_reply(sender_id, postback.payload));
        }
        let message = self.message?;
        if message.is_echo {
            return None;
        }
        // Unknown quick-reply tags fall back to the text shown on the button.
        let payload = match (message.quick_reply, message.text) {
            (Some(qr), _) if qr.payload == image_trigger => Some(EventPayload::QuickReply(qr.payload)),
            (_, Some(text)) => Some(EventPayload::Text(text)),
            (Some(qr), None) => Some(EventPayload::QuickReply(qr.payload)),
            (None, None) => None,
        };
        Some(InboundEvent { sender_id, payload })
    }
}

/// Extract user events from a webhook body, in delivery order. Malformed events, events without
/// a message (deliveries, reads), echoes and postbacks other than `image_trigger` are skipped.
pub fn inbound_events(body: &WebhookBody, image_trigger: &str) -> Vec<InboundEvent> {
    let mut events = Vec::new();
    for entry in &body.entry {
        let Some(messaging) = entry.get("messaging").and_then(|m| m.as_array()) else {
            continue;
        };
        for raw in messaging {
            match serde_json::from_value::<MessagingEvent>(raw.clone()) {
                Ok(event) => {
                    if let Some(inbound) = event.into_inbound(image_trigger) {
                        events.push(inbound);
                    }
                }
                Err(e) => log::debug!("messenger: dropping malformed event: {}", e),
            }
        }
    }
    events
}

/// Send API client for one page.
pub struct MessengerChannel {
    token: Option<String>,
    send_api_url: String,
    client: reqwest::Client,
}

impl MessengerChannel {
    pub fn new(token: Option<String>, send_api_url: impl Into<String>) -> Self {
        Self {
            token,
            send_api_url: send_api_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn post_message(
        &self,
        recipient_id: &str,
        message: serde_json::Value,
    ) -> Result<(), ChannelError> {
        let token = self.token.as_ref().ok_or(ChannelError::MissingCredential)?;
        let body = serde_json::json!({
            "recipient": { "id": recipient_id },
            "messaging_type": "RESPONSE",
            "message": message,
        });
        let res = self
            .client
            .post(&self.send_api_url)
            .query(&[("access_token", token.as_str())])
            .json(&body)
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChannelError::Api(format!("{} {}", status, body)));
        }
        log::info!("messenger: message sent to {}", recipient_id);
        Ok(())
    }
}

#[async_trait]
impl Outbound for MessengerChannel {
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), ChannelError> {
        self.post_message(recipient_id, serde_json::json!({ "text": text }))
            .await
    }

    async fn send_image(&self, recipient_id: &str, image_url: &str) -> Result<(), ChannelError> {
        let message = serde_json::json!({
            "attachment": {
                "type": "image",
                "payload": { "url": image_url, "is_reusable": true }
            }
        });
        self.post_message(recipient_id, message).await
    }
}
