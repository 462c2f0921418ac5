//! Event dispatcher: classify one inbound event, act on it, send exactly one reply.
//!
//! Events for the same sender are handled one at a time (the sender lock is held from the mode
//! read to the reply send); different senders run in parallel. Delegate failures never escape:
//! each maps to a fixed apology.

use crate::channels::{InboundEvent, Outbound};
use crate::config::{Config, RepliesConfig};
use crate::intent::{Intent, IntentClassifier};
use crate::llm::{DelegateError, ImageClient, ImageDelegate, TextClient, TextDelegate};
use crate::reply::compose_reply;
use crate::session::{ConversationMode, ModeStore, SenderLocks};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// The one message sent back for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// URL of a generated image, sent as an attachment.
    Image(String),
}

pub struct Dispatcher {
    classifier: IntentClassifier,
    modes: Arc<dyn ModeStore>,
    locks: SenderLocks,
    text: Arc<dyn TextDelegate>,
    image: Arc<dyn ImageDelegate>,
    outbound: Arc<dyn Outbound>,
    replies: RepliesConfig,
    delegate_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        classifier: IntentClassifier,
        modes: Arc<dyn ModeStore>,
        text: Arc<dyn TextDelegate>,
        image: Arc<dyn ImageDelegate>,
        outbound: Arc<dyn Outbound>,
        replies: RepliesConfig,
        delegate_timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            modes,
            locks: SenderLocks::new(),
            text,
            image,
            outbound,
            replies,
            delegate_timeout,
        }
    }

    /// Dispatcher wired to the HTTP delegates described by `config`.
    pub fn from_config(
        config: &Config,
        modes: Arc<dyn ModeStore>,
        outbound: Arc<dyn Outbound>,
    ) -> Self {
        Self::new(
            IntentClassifier::from_config(&config.conversation),
            modes,
            Arc::new(TextClient::from_config(&config.delegates)),
            Arc::new(ImageClient::from_config(&config.delegates)),
            outbound,
            config.replies.clone(),
            Duration::from_secs(config.delegates.timeout_secs),
        )
    }

    /// Handle one event to completion and send its reply.
    pub async fn handle(&self, event: InboundEvent) {
        let sender_id = event.sender_id.as_str();
        let _guard = self.locks.lock(sender_id).await;
        let mode = self.modes.get(sender_id).await;
        let intent = self.classifier.classify(&event, mode);
        log::debug!("sender {}: mode {:?}, intent {:?}", sender_id, mode, intent);
        let reply = self.respond(sender_id, intent).await;
        self.deliver(sender_id, &reply).await;
    }

    async fn respond(&self, sender_id: &str, intent: Intent) -> Reply {
        match intent {
            Intent::Unsupported => Reply::Text(self.replies.text_only.clone()),
            Intent::DeveloperQuery => Reply::Text(self.replies.developer.clone()),
            Intent::StartImageMode => {
                self.modes
                    .set(sender_id, ConversationMode::AwaitingImagePrompt)
                    .await;
                Reply::Text(self.replies.image_prompt.clone())
            }
            Intent::ImagePromptContinuation(prompt) => {
                let reply = match self.bounded(self.image.generate(&prompt)).await {
                    Ok(url) => Reply::Image(url),
                    Err(e) => {
                        log::error!("image delegate failed for sender {}: {}", sender_id, e);
                        Reply::Text(self.replies.image_failed.clone())
                    }
                };
                self.modes.clear(sender_id).await;
                reply
            }
            Intent::GenericQuery(text) => Reply::Text(self.answer(sender_id, &text).await),
        }
    }

    async fn answer(&self, sender_id: &str, text: &str) -> String {
        match self.bounded(self.text.ask(text)).await {
            Ok(body) => {
                let reply = compose_reply(&body);
                if reply.is_empty() {
                    log::warn!("text delegate gave no usable answer for sender {}", sender_id);
                    self.replies.no_reply.clone()
                } else {
                    reply
                }
            }
            Err(e) => {
                log::error!("text delegate failed for sender {}: {}", sender_id, e);
                self.replies.error.clone()
            }
        }
    }

    /// Run a delegate call under the per-call timeout.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, DelegateError>>,
    ) -> Result<T, DelegateError> {
        tokio::time::timeout(self.delegate_timeout, call)
            .await
            .unwrap_or(Err(DelegateError::Timeout(self.delegate_timeout)))
    }

    async fn deliver(&self, sender_id: &str, reply: &Reply) {
        let result = match reply {
            Reply::Text(text) => self.outbound.send_text(sender_id, text).await,
            Reply::Image(url) => self.outbound.send_image(sender_id, url).await,
        };
        if let Err(e) = result {
            log::error!("send to {} failed: {}", sender_id, e);
        }
    }
}
