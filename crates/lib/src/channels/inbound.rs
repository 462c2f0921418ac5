//! Inbound event from the messaging platform: delivered to the dispatcher for handling.

/// What the user sent. Events carrying neither (attachments, stickers) have no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    Text(String),
    /// Quick-reply button press, identified by its opaque payload tag.
    QuickReply(String),
}

/// One user-originated event, addressed by the sender's page-scoped id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender_id: String,
    pub payload: Option<EventPayload>,
}

impl InboundEvent {
    pub fn text(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            payload: Some(EventPayload::Text(text.into())),
        }
    }

    pub fn quick_reply(sender_id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            payload: Some(EventPayload::QuickReply(tag.into())),
        }
    }

    pub fn empty(sender_id: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            payload: None,
        }
    }
}
