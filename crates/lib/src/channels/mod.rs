//! Messaging platform channel (Facebook Messenger).
//!
//! Inbound: webhook bodies are turned into [`InboundEvent`]s for the dispatcher.
//! Outbound: replies go through the [`Outbound`] trait, implemented by [`MessengerChannel`].

mod inbound;
mod messenger;
mod outbound;

pub use inbound::{EventPayload, InboundEvent};
pub use messenger::{inbound_events, MessengerChannel, WebhookBody};
pub use outbound::{ChannelError, Outbound};
