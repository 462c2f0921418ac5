//! Intent classification for one inbound event.
//!
//! Matching is plain case-insensitive substring search: no tokenizing, no stemming.

use crate::channels::{EventPayload, InboundEvent};
use crate::config::ConversationConfig;
use crate::session::ConversationMode;

/// What the dispatcher should do with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Asked who built the bot.
    DeveloperQuery,
    /// Pressed the "generate image" quick reply.
    StartImageMode,
    /// Text that answers the image prompt question.
    ImagePromptContinuation(String),
    /// Anything else with text: ask the text delegate.
    GenericQuery(String),
    /// No text (attachment, sticker, unknown quick reply, blank message).
    Unsupported,
}

/// Classifies events against the developer names/phrases and the image trigger tag.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    /// Lowercased names with all whitespace removed.
    developer_names: Vec<String>,
    /// Lowercased phrasings.
    developer_phrases: Vec<String>,
    image_trigger: String,
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

impl IntentClassifier {
    pub fn new(
        developer_names: &[String],
        developer_phrases: &[String],
        image_trigger: impl Into<String>,
    ) -> Self {
        Self {
            developer_names: developer_names
                .iter()
                .map(|n| strip_whitespace(&n.to_lowercase()))
                .filter(|n| !n.is_empty())
                .collect(),
            developer_phrases: developer_phrases
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            image_trigger: image_trigger.into(),
        }
    }

    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(
            &config.developer_names,
            &config.developer_phrases,
            config.image_trigger_payload.clone(),
        )
    }

    /// Decide the intent of `event` given the sender's current mode. An active image prompt
    /// takes precedence over content matching.
    pub fn classify(&self, event: &InboundEvent, mode: ConversationMode) -> Intent {
        let text = match &event.payload {
            Some(EventPayload::Text(t)) if !t.trim().is_empty() => t.trim(),
            Some(EventPayload::QuickReply(tag)) if *tag == self.image_trigger => {
                return Intent::StartImageMode;
            }
            _ => return Intent::Unsupported,
        };
        if mode == ConversationMode::AwaitingImagePrompt {
            return Intent::ImagePromptContinuation(text.to_string());
        }
        if self.is_developer_query(text) {
            return Intent::DeveloperQuery;
        }
        Intent::GenericQuery(text.to_string())
    }

    /// True when the text names the developer or asks who made the bot.
    pub fn is_developer_query(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        let compact = strip_whitespace(&lower);
        self.developer_names.iter().any(|n| compact.contains(n.as_str()))
            || self
                .developer_phrases
                .iter()
                .any(|p| lower.contains(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::from_config(&ConversationConfig::default())
    }

    #[test]
    fn developer_name_in_any_case_and_spacing() {
        let c = classifier();
        for text in [
            "do you know Aymen Bourai?",
            "AYMENBOURAI",
            "aymen   bourai is cool",
            "a y m e n bourai",
        ] {
            assert_eq!(
                c.classify(&InboundEvent::text("u", text), ConversationMode::Idle),
                Intent::DeveloperQuery,
                "{text:?}"
            );
        }
    }

    #[test]
    fn developer_phrases_in_both_scripts() {
        let c = classifier();
        for text in ["من مطورك؟", "Who MADE you", "hey, who is your developer", "mn matwrk"] {
            assert_eq!(
                c.classify(&InboundEvent::text("u", text), ConversationMode::Idle),
                Intent::DeveloperQuery,
                "{text:?}"
            );
        }
    }

    #[test]
    fn other_text_is_a_generic_query_trimmed() {
        let c = classifier();
        assert_eq!(
            c.classify(&InboundEvent::text("u", "  hello  "), ConversationMode::Idle),
            Intent::GenericQuery("hello".to_string())
        );
    }

    #[test]
    fn awaiting_prompt_wins_over_developer_match() {
        let c = classifier();
        assert_eq!(
            c.classify(
                &InboundEvent::text("u", "draw aymen bourai"),
                ConversationMode::AwaitingImagePrompt
            ),
            Intent::ImagePromptContinuation("draw aymen bourai".to_string())
        );
    }

    #[test]
    fn image_trigger_starts_image_mode_in_any_mode() {
        let c = classifier();
        let ev = InboundEvent::quick_reply("u", "GENERATE_IMAGE");
        assert_eq!(c.classify(&ev, ConversationMode::Idle), Intent::StartImageMode);
        assert_eq!(
            c.classify(&ev, ConversationMode::AwaitingImagePrompt),
            Intent::StartImageMode
        );
    }

    #[test]
    fn unknown_quick_reply_and_no_payload_are_unsupported() {
        let c = classifier();
        assert_eq!(
            c.classify(&InboundEvent::quick_reply("u", "OTHER"), ConversationMode::Idle),
            Intent::Unsupported
        );
        assert_eq!(
            c.classify(&InboundEvent::empty("u"), ConversationMode::AwaitingImagePrompt),
            Intent::Unsupported
        );
    }

    #[test]
    fn blank_text_is_unsupported_even_when_awaiting_prompt() {
        let c = classifier();
        assert_eq!(
            c.classify(&InboundEvent::text("u", " \n\t "), ConversationMode::AwaitingImagePrompt),
            Intent::Unsupported
        );
    }

    #[test]
    fn custom_names_and_trigger() {
        let c = IntentClassifier::new(&["Jane Doe".to_string()], &[], "IMG");
        assert!(c.is_developer_query("ask JANEDOE"));
        assert!(!c.is_developer_query("who made you"));
        assert_eq!(
            c.classify(&InboundEvent::quick_reply("u", "IMG"), ConversationMode::Idle),
            Intent::StartImageMode
        );
    }
}
