//! Reply shaping: turn whatever the text delegate returned into one short reply.
//!
//! The delegate body is parsed as JSON when possible and searched for an answer field
//! ([`extract_answer`]); otherwise the raw body is used. The candidate is then cut down to a
//! single sentence ([`first_sentence`]).

mod extract;
mod trim;

pub use extract::extract_answer;
pub use trim::{first_sentence, MAX_REPLY_CHARS};

/// Longest raw (non-JSON) body used as a reply candidate.
pub const MAX_RAW_CHARS: usize = 1000;

const TRUNCATION_MARKER: &str = "…";

/// Normalize a text delegate body into one reply sentence. Returns an empty string when the body
/// holds nothing usable; the caller substitutes an apology.
pub fn compose_reply(body: &str) -> String {
    let candidate = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => extract_answer(&value),
        Err(_) => {
            log::debug!("delegate body is not JSON, using raw text");
            None
        }
    };
    let candidate = candidate.unwrap_or_else(|| clamp_chars(body.trim(), MAX_RAW_CHARS));
    first_sentence(&candidate)
}

/// First `max` characters of `s`, with a truncation marker appended when something was cut.
fn clamp_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}{}", &s[..idx], TRUNCATION_MARKER),
        None => s.to_string(),
    }
}
