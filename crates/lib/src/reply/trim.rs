//! Cut delegate text down to one reply sentence.

/// Reply length (in characters) when the text has no sentence terminator.
pub const MAX_REPLY_CHARS: usize = 200;

/// Sentence terminators: Latin period/question/exclamation plus the Arabic question mark and
/// Arabic full stop.
const TERMINATORS: &[char] = &['.', '?', '!', '؟', '۔'];

const ELLIPSIS: &str = "...";

/// Collapse line breaks to single spaces, then return the text up to and including the first
/// sentence terminator. Without a terminator, return the first [`MAX_REPLY_CHARS`] characters
/// (trailing whitespace stripped) with "..." appended if the text was longer.
pub fn first_sentence(text: &str) -> String {
    let collapsed = collapse_line_breaks(text);
    if let Some(idx) = collapsed.find(TERMINATORS) {
        let end = idx + collapsed[idx..].chars().next().map_or(1, char::len_utf8);
        return collapsed[..end].to_string();
    }
    match collapsed.char_indices().nth(MAX_REPLY_CHARS) {
        Some((cut, _)) => format!("{}{}", collapsed[..cut].trim_end(), ELLIPSIS),
        None => collapsed,
    }
}

fn collapse_line_breaks(text: &str) -> String {
    text.split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
