//! Answer lookup in loosely shaped delegate JSON.

use serde_json::{Map, Value};

/// Where to look for a candidate answer. Strategies run in table order; the first one that
/// yields a non-blank string wins.
#[derive(Debug, Clone, Copy)]
enum Strategy {
    /// Keys on the top-level object, in order.
    TopLevel(&'static [&'static str]),
    /// Keys on the first element of a top-level list, when that element is an object.
    FirstListItem {
        list: &'static str,
        keys: &'static [&'static str],
    },
    /// Keys on a nested object under a top-level field.
    Nested {
        field: &'static str,
        keys: &'static [&'static str],
    },
}

const STRATEGIES: &[Strategy] = &[
    Strategy::TopLevel(&["answer"]),
    Strategy::TopLevel(&["text", "response", "message", "reply", "output"]),
    Strategy::FirstListItem {
        list: "choices",
        keys: &["text", "message", "content"],
    },
    Strategy::Nested {
        field: "data",
        keys: &["answer", "text", "message"],
    },
];

impl Strategy {
    fn apply(&self, root: &Map<String, Value>) -> Option<String> {
        match *self {
            Strategy::TopLevel(keys) => first_string(root, keys),
            Strategy::FirstListItem { list, keys } => root
                .get(list)
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .and_then(Value::as_object)
                .and_then(|item| first_string(item, keys)),
            Strategy::Nested { field, keys } => root
                .get(field)
                .and_then(Value::as_object)
                .and_then(|inner| first_string(inner, keys)),
        }
    }
}

/// First key (in order) whose value is a string with non-whitespace content, trimmed.
/// Non-string values are skipped.
fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Find the best answer string in a parsed delegate response. Returns None when the value is
/// not an object or no strategy yields a candidate.
pub fn extract_answer(raw: &Value) -> Option<String> {
    let root = raw.as_object()?;
    STRATEGIES.iter().find_map(|strategy| strategy.apply(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answer_beats_text() {
        let v = json!({ "text": "from text", "answer": "from answer" });
        assert_eq!(extract_answer(&v).as_deref(), Some("from answer"));
    }

    #[test]
    fn top_level_keys_follow_fixed_order() {
        let v = json!({ "output": "o", "reply": "r", "message": "m" });
        assert_eq!(extract_answer(&v).as_deref(), Some("m"));
        let v = json!({ "output": "o", "reply": "r" });
        assert_eq!(extract_answer(&v).as_deref(), Some("r"));
    }

    #[test]
    fn blank_and_non_string_values_are_skipped() {
        let v = json!({ "answer": "   ", "text": 42, "response": "ok" });
        assert_eq!(extract_answer(&v).as_deref(), Some("ok"));
    }

    #[test]
    fn non_string_answer_falls_through_to_later_rules() {
        let v = json!({ "answer": { "text": "nested" }, "data": { "text": "from data" } });
        assert_eq!(extract_answer(&v).as_deref(), Some("from data"));
    }

    #[test]
    fn first_choice_is_searched() {
        let v = json!({ "choices": [ { "content": "c", "message": "m" }, { "text": "second" } ] });
        assert_eq!(extract_answer(&v).as_deref(), Some("m"));
    }

    #[test]
    fn choice_with_object_message_is_not_a_candidate() {
        let v = json!({ "choices": [ { "message": { "content": "deep" } } ] });
        assert_eq!(extract_answer(&v), None);
    }

    #[test]
    fn empty_choices_fall_through_to_data() {
        let v = json!({ "choices": [], "data": { "message": "from data" } });
        assert_eq!(extract_answer(&v).as_deref(), Some("from data"));
    }

    #[test]
    fn top_level_beats_choices_and_data() {
        let v = json!({
            "data": { "answer": "d" },
            "choices": [ { "text": "c" } ],
            "output": "top"
        });
        assert_eq!(extract_answer(&v).as_deref(), Some("top"));
    }

    #[test]
    fn values_are_trimmed() {
        let v = json!({ "answer": "  padded \n" });
        assert_eq!(extract_answer(&v).as_deref(), Some("padded"));
    }

    #[test]
    fn non_object_roots_have_no_answer() {
        assert_eq!(extract_answer(&json!("just a string")), None);
        assert_eq!(extract_answer(&json!([{ "answer": "x" }])), None);
        assert_eq!(extract_answer(&json!({})), None);
    }
}
