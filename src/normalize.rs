//! Turn an arbitrary JSON reply into the text shown in the chat.

use serde_json::Value;

/// Fields checked, in order, for the text to display.
const DISPLAY_FIELDS: [&str; 4] = ["summary", "answer", "response", "message"];

/// Pick the display text for a backend reply.
///
/// The first truthy field among `summary`, `answer`, `response` and `message`
/// wins. If none is present the whole payload is shown as pretty JSON.
pub fn display_text(payload: &Value) -> String {
    if let Value::Object(map) = payload {
        for field in DISPLAY_FIELDS {
            if let Some(value) = map.get(field).filter(|v| is_truthy(v)) {
                return match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => pretty(other),
                };
            }
        }
    }
    pretty(payload)
}

/// Two-space indented JSON, as shown in the inspector.
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_wins() {
        let payload = json!({"summary": "S", "answer": "A"});
        assert_eq!(display_text(&payload), "S");
    }

    #[test]
    fn test_null_summary_falls_through_to_answer() {
        let payload = json!({"answer": "A", "summary": null});
        assert_eq!(display_text(&payload), "A");
    }

    #[test]
    fn test_precedence_order() {
        assert_eq!(display_text(&json!({"message": "M", "response": "R"})), "R");
        assert_eq!(display_text(&json!({"message": "M"})), "M");
        assert_eq!(
            display_text(&json!({"summary": "", "answer": false, "response": 0, "message": "M"})),
            "M"
        );
    }

    #[test]
    fn test_field_names_are_case_sensitive() {
        let payload = json!({"Answer": "nope"});
        assert_eq!(display_text(&payload), "{\n  \"Answer\": \"nope\"\n}");
    }

    #[test]
    fn test_unknown_shape_is_pretty_printed() {
        let payload = json!({"foo": "bar"});
        assert_eq!(display_text(&payload), "{\n  \"foo\": \"bar\"\n}");
    }

    #[test]
    fn test_truthy_non_string_fields() {
        assert_eq!(display_text(&json!({"answer": 42})), "42");
        assert_eq!(display_text(&json!({"answer": true})), "true");
        assert_eq!(
            display_text(&json!({"summary": {"k": 1}})),
            "{\n  \"k\": 1\n}"
        );
        assert_eq!(display_text(&json!({"summary": []})), "[]");
    }

    #[test]
    fn test_non_object_payloads() {
        assert_eq!(display_text(&json!("hello")), "\"hello\"");
        assert_eq!(display_text(&json!(null)), "null");
        assert_eq!(display_text(&json!([1])), "[\n  1\n]");
    }
}
