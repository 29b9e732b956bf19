use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::pipeline::batch_extraction::{ExtractorError, FieldKind, FieldValue, FieldValues, TargetField};

/// Strip model-specific artifacts from raw LLM output.
///
/// Handles:
/// 1. MedGemma thinking tags (`<unusedN>thought\n...`)
/// 2. Stray `<unusedN>` tokens from the Gemma3 tokenizer
/// 3. Leading/trailing whitespace from stripping
pub fn sanitize_llm_output(raw: &str) -> String {
    let mut text = raw.to_string();

    if let Some(idx) = text.find("<unused") {
        if let Some(thought_offset) = text[idx..].find("thought\n") {
            text = text[idx + thought_offset + 8..].to_string();
        }
    }

    static UNUSED_TOKEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<unused\d+>").expect("valid regex"));
    text = UNUSED_TOKEN_RE.replace_all(&text, "").to_string();

    text.trim().to_string()
}

/// Locate the JSON object in a model response.
///
/// Accepts a ```json fence, a bare ``` fence, or falls back to the span
/// between the first `{` and the last `}`.
pub fn extract_json_block(response: &str) -> Result<&str, ExtractorError> {
    if let Some(start) = response.find("```json") {
        let content_start = start + 7;
        let end = response[content_start..]
            .find("```")
            .ok_or_else(|| ExtractorError::JsonParsing("Unclosed JSON block".into()))?;
        return Ok(response[content_start..content_start + end].trim());
    }

    if let Some(start) = response.find("```") {
        let content_start = start + 3;
        if let Some(end) = response[content_start..].find("```") {
            let inner = response[content_start..content_start + end].trim();
            if inner.starts_with('{') {
                return Ok(inner);
            }
        }
    }

    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&response[start..=end]),
        _ => Err(ExtractorError::JsonParsing("No JSON object found".into())),
    }
}

/// Read the declared target fields out of a model response.
///
/// Undeclared keys are ignored. A key matches its field exactly or, failing
/// that, case-insensitively. `null` leaves the field unset.
pub fn parse_field_values(response: &str, fields: &[TargetField]) -> Result<FieldValues, ExtractorError> {
    let block = extract_json_block(response)?;
    let value: Value =
        serde_json::from_str(block).map_err(|e| ExtractorError::JsonParsing(e.to_string()))?;
    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(ExtractorError::JsonParsing(format!(
                "expected a JSON object, got {}",
                type_name(&other)
            )))
        }
    };

    let mut values = FieldValues::new();
    for field in fields {
        let Some(raw) = lookup(&object, &field.name) else {
            continue;
        };
        if let Some(parsed) = convert(field, raw)? {
            values.insert(field.name.clone(), parsed);
        }
    }
    Ok(values)
}

fn lookup<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn convert(field: &TargetField, raw: &Value) -> Result<Option<FieldValue>, ExtractorError> {
    let invalid = || ExtractorError::InvalidField {
        field: field.name.clone(),
        value: raw.to_string(),
    };

    match (field.kind, raw) {
        (_, Value::Null) => Ok(None),

        (FieldKind::Flag, Value::Bool(b)) => Ok(Some(FieldValue::Flag(*b))),
        (FieldKind::Flag, Value::Number(n)) => match n.as_f64() {
            Some(v) if v == 0.0 => Ok(Some(FieldValue::Flag(false))),
            Some(v) if v == 1.0 => Ok(Some(FieldValue::Flag(true))),
            _ => Err(invalid()),
        },
        // Spelled flags ("1", "yes") are resolved by FieldValues::flag.
        (FieldKind::Flag, Value::String(s)) => Ok(Some(FieldValue::Text(s.clone()))),
        (FieldKind::Flag, _) => Err(invalid()),

        (FieldKind::Text, Value::String(s)) => Ok(Some(FieldValue::Text(s.clone()))),
        (FieldKind::Text, Value::Array(items)) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => parts.push(s.trim().to_string()),
                    Value::Null => {}
                    _ => return Err(invalid()),
                }
            }
            Ok(Some(FieldValue::Text(parts.join(" "))))
        }
        (FieldKind::Text, Value::Number(_) | Value::Bool(_)) => {
            Ok(Some(FieldValue::Text(raw.to_string())))
        }
        (FieldKind::Text, Value::Object(_)) => Err(invalid()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence_fields() -> Vec<TargetField> {
        vec![
            TargetField::flag("presence", "mentioned as present"),
            TargetField::text("evidence", "supporting sentence"),
        ]
    }

    #[test]
    fn strips_thinking_prefix() {
        let raw = "<unused94>thought\nThe lungs look clear.\n{\"presence\": 0}";
        assert_eq!(sanitize_llm_output(raw), "The lungs look clear.\n{\"presence\": 0}");
    }

    #[test]
    fn strips_stray_unused_tokens() {
        assert_eq!(sanitize_llm_output("<unused3>{\"presence\": 1}<unused4>"), "{\"presence\": 1}");
    }

    #[test]
    fn clean_output_unchanged() {
        assert_eq!(sanitize_llm_output("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn extracts_fenced_json() {
        let response = "Here you go:\n```json\n{\"presence\": 1}\n```\nDone.";
        assert_eq!(extract_json_block(response).unwrap(), "{\"presence\": 1}");
    }

    #[test]
    fn extracts_bare_fence() {
        let response = "```\n{\"presence\": 0}\n```";
        assert_eq!(extract_json_block(response).unwrap(), "{\"presence\": 0}");
    }

    #[test]
    fn extracts_unfenced_object() {
        let response = "Answer: {\"presence\": 1, \"evidence\": \"{mass}\"} end";
        assert_eq!(
            extract_json_block(response).unwrap(),
            "{\"presence\": 1, \"evidence\": \"{mass}\"}"
        );
    }

    #[test]
    fn unclosed_fence_is_an_error() {
        let err = extract_json_block("```json\n{\"presence\": 1}").unwrap_err();
        assert!(matches!(err, ExtractorError::JsonParsing(_)));
    }

    #[test]
    fn no_object_is_an_error() {
        assert!(extract_json_block("no findings").is_err());
    }

    #[test]
    fn parses_flags_and_text() {
        let values = parse_field_values(
            r#"{"presence": 1, "evidence": "Small nodule in the RUL."}"#,
            &presence_fields(),
        )
        .unwrap();
        assert!(values.flag("presence").unwrap());
        assert_eq!(values.text("evidence").unwrap(), "Small nodule in the RUL.");
    }

    #[test]
    fn accepts_booleans_and_spelled_flags() {
        let fields = vec![TargetField::flag("a", ""), TargetField::flag("b", "")];
        let values = parse_field_values(r#"{"a": true, "b": "0"}"#, &fields).unwrap();
        assert!(values.flag("a").unwrap());
        assert!(!values.flag("b").unwrap());
    }

    #[test]
    fn non_binary_number_is_invalid() {
        let err = parse_field_values(r#"{"presence": 2}"#, &presence_fields()).unwrap_err();
        assert_eq!(
            err,
            ExtractorError::InvalidField {
                field: "presence".into(),
                value: "2".into()
            }
        );
    }

    #[test]
    fn null_and_missing_fields_stay_unset() {
        let values = parse_field_values(r#"{"presence": null}"#, &presence_fields()).unwrap();
        assert!(values.is_empty());
        assert_eq!(
            values.flag("presence").unwrap_err(),
            ExtractorError::MissingField("presence".into())
        );
    }

    #[test]
    fn keys_match_case_insensitively() {
        let values = parse_field_values(r#"{"Presence": 0}"#, &presence_fields()).unwrap();
        assert!(!values.flag("presence").unwrap());
    }

    #[test]
    fn undeclared_keys_are_ignored() {
        let values =
            parse_field_values(r#"{"presence": 0, "confidence": 0.4}"#, &presence_fields()).unwrap();
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn sentence_lists_are_joined() {
        let fields = vec![TargetField::text("sentences", "")];
        let values =
            parse_field_values(r#"{"sentences": ["Clear lungs.", "No effusion."]}"#, &fields).unwrap();
        assert_eq!(values.text("sentences").unwrap(), "Clear lungs. No effusion.");
    }

    #[test]
    fn top_level_array_is_rejected() {
        let err = parse_field_values("[1, 0]", &presence_fields()).unwrap_err();
        assert!(matches!(err, ExtractorError::JsonParsing(_)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = parse_field_values(r#"{"presence": 1,"#, &presence_fields()).unwrap_err();
        assert!(matches!(err, ExtractorError::JsonParsing(_)));
    }
}
