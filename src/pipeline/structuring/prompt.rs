use crate::models::Stage;
use crate::pipeline::batch_extraction::{ExtractionRequest, FieldKind, TargetField};

pub const SYSTEM_PROMPT: &str = r#"
You are a radiology report structuring assistant. Your ONLY role is to read
the findings of a chest CT report and answer narrow questions about them.

RULES (ABSOLUTE, NO EXCEPTIONS):
1. Answer ONLY from what is explicitly written in the report.
2. A finding that is negated ("no", "without", "resolved") is NOT present.
3. NEVER infer a finding, a location or a count that is not written.
4. Flags are 0 or 1. Text answers are copied verbatim from the report.
5. Output MUST be a single JSON object with exactly the requested keys.
"#;

/// Build the question prompt for one Extractor request.
pub fn build_prompt(request: &ExtractionRequest<'_>) -> String {
    let mut prompt = String::new();

    prompt.push_str("<report>\n");
    prompt.push_str(request.text.trim());
    prompt.push_str("\n</report>\n\n");

    prompt.push_str(&format!("Organ: {}\n", request.organ_label));
    if let Some(def) = request.abnormality {
        prompt.push_str(&format!("Finding: {}\n", def.label));
        if !def.hint.is_empty() {
            prompt.push_str(&format!("Notes: {}\n", def.hint));
        }
    }
    prompt.push_str(&format!("Question: {}\n\n", question(request)));

    prompt.push_str("Answer with a JSON object containing exactly these keys:\n");
    for field in request.fields {
        prompt.push_str(&field_line(field));
    }
    prompt.push_str("\nOutput only the JSON object.");

    prompt
}

fn question(request: &ExtractionRequest<'_>) -> String {
    let finding = request.abnormality.map(|d| d.label).unwrap_or("finding");
    match (request.stage, request.scope) {
        (Stage::Section, _) => format!(
            "Which sentences of the report describe the {}?",
            request.organ_label
        ),
        (Stage::Presence, _) => format!("Does the report describe a {finding} as present?"),
        (Stage::Location, Some(scope)) => {
            format!("Within the {scope}, where is the {finding} located?")
        }
        (Stage::Location, None) => format!("Where is the {finding} located?"),
        (Stage::Count, _) => format!("How many {finding} lesions does the report describe?"),
        (Stage::Onset, Some(scope)) => {
            format!("Is the {finding} at the {scope} new, old or healed, or not stated?")
        }
        (Stage::Onset, None) => format!("Is the {finding} new, old or healed, or not stated?"),
    }
}

fn field_line(field: &TargetField) -> String {
    let shape = match field.kind {
        FieldKind::Flag => "0 or 1",
        FieldKind::Text => "text",
    };
    format!("- \"{}\" ({shape}): {}\n", field.name, field.description)
}
