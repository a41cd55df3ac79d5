//! Prompt text for the three enrichment operations.

use docfill_core::PlaceholderName;

pub const SUGGEST_SYSTEM: &str = "You are an assistant that must return JSON only. No extra text.";

pub const INSERT_SYSTEM: &str =
    "Return the formatted Markdown document only, without commentary or code fences.";

pub const CLEANUP_SYSTEM: &str =
    "You finalize filled-in documents. Return the finished Markdown document only, \
     without commentary or code fences.";

/// Marker shown to the model for a placeholder the user left blank.
pub const BLANK_MARKER: &str = "(left blank)";

pub fn suggest_prompt(text: &str) -> String {
    format!(
        r#"Identify values in this document that should become fill-in placeholders.
Respond with ONLY a JSON object in this format:

{{
  "suggested_placeholders": {{
    "exact text from the document": "descriptive-name"
  }}
}}

Rules:
- Return ONLY JSON, no explanations.
- Each name must be lowercase with hyphens.
- Do not repeat text that is already a ${{placeholder}}.

Document:
{text}"#
    )
}

pub fn insert_prompt(text: &str, names: &[PlaceholderName]) -> String {
    let list = names
        .iter()
        .map(|n| format!("- {}", n.delimited()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"Insert these placeholders into the document:
{list}

Rules:
1. Keep existing placeholders in their positions.
2. Insert new placeholders where the matching text appears.
3. Preserve Markdown formatting.

Document:
{text}"#
    )
}

pub fn cleanup_prompt(text: &str, values: &[(PlaceholderName, String)]) -> String {
    let list = values
        .iter()
        .map(|(name, value)| {
            let shown = if value.trim().is_empty() {
                BLANK_MARKER
            } else {
                value.as_str()
            };
            format!("- {}: {}", name.delimited(), shown)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"Fill in the placeholders of this document with the values below.
Where a value is marked {BLANK_MARKER}, remove the sentence or clause that depends on it
so the document still reads naturally. Do not invent values.

Values:
{list}

Document:
{text}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> PlaceholderName {
        PlaceholderName::parse(raw).unwrap()
    }

    #[test]
    fn insert_prompt_lists_delimited_names() {
        let prompt = insert_prompt("Dear Jane", &[name("full-name"), name("date")]);
        assert!(prompt.contains("- ${full-name}\n- ${date}"));
        assert!(prompt.ends_with("Dear Jane"));
    }

    #[test]
    fn cleanup_prompt_marks_blank_values() {
        let values = vec![
            (name("full-name"), "Jane Doe".to_string()),
            (name("middle-name"), "  ".to_string()),
        ];
        let prompt = cleanup_prompt("${full-name} ${middle-name}", &values);
        assert!(prompt.contains("- ${full-name}: Jane Doe"));
        assert!(prompt.contains("- ${middle-name}: (left blank)"));
    }
}
