//! Rendering model for report content, which is free text that is usually JSON.

use serde_json::Value;

/// One labelled block of a structured report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub label: String,
    pub text: String,
}

/// Report content ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportContent {
    /// Nothing to show.
    Empty,
    /// A JSON object split into labelled sections, in the order they were written.
    Sections(Vec<ReportSection>),
    /// Valid JSON that is not an object, pretty-printed.
    Json(String),
    /// Not JSON; shown verbatim.
    Raw(String),
}

impl ReportContent {
    /// Interpret raw report content. Never fails: bad JSON is shown as text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ReportContent::Empty;
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) => ReportContent::Sections(
                map.iter()
                    .map(|(key, value)| ReportSection {
                        label: humanize_key(key),
                        text: value_text(value),
                    })
                    .collect(),
            ),
            Ok(Value::String(s)) => ReportContent::Raw(s),
            Ok(other) => ReportContent::Json(serde_json::to_string_pretty(&other).unwrap_or_else(|_| trimmed.to_string())),
            Err(e) => {
                tracing::debug!("Report content is not JSON ({}), showing raw text", e);
                ReportContent::Raw(raw.to_string())
            }
        }
    }

    /// Flatten to plain text, for exports and clipboard.
    pub fn to_plain_text(&self) -> String {
        match self {
            ReportContent::Empty => String::new(),
            ReportContent::Sections(sections) => sections
                .iter()
                .map(|s| format!("{}: {}", s.label, s.text))
                .collect::<Vec<_>>()
                .join("\n"),
            ReportContent::Json(text) | ReportContent::Raw(text) => text.clone(),
        }
    }
}

/// `clinicalHistory` / `clinical_history` → `Clinical History`.
pub fn humanize_key(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in key.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if ch.is_uppercase() && !current.is_empty() && !current.chars().all(char::is_uppercase) {
            words.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => (if *b { "Yes" } else { "No" }).to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| format!("• {}", value_text(item)))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", humanize_key(k), value_text(v)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_json_falls_back_to_raw() {
        let raw = "{\"findings\": \"no fracture\"";
        assert_eq!(ReportContent::parse(raw), ReportContent::Raw(raw.to_string()));
    }

    #[test]
    fn test_plain_text_is_raw() {
        let raw = "Lungs are clear. No acute findings.";
        assert_eq!(ReportContent::parse(raw), ReportContent::Raw(raw.to_string()));
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(ReportContent::parse(""), ReportContent::Empty);
        assert_eq!(ReportContent::parse("  \n"), ReportContent::Empty);
    }

    #[test]
    fn test_object_becomes_sections() {
        let raw = r#"{"findings":"Small nodule","impression":"Benign","followUp":true}"#;
        let ReportContent::Sections(sections) = ReportContent::parse(raw) else {
            panic!("expected sections");
        };
        assert_eq!(sections.len(), 3);
        assert!(sections.contains(&ReportSection {
            label: "Findings".to_string(),
            text: "Small nodule".to_string(),
        }));
        assert!(sections.contains(&ReportSection {
            label: "Follow Up".to_string(),
            text: "Yes".to_string(),
        }));
    }

    #[test]
    fn test_sections_keep_written_order() {
        let raw = r#"{"technique":"CT with contrast","findings":"No mass","impression":"Normal study"}"#;
        let ReportContent::Sections(sections) = ReportContent::parse(raw) else {
            panic!("expected sections");
        };
        let labels: Vec<&str> = sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["Technique", "Findings", "Impression"]);
        assert_eq!(
            ReportContent::parse(raw).to_plain_text(),
            "Technique: CT with contrast\nFindings: No mass\nImpression: Normal study"
        );
    }

    #[test]
    fn test_nested_values_flatten() {
        let raw = r#"{"measurements":[1.5, 2],"technique":{"contrast":false}}"#;
        let ReportContent::Sections(sections) = ReportContent::parse(raw) else {
            panic!("expected sections");
        };
        let text_of = |label: &str| sections.iter().find(|s| s.label == label).map(|s| s.text.clone());
        assert_eq!(text_of("Measurements").as_deref(), Some("• 1.5\n• 2"));
        assert_eq!(text_of("Technique").as_deref(), Some("Contrast: No"));
    }

    #[test]
    fn test_json_string_is_unwrapped() {
        assert_eq!(
            ReportContent::parse("\"All clear\""),
            ReportContent::Raw("All clear".to_string())
        );
    }

    #[test]
    fn test_json_array_is_pretty_printed() {
        assert_eq!(ReportContent::parse("[1,2]"), ReportContent::Json("[\n  1,\n  2\n]".to_string()));
    }

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("clinicalHistory"), "Clinical History");
        assert_eq!(humanize_key("clinical_history"), "Clinical History");
        assert_eq!(humanize_key("impression"), "Impression");
        assert_eq!(humanize_key("CT-findings"), "CT Findings");
    }

    #[test]
    fn test_plain_text_export() {
        let content = ReportContent::parse(r#"{"impression":"Normal"}"#);
        assert_eq!(content.to_plain_text(), "Impression: Normal");
    }
}
