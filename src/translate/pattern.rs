//! Field extraction from human-readable tool output.
//!
//! Some tools print labeled lines instead of JSON (`Account: 1234567`,
//! `ACME-12 | Fix login`). A `TextRule` is an ordered list of `FieldRule`s;
//! each one pulls a single named field out of the text with a regex.

use regex::Regex;
use serde_json::{Map, Value};

use crate::errors::{Result, ToolVaultError};

/// How a field's matches become a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// First capture group of the first match, trimmed.
    First,
    /// First capture group of the first match, split on commas.
    List,
    /// Every match, each as an object of its named groups. Never missing:
    /// no matches is an empty array.
    All,
    /// The whole first match.
    Whole,
}

/// One named field of a `TextRule`.
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: String,
    regex: Regex,
    capture: Capture,
    required: bool,
}

impl FieldRule {
    /// Build an optional field. Fails with `ConfigError` on a bad pattern.
    pub fn new(name: impl Into<String>, pattern: &str, capture: Capture) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern)
            .map_err(|e| ToolVaultError::ConfigError(format!("pattern for '{name}': {e}")))?;
        Ok(Self {
            name,
            regex,
            capture,
            required: false,
        })
    }

    /// Mark the field as required; its absence fails the whole rule.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn extract(&self, text: &str) -> Option<Value> {
        match self.capture {
            Capture::Whole => self
                .regex
                .find(text)
                .map(|m| Value::String(m.as_str().trim().to_string())),
            Capture::First => self
                .regex
                .captures(text)
                .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
                .map(|m| Value::String(m.as_str().trim().to_string())),
            Capture::List => self.regex.captures(text).and_then(|caps| {
                let m = caps.get(1).or_else(|| caps.get(0))?;
                let items = m
                    .as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect();
                Some(Value::Array(items))
            }),
            Capture::All => Some(Value::Array(self.all_matches(text))),
        }
    }

    fn all_matches(&self, text: &str) -> Vec<Value> {
        let names: Vec<&str> = self.regex.capture_names().flatten().collect();
        self.regex
            .captures_iter(text)
            .map(|caps| {
                if names.is_empty() {
                    let m = caps.get(1).or_else(|| caps.get(0));
                    return Value::String(m.map_or("", |m| m.as_str()).trim().to_string());
                }
                let object: Map<String, Value> = names
                    .iter()
                    .map(|name| {
                        let value = caps
                            .name(name)
                            .map_or(Value::Null, |m| Value::String(m.as_str().trim().to_string()));
                        (name.to_string(), value)
                    })
                    .collect();
                Value::Object(object)
            })
            .collect()
    }
}

/// An ordered set of field rules applied to one text.
#[derive(Debug, Clone, Default)]
pub struct TextRule {
    fields: Vec<FieldRule>,
}

impl TextRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    /// Apply every field rule to `text`.
    ///
    /// Missing optional fields are `null`. A missing required field yields
    /// `Err` with that field's name.
    pub fn extract(&self, text: &str) -> std::result::Result<Map<String, Value>, String> {
        let mut out = Map::new();
        for rule in &self.fields {
            match rule.extract(text) {
                Some(value) => {
                    out.insert(rule.name.clone(), value);
                }
                None if rule.required => return Err(rule.name.clone()),
                None => {
                    out.insert(rule.name.clone(), Value::Null);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bad_pattern_is_config_error() {
        let err = FieldRule::new("x", "(unclosed", Capture::First).unwrap_err();
        assert!(matches!(err, ToolVaultError::ConfigError(_)));
    }

    #[test]
    fn first_capture_is_trimmed() {
        let rule = TextRule::new().field(
            FieldRule::new("account", r"Account[:\s]+(\d+)", Capture::First)
                .unwrap()
                .required(),
        );
        let fields = rule.extract("Discovering...\nAccount: 5551234\n").unwrap();
        assert_eq!(fields["account"], "5551234");
    }

    #[test]
    fn list_splits_on_commas() {
        let rule = TextRule::new()
            .field(FieldRule::new("sbr", r"SBR[:\s]+([^\n]+)", Capture::List).unwrap());
        let fields = rule.extract("SBR: Ansible, OpenShift ,RHEL\n").unwrap();
        assert_eq!(fields["sbr"], json!(["Ansible", "OpenShift", "RHEL"]));
    }

    #[test]
    fn all_collects_named_groups() {
        let rule = TextRule::new().field(
            FieldRule::new(
                "issues",
                r"(?P<id>[A-Z]+-\d+)\s*[|:]\s*(?P<summary>.+)",
                Capture::All,
            )
            .unwrap(),
        );
        let text = "Report for acme\nRFE-101 | Faster boot\nBUG-7: Crash on save\n";
        let fields = rule.extract(text).unwrap();
        assert_eq!(
            fields["issues"],
            json!([
                { "id": "RFE-101", "summary": "Faster boot" },
                { "id": "BUG-7", "summary": "Crash on save" }
            ])
        );
    }

    #[test]
    fn all_with_no_matches_is_empty_list() {
        let rule = TextRule::new()
            .field(FieldRule::new("issues", r"([A-Z]+-\d+)", Capture::All).unwrap().required());
        let fields = rule.extract("nothing to report").unwrap();
        assert_eq!(fields["issues"], json!([]));
    }

    #[test]
    fn whole_match_for_urls() {
        let rule =
            TextRule::new().field(FieldRule::new("url", r"https?://[^\s]+", Capture::Whole).unwrap());
        let fields = rule
            .extract("Posted to https://example.com/reports/42 successfully")
            .unwrap();
        assert_eq!(fields["url"], "https://example.com/reports/42");
    }

    #[test]
    fn missing_optional_is_null_and_required_fails() {
        let optional =
            TextRule::new().field(FieldRule::new("url", r"https?://\S+", Capture::Whole).unwrap());
        assert_eq!(optional.extract("done").unwrap()["url"], Value::Null);

        let required = TextRule::new().field(
            FieldRule::new("account", r"Account[:\s]+(\d+)", Capture::First)
                .unwrap()
                .required(),
        );
        assert_eq!(required.extract("no account here").unwrap_err(), "account");
    }
}
