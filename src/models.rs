use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /validate-display-name`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateDisplayNameRequest {
    /// Accepted as any JSON value; non-strings are stringified before validation
    #[serde(default)]
    pub display_name: Value,
    #[serde(default)]
    pub caller_identity: Option<String>,
}

impl ValidateDisplayNameRequest {
    /// Missing and `null` both read as an empty name
    pub fn display_name_text(&self) -> String {
        match &self.display_name {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
