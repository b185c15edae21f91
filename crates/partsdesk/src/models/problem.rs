//! Error bodies returned by the service.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One element of a field location, e.g. `["body", "name"]` or `["query", 0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocSegment {
    Index(u64),
    Name(String),
}

impl fmt::Display for LocSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocSegment::Index(i) => write!(f, "{}", i),
            LocSegment::Name(n) => f.write_str(n),
        }
    }
}

/// A field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub loc: Vec<LocSegment>,
    pub msg: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl FieldError {
    /// Builds a field error for a single named field.
    pub fn for_field(field: &str, msg: &str, kind: &str) -> Self {
        Self {
            loc: vec![LocSegment::Name(field.to_string())],
            msg: msg.to_string(),
            kind: kind.to_string(),
        }
    }

    /// Dotted field path without the request-part prefix (`body`, `query`, ...).
    pub fn field(&self) -> String {
        let skip = match self.loc.first() {
            Some(LocSegment::Name(n)) if matches!(n.as_str(), "body" | "query" | "path" | "form") => 1,
            _ => 0,
        };
        self.loc
            .iter()
            .skip(skip)
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field();
        if field.is_empty() {
            f.write_str(&self.msg)
        } else {
            write!(f, "{}: {}", field, self.msg)
        }
    }
}

/// The `detail` member of an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Fields(Vec<FieldError>),
    Message(String),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_body() {
        let body: ErrorBody = serde_json::from_value(json!({
            "detail": [
                {"loc": ["body", "name"], "msg": "field required", "type": "value_error.missing"},
                {"loc": ["query", "items", 2], "msg": "bad", "type": "type_error"}
            ]
        }))
        .unwrap();

        match body.detail {
            ErrorDetail::Fields(fields) => {
                assert_eq!(fields[0].field(), "name");
                assert_eq!(fields[0].to_string(), "name: field required");
                assert_eq!(fields[1].field(), "items.2");
            }
            other => panic!("unexpected detail: {:?}", other),
        }
    }

    #[test]
    fn test_message_body() {
        let body: ErrorBody = serde_json::from_value(json!({"detail": "Job not found"})).unwrap();
        assert_eq!(body.detail, ErrorDetail::Message("Job not found".to_string()));
    }
}
