use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Field-keyed messages returned by a store that rejected a payload.
///
/// Messages are kept exactly as the store sent them. Errors not tied to a
/// field are keyed by [`FieldErrors::NON_FIELD`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub const NON_FIELD: &'static str = "non_field_errors";

    pub fn new() -> Self {
        Self::default()
    }

    /// A single message for a single field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interpret a JSON error body of the shape `{"field": ["msg", ...]}` or
    /// `{"field": "msg"}`. Returns `None` for any other shape.
    pub fn from_json(body: &serde_json::Value) -> Option<Self> {
        let obj = body.as_object()?;
        let mut errors = FieldErrors::new();
        for (field, value) in obj {
            match value {
                serde_json::Value::String(msg) => errors.push(field.clone(), msg.clone()),
                serde_json::Value::Array(items) => {
                    for item in items {
                        match item {
                            serde_json::Value::String(msg) => {
                                errors.push(field.clone(), msg.clone())
                            }
                            other => errors.push(field.clone(), other.to_string()),
                        }
                    }
                }
                _ => return None,
            }
        }
        if errors.is_empty() {
            None
        } else {
            Some(errors)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(" "))?;
        }
        Ok(())
    }
}

/// All errors that can be returned by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No credential, or the store did not accept it. Distinct from
    /// [`StoreError::Network`] so callers can prompt for sign-in.
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    /// The credential was accepted but does not permit this call.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The record targeted by an update or delete no longer exists.
    #[error("record not found: {kind}/{id}")]
    NotFound { kind: String, id: String },

    /// The store validated the payload and rejected it.
    #[error("rejected: {0}")]
    Rejected(FieldErrors),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The store answered with something the client cannot interpret.
    #[error("unexpected store response (status {status}): {message}")]
    Unexpected { status: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_accepts_lists_and_strings() {
        let body = serde_json::json!({
            "username": ["A user with that username already exists."],
            "detail": "Bad input"
        });
        let errors = FieldErrors::from_json(&body).unwrap();
        assert_eq!(
            errors.get("username").unwrap(),
            &["A user with that username already exists.".to_string()]
        );
        assert_eq!(errors.get("detail").unwrap(), &["Bad input".to_string()]);
    }

    #[test]
    fn from_json_rejects_other_shapes() {
        assert!(FieldErrors::from_json(&serde_json::json!([1, 2])).is_none());
        assert!(FieldErrors::from_json(&serde_json::json!({"x": 3})).is_none());
        assert!(FieldErrors::from_json(&serde_json::json!({})).is_none());
    }

    #[test]
    fn serializes_as_plain_map() {
        let errors = FieldErrors::single("date", "This field is required.");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({"date": ["This field is required."]})
        );
    }
}
