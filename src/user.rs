//! User payloads exchanged with the remote authentication service.
//!
//! `CurrentUser` is an opaque attribute bag: whatever JSON object the
//! service returns is kept verbatim and no attribute is validated here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The authenticated user as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrentUser(Map<String, Value>);

impl CurrentUser {
    /// Decode a response body. `null` (or an empty body) means "no user".
    ///
    /// # Errors
    ///
    /// Returns the decode error message when the body is neither a JSON
    /// object nor `null`.
    pub fn from_response_body(body: &str) -> Result<Option<Self>, String> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Value>(body).map_err(|e| e.to_string())? {
            Value::Null => Ok(None),
            Value::Object(map) => Ok(Some(Self(map))),
            other => Err(format!("expected user object or null, got {}", json_type_name(&other))),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set an attribute on this copy. The session cache is unaffected.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.get("username").and_then(Value::as_str)
    }

    #[must_use]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Account details sent to the create-account endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserDetails {
    pub username: String,
    pub password: String,
    #[serde(rename = "emailAddr", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Any additional fields the service accepts.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserDetails {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[cfg(test)]
#[path = "user_test.rs"]
mod tests;
