//! Request and response types for the proxy API

use std::collections::BTreeMap;
use std::fmt;

use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::common::{Error, Result};

/// Endpoint path with `{name}` placeholders, relative to the API prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate(&'static str);

impl PathTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self(template)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Split into path segments, substituting placeholders from `vars`
    ///
    /// Values are returned raw; percent-encoding happens when the segments
    /// are appended to a URL.
    pub fn render(&self, vars: &BTreeMap<String, String>) -> Result<Vec<String>> {
        self.0
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                match segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                {
                    Some(name) => vars.get(name).cloned().ok_or_else(|| {
                        Error::Internal(format!(
                            "Path '{}' needs a value for '{}'",
                            self.0, name
                        ))
                    }),
                    None => Ok(segment.to_string()),
                }
            })
            .collect()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One request against the proxy
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: PathTemplate,
    pub vars: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: &'static str) -> Self {
        Self {
            method,
            path: PathTemplate::new(path),
            vars: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(path: &'static str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &'static str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &'static str) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Fill a path placeholder
    pub fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.insert(name.to_string(), value.into());
        self
    }

    /// Attach a JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Segments of the rendered path
    pub fn segments(&self) -> Result<Vec<String>> {
        self.path.render(&self.vars)
    }

    /// Short description for logs and failure messages
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Status and parsed body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Parsed JSON; `null` for an empty body
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The `success` flag of the body, if present
    pub fn success_flag(&self) -> Option<bool> {
        self.body.get("success").and_then(Value::as_bool)
    }

    /// The `error` message of the body, if present
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// String field of the body
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.body.get(name).and_then(Value::as_str)
    }

    /// Require a 2xx status, turning anything else into a protocol error
    /// that carries the body's `error` field when present.
    pub fn require_success(&self) -> Result<&Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::http_status(
                self.status.as_u16(),
                self.error_message().unwrap_or("Unknown error"),
            ))
        }
    }

    /// Require a 2xx status and `success: true` in the body
    pub fn require_accepted(&self) -> Result<&Self> {
        self.require_success()?;
        match self.success_flag() {
            Some(true) => Ok(self),
            _ => Err(Error::Rejected(
                self.error_message().unwrap_or("Unknown error").to_string(),
            )),
        }
    }

    /// Require a 2xx status and reject an explicit `success: false`
    pub fn require_not_rejected(&self) -> Result<&Self> {
        self.require_success()?;
        if self.success_flag() == Some(false) {
            return Err(Error::Rejected(
                self.error_message().unwrap_or("Unknown error").to_string(),
            ));
        }
        Ok(self)
    }
}
