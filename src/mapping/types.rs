//! Mapping record definitions.
//!
//! These mirror the on-disk JSON format:
//!
//! ```json
//! [
//!   {
//!     "path": "/login",
//!     "method": "POST",
//!     "response": {
//!       "statusCode": 200,
//!       "headers": { "Content-Type": "application/json" },
//!       "body": { "token": "abc" }
//!     }
//!   }
//! ]
//! ```

use std::collections::BTreeMap;
use std::fmt;

use axum::body::Bytes;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::value::RawValue;

/// A single declarative method + path → response rule.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MappingRecord {
    /// Path relative to the configured prefix (e.g. `/login`).
    pub path: String,

    /// HTTP method as written in the source. Matching is case-insensitive.
    pub method: String,

    /// The canned response to serve.
    pub response: MockResponse,
}

impl MappingRecord {
    pub fn new(method: impl Into<String>, path: impl Into<String>, response: MockResponse) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            response,
        }
    }
}

/// Declared response of a mapping.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockResponse {
    pub status_code: u16,

    /// Sorted so that header names differing only in case resolve the same way on every build.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RawBody>,
}

impl MockResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<RawBody>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Response body exactly as it appeared in the source.
///
/// A JSON body keeps its original bytes, whitespace included; a string literal
/// such as `"ok"` keeps its quotes. Nothing is ever re-encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct RawBody(Bytes);

impl RawBody {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Cheap handle to the underlying buffer.
    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RawBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawBody({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl From<&'static str> for RawBody {
    fn from(s: &'static str) -> Self {
        Self(Bytes::from_static(s.as_bytes()))
    }
}

impl From<String> for RawBody {
    fn from(s: String) -> Self {
        Self(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RawBody {
    fn from(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }
}

impl From<Bytes> for RawBody {
    fn from(b: Bytes) -> Self {
        Self(b)
    }
}

impl<'de> Deserialize<'de> for RawBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Box<RawValue> = Deserialize::deserialize(deserializer)?;
        Ok(Self(Bytes::from(raw.get().to_owned())))
    }
}

impl Serialize for RawBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Bodies built in code may be plain text; those round-trip as a JSON string.
        let text = String::from_utf8_lossy(&self.0);
        match RawValue::from_string(text.clone().into_owned()) {
            Ok(raw) => raw.serialize(serializer),
            Err(_) => serializer.serialize_str(&text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_kept_verbatim() {
        let json = r#"[{"path":"/a","method":"get","response":{"statusCode":200,"body":{ "message" : "ok" }}}]"#;
        let records: Vec<MappingRecord> = serde_json::from_str(json).unwrap();

        let body = records[0].response.body.as_ref().unwrap();
        assert_eq!(body.as_bytes(), br#"{ "message" : "ok" }"#);
        assert_eq!(records[0].method, "get");
    }

    #[test]
    fn test_string_literal_body_keeps_quotes() {
        let json = r#"{"statusCode":200,"body":"ok"}"#;
        let response: MockResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.body.unwrap().as_bytes(), br#""ok""#);
    }

    #[test]
    fn test_optional_fields() {
        let response: MockResponse = serde_json::from_str(r#"{"statusCode":204}"#).unwrap();

        assert_eq!(response.status_code, 204);
        assert!(response.headers.is_empty());
        assert!(response.body.is_none());
    }

    #[test]
    fn test_duplicate_header_keys_last_wins() {
        let json = r#"{"statusCode":200,"headers":{"X-Mode":"first","X-Mode":"second"}}"#;
        let response: MockResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.headers.get("X-Mode").map(String::as_str), Some("second"));
    }

    #[test]
    fn test_missing_status_is_rejected() {
        assert!(serde_json::from_str::<MockResponse>(r#"{"body":"ok"}"#).is_err());
        assert!(serde_json::from_str::<MockResponse>(r#"{"statusCode":"200"}"#).is_err());
    }

    #[test]
    fn test_plain_text_body_serializes_as_string() {
        let response = MockResponse::new(200).body("not json".to_string());
        let out = serde_json::to_string(&response).unwrap();

        assert_eq!(out, r#"{"statusCode":200,"body":"not json"}"#);
    }
}
