//! The host environment: a string-keyed map of request values.

use std::collections::HashMap;

use hostbridge_body::{BoxBodyDelegate, BridgeError, BridgeResult};

use crate::header::HeaderMap;

/// Environment keys defined by the host contract.
pub mod keys {
    pub const VERSION: &str = "owin.Version";
    pub const REQUEST_METHOD: &str = "owin.RequestMethod";
    pub const REQUEST_SCHEME: &str = "owin.RequestScheme";
    pub const REQUEST_PATH_BASE: &str = "owin.RequestPathBase";
    pub const REQUEST_PATH: &str = "owin.RequestPath";
    pub const REQUEST_QUERY_STRING: &str = "owin.RequestQueryString";
    pub const REQUEST_HEADERS: &str = "owin.RequestHeaders";
    pub const REQUEST_BODY: &str = "owin.RequestBody";
}

/// The only host contract version this bridge speaks.
pub const SUPPORTED_VERSION: &str = "1.0";

pub enum EnvValue {
    Text(String),
    Headers(HeaderMap),
    Body(BoxBodyDelegate),
}

impl std::fmt::Debug for EnvValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Headers(h) => f.debug_tuple("Headers").field(h).finish(),
            Self::Body(_) => f.write_str("Body(..)"),
        }
    }
}

/// Per-request environment handed over by the host.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, EnvValue>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment already carrying the supported contract version.
    pub fn versioned() -> Self {
        let mut env = Self::new();
        env.insert_text(keys::VERSION, SUPPORTED_VERSION);
        env
    }

    pub fn insert(&mut self, key: impl Into<String>, value: EnvValue) -> Option<EnvValue> {
        self.values.insert(key.into(), value)
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), EnvValue::Text(value.into()));
    }

    pub fn insert_headers(&mut self, key: impl Into<String>, headers: HeaderMap) {
        self.values.insert(key.into(), EnvValue::Headers(headers));
    }

    pub fn set_body(&mut self, body: BoxBodyDelegate) {
        self.values
            .insert(keys::REQUEST_BODY.to_string(), EnvValue::Body(body));
    }

    pub fn remove(&mut self, key: &str) -> Option<EnvValue> {
        self.values.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&EnvValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The text value under `key`.
    pub fn text(&self, key: &'static str) -> BridgeResult<&str> {
        match self.values.get(key) {
            Some(EnvValue::Text(s)) => Ok(s),
            Some(_) => Err(BridgeError::InvalidValue {
                key,
                expected: "text",
            }),
            None => Err(BridgeError::MissingKey(key)),
        }
    }

    /// The text value under `key`, or `""` when absent.
    pub fn text_or_empty(&self, key: &'static str) -> BridgeResult<&str> {
        match self.values.get(key) {
            None => Ok(""),
            Some(_) => self.text(key),
        }
    }

    pub fn headers(&self, key: &'static str) -> BridgeResult<&HeaderMap> {
        match self.values.get(key) {
            Some(EnvValue::Headers(h)) => Ok(h),
            Some(_) => Err(BridgeError::InvalidValue {
                key,
                expected: "header map",
            }),
            None => Err(BridgeError::MissingKey(key)),
        }
    }

    /// The version string, if the host supplied one as text.
    pub fn version(&self) -> Option<&str> {
        match self.values.get(keys::VERSION) {
            Some(EnvValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Remove the request body producer. `None` means the request has no body.
    pub fn take_body(&mut self) -> BridgeResult<Option<BoxBodyDelegate>> {
        match self.values.remove(keys::REQUEST_BODY) {
            Some(EnvValue::Body(body)) => Ok(Some(body)),
            Some(other) => {
                self.values.insert(keys::REQUEST_BODY.to_string(), other);
                Err(BridgeError::InvalidValue {
                    key: keys::REQUEST_BODY,
                    expected: "body delegate",
                })
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbridge_body::from_bytes;

    #[test]
    fn versioned_environment_reports_version() {
        let env = Environment::versioned();
        assert_eq!(env.version(), Some("1.0"));
    }

    #[test]
    fn text_lookup_errors() {
        let mut env = Environment::new();
        env.insert_headers(keys::REQUEST_HEADERS, HeaderMap::new());

        assert!(matches!(
            env.text(keys::REQUEST_METHOD),
            Err(BridgeError::MissingKey("owin.RequestMethod"))
        ));
        assert!(matches!(
            env.text(keys::REQUEST_HEADERS),
            Err(BridgeError::InvalidValue { expected: "text", .. })
        ));
    }

    #[test]
    fn text_or_empty_defaults_missing_keys() {
        let mut env = Environment::new();
        assert_eq!(env.text_or_empty(keys::REQUEST_QUERY_STRING).unwrap(), "");

        env.insert_text(keys::REQUEST_QUERY_STRING, "a=1");
        assert_eq!(env.text_or_empty(keys::REQUEST_QUERY_STRING).unwrap(), "a=1");
    }

    #[test]
    fn headers_lookup() {
        let mut env = Environment::new();
        let mut headers = HeaderMap::new();
        headers.append("Host", "example.com");
        env.insert_headers(keys::REQUEST_HEADERS, headers);

        let headers = env.headers(keys::REQUEST_HEADERS).unwrap();
        assert_eq!(headers.single("host"), Some("example.com"));
    }

    #[test]
    fn take_body_removes_the_delegate() {
        let mut env = Environment::new();
        env.set_body(from_bytes(bytes::Bytes::from_static(b"x"), 1));

        assert!(env.take_body().unwrap().is_some());
        assert!(env.take_body().unwrap().is_none());
    }

    #[test]
    fn take_body_rejects_wrong_type() {
        let mut env = Environment::new();
        env.insert_text(keys::REQUEST_BODY, "not a body");

        assert!(env.take_body().is_err());
        assert!(env.contains(keys::REQUEST_BODY));
    }

    #[test]
    fn non_text_version_is_ignored() {
        let mut env = Environment::new();
        env.insert_headers(keys::VERSION, HeaderMap::new());
        assert_eq!(env.version(), None);
    }
}
