//! Conversions between hyper's HTTP types and the host environment.

use bytes::Bytes;
use hostbridge_body::from_bytes;
use hostbridge_host::{Environment, HeaderMap, keys};
use http::header::HOST;
use http::request::Parts;
use http::{HeaderName, HeaderValue, StatusCode};
use tracing::debug;

/// Build the host environment for one HTTP request.
///
/// The path base is always empty: the application is mounted at the root.
/// An empty body is left out of the environment so the application does
/// not wait for one.
pub fn environment_from_parts(parts: &Parts, body: Bytes, chunk_size: usize) -> Environment {
    let mut env = Environment::versioned();
    env.insert_text(keys::REQUEST_METHOD, parts.method.as_str());
    env.insert_text(keys::REQUEST_SCHEME, parts.uri.scheme_str().unwrap_or("http"));
    env.insert_text(keys::REQUEST_PATH_BASE, "");
    env.insert_text(keys::REQUEST_PATH, parts.uri.path());
    env.insert_text(keys::REQUEST_QUERY_STRING, parts.uri.query().unwrap_or(""));
    env.insert_headers(keys::REQUEST_HEADERS, request_headers(parts));
    if !body.is_empty() {
        env.set_body(from_bytes(body, chunk_size));
    }
    env
}

/// Request headers as a host header map. Values that are not visible ASCII
/// are converted lossily. A missing `Host` is filled in from the URI
/// authority when there is one.
pub fn request_headers(parts: &Parts) -> HeaderMap {
    let mut headers: HeaderMap = parts
        .headers
        .iter()
        .map(|(name, value)| {
            let value = match value.to_str() {
                Ok(v) => v.to_string(),
                Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            };
            (name.as_str().to_string(), value)
        })
        .collect();
    if !headers.contains(HOST.as_str()) {
        if let Some(authority) = parts.uri.authority() {
            headers.append(HOST.as_str(), authority.as_str());
        }
    }
    headers
}

/// Parse the numeric code at the start of a status line.
///
/// Anything unparsable becomes `500 Internal Server Error`.
pub fn status_from_line(line: &str) -> StatusCode {
    line.split_whitespace()
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Convert host response headers, skipping names or values hyper would
/// reject.
pub fn response_headers(headers: &HeaderMap) -> http::HeaderMap {
    let mut map = http::HeaderMap::new();
    for header in headers {
        let Ok(name) = HeaderName::from_bytes(header.name.as_bytes()) else {
            debug!(name = %header.name, "dropping response header with invalid name");
            continue;
        };
        for value in &header.values {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    map.append(name.clone(), value);
                }
                Err(_) => debug!(name = %header.name, "dropping invalid response header value"),
            }
        }
    }
    map
}
