//! Mapping between the host environment and the engine's request/response
//! model. Pure functions only.

use hostbridge_body::{BridgeResult, RequestStream};
use http::StatusCode;

use crate::environment::{Environment, keys};
use crate::header::HeaderMap;
use crate::request::{Request, Url};
use crate::response::Response;

/// Everything the engine request needs except the body, which is collected
/// separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParameters {
    pub method: String,
    pub url: Url,
    pub headers: HeaderMap,
    /// Advertised body length, zero when absent or unusable.
    pub content_length: usize,
}

impl RequestParameters {
    pub fn into_request(self, body: RequestStream) -> Request {
        Request::new(self.method, self.url, self.headers, body)
    }
}

/// Read the request parameters out of the environment.
///
/// Method, scheme, path and headers are required. Path base and query
/// string default to empty.
pub fn request_parameters(env: &Environment) -> BridgeResult<RequestParameters> {
    let headers = env.headers(keys::REQUEST_HEADERS)?.clone();
    let url = request_url(env, &headers)?;
    let content_length = expected_request_length(&headers);
    Ok(RequestParameters {
        method: env.text(keys::REQUEST_METHOD)?.to_string(),
        url,
        headers,
        content_length,
    })
}

fn request_url(env: &Environment, headers: &HeaderMap) -> BridgeResult<Url> {
    let (host_name, port) = match headers.single("Host") {
        Some(host) => {
            let (name, port) = split_host(host);
            (Some(name.to_string()), port)
        }
        None => (None, None),
    };
    Ok(Url {
        scheme: env.text(keys::REQUEST_SCHEME)?.to_string(),
        host_name,
        port,
        base_path: env.text_or_empty(keys::REQUEST_PATH_BASE)?.to_string(),
        path: env.text(keys::REQUEST_PATH)?.to_string(),
        query: env.text_or_empty(keys::REQUEST_QUERY_STRING)?.to_string(),
    })
}

/// Split a `Host` header value into name and numeric port.
///
/// A non-numeric port is left attached to the name. Bracketed IPv6
/// literals keep their brackets.
pub fn split_host(host: &str) -> (&str, Option<u16>) {
    let host = host.trim();
    let Some((name, port)) = host.rsplit_once(':') else {
        return (host, None);
    };
    // An unbracketed IPv6 literal has colons but no port.
    if name.contains(':') && !name.ends_with(']') {
        return (host, None);
    }
    match port.parse::<u16>() {
        Ok(port) => (name, Some(port)),
        Err(_) => (host, None),
    }
}

/// The body length advertised by `Content-Length`.
///
/// Only a header with exactly one value counts. The value may carry
/// surrounding whitespace; anything that is not a non-negative integer
/// yields zero.
pub fn expected_request_length(headers: &HeaderMap) -> usize {
    headers
        .single("Content-Length")
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0)
}

/// Host response headers for `response`.
///
/// Every header becomes a single-element sequence. A non-blank content type
/// replaces any `Content-Type` header, and cookies become one `Set-Cookie`
/// value each.
pub fn response_headers(response: &Response) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in response.headers() {
        headers.set(name.as_str(), [value.as_str()]);
    }
    if !response.content_type().trim().is_empty() {
        headers.set("Content-Type", [response.content_type()]);
    }
    if !response.cookies().is_empty() {
        headers.set(
            "Set-Cookie",
            response.cookies().iter().map(ToString::to_string),
        );
    }
    headers
}

/// `"{code} {reason}"`, e.g. `"404 Not Found"`.
pub fn status_line(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::Cookie;

    fn environment(headers: HeaderMap) -> Environment {
        let mut env = Environment::versioned();
        env.insert_text(keys::REQUEST_METHOD, "POST");
        env.insert_text(keys::REQUEST_SCHEME, "https");
        env.insert_text(keys::REQUEST_PATH_BASE, "/app");
        env.insert_text(keys::REQUEST_PATH, "/items");
        env.insert_text(keys::REQUEST_QUERY_STRING, "q=1");
        env.insert_headers(keys::REQUEST_HEADERS, headers);
        env
    }

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parameters_from_full_environment() {
        let env = environment(headers(&[("Host", "example.com:8443"), ("Content-Length", "42")]));

        let params = request_parameters(&env).unwrap();

        assert_eq!(params.method, "POST");
        assert_eq!(params.content_length, 42);
        assert_eq!(
            params.url,
            Url {
                scheme: "https".into(),
                host_name: Some("example.com".into()),
                port: Some(8443),
                base_path: "/app".into(),
                path: "/items".into(),
                query: "q=1".into(),
            }
        );
    }

    #[test]
    fn optional_keys_default_to_empty() {
        let mut env = Environment::versioned();
        env.insert_text(keys::REQUEST_METHOD, "GET");
        env.insert_text(keys::REQUEST_SCHEME, "http");
        env.insert_text(keys::REQUEST_PATH, "/");
        env.insert_headers(keys::REQUEST_HEADERS, HeaderMap::new());

        let params = request_parameters(&env).unwrap();

        assert_eq!(params.url.base_path, "");
        assert_eq!(params.url.query, "");
        assert_eq!(params.url.host_name, None);
    }

    #[test]
    fn missing_method_is_an_error() {
        let mut env = environment(HeaderMap::new());
        env.insert_headers(keys::REQUEST_METHOD, HeaderMap::new());
        assert!(request_parameters(&env).is_err());

        let mut env = Environment::versioned();
        env.insert_headers(keys::REQUEST_HEADERS, HeaderMap::new());
        assert!(request_parameters(&env).is_err());
    }

    #[test]
    fn content_length_missing_or_unparsable_is_zero() {
        assert_eq!(expected_request_length(&HeaderMap::new()), 0);
        assert_eq!(expected_request_length(&headers(&[("Content-Length", "abc")])), 0);
        assert_eq!(expected_request_length(&headers(&[("Content-Length", "-5")])), 0);
        assert_eq!(
            expected_request_length(&headers(&[("Content-Length", "1"), ("content-length", "2")])),
            0
        );
    }

    #[test]
    fn content_length_tolerates_whitespace() {
        assert_eq!(expected_request_length(&headers(&[("content-length", " 17 ")])), 17);
    }

    #[test]
    fn split_host_variants() {
        assert_eq!(split_host("example.com"), ("example.com", None));
        assert_eq!(split_host("example.com:80"), ("example.com", Some(80)));
        assert_eq!(split_host("example.com:http"), ("example.com:http", None));
        assert_eq!(split_host("[::1]:8080"), ("[::1]", Some(8080)));
        assert_eq!(split_host("::1"), ("::1", None));
        assert_eq!(split_host("[::1]"), ("[::1]", None));
    }

    #[test]
    fn ambiguous_host_header_is_ignored() {
        let env = environment(headers(&[("Host", "a.example"), ("Host", "b.example")]));
        let params = request_parameters(&env).unwrap();
        assert_eq!(params.url.host_name, None);
    }

    #[test]
    fn response_header_translation() {
        let response = Response::text("ignored")
            .with_header("X-Test", "a")
            .with_header("Content-Type", "text/html")
            .with_content_type("text/plain")
            .with_cookie(Cookie::new("first", "1"))
            .with_cookie(Cookie::new("second", "2").http_only());

        let headers = response_headers(&response);

        assert_eq!(headers.get("X-Test").unwrap(), &["a".to_string()]);
        assert_eq!(headers.get("Content-Type").unwrap(), &["text/plain".to_string()]);
        assert_eq!(
            headers.get("Set-Cookie").unwrap(),
            &[
                "first=1; path=/".to_string(),
                "second=2; path=/; HttpOnly".to_string(),
            ]
        );
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn blank_content_type_keeps_header() {
        let response = Response::new(StatusCode::OK)
            .with_header("Content-Type", "application/json")
            .with_content_type("  ");

        let headers = response_headers(&response);
        assert_eq!(headers.single("content-type"), Some("application/json"));
        assert!(!headers.contains("Set-Cookie"));
    }

    #[test]
    fn status_lines() {
        assert_eq!(status_line(StatusCode::OK), "200 OK");
        assert_eq!(status_line(StatusCode::NOT_FOUND), "404 Not Found");
        assert_eq!(status_line(StatusCode::from_u16(599).unwrap()), "599 Unknown");
    }
}
