use std::fmt;
use std::io::Write;

use bytes::Bytes;
use hostbridge_body::{BridgeResult, ContentWriter};
use http::StatusCode;

use crate::cookie::Cookie;

/// A response produced by the engine.
///
/// The body is not buffered: `contents` renders it into whatever sink the
/// host provides when the body is streamed.
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    content_type: String,
    cookies: Vec<Cookie>,
    contents: ContentWriter,
}

impl Response {
    /// An empty-bodied response.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            content_type: String::new(),
            cookies: Vec::new(),
            contents: Box::new(|_: &mut dyn Write| -> BridgeResult<()> { Ok(()) }),
        }
    }

    /// A `200 OK` plain-text response.
    pub fn text(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::bytes(StatusCode::OK, Bytes::from(body), "text/plain; charset=utf-8")
    }

    pub fn bytes(status: StatusCode, body: impl Into<Bytes>, content_type: &str) -> Self {
        let body = body.into();
        Self::new(status)
            .with_content_type(content_type)
            .with_contents(move |sink| Ok(sink.write_all(&body)?))
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a header, replacing any earlier value under the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn with_contents<F>(mut self, contents: F) -> Self
    where
        F: FnOnce(&mut dyn Write) -> BridgeResult<()> + Send + 'static,
    {
        self.contents = Box::new(contents);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The content type, empty when none was set.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn into_contents(self) -> ContentWriter {
        self.contents
    }

    /// Run the content writer into a buffer.
    pub fn render(self) -> BridgeResult<Vec<u8>> {
        let mut buf = Vec::new();
        let sink: &mut dyn Write = &mut buf;
        (self.contents)(sink)?;
        Ok(buf)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("content_type", &self.content_type)
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}
