use std::fmt;
use std::io::Read;

use bytes::Bytes;
use hostbridge_body::{ChunkedBytes, DEFAULT_CHUNK_SIZE, RequestStream};

use crate::header::HeaderMap;

/// The request URL, assembled from the environment's separate parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Url {
    pub scheme: String,
    pub host_name: Option<String>,
    pub port: Option<u16>,
    pub base_path: String,
    pub path: String,
    pub query: String,
}

impl Url {
    /// The base path joined with the path, as the client requested it.
    pub fn full_path(&self) -> String {
        format!("{}{}", self.base_path, self.path)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(host) = &self.host_name {
            write!(f, "{}://{}", self.scheme, host)?;
            if let Some(port) = self.port {
                write!(f, ":{port}")?;
            }
        }
        write!(f, "{}{}", self.base_path, self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        Ok(())
    }
}

/// The request handed to the engine.
///
/// The body has already been collected in full and rewound to the start.
#[derive(Debug)]
pub struct Request {
    method: String,
    url: Url,
    headers: HeaderMap,
    body: RequestStream,
}

impl Request {
    pub fn new(method: impl Into<String>, url: Url, headers: HeaderMap, body: RequestStream) -> Self {
        Self {
            method: method.into(),
            url,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        &self.url.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &RequestStream {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut RequestStream {
        &mut self.body
    }

    /// Read whatever remains of the body from its current position.
    pub fn read_body(&mut self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.body.len());
        self.body.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Consume the request, keeping only the body.
    pub fn into_body(self) -> Bytes {
        self.body.into_bytes()
    }

    /// Consume the request body as a stream of [`DEFAULT_CHUNK_SIZE`] chunks.
    pub fn into_body_stream(self) -> ChunkedBytes {
        self.into_body_stream_chunked(DEFAULT_CHUNK_SIZE)
    }

    pub fn into_body_stream_chunked(self, chunk_size: usize) -> ChunkedBytes {
        self.body.into_chunks(chunk_size)
    }
}
