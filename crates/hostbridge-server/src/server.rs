//! HTTP server that runs an application delegate.
//!
//! `BridgeServer` accepts HTTP/1.1 connections with hyper, builds a host
//! environment per request, and runs the application on a blocking thread.
//! The response body producer is pumped into a bounded channel that feeds
//! hyper's streaming body:
//!
//! ```text
//! producer ──write──▶ [ bounded channel ] ──poll_frame──▶ hyper
//!     ▲                      │
//!     └──continuation────────┘ (once capacity frees up)
//! ```
//!
//! A full channel is reported to the producer as backpressure.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use anyhow::Context;
use bytes::Bytes;
use hostbridge_body::{
    BoxBodyDelegate, BridgeError, CancellationToken, DEFAULT_CHUNK_SIZE, EndFn, FlushFn, WriteFn,
    call_once_with,
};
use hostbridge_host::{AppDelegate, Environment, HeaderMap};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::convert;

/// Body type of every response the server sends.
pub type ResponseBody = BoxBody<Bytes, BridgeError>;

/// Body streaming settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyOptions {
    /// Chunk size used when pushing request bodies to the application.
    pub chunk_size: usize,
    /// Response chunks buffered before the producer is asked to pause.
    pub response_buffer_chunks: usize,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            response_buffer_chunks: 8,
        }
    }
}

/// HTTP/1.1 server for an [`AppDelegate`].
pub struct BridgeServer {
    bind_addr: SocketAddr,
    app: AppDelegate,
    options: BodyOptions,
}

impl BridgeServer {
    pub fn new(bind_addr: SocketAddr, app: AppDelegate) -> Self {
        Self {
            bind_addr,
            app,
            options: BodyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BodyOptions) -> Self {
        self.options = options;
        self
    }

    /// Bind and serve until `shutdown` changes.
    pub async fn serve(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.bind_addr))?;
        self.serve_with_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` changes.
    ///
    /// Spawns a tokio task per connection.
    pub async fn serve_with_listener(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let local_addr = listener.local_addr().context("listener has no address")?;
        info!(addr = %local_addr, "bridge server listening");

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, peer_addr) = accept_result.context("accept failed")?;
                    let app = self.app.clone();
                    let options = self.options;

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let svc = service_fn(move |req: Request<Incoming>| {
                            let app = app.clone();
                            async move {
                                let response = handle(app, options, req).await.unwrap_or_else(|e| {
                                    error!(%peer_addr, error = %format!("{e:#}"), "request failed");
                                    internal_error()
                                });
                                Ok::<_, Infallible>(response)
                            }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, svc).await {
                            error!(%peer_addr, error = %e, "connection error");
                        }
                    });
                }
                _ = shutdown.changed() => {
                    info!("bridge server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Run one HTTP request through `app`.
pub async fn handle<B>(
    app: AppDelegate,
    options: BodyOptions,
    req: Request<B>,
) -> anyhow::Result<Response<ResponseBody>>
where
    B: Body<Data = Bytes>,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .context("failed to read request body")?
        .to_bytes();
    debug!(method = %parts.method, path = %parts.uri.path(), len = body.len(), "request received");

    let env = convert::environment_from_parts(&parts, body, options.chunk_size);
    match dispatch(app, env).await? {
        Reply::Result {
            status,
            headers,
            body,
        } => {
            let mut response = Response::new(stream_body(body, options.response_buffer_chunks));
            *response.status_mut() = convert::status_from_line(&status);
            *response.headers_mut() = convert::response_headers(&headers);
            Ok(response)
        }
        Reply::Error(e) => Err(e).context("application reported an error"),
    }
}

enum Reply {
    Result {
        status: String,
        headers: HeaderMap,
        body: BoxBodyDelegate,
    },
    Error(BridgeError),
}

/// Call the application on a blocking thread and wait for its answer.
async fn dispatch(app: AppDelegate, env: Environment) -> anyhow::Result<Reply> {
    let (tx, rx) = oneshot::channel();
    let on_result = call_once_with(move |reply: Reply| {
        let _ = tx.send(reply);
    });
    let on_error = on_result.clone();

    tokio::task::spawn_blocking(move || {
        app(
            env,
            Box::new(move |status: String, headers: HeaderMap, body: BoxBodyDelegate| {
                on_result(Reply::Result {
                    status,
                    headers,
                    body,
                })
            }),
            Box::new(move |error: BridgeError| on_error(Reply::Error(error))),
        )
    })
    .await
    .context("application task panicked")?
    .context("application rejected the request")?;

    rx.await
        .context("application dropped the request without answering")
}

/// Stream the body produced by `delegate` through a channel of `buffer`
/// chunks.
fn stream_body(delegate: BoxBodyDelegate, buffer: usize) -> ResponseBody {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let runtime = Handle::current();
    tokio::task::spawn_blocking(move || pump(delegate, tx, runtime));
    ChannelBody { rx }.boxed()
}

/// Invoke `delegate` and forward what it pushes into `tx`. Runs on a
/// blocking thread: writes block while the channel is full.
fn pump(delegate: BoxBodyDelegate, tx: mpsc::Sender<Result<Bytes, BridgeError>>, runtime: Handle) {
    let cancel = CancellationToken::new();

    let sender = tx.clone();
    let client_gone = cancel.clone();
    let write: WriteFn = Arc::new(move |chunk: Bytes| {
        if sender.blocking_send(Ok(chunk)).is_err() {
            if !client_gone.is_cancelled() {
                debug!("client went away, cancelling response body");
            }
            client_gone.cancel();
            return false;
        }
        sender.capacity() == 0
    });

    let sender = tx.clone();
    let flush: FlushFn = Arc::new(move |continuation| {
        let Some(continuation) = continuation else {
            return false;
        };
        let sender = sender.clone();
        runtime.spawn(async move {
            // A reservable permit means the channel has room again.
            if let Ok(permit) = sender.reserve().await {
                drop(permit);
            }
            continuation();
        });
        true
    });

    let end: EndFn = Box::new(move |error| {
        if let Some(error) = error {
            warn!(error = %error, "response body failed");
            let _ = tx.blocking_send(Err(error));
        }
    });

    delegate.invoke(write, flush, end, cancel);
}

/// Response body fed by the pump channel.
struct ChannelBody {
    rx: mpsc::Receiver<Result<Bytes, BridgeError>>,
}

impl Body for ChannelBody {
    type Data = Bytes;
    type Error = BridgeError;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, BridgeError>>> {
        self.rx
            .poll_recv(cx)
            .map(|item| item.map(|chunk| chunk.map(Frame::data)))
    }
}

fn internal_error() -> Response<ResponseBody> {
    let body = Full::new(Bytes::from_static(b"Internal Server Error"))
        .map_err(|never| match never {})
        .boxed();
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbridge_body::response_body;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn default_options() {
        let options = BodyOptions::default();
        assert_eq!(options.chunk_size, 64 * 1024);
        assert_eq!(options.response_buffer_chunks, 8);
    }

    #[tokio::test]
    async fn channel_body_streams_every_chunk_with_backpressure() {
        let delegate = response_body(
            Box::new(|sink: &mut dyn Write| -> hostbridge_body::BridgeResult<()> {
                for i in 0..100u8 {
                    sink.write_all(&[i; 100])?;
                }
                Ok(())
            }),
            || {},
        );

        let body = stream_body(delegate, 2);
        let collected = body.collect().await.unwrap().to_bytes();

        assert_eq!(collected.len(), 10_000);
        assert!(collected.chunks(100).enumerate().all(|(i, c)| c.iter().all(|b| *b as usize == i)));
    }

    #[tokio::test]
    async fn channel_body_reports_writer_errors() {
        let delegate = response_body(
            Box::new(|sink: &mut dyn Write| -> hostbridge_body::BridgeResult<()> {
                sink.write_all(b"partial")?;
                Err(BridgeError::ContentWriter("broken template".into()))
            }),
            || {},
        );

        let err = stream_body(delegate, 4).collect().await.unwrap_err();
        assert_eq!(err.to_string(), "content writer failed: broken template");
    }

    #[tokio::test]
    async fn dropped_body_cancels_the_producer() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let d = disposed.clone();
        let delegate = response_body(
            Box::new(|sink: &mut dyn Write| -> hostbridge_body::BridgeResult<()> {
                for _ in 0..10 {
                    sink.write_all(b"chunk")?;
                }
                Ok(())
            }),
            move || {
                d.fetch_add(1, Ordering::SeqCst);
            },
        );

        drop(stream_body(delegate, 1));

        for _ in 0..100 {
            if disposed.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn internal_error_response() {
        let response = internal_error();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"Internal Server Error"));
    }
}
