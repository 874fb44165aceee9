//! Inbound body collection.

use std::io::Write;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::{BridgeError, BridgeResult};
use crate::producer::{BoxBodyDelegate, EndFn, FlushFn, WriteFn};
use crate::stream::RequestStream;

/// Materializes a pushed body into a [`RequestStream`].
///
/// Writes are appended synchronously and always answer "no backpressure",
/// and flushes always answer "continuation will not be invoked", so the
/// producer is never paused. The stream is handed over when the producer
/// ends without error; an error passed to `end` is forwarded as is.
#[derive(Debug, Default)]
pub struct BodyCollector {
    capacity_hint: usize,
}

impl BodyCollector {
    /// `capacity_hint` presizes the buffer; it never limits the body.
    pub fn with_capacity(capacity_hint: usize) -> Self {
        Self { capacity_hint }
    }

    pub fn capacity_hint(&self) -> usize {
        self.capacity_hint
    }

    /// Drive `delegate` and report the outcome through exactly one of
    /// `on_ready` or `on_error`.
    ///
    /// With no delegate there is no body: `on_ready` runs immediately with
    /// an empty stream. Otherwise the callbacks run on whichever thread the
    /// producer calls `end` from.
    pub fn collect<R, E>(self, delegate: Option<BoxBodyDelegate>, on_ready: R, on_error: E)
    where
        R: FnOnce(RequestStream) + Send + 'static,
        E: FnOnce(BridgeError) + Send + 'static,
    {
        let stream = RequestStream::with_capacity(self.capacity_hint);
        let Some(delegate) = delegate else {
            on_ready(stream);
            return;
        };

        let buffer = Arc::new(Mutex::new(Some(stream)));

        let sink = Arc::clone(&buffer);
        let write: WriteFn = Arc::new(move |chunk| {
            match lock(&sink).as_mut() {
                Some(stream) => {
                    // Writes into a Vec-backed cursor cannot fail.
                    let _ = stream.write_all(&chunk);
                }
                None => warn!(len = chunk.len(), "body chunk arrived after end, dropped"),
            }
            false
        });

        let flush: FlushFn = Arc::new(|_| false);

        let finish = PendingEnd(Some(Box::new(move |error: Option<BridgeError>| {
            let collected = lock(&buffer).take();
            match (error, collected) {
                (None, Some(stream)) => {
                    debug!(len = stream.len(), "request body collected");
                    on_ready(stream);
                }
                (Some(error), _) => {
                    warn!(error = %error, "request body producer failed");
                    on_error(error);
                }
                (None, None) => {}
            }
        })));
        let end: EndFn = Box::new(move |error| finish.complete(error));

        delegate.invoke(write, flush, end, CancellationToken::new());
    }

    /// Like [`collect`](Self::collect) but blocks the calling thread until
    /// the producer ends.
    ///
    /// Each call waits on its own one-shot channel.
    pub fn collect_blocking(self, delegate: Option<BoxBodyDelegate>) -> BridgeResult<RequestStream> {
        let (tx, rx) = mpsc::sync_channel(1);
        let error_tx = tx.clone();
        self.collect(
            delegate,
            move |stream| {
                let _ = tx.send(Ok(stream));
            },
            move |error| {
                let _ = error_tx.send(Err(error));
            },
        );
        rx.recv().map_err(|_| {
            BridgeError::Body("producer dropped the body without ending it".to_string())
        })?
    }
}

/// Completion handler that reports a [`BridgeError::Body`] if the producer
/// drops `end` without calling it.
struct PendingEnd(Option<Box<dyn FnOnce(Option<BridgeError>) + Send>>);

impl PendingEnd {
    fn complete(mut self, error: Option<BridgeError>) {
        if let Some(finish) = self.0.take() {
            finish(error);
        }
    }
}

impl Drop for PendingEnd {
    fn drop(&mut self) {
        if let Some(finish) = self.0.take() {
            warn!("request body producer dropped end without calling it");
            finish(Some(BridgeError::Body(
                "producer dropped the body without ending it".to_string(),
            )));
        }
    }
}

fn lock(buffer: &Mutex<Option<RequestStream>>) -> MutexGuard<'_, Option<RequestStream>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}
