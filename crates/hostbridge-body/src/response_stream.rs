use std::io::{self, Write};

use bytes::Bytes;
use tracing::trace;

use crate::error::BridgeError;
use crate::producer::{FlushFn, WriteFn};
use crate::signal;

type OnComplete = Box<dyn FnOnce(Option<BridgeError>) + Send>;

/// Blocking `Write` sink over the host's push-style write/flush callbacks.
///
/// Each `write` copies the buffer into a chunk and hands it to the host.
/// When the host answers that it is buffering, the stream offers a
/// continuation through `flush` and parks the writing thread until the host
/// runs it. If the host declines the continuation, the write returns at once.
///
/// There is no timeout: a host that keeps a continuation without ever
/// invoking it stalls the writer. Dropping the continuation unparks the
/// writer with a `BrokenPipe` error instead.
///
/// [`dispose`](Self::dispose) completes the body and is idempotent; `Drop`
/// calls it.
pub struct ResponseStream {
    write: WriteFn,
    flush: FlushFn,
    on_complete: Option<OnComplete>,
}

impl ResponseStream {
    pub fn new<F>(write: WriteFn, flush: FlushFn, on_complete: F) -> Self
    where
        F: FnOnce(Option<BridgeError>) + Send + 'static,
    {
        Self {
            write,
            flush,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.on_complete.is_none()
    }

    /// Signal successful completion. Only the first call has an effect.
    pub fn dispose(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(None);
        }
    }

    fn wait_for_drain(&self) -> io::Result<()> {
        let (continuation, waiter) = signal::continuation();
        if (self.flush)(Some(continuation)) {
            trace!("response writer parked for backpressure");
            waiter.wait()?;
        }
        Ok(())
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.is_disposed() {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "response stream already disposed",
            ));
        }
        Ok(())
    }
}

impl Write for ResponseStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        if (self.write)(Bytes::copy_from_slice(buf)) {
            self.wait_for_drain()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        self.wait_for_drain()
    }
}

impl Drop for ResponseStream {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseStream")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
