//! The push-style body contract.
//!
//! A body is represented by a [`BodyDelegate`]: the producer side. The
//! consumer invokes it once, passing in the four capabilities the producer
//! pushes into:
//!
//! - `write(chunk) -> bool`: deliver a chunk. `true` means the consumer is
//!   buffering and would like the producer to call `flush` with a
//!   continuation before sending more.
//! - `flush(continuation) -> bool`: `true` means the consumer took the
//!   continuation and will invoke it once it has drained; `false` means it
//!   never will, and the producer may continue straight away.
//! - `end(error)`: called exactly once, after the last write, with `None`
//!   on success.
//! - a [`CancellationToken`] the consumer may cancel to ask the producer to
//!   stop.

use std::sync::Arc;

use bytes::Bytes;
use tracing::trace;

use crate::cancel::CancellationToken;
use crate::chunk::ChunkedBytes;
use crate::error::BridgeError;
use crate::signal;

/// Resumes a producer paused for backpressure.
pub type Continuation = Box<dyn FnOnce() + Send>;

pub type WriteFn = Arc<dyn Fn(Bytes) -> bool + Send + Sync>;

pub type FlushFn = Arc<dyn Fn(Option<Continuation>) -> bool + Send + Sync>;

pub type EndFn = Box<dyn FnOnce(Option<BridgeError>) + Send>;

/// Producer side of a body.
pub trait BodyDelegate: Send {
    fn invoke(
        self: Box<Self>,
        write: WriteFn,
        flush: FlushFn,
        end: EndFn,
        cancel: CancellationToken,
    );
}

impl<F> BodyDelegate for F
where
    F: FnOnce(WriteFn, FlushFn, EndFn, CancellationToken) + Send,
{
    fn invoke(
        self: Box<Self>,
        write: WriteFn,
        flush: FlushFn,
        end: EndFn,
        cancel: CancellationToken,
    ) {
        (*self)(write, flush, end, cancel)
    }
}

pub type BoxBodyDelegate = Box<dyn BodyDelegate>;

/// A producer that pushes a buffered body in `chunk_size` pieces.
///
/// Honors the consumer's backpressure: when a write asks for it, the
/// producer offers a continuation through `flush` and blocks the invoking
/// thread until it runs. Stops early with [`BridgeError::Cancelled`] once
/// the token is cancelled. A `chunk_size` of zero is treated as one.
pub fn from_bytes(body: Bytes, chunk_size: usize) -> BoxBodyDelegate {
    Box::new(
        move |write: WriteFn, flush: FlushFn, end: EndFn, cancel: CancellationToken| {
            for chunk in ChunkedBytes::new(body, chunk_size) {
                if cancel.is_cancelled() {
                    end(Some(BridgeError::Cancelled));
                    return;
                }
                if !write(chunk) {
                    continue;
                }
                let (continuation, waiter) = signal::continuation();
                if flush(Some(continuation)) {
                    trace!("producer paused for backpressure");
                    if let Err(e) = waiter.wait() {
                        end(Some(e.into()));
                        return;
                    }
                }
            }
            end(None);
        },
    )
}
