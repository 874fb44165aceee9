//! Body bridge between a push-style host body contract and pull-style
//! request handling.
//!
//! The host hands bodies around as a [`BodyDelegate`]: a producer that is
//! invoked once with four consumer capabilities (write, flush, end and a
//! [`CancellationToken`]) and pushes bytes into them. Request handling, on
//! the other hand, wants a seekable buffer to read from and a
//! `std::io::Write` sink to render into.
//!
//! # Inbound
//!
//! [`BodyCollector`] consumes a delegate and materializes the pushed bytes
//! into a [`RequestStream`]. Writes never request backpressure, so the
//! inbound path never suspends the producer.
//!
//! # Outbound
//!
//! [`response_body`] turns a [`ContentWriter`] into a delegate. When the
//! host invokes it, the content writer renders into a [`ResponseStream`]
//! whose writes call straight through to the host and block while the
//! host asks for backpressure.
//!
//! # Exactly once
//!
//! [`CompletionGuard`] wraps completion callbacks that several code paths
//! (normal completion, error, cancellation) may race to invoke.

mod cancel;
mod chunk;
mod collector;
mod emitter;
mod error;
mod guard;
mod producer;
mod response_stream;
mod signal;
mod stream;

pub use cancel::CancellationToken;
pub use chunk::{ChunkedBytes, DEFAULT_CHUNK_SIZE};
pub use collector::BodyCollector;
pub use emitter::{ContentWriter, response_body};
pub use error::{BridgeError, BridgeResult};
pub use guard::{CompletionGuard, call_once, call_once_with};
pub use producer::{
    BodyDelegate, BoxBodyDelegate, Continuation, EndFn, FlushFn, WriteFn, from_bytes,
};
pub use response_stream::ResponseStream;
pub use stream::RequestStream;
