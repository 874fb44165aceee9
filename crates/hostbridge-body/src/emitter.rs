//! Outbound body emission.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::{BridgeError, BridgeResult};
use crate::guard::CompletionGuard;
use crate::producer::{BoxBodyDelegate, EndFn, FlushFn, WriteFn};
use crate::response_stream::ResponseStream;

/// Renders a response body into the sink it is given.
pub type ContentWriter = Box<dyn FnOnce(&mut dyn Write) -> BridgeResult<()> + Send>;

/// Adapt `contents` into the push-style producer the host expects.
///
/// When the host invokes the returned delegate, `contents` renders into a
/// [`ResponseStream`] over the host's write/flush callbacks, on the
/// invoking thread. Afterwards the host's `end` receives `None`, or the
/// error (or panic) raised by `contents`, followed by `dispose`. Both `end`
/// and `dispose` sit behind completion guards, so neither runs twice no
/// matter which paths race.
///
/// Cancellation only triggers `dispose`; it does not interrupt a write in
/// progress and it does not change what `end` later receives.
pub fn response_body<D>(contents: ContentWriter, dispose: D) -> BoxBodyDelegate
where
    D: FnOnce() + Send + 'static,
{
    Box::new(
        move |write: WriteFn, flush: FlushFn, end: EndFn, cancel: CancellationToken| {
            let call_end = Arc::new(CompletionGuard::new(end));
            let call_dispose = Arc::new(CompletionGuard::new(move |()| dispose()));

            let on_cancel = Arc::clone(&call_dispose);
            cancel.register(move || {
                debug!("response body cancelled by host");
                on_cancel.fire();
            });

            let on_complete = {
                let call_end = Arc::clone(&call_end);
                let call_dispose = Arc::clone(&call_dispose);
                move |error| {
                    call_end.invoke(error);
                    call_dispose.fire();
                }
            };

            let mut stream = ResponseStream::new(write, flush, on_complete);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| contents(&mut stream)))
                .unwrap_or_else(|payload| Err(BridgeError::from_panic(payload)));

            if let Err(error) = outcome {
                warn!(error = %error, "content writer failed");
                call_end.invoke(Some(error));
                call_dispose.fire();
            }
            stream.dispose();
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Host {
        body: Mutex<Vec<u8>>,
        ends: Mutex<Vec<Option<String>>>,
    }

    impl Host {
        fn run(self: &Arc<Self>, delegate: BoxBodyDelegate, cancel: CancellationToken) {
            let host = Arc::clone(self);
            let write: WriteFn = Arc::new(move |chunk: Bytes| {
                host.body.lock().unwrap().extend_from_slice(&chunk);
                false
            });
            let flush: FlushFn = Arc::new(|_| false);
            let host = Arc::clone(self);
            let end: EndFn = Box::new(move |err| {
                host.ends.lock().unwrap().push(err.map(|e| e.to_string()));
            });
            delegate.invoke(write, flush, end, cancel);
        }
    }

    fn counted_dispose() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let disposals = Arc::new(AtomicUsize::new(0));
        let d = disposals.clone();
        (disposals, move || {
            d.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn success_streams_body_then_ends_and_disposes() {
        let host = Arc::new(Host::default());
        let (disposals, dispose) = counted_dispose();
        let contents: ContentWriter = Box::new(|sink| {
            sink.write_all(b"hello ")?;
            sink.write_all(b"world")?;
            Ok(())
        });

        host.run(response_body(contents, dispose), CancellationToken::new());

        assert_eq!(&*host.body.lock().unwrap(), b"hello world");
        assert_eq!(*host.ends.lock().unwrap(), vec![None]);
        assert_eq!(disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn writer_error_is_passed_to_end_once() {
        let host = Arc::new(Host::default());
        let (disposals, dispose) = counted_dispose();
        let contents: ContentWriter = Box::new(|sink| {
            sink.write_all(b"partial")?;
            Err(BridgeError::ContentWriter("template missing".into()))
        });

        host.run(response_body(contents, dispose), CancellationToken::new());

        assert_eq!(
            *host.ends.lock().unwrap(),
            vec![Some("content writer failed: template missing".to_string())]
        );
        assert_eq!(disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn writer_panic_becomes_an_error() {
        let host = Arc::new(Host::default());
        let (disposals, dispose) = counted_dispose();
        let contents: ContentWriter = Box::new(|_| panic!("renderer exploded"));

        host.run(response_body(contents, dispose), CancellationToken::new());

        assert_eq!(
            *host.ends.lock().unwrap(),
            vec![Some("panicked: renderer exploded".to_string())]
        );
        assert_eq!(disposals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancellation_disposes_once() {
        let host = Arc::new(Host::default());
        let (disposals, dispose) = counted_dispose();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let contents: ContentWriter = Box::new(move |sink| {
            sink.write_all(b"before")?;
            trigger.cancel();
            sink.write_all(b" after")?;
            Ok(())
        });

        host.run(response_body(contents, dispose), cancel);

        assert_eq!(disposals.load(Ordering::SeqCst), 1);
        assert_eq!(*host.ends.lock().unwrap(), vec![None]);
        assert_eq!(&*host.body.lock().unwrap(), b"before after");
    }

    #[test]
    fn cancellation_after_completion_is_harmless() {
        let host = Arc::new(Host::default());
        let (disposals, dispose) = counted_dispose();
        let cancel = CancellationToken::new();
        let contents: ContentWriter = Box::new(|sink| Ok(sink.write_all(b"done")?));

        host.run(response_body(contents, dispose), cancel.clone());
        cancel.cancel();

        assert_eq!(disposals.load(Ordering::SeqCst), 1);
        assert_eq!(host.ends.lock().unwrap().len(), 1);
    }
}
