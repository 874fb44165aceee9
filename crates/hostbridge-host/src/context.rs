use std::fmt;

use tracing::trace;

use crate::response::Response;

type Disposable = Box<dyn FnOnce() + Send>;

/// Per-request resources released once the response body is done.
///
/// [`dispose`](Self::dispose) runs every registered action in registration
/// order, once. Dropping undisposed `Disposables` disposes them.
#[derive(Default)]
pub struct Disposables {
    actions: Vec<Disposable>,
}

impl Disposables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.actions.push(Box::new(action));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn dispose(&mut self) {
        let actions = std::mem::take(&mut self.actions);
        if !actions.is_empty() {
            trace!(count = actions.len(), "disposing request resources");
        }
        for action in actions {
            action();
        }
    }
}

impl Drop for Disposables {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Disposables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposables")
            .field("pending", &self.actions.len())
            .finish()
    }
}

/// The engine's result for one request: the response and the resources to
/// release after it has been streamed.
#[derive(Debug)]
pub struct Context {
    response: Response,
    disposables: Disposables,
}

impl Context {
    pub fn new(response: Response) -> Self {
        Self {
            response,
            disposables: Disposables::new(),
        }
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Run `action` when the context is disposed.
    pub fn on_dispose<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.disposables.register(action);
    }

    pub fn dispose(&mut self) {
        self.disposables.dispose();
    }

    pub fn into_parts(self) -> (Response, Disposables) {
        (self.response, self.disposables)
    }
}

impl From<Response> for Context {
    fn from(response: Response) -> Self {
        Self::new(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn dispose_runs_actions_in_order_once() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = Context::new(Response::new(StatusCode::OK));
        for i in 0..3 {
            let order = order.clone();
            ctx.on_dispose(move || order.lock().unwrap().push(i));
        }

        ctx.dispose();
        ctx.dispose();

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn dropping_disposables_disposes() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut ctx = Context::new(Response::new(StatusCode::OK));
        let c = count.clone();
        ctx.on_dispose(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let (_response, disposables) = ctx.into_parts();
        assert_eq!(disposables.len(), 1);
        drop(disposables);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_dispose_then_drop_runs_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut disposables = Disposables::new();
        let c = count.clone();
        disposables.register(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        disposables.dispose();
        drop(disposables);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
