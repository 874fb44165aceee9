//! The request-handling engine and how it is bootstrapped.

use std::sync::Arc;

use hostbridge_body::{BridgeError, BridgeResult};

use crate::context::Context;
use crate::request::Request;
use crate::response::Response;

/// Receives the engine's result for one request.
pub type OnResult = Box<dyn FnOnce(Context) + Send>;

/// Receives the engine's failure for one request.
pub type OnError = Box<dyn FnOnce(BridgeError) + Send>;

/// Turns a request into a response, possibly asynchronously.
///
/// An engine calls exactly one of `on_result` or `on_error`, from any
/// thread and at any later time. It may also fail synchronously by
/// returning an error (or panicking); the host forwards that to the same
/// error path.
pub trait Engine: Send + Sync {
    fn handle_request(&self, request: Request, on_result: OnResult, on_error: OnError)
    -> BridgeResult<()>;
}

impl<E: Engine + ?Sized> Engine for Arc<E> {
    fn handle_request(
        &self,
        request: Request,
        on_result: OnResult,
        on_error: OnError,
    ) -> BridgeResult<()> {
        (**self).handle_request(request, on_result, on_error)
    }
}

/// An engine backed by a synchronous handler function.
pub struct FnEngine<F> {
    handler: F,
}

impl<F> FnEngine<F>
where
    F: Fn(Request) -> BridgeResult<Response> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F> Engine for FnEngine<F>
where
    F: Fn(Request) -> BridgeResult<Response> + Send + Sync,
{
    fn handle_request(
        &self,
        request: Request,
        on_result: OnResult,
        on_error: OnError,
    ) -> BridgeResult<()> {
        match (self.handler)(request) {
            Ok(response) => on_result(Context::new(response)),
            Err(error) => on_error(error),
        }
        Ok(())
    }
}

/// Prepares an application and hands out its engine.
///
/// The host calls [`initialise`](Self::initialise) once, then
/// [`engine`](Self::engine).
pub trait Bootstrapper {
    fn initialise(&mut self) -> BridgeResult<()>;

    fn engine(&mut self) -> BridgeResult<Arc<dyn Engine>>;
}

/// A bootstrapper around an already built engine.
pub struct StaticBootstrapper {
    engine: Arc<dyn Engine>,
    initialised: bool,
}

impl StaticBootstrapper {
    pub fn new(engine: impl Engine + 'static) -> Self {
        Self {
            engine: Arc::new(engine),
            initialised: false,
        }
    }
}

impl Bootstrapper for StaticBootstrapper {
    fn initialise(&mut self) -> BridgeResult<()> {
        self.initialised = true;
        Ok(())
    }

    fn engine(&mut self) -> BridgeResult<Arc<dyn Engine>> {
        if !self.initialised {
            return Err(BridgeError::Bootstrap(
                "engine requested before initialise".to_string(),
            ));
        }
        Ok(Arc::clone(&self.engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderMap;
    use crate::request::Url;
    use hostbridge_body::RequestStream;
    use http::StatusCode;
    use std::sync::mpsc;

    fn request(path: &str) -> Request {
        let url = Url {
            path: path.to_string(),
            ..Url::default()
        };
        Request::new("GET", url, HeaderMap::new(), RequestStream::new())
    }

    fn echo_path() -> FnEngine<impl Fn(Request) -> BridgeResult<Response> + Send + Sync> {
        FnEngine::new(|req: Request| {
            if req.path() == "/fail" {
                return Err(BridgeError::Engine("no route".into()));
            }
            Ok(Response::text(req.path().to_string()))
        })
    }

    #[test]
    fn fn_engine_reports_results() {
        let (tx, rx) = mpsc::channel();
        let err_tx = tx.clone();
        echo_path()
            .handle_request(
                request("/ok"),
                Box::new(move |ctx| tx.send(Ok(ctx.response().status())).unwrap()),
                Box::new(move |e| err_tx.send(Err(e.to_string())).unwrap()),
            )
            .unwrap();

        assert_eq!(rx.recv().unwrap(), Ok(StatusCode::OK));
    }

    #[test]
    fn fn_engine_reports_errors() {
        let (tx, rx) = mpsc::channel();
        let err_tx = tx.clone();
        echo_path()
            .handle_request(
                request("/fail"),
                Box::new(move |ctx| tx.send(Ok(ctx.response().status())).unwrap()),
                Box::new(move |e| err_tx.send(Err(e.to_string())).unwrap()),
            )
            .unwrap();

        assert_eq!(rx.recv().unwrap(), Err("engine error: no route".to_string()));
    }

    #[test]
    fn static_bootstrapper_requires_initialise() {
        let mut bootstrapper = StaticBootstrapper::new(echo_path());
        assert!(matches!(bootstrapper.engine(), Err(BridgeError::Bootstrap(_))));

        bootstrapper.initialise().unwrap();
        assert!(bootstrapper.engine().is_ok());
    }
}
