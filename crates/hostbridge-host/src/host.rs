//! The host entry point.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use hostbridge_body::{
    BodyCollector, BoxBodyDelegate, BridgeError, BridgeResult, CompletionGuard, response_body,
};
use tracing::{Span, debug, debug_span, error, trace, warn};

use crate::config::HostConfig;
use crate::context::Context;
use crate::engine::{Bootstrapper, Engine};
use crate::environment::{Environment, SUPPORTED_VERSION};
use crate::header::HeaderMap;
use crate::request::Request;
use crate::translate;

/// Receives the status line, response headers and body producer.
pub type ResultCallback = Box<dyn FnOnce(String, HeaderMap, BoxBodyDelegate) + Send>;

/// Receives a failure that happened after the request was accepted.
pub type ErrorCallback = Box<dyn FnOnce(BridgeError) + Send>;

type SharedError = Arc<CompletionGuard<BridgeError>>;

/// Runs an [`Engine`] behind the host contract.
///
/// Each call to [`process_request`](Self::process_request) walks one
/// request through: version check, environment translation, body
/// collection (skipped when there is no body), engine invocation, and
/// response translation. The response body is produced later, when the
/// host invokes the delegate handed to its result callback.
#[derive(Clone)]
pub struct BridgeHost {
    engine: Arc<dyn Engine>,
    config: HostConfig,
}

impl BridgeHost {
    /// Initialise `bootstrapper` and take its engine.
    pub fn new<B: Bootstrapper>(mut bootstrapper: B) -> BridgeResult<Self> {
        bootstrapper.initialise()?;
        let engine = bootstrapper.engine()?;
        debug!("bridge host bootstrapped");
        Ok(Self::from_engine(engine))
    }

    pub fn from_engine(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            config: HostConfig::default(),
        }
    }

    pub fn with_config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Handle one request from the host.
    ///
    /// An unsupported contract version or an environment that cannot be
    /// translated is returned as `Err` before anything else happens. From
    /// then on every outcome goes to exactly one of `on_result` or
    /// `on_error`, possibly on another thread.
    pub fn process_request(
        &self,
        mut env: Environment,
        on_result: ResultCallback,
        on_error: ErrorCallback,
    ) -> BridgeResult<()> {
        check_version(&env)?;
        let params = translate::request_parameters(&env)?;
        let body = env.take_body()?;

        let span = debug_span!(
            "request",
            method = %params.method,
            path = %params.url.path,
        );
        let _entered = span.enter();
        trace!(has_body = body.is_some(), "environment translated");

        let on_error: SharedError = Arc::new(CompletionGuard::new(on_error));
        let collector = BodyCollector::with_capacity(self.config.capacity_hint(params.content_length));

        let host = self.clone();
        let engine_error = Arc::clone(&on_error);
        let ready_span = span.clone();
        collector.collect(
            body,
            move |stream| {
                let _entered = ready_span.enter();
                trace!(len = stream.len(), "request body ready");
                host.invoke_engine(params.into_request(stream), on_result, engine_error);
            },
            move |error| {
                warn!(error = %error, "request body failed, engine not invoked");
                on_error.invoke(error);
            },
        );
        Ok(())
    }

    fn invoke_engine(&self, mut request: Request, on_result: ResultCallback, on_error: SharedError) {
        request.body_mut().rewind();

        let span = Span::current();
        let failure = Arc::clone(&on_error);
        let outcome = Arc::new(CompletionGuard::new(
            move |outcome: Result<Context, BridgeError>| {
                let _entered = span.enter();
                match outcome {
                    Ok(context) => respond(context, on_result),
                    Err(error) => {
                        warn!(error = %error, "engine failed");
                        failure.invoke(error);
                    }
                }
            },
        ));

        let on_success = Arc::clone(&outcome);
        let on_failure = Arc::clone(&outcome);
        debug!("invoking engine");
        let invoked = panic::catch_unwind(AssertUnwindSafe(|| {
            self.engine.handle_request(
                request,
                Box::new(move |context| {
                    on_success.invoke(Ok(context));
                }),
                Box::new(move |error| {
                    on_failure.invoke(Err(error));
                }),
            )
        }))
        .unwrap_or_else(|payload| Err(BridgeError::from_panic(payload)));

        if let Err(error) = invoked {
            if outcome.is_spent() {
                // The engine already answered; the failure came from answering.
                error!(error = %error, "request failed after the engine answered");
                on_error.invoke(error);
            } else {
                outcome.invoke(Err(error));
            }
        }
    }
}

impl std::fmt::Debug for BridgeHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHost")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn check_version(env: &Environment) -> BridgeResult<()> {
    match env.version() {
        Some(SUPPORTED_VERSION) => Ok(()),
        other => {
            warn!(version = ?other, "rejecting request from unsupported host");
            Err(BridgeError::UnsupportedVersion(other.map(str::to_string)))
        }
    }
}

fn respond(context: Context, on_result: ResultCallback) {
    let status = translate::status_line(context.response().status());
    let headers = translate::response_headers(context.response());
    debug!(status = %status, "engine responded");

    let (response, mut disposables) = context.into_parts();
    let body = response_body(response.into_contents(), move || disposables.dispose());
    on_result(status, headers, body);
}
