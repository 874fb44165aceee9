use std::sync::Arc;

use hostbridge_body::{BridgeError, BridgeResult};
use tracing::debug;

use crate::engine::Bootstrapper;
use crate::environment::Environment;
use crate::host::{BridgeHost, ErrorCallback, ResultCallback};

/// The application delegate a host server calls once per request.
pub type AppDelegate =
    Arc<dyn Fn(Environment, ResultCallback, ErrorCallback) -> BridgeResult<()> + Send + Sync>;

/// Assembles the application delegate a server runs.
#[derive(Default)]
pub struct AppBuilder {
    app: Option<AppDelegate>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `host` as the terminal application.
    pub fn run(mut self, host: BridgeHost) -> Self {
        debug!(config = ?host.config(), "bridge host registered");
        self.app = Some(Arc::new(
            move |env: Environment, on_result: ResultCallback, on_error: ErrorCallback| {
                host.process_request(env, on_result, on_error)
            },
        ));
        self
    }

    /// Bootstrap a host from `bootstrapper` and register it.
    pub fn run_bootstrapper<B: Bootstrapper>(self, bootstrapper: B) -> BridgeResult<Self> {
        Ok(self.run(BridgeHost::new(bootstrapper)?))
    }

    pub fn build(self) -> BridgeResult<AppDelegate> {
        self.app
            .ok_or_else(|| BridgeError::Bootstrap("no application registered".to_string()))
    }
}

impl std::fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppBuilder")
            .field("has_app", &self.app.is_some())
            .finish()
    }
}
