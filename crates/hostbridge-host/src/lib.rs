//! Host entry point for running a request-handling engine behind a
//! push-style host contract.
//!
//! A host hands over an [`Environment`]: a string-keyed map carrying the
//! request method, URL parts, headers and a body producer. [`BridgeHost`]
//! checks the contract version, translates the environment into a
//! [`Request`], collects the body, and runs the [`Engine`]. The engine's
//! [`Response`] goes back to the host as a status line, a [`HeaderMap`] and
//! a body producer that renders the response when the host invokes it.

pub mod app;
pub mod config;
pub mod context;
pub mod cookie;
pub mod engine;
pub mod environment;
pub mod header;
pub mod host;
pub mod request;
pub mod response;
pub mod translate;

pub use app::{AppBuilder, AppDelegate};
pub use config::HostConfig;
pub use context::{Context, Disposables};
pub use cookie::Cookie;
pub use engine::{Bootstrapper, Engine, FnEngine, OnError, OnResult, StaticBootstrapper};
pub use environment::{EnvValue, Environment, SUPPORTED_VERSION, keys};
pub use header::{Header, HeaderMap};
pub use host::{BridgeHost, ErrorCallback, ResultCallback};
pub use request::{Request, Url};
pub use response::Response;

pub use hostbridge_body as body;
