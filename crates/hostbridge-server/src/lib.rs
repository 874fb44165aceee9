//! HTTP/1.1 host for bridge applications.
//!
//! [`BridgeServer`] serves an [`AppDelegate`](hostbridge_host::AppDelegate)
//! over hyper. [`demo`] holds the application the `hostbridge` binary runs.

pub mod config;
pub mod convert;
pub mod demo;
pub mod server;

pub use config::ServerConfig;
pub use demo::{DemoBootstrapper, DemoEngine};
pub use server::{BodyOptions, BridgeServer, ResponseBody, handle};
