//! Templating shim: renders askama templates into bridge response bodies.
//!
//! A template keeps a [`View`] field for its model and helpers (HTML
//! escaping, raw passthrough, `~/` site-resource resolution).
//! [`content_writer`] turns a template into a response body.

mod error;
mod view;

pub use error::ViewError;
pub use view::{View, ViewContext, content_writer, execute};
