use std::any::Any;
use std::fmt::Display;
use std::io::Write;

use askama::Template;
use hostbridge_body::{BridgeResult, ContentWriter};
use tracing::{debug, trace};

use crate::error::ViewError;

/// Request-scoped data a view can consult while rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewContext {
    /// The request path base, e.g. `/app` when mounted below the root.
    pub base_path: String,
}

impl ViewContext {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

/// Model and helpers for a template.
///
/// Templates hold a `View<M>` as a field and call its helpers. `.html`
/// templates are escaped by askama itself:
///
/// ```text
/// <h1>{{ view.model().title }}</h1>
/// <link href="{{ view.site_resource("~/site.css") }}">
/// ```
#[derive(Debug, Clone, Default)]
pub struct View<M> {
    model: M,
    context: ViewContext,
}

impl<M: Default + 'static> View<M> {
    pub fn new(model: M, context: ViewContext) -> Self {
        Self { model, context }
    }

    /// Set the model from an untyped value. A value of any other type
    /// leaves the default model in place.
    pub fn set_model(&mut self, model: Box<dyn Any>) {
        self.model = match model.downcast::<M>() {
            Ok(model) => *model,
            Err(_) => {
                debug!(
                    expected = std::any::type_name::<M>(),
                    "view model has an unexpected type, using default"
                );
                M::default()
            }
        };
    }
}

impl<M> View<M> {
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn context(&self) -> &ViewContext {
        &self.context
    }

    /// HTML-escape the display form of `value` with askama's HTML escaper.
    ///
    /// For use outside auto-escaped templates; in an `.html` template the
    /// result would be escaped twice.
    pub fn h<T: Display>(&self, value: T) -> String {
        askama::filters::escape(value, askama::filters::Html)
            .map(|escaped| escaped.to_string())
            .unwrap_or_default()
    }

    /// Mark `value` as already-safe markup; returned unchanged.
    pub fn html<T>(&self, value: T) -> T {
        value
    }

    /// Resolve a `~/` site-relative path against the request path base.
    ///
    /// Blank values and paths without the `~/` prefix come back unchanged.
    pub fn site_resource(&self, value: &str) -> String {
        if value.trim().is_empty() {
            return value.to_string();
        }
        match value.strip_prefix('~') {
            Some(rest) if rest.starts_with('/') => {
                format!("{}{}", self.context.base_path.trim_end_matches('/'), rest)
            }
            _ => value.to_string(),
        }
    }
}

/// Render `template` into `writer`.
pub fn execute<T>(template: &T, writer: &mut dyn Write) -> Result<(), ViewError>
where
    T: Template,
{
    let rendered = template.render()?;
    trace!(len = rendered.len(), "view rendered");
    writer.write_all(rendered.as_bytes())?;
    Ok(())
}

/// A response body that renders `template` when streamed.
pub fn content_writer<T>(template: T) -> ContentWriter
where
    T: Template + Send + 'static,
{
    Box::new(move |writer: &mut dyn Write| -> BridgeResult<()> {
        execute(&template, writer)?;
        Ok(())
    })
}
