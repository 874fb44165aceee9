//! Demo application served by the `hostbridge` binary.
//!
//! | Route | Response |
//! |---|---|
//! | `GET /` | plain text, sets a `visited=1` cookie |
//! | `POST /echo` | the request body, with the request's content type |
//! | `GET /hello/{name}` | an HTML page rendered through a view |
//! | `GET /info` | JSON describing the request |
//!
//! Anything else is a 404.

use std::sync::Arc;

use askama::Template;
use chrono::{Duration, Utc};
use hostbridge_body::{BridgeError, BridgeResult};
use hostbridge_host::{
    Bootstrapper, Context, Cookie, Engine, OnError, OnResult, Request, Response,
};
use hostbridge_view::{View, ViewContext, content_writer};
use http::StatusCode;
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct HelloModel {
    pub name: String,
    pub served_at: String,
}

#[derive(Template)]
#[template(path = "hello.html")]
pub struct HelloPage {
    pub view: View<HelloModel>,
}

/// The demo routes.
#[derive(Debug, Default)]
pub struct DemoEngine;

impl DemoEngine {
    pub fn route(&self, mut request: Request) -> BridgeResult<Response> {
        let method = request.method().to_string();
        let path = request.path().to_string();
        match (method.as_str(), path.as_str()) {
            ("GET", "/") => Ok(Response::text("hostbridge is running\n").with_cookie(
                Cookie::new("visited", "1")
                    .with_expires(Utc::now() + Duration::days(1))
                    .http_only(),
            )),
            ("POST", "/echo") => {
                let content_type = request
                    .headers()
                    .first("Content-Type")
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = request.read_body()?;
                Ok(Response::bytes(StatusCode::OK, body, &content_type))
            }
            ("GET", "/info") => info(&request),
            ("GET", p) => match p.strip_prefix("/hello/") {
                Some(name) if !name.is_empty() && !name.contains('/') => Ok(hello(&request, name)),
                _ => Ok(not_found()),
            },
            _ => Ok(not_found()),
        }
    }
}

impl Engine for DemoEngine {
    fn handle_request(
        &self,
        request: Request,
        on_result: OnResult,
        on_error: OnError,
    ) -> BridgeResult<()> {
        match self.route(request) {
            Ok(response) => {
                let mut context = Context::new(response);
                context.on_dispose(|| trace!("demo request context disposed"));
                on_result(context);
            }
            Err(error) => on_error(error),
        }
        Ok(())
    }
}

fn hello(request: &Request, name: &str) -> Response {
    let page = HelloPage {
        view: View::new(
            HelloModel {
                name: name.to_string(),
                served_at: Utc::now().to_rfc3339(),
            },
            ViewContext::new(request.url().base_path.clone()),
        ),
    };
    Response::new(StatusCode::OK)
        .with_content_type("text/html; charset=utf-8")
        .with_contents(content_writer(page))
}

fn info(request: &Request) -> BridgeResult<Response> {
    let url = request.url();
    let headers: serde_json::Map<String, serde_json::Value> = request
        .headers()
        .iter()
        .map(|h| (h.name.clone(), serde_json::json!(h.values)))
        .collect();
    let body = serde_json::json!({
        "method": request.method(),
        "scheme": url.scheme,
        "host": url.host_name,
        "port": url.port,
        "path": url.path,
        "query": url.query,
        "headers": headers,
        "body_length": request.body().len(),
    });
    let body = serde_json::to_vec_pretty(&body)
        .map_err(|e| BridgeError::Engine(format!("failed to encode info: {e}")))?;
    Ok(Response::bytes(StatusCode::OK, body, "application/json"))
}

fn not_found() -> Response {
    Response::text("not found\n").with_status(StatusCode::NOT_FOUND)
}

/// Bootstraps the demo engine.
#[derive(Debug, Default)]
pub struct DemoBootstrapper {
    engine: Option<Arc<DemoEngine>>,
}

impl Bootstrapper for DemoBootstrapper {
    fn initialise(&mut self) -> BridgeResult<()> {
        self.engine = Some(Arc::new(DemoEngine));
        debug!("demo routes registered");
        Ok(())
    }

    fn engine(&mut self) -> BridgeResult<Arc<dyn Engine>> {
        match &self.engine {
            Some(engine) => Ok(engine.clone()),
            None => Err(BridgeError::Bootstrap("demo engine not initialised".into())),
        }
    }
}
