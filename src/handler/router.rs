//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. POST to the configured upload
//! route goes to the avatar handler; every other GET/HEAD/POST falls
//! through to static file serving from the site root.

use crate::config::AppState;
use crate::handler::{static_files, upload};
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context for static file serving
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub access_log: bool,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let is_head = method == Method::HEAD;

    let access_log = state.config.logging.access_log;
    if access_log {
        logger::log_request(&method, req.uri(), req.version());
    }
    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    match method {
        Method::POST if path == state.config.upload.route => {
            Ok(upload::handle_upload(req, &state).await)
        }
        // POST to any other path falls through to static serving, same as GET
        Method::GET | Method::HEAD | Method::POST => {
            let ctx = RequestContext {
                path: &path,
                is_head,
                if_none_match: req
                    .headers()
                    .get("if-none-match")
                    .and_then(|v| v.to_str().ok())
                    .map(ToString::to_string),
                access_log,
            };
            Ok(static_files::serve(&ctx, &state.config.site, &state.config.http).await)
        }
        Method::OPTIONS => Ok(http::build_options_response(state.config.http.enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Ok(http::build_405_response())
        }
    }
}
