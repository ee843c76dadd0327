// API module entry
// Method + path routing for the record-management surface

mod documents;
mod employees;
mod multipart;
mod response;
pub mod types;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::HeaderValue;
use hyper::{Method, Request, Response, StatusCode, Version};

use crate::config::AppState;
use crate::logger;
use crate::logger::AccessLogEntry;
use response::{error_response, json_response, method_not_allowed, payload_too_large, preflight};

/// Route targets for the CRUD surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    ListDocuments,
    CreateDocument,
    UpdateDocument(u64),
    DeleteDocument(u64),
    ListEmployees,
    CreateEmployee,
    UpdateEmployee(u64),
    DeleteEmployee(u64),
    Health,
    MethodNotAllowed(&'static str),
    NotFound,
}

/// Match a request line against the route table.
///
/// An id segment that does not parse as an integer fails the whole match,
/// yielding the generic 404 rather than a resource-specific error.
fn match_route(method: &Method, path: &str) -> Route {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, segments.as_slice()) {
        (&Method::GET, ["documents"]) => Route::ListDocuments,
        (&Method::POST, ["documents"]) => Route::CreateDocument,
        (_, ["documents"]) => Route::MethodNotAllowed("GET, POST, OPTIONS"),
        (&Method::PUT, ["documents", id]) => parse_id(id).map_or(Route::NotFound, Route::UpdateDocument),
        (&Method::DELETE, ["documents", id]) => {
            parse_id(id).map_or(Route::NotFound, Route::DeleteDocument)
        }
        (_, ["documents", _]) => Route::MethodNotAllowed("PUT, DELETE, OPTIONS"),

        (&Method::GET, ["employees"]) => Route::ListEmployees,
        (&Method::POST, ["employees"]) => Route::CreateEmployee,
        (_, ["employees"]) => Route::MethodNotAllowed("GET, POST, OPTIONS"),
        (&Method::PUT, ["employees", id]) => parse_id(id).map_or(Route::NotFound, Route::UpdateEmployee),
        (&Method::DELETE, ["employees", id]) => {
            parse_id(id).map_or(Route::NotFound, Route::DeleteEmployee)
        }
        (_, ["employees", _]) => Route::MethodNotAllowed("PUT, DELETE, OPTIONS"),

        (&Method::GET, ["healthz"]) => Route::Health,

        _ => Route::NotFound,
    }
}

fn parse_id(segment: &str) -> Option<u64> {
    segment.parse().ok()
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToOwned::to_owned);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header_string(&req, "referer");
    entry.user_agent = header_string(&req, "user-agent");

    let mut response = dispatch(req, &state).await;

    if state.config.http.enable_cors {
        response
            .headers_mut()
            .insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    }

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch(req: Request<hyper::body::Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    if req.method() == Method::OPTIONS {
        return preflight(state.config.http.enable_cors);
    }

    if let Some(response) = check_body_size(&req, state.config.http.max_body_size) {
        return response;
    }

    let route = match_route(req.method(), req.uri().path());
    match route {
        Route::ListDocuments => documents::list(state),
        Route::CreateDocument => documents::create(req, state).await,
        Route::UpdateDocument(id) => documents::update(req, state, id).await,
        Route::DeleteDocument(id) => documents::delete(state, id).await,
        Route::ListEmployees => employees::list(state),
        Route::CreateEmployee => employees::create(req, state).await,
        Route::UpdateEmployee(id) => employees::update(req, state, id).await,
        Route::DeleteEmployee(id) => employees::delete(state, id).await,
        Route::Health => json_response(StatusCode::OK, &serde_json::json!({"status": "ok"})),
        Route::MethodNotAllowed(allow) => method_not_allowed(allow),
        Route::NotFound => error_response(StatusCode::NOT_FOUND, "Not Found"),
    }
}

/// Validate the Content-Length header and reject oversized bodies early.
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let size = req
        .headers()
        .get("content-length")?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()?;

    if size > max_body_size {
        logger::log_warning(&format!(
            "Request body too large: {size} bytes (max: {max_body_size})"
        ));
        return Some(payload_too_large());
    }
    None
}

fn header_string(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
