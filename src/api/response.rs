// API response utility functions module

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::logger;

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string_pretty(body) {
        Ok(j) => j,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return internal_error();
        }
    };
    build_json(status, Bytes::from(json))
}

/// `{"error": message}` with the given status
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message });
    build_json(status, Bytes::from(body.to_string()))
}

/// 200 `{"message": ...}` confirmation
pub fn message_response(message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "message": message });
    build_json(StatusCode::OK, Bytes::from(body.to_string()))
}

/// 400 Bad Request response
pub fn bad_request(message: &str) -> Response<Full<Bytes>> {
    error_response(StatusCode::BAD_REQUEST, message)
}

/// 404 Not Found response
pub fn not_found(message: &str) -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, message)
}

/// 500 response with a deliberately generic body; details go to the log only
pub fn internal_error() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(
            r#"{"error":"Internal server error"}"#,
        )))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))))
}

/// 405 Method Not Allowed response
pub fn method_not_allowed(allow: &'static str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": "Method Not Allowed" });
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json")
        .header("Allow", allow)
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Method Not Allowed"))))
}

/// 413 Payload Too Large response
pub fn payload_too_large() -> Response<Full<Bytes>> {
    error_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
}

/// Build OPTIONS response (preflight request)
pub fn preflight(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", "GET, POST, PUT, DELETE, OPTIONS");

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .header("Access-Control-Max-Age", "86400");
    }

    builder
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

fn build_json(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        })
}

#[cfg(test)]
pub mod test_util {
    use super::*;
    use http_body_util::BodyExt;

    /// Collect a response body into a JSON value (test helper).
    pub async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("body is JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_util::body_json;

    #[tokio::test]
    async fn test_error_response_shape() {
        let response = not_found("Document not found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()["Content-Type"].to_str().expect("ascii"),
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({"error": "Document not found"}));
    }

    #[tokio::test]
    async fn test_message_response_shape() {
        let body = body_json(message_response("Employee deleted")).await;
        assert_eq!(body, serde_json::json!({"message": "Employee deleted"}));
    }

    #[test]
    fn test_preflight_headers() {
        let with_cors = preflight(true);
        assert_eq!(with_cors.status(), StatusCode::NO_CONTENT);
        assert!(with_cors
            .headers()
            .contains_key("Access-Control-Allow-Methods"));

        let without_cors = preflight(false);
        assert!(!without_cors
            .headers()
            .contains_key("Access-Control-Allow-Methods"));
    }

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let response = method_not_allowed("GET, POST, OPTIONS");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers()["Allow"].to_str().expect("ascii"),
            "GET, POST, OPTIONS"
        );
    }
}
