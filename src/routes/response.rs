//! JSON response helpers shared by all routes

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CONTENT_TYPE,
};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::types::StudioError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Error type of a length-limited request body
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Largest accepted JSON request body
pub const MAX_BODY_BYTES: usize = 10240;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of the 401 sent to anonymous callers of protected routes
#[derive(Debug, Serialize)]
pub struct UnauthorizedResponse {
    pub status: u16,
    pub error: &'static str,
    pub message: &'static str,
    pub path: String,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    apply_cors(headers);
    response
}

pub fn empty_response(status: StatusCode) -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = status;
    apply_cors(response.headers_mut());
    response
}

pub fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    code: Option<&str>,
) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorResponse {
            error: error.into(),
            code: code.map(str::to_string),
        },
    )
}

/// Response for a failed operation.
///
/// Store failures are logged and answered generically; other errors carry
/// their message.
pub fn studio_error_response(err: StudioError) -> Response<BoxBody> {
    if let StudioError::Database(detail) = &err {
        error!("Database error: {}", detail);
        return error_response(err.status_code(), "Database error", Some("DB_ERROR"));
    }

    let (status, body) = err.into_status_code_and_body();
    error_response(status, body, None)
}

pub fn message_response(status: StatusCode, message: impl Into<String>) -> Response<BoxBody> {
    json_response(
        status,
        &MessageResponse {
            message: message.into(),
        },
    )
}

/// 401 for anonymous requests to routes that need a member
pub fn unauthorized_entry_point(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::UNAUTHORIZED,
        &UnauthorizedResponse {
            status: StatusCode::UNAUTHORIZED.as_u16(),
            error: "Unauthorized",
            message: "Full authentication is required to access this resource",
            path: path.to_string(),
        },
    )
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });
    json_response(StatusCode::NOT_FOUND, &body)
}

pub fn method_not_allowed() -> Response<BoxBody> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", None)
}

/// CORS preflight response
pub fn preflight_response() -> Response<BoxBody> {
    let mut response = empty_response(StatusCode::NO_CONTENT);
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

/// Read and decode a JSON request body.
///
/// Reading stops as soon as the body grows past [`MAX_BODY_BYTES`].
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T, StudioError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<BoxError>,
{
    let bytes = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            return Err(StudioError::Http("Request body too large".into()))
        }
        Err(e) => return Err(StudioError::Http(format!("Failed to read body: {}", e))),
    };

    serde_json::from_slice(&bytes).map_err(|e| StudioError::Http(format!("Invalid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response<BoxBody>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unauthorized_entry_point_body() {
        let response = unauthorized_entry_point("/api/user/1");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let json = body_json(response).await;
        assert_eq!(json["status"], 401);
        assert_eq!(json["error"], "Unauthorized");
        assert_eq!(json["path"], "/api/user/1");
    }

    #[tokio::test]
    async fn test_error_response_omits_empty_code() {
        let json = body_json(error_response(StatusCode::BAD_REQUEST, "nope", None)).await;
        assert_eq!(json["error"], "nope");
        assert!(json.get("code").is_none());
    }

    #[tokio::test]
    async fn test_parse_json_body() {
        #[derive(serde::Deserialize)]
        struct Ping {
            value: u8,
        }

        let req = Request::new(Full::new(Bytes::from(r#"{"value": 7}"#)));
        let ping: Ping = parse_json_body(req).await.unwrap();
        assert_eq!(ping.value, 7);

        let req = Request::new(Full::new(Bytes::from("not json")));
        assert!(parse_json_body::<Ping, _>(req).await.is_err());

        let req = Request::new(Full::new(Bytes::from(vec![b' '; MAX_BODY_BYTES + 1])));
        let err = parse_json_body::<Ping, _>(req).await.err().unwrap();
        assert!(matches!(err, StudioError::Http(ref m) if m.contains("too large")));
    }

    #[tokio::test]
    async fn test_parse_json_body_accepts_body_at_limit() {
        #[derive(serde::Deserialize)]
        struct Ping {
            value: u8,
        }

        let mut payload = br#"{"value": 7}"#.to_vec();
        payload.resize(MAX_BODY_BYTES, b' ');

        let req = Request::new(Full::new(Bytes::from(payload)));
        let ping: Ping = parse_json_body(req).await.unwrap();
        assert_eq!(ping.value, 7);
    }

    #[tokio::test]
    async fn test_studio_error_response() {
        let response = studio_error_response(StudioError::NotFound("user 7".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Not found: user 7");

        let response = studio_error_response(StudioError::Database("pool timed out".into()));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Database error");
        assert_eq!(json["code"], "DB_ERROR");
    }

    #[test]
    fn test_preflight_response() {
        let response = preflight_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
