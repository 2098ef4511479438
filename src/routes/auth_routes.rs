//! HTTP routes for authentication
//!
//! - POST /api/auth/login    - Authenticate and get a bearer token
//! - POST /api/auth/register - Create member credentials

use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{hash_password, Principal};
use crate::routes::response::{
    error_response, json_response, message_response, method_not_allowed, not_found_response,
    parse_json_body, studio_error_response, BoxBody, BoxError,
};
use crate::server::AppState;
use crate::store::NewCredential;
use crate::types::StudioError;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";

const EMAIL_TAKEN: &str = "Error: Email is already taken!";

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
}

/// Token issuance response returned by a successful login
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub admin: bool,
}

impl JwtResponse {
    pub fn new(token: String, principal: Principal) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            id: principal.id,
            username: principal.username,
            first_name: principal.first_name,
            last_name: principal.last_name,
            admin: principal.admin,
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /api/auth/login
///
/// 1. Verify email and password against the credential store
/// 2. Issue a bearer token for the member
async fn handle_login<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return studio_error_response(e),
    };

    if body.email.is_empty() || body.password.is_empty() {
        return studio_error_response(StudioError::BadRequest(
            "missing required fields: email, password".into(),
        ));
    }

    let principal = match state
        .authenticator
        .authenticate(&body.email, &body.password)
        .await
    {
        Ok(p) => p,
        Err(StudioError::Auth(_)) => {
            warn!("Login failed: {}", body.email);
            // Same answer for unknown email and wrong password
            return error_response(
                StatusCode::UNAUTHORIZED,
                "Invalid credentials",
                Some("INVALID_CREDENTIALS"),
            );
        }
        Err(e) => {
            error!("Login lookup failed: {}", e);
            return error_response(e.status_code(), "Authentication error", Some("AUTH_ERROR"));
        }
    };

    match state.codec.issue(&principal) {
        Ok(token) => {
            info!(
                "Login successful: {} ({})",
                principal.username,
                principal.display_name()
            );
            json_response(StatusCode::OK, &JwtResponse::new(token, principal))
        }
        Err(e) => {
            error!("Token issuance failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate token",
                Some("TOKEN_ERROR"),
            )
        }
    }
}

/// POST /api/auth/register
///
/// 1. Reject an email that is already registered
/// 2. Hash the password with argon2
/// 3. Store the credentials (never as admin)
async fn handle_register<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let body: SignupRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return studio_error_response(e),
    };

    if body.email.is_empty()
        || body.first_name.is_empty()
        || body.last_name.is_empty()
        || body.password.is_empty()
    {
        return studio_error_response(StudioError::BadRequest(
            "missing required fields: email, firstName, lastName, password".into(),
        ));
    }

    match state.store.exists_by_login_name(&body.email).await {
        Ok(true) => return message_response(StatusCode::BAD_REQUEST, EMAIL_TAKEN),
        Ok(false) => {}
        Err(e) => return studio_error_response(e),
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => {
            error!("Password hashing failed: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to hash password",
                Some("HASH_ERROR"),
            );
        }
    };

    let credential = NewCredential {
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
        password_hash,
        admin: false,
    };

    match state.store.insert(credential).await {
        Ok(record) => {
            info!("Registered new member {}: {}", record.id, record.email);
            message_response(StatusCode::OK, "User registered successfully!")
        }
        // Lost a race with a concurrent registration
        Err(StudioError::Conflict(_)) => message_response(StatusCode::BAD_REQUEST, EMAIL_TAKEN),
        Err(e) => studio_error_response(e),
    }
}

// =============================================================================
// Router
// =============================================================================

/// Handle auth-related HTTP requests.
///
/// Returns Some(response) if request was handled, None if not an auth route.
pub async fn handle_auth_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let path = req.uri().path().to_string();
    if !path.starts_with("/api/auth/") {
        return None;
    }

    let method = req.method().clone();
    let response = match (&method, path.as_str()) {
        (&Method::POST, LOGIN_PATH) => handle_login(req, state).await,
        (&Method::POST, REGISTER_PATH) => handle_register(req, state).await,
        (_, LOGIN_PATH) | (_, REGISTER_PATH) => method_not_allowed(),
        _ => not_found_response(&path),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_response_shape() {
        let response = JwtResponse::new(
            "abc.def.ghi".into(),
            Principal {
                id: 1,
                username: "yoga@studio.com".into(),
                first_name: "Admin".into(),
                last_name: "Admin".into(),
                admin: true,
            },
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token"], "abc.def.ghi");
        assert_eq!(json["type"], "Bearer");
        assert_eq!(json["id"], 1);
        assert_eq!(json["username"], "yoga@studio.com");
        assert_eq!(json["firstName"], "Admin");
        assert_eq!(json["lastName"], "Admin");
        assert_eq!(json["admin"], true);
    }

    #[test]
    fn test_signup_request_uses_camel_case() {
        let body: SignupRequest = serde_json::from_str(
            r#"{"email":"jane@studio.com","firstName":"Jane","lastName":"Doe","password":"secret!"}"#,
        )
        .unwrap();
        assert_eq!(body.first_name, "Jane");
        assert_eq!(body.last_name, "Doe");
    }

    #[test]
    fn test_login_request_tolerates_missing_fields() {
        let body: LoginRequest = serde_json::from_str(r#"{"email":"jane@studio.com"}"#).unwrap();
        assert!(body.password.is_empty());
    }
}
