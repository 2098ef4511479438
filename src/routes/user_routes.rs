//! HTTP routes for member accounts
//!
//! - GET    /api/user/{id} - Member profile
//! - DELETE /api/user/{id} - Delete own account
//!
//! Both require an authenticated security context; deletion additionally
//! requires the caller to own the account.

use chrono::{DateTime, Utc};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{current_identity_of, permits, Principal};
use crate::routes::response::{
    empty_response, error_response, json_response, method_not_allowed, studio_error_response,
    unauthorized_entry_point, BoxBody,
};
use crate::server::AppState;
use crate::store::CredentialRecord;
use crate::types::StudioError;

pub const USER_PATH_PREFIX: &str = "/api/user/";

/// Public view of a member; the password hash never leaves the store
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub last_name: String,
    pub first_name: String,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CredentialRecord> for UserResponse {
    fn from(record: CredentialRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            last_name: record.last_name,
            first_name: record.first_name,
            admin: record.admin,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

async fn load_member(state: &AppState, id: i64) -> Result<CredentialRecord, StudioError> {
    state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| StudioError::NotFound(format!("user {}", id)))
}

/// GET /api/user/{id}
async fn handle_find_by_id(state: &AppState, id: i64) -> Response<BoxBody> {
    match load_member(state, id).await {
        Ok(record) => json_response(StatusCode::OK, &UserResponse::from(record)),
        Err(e) => studio_error_response(e),
    }
}

/// DELETE /api/user/{id}
///
/// Only the account owner may delete it; anyone else gets 401.
async fn handle_delete(
    current: Option<Principal>,
    path: &str,
    state: &AppState,
    id: i64,
) -> Response<BoxBody> {
    let Some(current) = current else {
        return unauthorized_entry_point(path);
    };

    let record = match load_member(state, id).await {
        Ok(record) => record,
        Err(e) => return studio_error_response(e),
    };

    if !permits(&current, &record.email) {
        warn!(
            "Member {} attempted to delete account {}",
            current.username, record.id
        );
        return error_response(
            StatusCode::UNAUTHORIZED,
            "Not allowed to delete another member",
            Some("NOT_OWNER"),
        );
    }

    match state.store.delete(record.id).await {
        Ok(_) => {
            info!("Member {} deleted own account", record.id);
            empty_response(StatusCode::OK)
        }
        Err(e) => {
            error!("Failed to delete member {}: {}", record.id, e);
            error_response(e.status_code(), "Failed to delete user", Some("DB_ERROR"))
        }
    }
}

/// Handle member account requests.
///
/// Returns Some(response) if request was handled, None if not a user route.
pub async fn handle_user_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let raw_id = path.strip_prefix(USER_PATH_PREFIX)?;

    let Ok(id) = raw_id.parse::<i64>() else {
        return Some(studio_error_response(StudioError::BadRequest(format!(
            "invalid user id {}",
            raw_id
        ))));
    };

    let current = current_identity_of(&req).cloned();
    let method = req.method().clone();

    let response = match method {
        Method::GET => handle_find_by_id(&state, id).await,
        Method::DELETE => handle_delete(current, &path, &state, id).await,
        _ => method_not_allowed(),
    };

    Some(response)
}
