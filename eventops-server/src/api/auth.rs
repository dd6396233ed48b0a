//! Role middleware for staff routes
//!
//! Authentication itself happens upstream (session layer / reverse proxy);
//! by the time a request reaches this service the caller's role arrives
//! resolved in the `X-Role` header. The middleware here only answers "is
//! this role permitted on this route group" - it never checks credentials.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use eventops_common::db::models::StaffRole;
use serde_json::json;
use tracing::warn;

/// Header carrying the upstream-resolved staff role
pub const ROLE_HEADER: &str = "x-role";

/// Role extraction / permission failure
#[derive(Debug)]
pub enum AuthError {
    /// No role header present (not authenticated upstream)
    MissingRole,
    /// Header present but not a known role
    UnknownRole(String),
    /// Known role without permission for this route group
    NotPermitted(StaffRole),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingRole => (
                StatusCode::UNAUTHORIZED,
                "Missing staff role".to_string(),
            ),
            AuthError::UnknownRole(value) => (
                StatusCode::UNAUTHORIZED,
                format!("Unknown staff role: {value}"),
            ),
            AuthError::NotPermitted(role) => (
                StatusCode::FORBIDDEN,
                format!("Role '{}' is not permitted for this operation", role.as_str()),
            ),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

fn resolve_role(headers: &HeaderMap) -> Result<StaffRole, AuthError> {
    let value = headers
        .get(ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingRole)?;

    value
        .parse::<StaffRole>()
        .map_err(|_| AuthError::UnknownRole(value.to_string()))
}

/// Admin-only routes (approval, deletion, config writes)
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AuthError> {
    let role = resolve_role(request.headers())?;
    if role != StaffRole::Admin {
        warn!("Role '{}' denied on admin route {}", role.as_str(), request.uri().path());
        return Err(AuthError::NotPermitted(role));
    }
    Ok(next.run(request).await)
}

/// Queue-operating staff routes (admin or bartender/DJ)
pub async fn require_queue_staff(request: Request, next: Next) -> Result<Response, AuthError> {
    let role = resolve_role(request.headers())?;
    if !role.can_operate_queue() {
        warn!("Role '{}' denied on staff route {}", role.as_str(), request.uri().path());
        return Err(AuthError::NotPermitted(role));
    }
    Ok(next.run(request).await)
}
