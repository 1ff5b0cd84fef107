use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::access::{Actor, OrganizationId, Role, UserId};

pub const ORGANIZATION_HEADER: &str = "x-organization-id";
pub const USER_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";

/// Builds the caller identity from the headers set by the upstream auth proxy.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Response> {
    let organization_id = header_id(headers, ORGANIZATION_HEADER)?;
    let user_id = header_id(headers, USER_HEADER)?;
    let role = headers
        .get(ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(Role::parse)
        .ok_or_else(|| unauthorized(ROLE_HEADER))?;

    Ok(Actor {
        organization_id: OrganizationId(organization_id),
        user_id: UserId(user_id),
        role,
    })
}

fn header_id(headers: &HeaderMap, name: &str) -> Result<i64, Response> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .ok_or_else(|| unauthorized(name))
}

fn unauthorized(header: &str) -> Response {
    error_response(
        StatusCode::UNAUTHORIZED,
        format!("missing or invalid {header} header"),
    )
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({
        "error": message.into(),
    });
    (status, axum::Json(payload)).into_response()
}
