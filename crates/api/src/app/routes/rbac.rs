//! RBAC inspection endpoints for debugging "why was this request denied?".
//!
//! Any authenticated caller may use them; they only reveal the static tables
//! and the caller's own decisions.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use gatehouse_auth::{Permission, list_permissions};

use crate::app::errors;
use crate::app::routes::users::parse_user_id;
use crate::context::{AppServices, Caller};

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    /// Comma-separated permission names.
    pub permission: String,
    pub target: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/permissions", get(list_permission_catalog))
        .route("/explain", get(explain))
}

/// GET /rbac/roles
pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
) -> axum::response::Response {
    if let Err(resp) = require_authenticated(&services, &caller) {
        return resp;
    }

    let roles = services.authorization().roles().roles();
    (StatusCode::OK, Json(serde_json::json!({ "roles": roles }))).into_response()
}

/// GET /rbac/permissions
pub async fn list_permission_catalog(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
) -> axum::response::Response {
    if let Err(resp) = require_authenticated(&services, &caller) {
        return resp;
    }

    (StatusCode::OK, Json(serde_json::json!({ "permissions": list_permissions() }))).into_response()
}

/// GET /rbac/explain?permission=get_user&target=<id>
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<ExplainQuery>,
) -> axum::response::Response {
    if let Err(resp) = require_authenticated(&services, &caller) {
        return resp;
    }

    let required: Result<Vec<Permission>, _> = query
        .permission
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::parse::<Permission>)
        .collect();
    let required = match required {
        Ok(required) => required,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "unknown_permission", e.to_string()),
    };

    let target = match query.target.as_deref().map(parse_user_id).transpose() {
        Ok(target) => target,
        Err(resp) => return resp,
    };

    let explanation =
        services
            .authorization()
            .explain(caller.claims(), &required, target, Utc::now());

    (StatusCode::OK, Json(serde_json::json!({ "explanation": explanation }))).into_response()
}

fn require_authenticated(services: &AppServices, caller: &Caller) -> Result<(), axum::response::Response> {
    services
        .authorization()
        .authorize(caller.claims(), &[], None, Utc::now())
        .map(|_| ())
        .map_err(|e| errors::user_error_to_response(e.into()))
}
