//! `/user-service` user routes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use gatehouse_core::UserId;
use gatehouse_users::{NewUserRequest, SigninRequest, SignupRequest, UserChanges};

use crate::app::errors;
use crate::context::{AppServices, Caller};

pub fn router() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/user/refresh-token", get(refresh_token))
        .route("/users", get(list_users))
        .route("/user/create", post(create_user))
        .route("/user", get(get_self).put(update_self).delete(delete_self))
        .route("/user/:id", get(get_user).put(update_user).delete(delete_user))
}

// ─────────────────────────────────────────────────────────────────────────────
// Public
// ─────────────────────────────────────────────────────────────────────────────

/// POST /signup
pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    match services.users.signup(body).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

/// POST /signin
pub async fn signin(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    match services.users.signin(body).await {
        Ok(token) => (StatusCode::OK, Json(token)).into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authenticated
// ─────────────────────────────────────────────────────────────────────────────

/// GET /user/refresh-token
pub async fn refresh_token(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
) -> axum::response::Response {
    match services.users.refresh_token(caller.claims()).await {
        Ok(token) => (StatusCode::OK, Json(token)).into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

/// GET /users
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
) -> axum::response::Response {
    match services.users.list_users(caller.claims()).await {
        Ok(users) => (StatusCode::OK, Json(json!({ "users": users }))).into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

/// POST /user/create
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<NewUserRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(resp) => return resp,
    };
    match services.users.create_user(caller.claims(), body).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

/// GET /user
pub async fn get_self(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
) -> axum::response::Response {
    fetch(&services, &caller, None).await
}

/// GET /user/:id
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match parse_user_id(&id) {
        Ok(id) => fetch(&services, &caller, Some(id)).await,
        Err(resp) => resp,
    }
}

/// PUT /user
pub async fn update_self(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<UserChanges>, JsonRejection>,
) -> axum::response::Response {
    match json_body(payload) {
        Ok(body) => update(&services, &caller, None, body).await,
        Err(resp) => resp,
    }
}

/// PUT /user/:id
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<UserChanges>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_user_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match json_body(payload) {
        Ok(body) => update(&services, &caller, Some(id), body).await,
        Err(resp) => resp,
    }
}

/// DELETE /user
pub async fn delete_self(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
) -> axum::response::Response {
    remove(&services, &caller, None).await
}

/// DELETE /user/:id
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match parse_user_id(&id) {
        Ok(id) => remove(&services, &caller, Some(id)).await,
        Err(resp) => resp,
    }
}

async fn fetch(services: &AppServices, caller: &Caller, id: Option<UserId>) -> axum::response::Response {
    match services.users.get_user(caller.claims(), id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

async fn update(
    services: &AppServices,
    caller: &Caller,
    id: Option<UserId>,
    changes: UserChanges,
) -> axum::response::Response {
    match services.users.update_user(caller.claims(), id, changes).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

async fn remove(services: &AppServices, caller: &Caller, id: Option<UserId>) -> axum::response::Response {
    match services.users.delete_user(caller.claims(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::user_error_to_response(e),
    }
}

/// Unwraps a JSON body, turning axum's plain-text rejection into our error body.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload.map(|Json(body)| body).map_err(errors::json_rejection)
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, axum::response::Response> {
    raw.parse::<UserId>()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"))
}
