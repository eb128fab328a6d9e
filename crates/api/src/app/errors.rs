use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use gatehouse_auth::AuthzError;
use gatehouse_users::UserServiceError;

pub fn user_error_to_response(err: UserServiceError) -> axum::response::Response {
    match err {
        UserServiceError::Authz(AuthzError::Unauthenticated(e)) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string())
        }
        UserServiceError::Authz(e @ AuthzError::Forbidden { .. }) => {
            json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
        }
        UserServiceError::Authz(AuthzError::UnknownRole(_)) => internal_error(),
        UserServiceError::Validation(e) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        e @ UserServiceError::PasswordsDontMatch => {
            json_error(StatusCode::BAD_REQUEST, "passwords_dont_match", e.to_string())
        }
        e @ UserServiceError::WeakPassword { .. } => {
            json_error(StatusCode::BAD_REQUEST, "weak_password", e.to_string())
        }
        e @ UserServiceError::EmailTaken => json_error(StatusCode::CONFLICT, "email_taken", e.to_string()),
        e @ UserServiceError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", e.to_string())
        }
        e @ UserServiceError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        e @ UserServiceError::SubjectNotFound => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string())
        }
        e @ (UserServiceError::Token(_) | UserServiceError::Repository(_) | UserServiceError::Hashing(_)) => {
            tracing::error!(error = %e, "user service failure");
            internal_error()
        }
    }
}

/// 500 with a generic message; details stay in the logs.
pub fn internal_error() -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error")
}

/// Malformed, mistyped or non-JSON request body. Keeps axum's status (400, 415 or 422).
pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    json_error(rejection.status(), "invalid_body", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
