use axum::Router;

pub mod rbac;
pub mod system;
pub mod users;

/// Router for everything under `/user-service`.
pub fn router() -> Router {
    Router::new()
        .merge(users::router())
        .nest("/rbac", rbac::router())
}
