use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, middleware::Next, response::Response};
use chrono::Utc;

use gatehouse_auth::TokenCodec;

use crate::context::Caller;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenCodec>,
}

/// Attach a [`Caller`] to every request.
///
/// Never rejects: public routes work without a token, and protected
/// operations deny an anonymous caller themselves.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let caller = match extract_bearer(req.headers()) {
        Some(token) => match state.tokens.verify(token, Utc::now()) {
            Ok(claims) => Caller::authenticated(claims),
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                Caller::anonymous()
            }
        },
        None => Caller::anonymous(),
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
