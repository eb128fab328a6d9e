use std::sync::Arc;

use gatehouse_auth::{AuthorizationEngine, IdentityClaims};
use gatehouse_users::UserService;

/// Identity attached to a request by the auth middleware.
///
/// `None` when no bearer token was sent or it failed verification; the
/// service layer turns that into `Unauthenticated` where it matters.
#[derive(Debug, Clone, Default)]
pub struct Caller(Option<IdentityClaims>);

impl Caller {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn authenticated(claims: IdentityClaims) -> Self {
        Self(Some(claims))
    }

    pub fn claims(&self) -> Option<&IdentityClaims> {
        self.0.as_ref()
    }
}

/// Services shared by every handler, built once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub users: UserService,
}

impl AppServices {
    pub fn new(users: UserService) -> Arc<Self> {
        Arc::new(Self { users })
    }

    pub fn authorization(&self) -> &AuthorizationEngine {
        self.users.authorization()
    }
}
