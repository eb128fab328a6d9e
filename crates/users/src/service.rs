//! User service: signup, signin, refresh and CRUD behind authorization.
//!
//! Every protected operation asks the [`AuthorizationEngine`] before it reads
//! or writes anything. Lookups always use the caller's tenant.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use gatehouse_auth::{
    AuthorizationEngine, AuthzError, Grant, IdentityClaims, Permission, Role, TokenCodec,
    TokenError, Unauthenticated,
};
use gatehouse_core::{DomainError, TenantId, UserId};

use crate::error::UserServiceError;
use crate::model::{
    NewUserRequest, RedactedUser, SigninRequest, SignupRequest, UserChanges, UserRecord,
    normalize_email, normalize_name,
};
use crate::ports::{PasswordHasher, RepositoryError, UserRepository};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

type Result<T> = std::result::Result<T, UserServiceError>;

#[derive(Debug, Clone)]
pub struct UserServiceConfig {
    pub min_password_length: usize,
}

impl Default for UserServiceConfig {
    fn default() -> Self {
        Self {
            min_password_length: 8,
        }
    }
}

/// Signed token handed back by signin/refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenCodec>,
    authz: AuthorizationEngine,
    config: UserServiceConfig,
    clock: Clock,
    /// Hash of a throwaway password, verified against when no account matches.
    decoy_hash: Arc<OnceLock<Option<String>>>,
}

const DECOY_PASSWORD: &str = "gatehouse-decoy-password";

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenCodec>,
        authz: AuthorizationEngine,
        config: UserServiceConfig,
    ) -> Self {
        Self {
            repo,
            hasher,
            tokens,
            authz,
            config,
            clock: Arc::new(Utc::now),
            decoy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Replace the wall clock (tests).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn authorization(&self) -> &AuthorizationEngine {
        &self.authz
    }

    pub fn tokens(&self) -> &dyn TokenCodec {
        self.tokens.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Public (unauthenticated) operations
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn signup(&self, req: SignupRequest) -> Result<RedactedUser> {
        if req.password != req.password_repeated {
            return Err(UserServiceError::PasswordsDontMatch);
        }

        let record = self.new_record(
            req.tenant_id,
            NewUserRequest {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                password: req.password,
                role: Some(Role::USER),
            },
        )?;

        self.insert(record, "signup").await
    }

    pub async fn signin(&self, req: SigninRequest) -> Result<IssuedToken> {
        // A malformed email cannot exist; same answer as a wrong password.
        let Ok(email) = normalize_email(&req.email) else {
            self.verify_against_decoy(&req.password);
            return Err(UserServiceError::InvalidCredentials);
        };

        let Some(user) = self.repo.find_by_email(req.tenant_id, &email).await? else {
            tracing::debug!(tenant = %req.tenant_id, "signin for unknown email");
            self.verify_against_decoy(&req.password);
            return Err(UserServiceError::InvalidCredentials);
        };

        if !self.hasher.verify_password(&req.password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "signin with wrong password");
            return Err(UserServiceError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, tenant = %user.tenant_id, "user signed in");
        self.issue_for(&user)
    }

    /// Spend one password verification so a missing account costs the same
    /// as a wrong password. The outcome is ignored.
    fn verify_against_decoy(&self, password: &str) {
        let decoy = self
            .decoy_hash
            .get_or_init(|| self.hasher.hash_password(DECOY_PASSWORD).ok());
        match decoy {
            Some(hash) => {
                let _ = self.hasher.verify_password(password, hash);
            }
            None => tracing::warn!("could not hash signin decoy password"),
        }
    }

    /// Seed an account with an explicit role, bypassing authorization.
    ///
    /// Startup-only. Idempotent on email: an existing account is returned
    /// unchanged.
    pub async fn bootstrap_admin(&self, tenant_id: TenantId, req: NewUserRequest) -> Result<RedactedUser> {
        let email = normalize_email(&req.email)?;
        if let Some(existing) = self.repo.find_by_email(tenant_id, &email).await? {
            return Ok(existing.redacted());
        }

        let req = NewUserRequest {
            role: Some(req.role.unwrap_or(Role::PLATFORM_ADMIN)),
            ..req
        };
        let record = self.new_record(tenant_id, req)?;
        self.insert(record, "bootstrap").await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Protected operations
    // ─────────────────────────────────────────────────────────────────────────

    /// New token for the caller, carrying the role currently on record.
    pub async fn refresh_token(&self, caller: Option<&IdentityClaims>) -> Result<IssuedToken> {
        let (claims, _) = self.authorize(caller, &[], None)?;

        let user = self
            .repo
            .get(claims.tenant_id, claims.sub)
            .await?
            .ok_or(UserServiceError::SubjectNotFound)?;

        self.issue_for(&user)
    }

    pub async fn list_users(&self, caller: Option<&IdentityClaims>) -> Result<Vec<RedactedUser>> {
        let (claims, _) = self.authorize(caller, &[Permission::GetUsers], None)?;

        let mut users: Vec<_> = self
            .repo
            .list(claims.tenant_id)
            .await?
            .iter()
            .map(UserRecord::redacted)
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    /// `target` defaults to the caller.
    pub async fn get_user(&self, caller: Option<&IdentityClaims>, target: Option<UserId>) -> Result<RedactedUser> {
        let target = resolve_target(caller, target);
        let (claims, _) = self.authorize(caller, &[Permission::GetUser], target)?;

        self.load(claims.tenant_id, target)
            .await
            .map(|u| u.redacted())
    }

    pub async fn create_user(&self, caller: Option<&IdentityClaims>, req: NewUserRequest) -> Result<RedactedUser> {
        let (claims, _) = self.authorize(caller, &[Permission::CreateUser], None)?;

        let record = self.new_record(claims.tenant_id, req)?;
        self.insert(record, "create").await
    }

    /// `target` defaults to the caller. Role changes need the generic
    /// `update_user` grant; ownership alone cannot change a role.
    pub async fn update_user(
        &self,
        caller: Option<&IdentityClaims>,
        target: Option<UserId>,
        changes: UserChanges,
    ) -> Result<RedactedUser> {
        let target = resolve_target(caller, target);
        let (claims, grant) = self.authorize(caller, &[Permission::UpdateUser], target)?;

        if changes.role.is_some() && !matches!(grant, Grant::Role(_)) {
            tracing::warn!(subject = %claims.sub, "attempt to change a role through self-service");
            return Err(AuthzError::Forbidden {
                required: vec![Permission::UpdateUser],
            }
            .into());
        }

        let mut user = self.load(claims.tenant_id, target).await?;
        if changes.is_empty() {
            return Ok(user.redacted());
        }

        if let Some(first_name) = changes.first_name {
            user.first_name = normalize_name("first_name", &first_name)?;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = normalize_name("last_name", &last_name)?;
        }
        if let Some(email) = changes.email {
            user.email = normalize_email(&email)?;
        }
        if let Some(password) = changes.password {
            self.check_password_strength(&password)?;
            user.password_hash = self.hasher.hash_password(&password)?;
        }
        if let Some(role) = changes.role {
            user.role = self.known_role(role)?;
        }
        user.updated_at = self.now();

        let updated = self.repo.update(user.clone()).await.map_err(conflict_as_email_taken)?;
        if !updated {
            return Err(UserServiceError::NotFound);
        }

        tracing::info!(user_id = %user.id, actor = %claims.sub, "user updated");
        Ok(user.redacted())
    }

    /// `target` defaults to the caller.
    pub async fn delete_user(&self, caller: Option<&IdentityClaims>, target: Option<UserId>) -> Result<()> {
        let target = resolve_target(caller, target);
        let (claims, _) = self.authorize(caller, &[Permission::DeleteUser], target)?;
        let Some(target) = target else {
            return Err(UserServiceError::NotFound);
        };

        if !self.repo.delete(claims.tenant_id, target).await? {
            return Err(UserServiceError::NotFound);
        }

        tracing::info!(user_id = %target, actor = %claims.sub, "user deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn authorize<'c>(
        &self,
        caller: Option<&'c IdentityClaims>,
        required: &[Permission],
        target: Option<UserId>,
    ) -> Result<(&'c IdentityClaims, Grant)> {
        let grant = self.authz.authorize(caller, required, target, self.now())?;
        let claims = caller.ok_or(AuthzError::Unauthenticated(Unauthenticated::MissingClaims))?;
        Ok((claims, grant))
    }

    async fn load(&self, tenant_id: TenantId, target: Option<UserId>) -> Result<UserRecord> {
        let Some(target) = target else {
            return Err(UserServiceError::NotFound);
        };
        self.repo
            .get(tenant_id, target)
            .await?
            .ok_or(UserServiceError::NotFound)
    }

    async fn insert(&self, record: UserRecord, origin: &'static str) -> Result<RedactedUser> {
        let user = record.redacted();
        self.repo.insert(record).await.map_err(conflict_as_email_taken)?;
        tracing::info!(user_id = %user.id, tenant = %user.tenant_id, role = %user.role, origin, "user created");
        Ok(user)
    }

    fn new_record(&self, tenant_id: TenantId, req: NewUserRequest) -> Result<UserRecord> {
        let first_name = normalize_name("first_name", &req.first_name)?;
        let last_name = normalize_name("last_name", &req.last_name)?;
        let email = normalize_email(&req.email)?;
        let role = self.known_role(req.role.unwrap_or(Role::USER))?;
        self.check_password_strength(&req.password)?;
        let password_hash = self.hasher.hash_password(&req.password)?;

        let now = self.now();
        Ok(UserRecord {
            id: UserId::new(),
            tenant_id,
            first_name,
            last_name,
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        })
    }

    fn known_role(&self, role: Role) -> Result<Role> {
        if self.authz.roles().contains(&role) {
            Ok(role)
        } else {
            Err(DomainError::validation(format!("unknown role '{role}'")).into())
        }
    }

    fn check_password_strength(&self, password: &str) -> Result<()> {
        let min_length = self.config.min_password_length;
        if password.chars().count() < min_length {
            return Err(UserServiceError::WeakPassword { min_length });
        }
        Ok(())
    }

    fn issue_for(&self, user: &UserRecord) -> Result<IssuedToken> {
        let claims = IdentityClaims::issue(
            user.id,
            user.tenant_id,
            user.role.clone(),
            self.now(),
            self.tokens.ttl(),
        )
        .map_err(TokenError::from)?;
        let token = self.tokens.issue(&claims)?;
        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at,
        })
    }
}

fn resolve_target(caller: Option<&IdentityClaims>, target: Option<UserId>) -> Option<UserId> {
    target.or_else(|| caller.map(|c| c.sub))
}

fn conflict_as_email_taken(err: RepositoryError) -> UserServiceError {
    match err {
        RepositoryError::Conflict(_) => UserServiceError::EmailTaken,
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Duration;
    use gatehouse_auth::Hs256TokenCodec;

    use super::*;
    use crate::ports::HashingError;

    #[derive(Default)]
    struct FakeRepo {
        users: Mutex<Vec<UserRecord>>,
    }

    #[async_trait]
    impl UserRepository for FakeRepo {
        async fn insert(&self, user: UserRecord) -> std::result::Result<(), RepositoryError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.tenant_id == user.tenant_id && u.email == user.email) {
                return Err(RepositoryError::Conflict("email".into()));
            }
            users.push(user);
            Ok(())
        }

        async fn get(&self, tenant_id: TenantId, user_id: UserId) -> std::result::Result<Option<UserRecord>, RepositoryError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.tenant_id == tenant_id && u.id == user_id).cloned())
        }

        async fn find_by_email(&self, tenant_id: TenantId, email: &str) -> std::result::Result<Option<UserRecord>, RepositoryError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.tenant_id == tenant_id && u.email == email).cloned())
        }

        async fn list(&self, tenant_id: TenantId) -> std::result::Result<Vec<UserRecord>, RepositoryError> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().filter(|u| u.tenant_id == tenant_id).cloned().collect())
        }

        async fn update(&self, user: UserRecord) -> std::result::Result<bool, RepositoryError> {
            let mut users = self.users.lock().unwrap();
            match users.iter_mut().find(|u| u.tenant_id == user.tenant_id && u.id == user.id) {
                Some(slot) => {
                    *slot = user;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete(&self, tenant_id: TenantId, user_id: UserId) -> std::result::Result<bool, RepositoryError> {
            let mut users = self.users.lock().unwrap();
            let before = users.len();
            users.retain(|u| !(u.tenant_id == tenant_id && u.id == user_id));
            Ok(users.len() != before)
        }
    }

    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash_password(&self, password: &str) -> std::result::Result<String, HashingError> {
            Ok(format!("plain:{password}"))
        }

        fn verify_password(&self, password: &str, hash: &str) -> std::result::Result<bool, HashingError> {
            Ok(hash == format!("plain:{password}"))
        }
    }

    /// `PlainHasher` that counts verifications.
    #[derive(Default)]
    struct CountingHasher {
        verifies: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash_password(&self, password: &str) -> std::result::Result<String, HashingError> {
            PlainHasher.hash_password(password)
        }

        fn verify_password(&self, password: &str, hash: &str) -> std::result::Result<bool, HashingError> {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            PlainHasher.verify_password(password, hash)
        }
    }

    fn service() -> UserService {
        UserService::new(
            Arc::new(FakeRepo::default()),
            Arc::new(PlainHasher),
            Arc::new(Hs256TokenCodec::new("unit-secret", Duration::minutes(15))),
            AuthorizationEngine::default(),
            UserServiceConfig::default(),
        )
    }

    fn signup_req(tenant_id: TenantId, email: &str) -> SignupRequest {
        SignupRequest {
            tenant_id,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: "correct horse".into(),
            password_repeated: "correct horse".into(),
        }
    }

    fn claims_of(svc: &UserService, token: &IssuedToken) -> IdentityClaims {
        svc.tokens().verify(&token.token, svc.now()).unwrap()
    }

    async fn signed_in(svc: &UserService, tenant_id: TenantId, email: &str) -> IdentityClaims {
        svc.signup(signup_req(tenant_id, email)).await.unwrap();
        let token = svc
            .signin(SigninRequest {
                tenant_id,
                email: email.into(),
                password: "correct horse".into(),
            })
            .await
            .unwrap();
        claims_of(svc, &token)
    }

    async fn admin(svc: &UserService, tenant_id: TenantId) -> IdentityClaims {
        svc.bootstrap_admin(
            tenant_id,
            NewUserRequest {
                first_name: "Root".into(),
                last_name: "Admin".into(),
                email: "root@example.com".into(),
                password: "correct horse".into(),
                role: None,
            },
        )
        .await
        .unwrap();
        let token = svc
            .signin(SigninRequest {
                tenant_id,
                email: "root@example.com".into(),
                password: "correct horse".into(),
            })
            .await
            .unwrap();
        claims_of(svc, &token)
    }

    #[tokio::test]
    async fn signup_assigns_standard_role() {
        let svc = service();
        let user = svc.signup(signup_req(TenantId::new(), "Ada@Example.com")).await.unwrap();
        assert_eq!(user.role, Role::USER);
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn signup_rejects_mismatched_and_weak_passwords() {
        let svc = service();
        let tenant = TenantId::new();

        let mut req = signup_req(tenant, "a@example.com");
        req.password_repeated = "something else".into();
        assert_eq!(svc.signup(req).await.unwrap_err(), UserServiceError::PasswordsDontMatch);

        let mut req = signup_req(tenant, "a@example.com");
        req.password = "short".into();
        req.password_repeated = "short".into();
        assert_eq!(
            svc.signup(req).await.unwrap_err(),
            UserServiceError::WeakPassword { min_length: 8 }
        );
    }

    #[tokio::test]
    async fn duplicate_email_is_per_tenant() {
        let svc = service();
        let tenant = TenantId::new();
        svc.signup(signup_req(tenant, "dup@example.com")).await.unwrap();

        assert_eq!(
            svc.signup(signup_req(tenant, "DUP@example.com")).await.unwrap_err(),
            UserServiceError::EmailTaken
        );
        assert!(svc.signup(signup_req(TenantId::new(), "dup@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn signin_does_not_reveal_which_part_was_wrong() {
        let svc = service();
        let tenant = TenantId::new();
        svc.signup(signup_req(tenant, "ada@example.com")).await.unwrap();

        let wrong_password = svc
            .signin(SigninRequest {
                tenant_id: tenant,
                email: "ada@example.com".into(),
                password: "nope nope".into(),
            })
            .await
            .unwrap_err();
        let unknown_email = svc
            .signin(SigninRequest {
                tenant_id: tenant,
                email: "nobody@example.com".into(),
                password: "correct horse".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password, UserServiceError::InvalidCredentials);
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn every_failed_signin_runs_one_password_verify() {
        let hasher = Arc::new(CountingHasher::default());
        let svc = UserService::new(
            Arc::new(FakeRepo::default()),
            hasher.clone(),
            Arc::new(Hs256TokenCodec::new("unit-secret", Duration::minutes(15))),
            AuthorizationEngine::default(),
            UserServiceConfig::default(),
        );
        let tenant = TenantId::new();
        svc.signup(signup_req(tenant, "ada@example.com")).await.unwrap();

        for email in ["ada@example.com", "nobody@example.com", "not-an-email"] {
            let before = hasher.verifies.load(Ordering::SeqCst);
            let err = svc
                .signin(SigninRequest {
                    tenant_id: tenant,
                    email: email.into(),
                    password: "nope nope".into(),
                })
                .await
                .unwrap_err();
            assert_eq!(err, UserServiceError::InvalidCredentials);
            assert_eq!(hasher.verifies.load(Ordering::SeqCst), before + 1, "{email}");
        }
    }

    #[tokio::test]
    async fn self_service_on_own_record() {
        let svc = service();
        let tenant = TenantId::new();
        let me = signed_in(&svc, tenant, "me@example.com").await;

        let fetched = svc.get_user(Some(&me), None).await.unwrap();
        assert_eq!(fetched.id, me.sub);

        let updated = svc
            .update_user(
                Some(&me),
                Some(me.sub),
                UserChanges {
                    first_name: Some("Augusta".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Augusta");

        svc.delete_user(Some(&me), None).await.unwrap();
        assert_eq!(
            svc.refresh_token(Some(&me)).await.unwrap_err(),
            UserServiceError::SubjectNotFound
        );
    }

    #[tokio::test]
    async fn standard_user_cannot_touch_others() {
        let svc = service();
        let tenant = TenantId::new();
        let me = signed_in(&svc, tenant, "me@example.com").await;
        let other = signed_in(&svc, tenant, "other@example.com").await;

        let err = svc.get_user(Some(&me), Some(other.sub)).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Authz(AuthzError::Forbidden { .. })));

        let err = svc.delete_user(Some(&me), Some(other.sub)).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Authz(AuthzError::Forbidden { .. })));

        let err = svc.list_users(Some(&me)).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Authz(AuthzError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn forbidden_comes_before_not_found() {
        let svc = service();
        let me = signed_in(&svc, TenantId::new(), "me@example.com").await;

        let err = svc.get_user(Some(&me), Some(UserId::new())).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Authz(AuthzError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn standard_user_cannot_escalate_own_role() {
        let svc = service();
        let me = signed_in(&svc, TenantId::new(), "me@example.com").await;

        let err = svc
            .update_user(
                Some(&me),
                None,
                UserChanges {
                    role: Some(Role::PLATFORM_ADMIN),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::Authz(AuthzError::Forbidden { .. })));
        assert_eq!(svc.get_user(Some(&me), None).await.unwrap().role, Role::USER);
    }

    #[tokio::test]
    async fn admin_manages_any_user_in_tenant() {
        let svc = service();
        let tenant = TenantId::new();
        let root = admin(&svc, tenant).await;
        let member = signed_in(&svc, tenant, "member@example.com").await;

        assert_eq!(svc.list_users(Some(&root)).await.unwrap().len(), 2);

        let promoted = svc
            .update_user(
                Some(&root),
                Some(member.sub),
                UserChanges {
                    role: Some(Role::PLATFORM_ADMIN),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(promoted.role, Role::PLATFORM_ADMIN);

        // The member's existing token still says "user" until refreshed.
        assert_eq!(member.role, Role::USER);
        let refreshed = svc.refresh_token(Some(&member)).await.unwrap();
        assert_eq!(claims_of(&svc, &refreshed).role, Role::PLATFORM_ADMIN);

        svc.delete_user(Some(&root), Some(member.sub)).await.unwrap();
        assert_eq!(
            svc.get_user(Some(&root), Some(member.sub)).await.unwrap_err(),
            UserServiceError::NotFound
        );
    }

    #[tokio::test]
    async fn admin_cannot_reach_other_tenants() {
        let svc = service();
        let root = admin(&svc, TenantId::new()).await;
        let stranger = signed_in(&svc, TenantId::new(), "stranger@example.com").await;

        assert_eq!(
            svc.get_user(Some(&root), Some(stranger.sub)).await.unwrap_err(),
            UserServiceError::NotFound
        );
    }

    #[tokio::test]
    async fn create_user_requires_permission_and_known_role() {
        let svc = service();
        let tenant = TenantId::new();
        let root = admin(&svc, tenant).await;
        let member = signed_in(&svc, tenant, "member@example.com").await;

        let req = |role: Option<Role>| NewUserRequest {
            first_name: "New".into(),
            last_name: "Person".into(),
            email: "new@example.com".into(),
            password: "long enough".into(),
            role,
        };

        let err = svc.create_user(Some(&member), req(None)).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Authz(AuthzError::Forbidden { .. })));

        let err = svc
            .create_user(Some(&root), req(Some(Role::new("wizard"))))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::Validation(_)));

        let created = svc.create_user(Some(&root), req(None)).await.unwrap();
        assert_eq!(created.role, Role::USER);
    }

    #[tokio::test]
    async fn anonymous_callers_are_unauthenticated() {
        let svc = service();
        let err = svc.get_user(None, None).await.unwrap_err();
        assert_eq!(
            err,
            UserServiceError::Authz(AuthzError::Unauthenticated(Unauthenticated::MissingClaims))
        );
        assert!(matches!(
            svc.refresh_token(None).await.unwrap_err(),
            UserServiceError::Authz(AuthzError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn expired_claims_stop_working() {
        let svc = service();
        let me = signed_in(&svc, TenantId::new(), "me@example.com").await;

        let later = me.expires_at;
        let svc = svc.with_clock(Arc::new(move || later));
        assert!(matches!(
            svc.get_user(Some(&me), None).await.unwrap_err(),
            UserServiceError::Authz(AuthzError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let svc = service();
        let tenant = TenantId::new();
        let first = admin(&svc, tenant).await;
        let second = admin(&svc, tenant).await;
        assert_eq!(first.sub, second.sub);
        assert_eq!(first.role, Role::PLATFORM_ADMIN);
    }
}
