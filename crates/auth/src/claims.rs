use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gatehouse_core::{TenantId, UserId};

use crate::Role;

/// Identity claim carried inside a signed token.
///
/// Tenant and role are trusted as of signing time; nothing re-reads them from
/// storage on later requests. Timestamps travel as Unix seconds (`iat`/`exp`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject: the authenticated user's id.
    pub sub: UserId,

    /// Tenant (namespace) the subject belongs to.
    #[serde(rename = "tenant")]
    pub tenant_id: TenantId,

    /// Role granted at signing time.
    pub role: Role,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl IdentityClaims {
    /// Claims valid from `now` for `ttl`.
    ///
    /// `now` is truncated to whole seconds so the in-memory claims equal what
    /// a round trip through a token yields. Fails if `ttl` is not positive or
    /// pushes the expiry past the representable range.
    pub fn issue(
        sub: UserId,
        tenant_id: TenantId,
        role: Role,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, TokenValidationError> {
        if ttl <= Duration::zero() {
            return Err(TokenValidationError::InvalidTimeWindow);
        }
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or(TokenValidationError::TtlOutOfRange)?;

        Ok(Self {
            sub,
            tenant_id,
            role,
            issued_at,
            expires_at,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("token lifetime overflows the representable time range")]
    TtlOutOfRange,
}

/// Deterministically validate the claim time window.
///
/// Signature verification happens in [`crate::token`]; this only looks at
/// the timestamps.
pub fn validate_claims(claims: &IdentityClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if claims.is_expired(now) {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn claims(iat: i64, exp: i64) -> IdentityClaims {
        IdentityClaims {
            sub: UserId::new(),
            tenant_id: TenantId::new(),
            role: Role::USER,
            issued_at: at(iat),
            expires_at: at(exp),
        }
    }

    #[test]
    fn active_inside_window() {
        assert_eq!(validate_claims(&claims(100, 200), at(150)), Ok(()));
        assert_eq!(validate_claims(&claims(100, 200), at(100)), Ok(()));
    }

    #[test]
    fn expired_at_exact_expiry() {
        assert_eq!(
            validate_claims(&claims(100, 200), at(200)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn future_issue_is_not_yet_valid() {
        assert_eq!(
            validate_claims(&claims(100, 200), at(99)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert_eq!(
            validate_claims(&claims(200, 200), at(200)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn issue_truncates_to_seconds() {
        let now = at(1_700_000_000) + Duration::milliseconds(750);
        let c = IdentityClaims::issue(UserId::new(), TenantId::new(), Role::USER, now, Duration::minutes(5)).unwrap();
        assert_eq!(c.issued_at, at(1_700_000_000));
        assert_eq!(c.expires_at, at(1_700_000_300));
    }

    #[test]
    fn oversized_ttl_is_an_error_not_a_panic() {
        let huge = Duration::try_seconds(9_000_000_000_000_000).unwrap();
        assert_eq!(
            IdentityClaims::issue(UserId::new(), TenantId::new(), Role::USER, at(1_700_000_000), huge),
            Err(TokenValidationError::TtlOutOfRange)
        );
        assert_eq!(
            IdentityClaims::issue(UserId::new(), TenantId::new(), Role::USER, at(1_700_000_000), Duration::MAX),
            Err(TokenValidationError::TtlOutOfRange)
        );
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        assert_eq!(
            IdentityClaims::issue(UserId::new(), TenantId::new(), Role::USER, at(100), Duration::zero()),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn wire_names_are_compact() {
        let json = serde_json::to_value(claims(100, 200)).unwrap();
        assert_eq!(json["iat"], 100);
        assert_eq!(json["exp"], 200);
        assert_eq!(json["role"], "user");
        assert!(json.get("tenant").is_some());
    }
}
