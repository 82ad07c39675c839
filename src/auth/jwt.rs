use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use uuid::Uuid;

use super::claims::Claims;
use crate::config::JwtConfig;

/// Why a token was refused. Callers log the variant; clients only ever see
/// "invalid token".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    Signature,
    #[error("token expired")]
    Expired,
    #[error("token issuer or audience mismatch")]
    Claims,
}

impl TokenError {
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Signing(_) => "signing",
            TokenError::Malformed => "malformed",
            TokenError::Signature => "signature",
            TokenError::Expired => "expired",
            TokenError::Claims => "claims",
        }
    }
}

/// Issues and validates HS256 identity tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Result<Self, TokenError> {
        if cfg.secret.is_empty() {
            return Err(TokenError::Signing("signing secret is empty".into()));
        }
        if cfg.ttl_minutes <= 0 {
            return Err(TokenError::Signing("token lifetime must be positive".into()));
        }
        let ttl_secs = cfg
            .ttl_minutes
            .checked_mul(60)
            .ok_or_else(|| TokenError::Signing("token lifetime is too large".into()))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(ttl_secs as u64),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid, username: &str, email: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, username, email, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        username: &str,
        email: &str,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let exp = now
            .checked_add(TimeDuration::seconds(self.ttl.as_secs() as i64))
            .ok_or_else(|| TokenError::Signing("token expiry out of range".into()))?;
        let claims = Claims {
            sub: user_id,
            username: username.to_owned(),
            email: email.to_owned(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, OffsetDateTime::now_utc())
    }

    /// Signature and claim checks come from jsonwebtoken; expiry is checked
    /// here against `now` with no leeway.
    pub(crate) fn validate_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::Signature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => TokenError::Claims,
                _ => TokenError::Malformed,
            }
        })?;

        if data.claims.is_expired_at(now.unix_timestamp()) {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret".into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        ttl_minutes: 60 * 24,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 60 * 24,
        })
        .expect("keys")
    }

    fn tamper_signature(token: &str) -> String {
        let (head, sig) = token.rsplit_once('.').expect("three segments");
        let mut chars: Vec<char> = sig.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        format!("{}.{}", head, chars.into_iter().collect::<String>())
    }

    #[test]
    fn issue_and_validate_roundtrip() {
        let keys = JwtKeys::new(&test_config()).expect("keys");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, "alice", "a@x.com").expect("issue");
        let claims = keys.validate(&token).expect("validate");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 60 * 60 * 24);
    }

    #[test]
    fn token_expires_after_lifetime() {
        let keys = JwtKeys::new(&test_config()).expect("keys");
        let issued = OffsetDateTime::now_utc();
        let token = keys
            .issue_at(Uuid::new_v4(), "alice", "a@x.com", issued)
            .expect("issue");

        let just_before = issued + TimeDuration::seconds(keys.ttl().as_secs() as i64 - 1);
        assert!(keys.validate_at(&token, just_before).is_ok());

        let at_expiry = issued + TimeDuration::seconds(keys.ttl().as_secs() as i64);
        assert_eq!(keys.validate_at(&token, at_expiry), Err(TokenError::Expired));
    }

    #[test]
    fn token_issued_long_ago_is_rejected_by_validate() {
        let keys = JwtKeys::new(&test_config()).expect("keys");
        let long_ago = OffsetDateTime::now_utc() - TimeDuration::days(2);
        let token = keys
            .issue_at(Uuid::new_v4(), "alice", "a@x.com", long_ago)
            .expect("issue");
        assert_eq!(keys.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn altered_signature_is_rejected() {
        let keys = JwtKeys::new(&test_config()).expect("keys");
        let token = keys.issue(Uuid::new_v4(), "alice", "a@x.com").expect("issue");
        let forged = tamper_signature(&token);
        assert_eq!(keys.validate(&forged), Err(TokenError::Signature));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let good = make_keys("secret-a", "iss", "aud");
        let other = make_keys("secret-b", "iss", "aud");
        let token = other.issue(Uuid::new_v4(), "mallory", "m@x.com").expect("issue");
        assert_eq!(good.validate(&token), Err(TokenError::Signature));
    }

    #[test]
    fn wrong_issuer_or_audience_is_rejected() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4(), "alice", "a@x.com").expect("issue");
        assert_eq!(bad.validate(&token), Err(TokenError::Claims));
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = JwtKeys::new(&test_config()).expect("keys");
        assert_eq!(keys.validate("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(keys.validate(""), Err(TokenError::Malformed));
    }

    #[test]
    fn overflowing_lifetime_is_rejected_at_construction() {
        let mut cfg = test_config();
        cfg.ttl_minutes = i64::MAX;
        let err = JwtKeys::new(&cfg).unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }

    #[test]
    fn expiry_past_calendar_range_is_a_signing_error() {
        let mut cfg = test_config();
        cfg.ttl_minutes = 10_000_000_000;
        let keys = JwtKeys::new(&cfg).expect("keys");
        let err = keys.issue(Uuid::new_v4(), "alice", "a@x.com").unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }

    #[test]
    fn empty_secret_cannot_sign() {
        let mut cfg = test_config();
        cfg.secret.clear();
        let err = JwtKeys::new(&cfg).unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }
}
