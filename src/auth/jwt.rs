use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use super::claims::Claims;
use crate::{config::JwtConfig, error::AuthFailure, state::AppState, users::User};

/// Upper bound on token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.clamp(0, MAX_TTL_MINUTES) as u64 * 60),
        }
    }

    pub fn sign(&self, user: &User) -> anyhow::Result<String> {
        self.sign_at(user, OffsetDateTime::now_utc())
    }

    fn sign_at(&self, user: &User, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, role = %user.role, "jwt signed");
        Ok(token)
    }

    /// Checks signature, expiry, issuer and audience.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthFailure> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => {
                debug!(user_id = %data.claims.sub, role = %data.claims.role, "jwt verified");
                Ok(data.claims)
            }
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                warn!("expired token");
                Err(AuthFailure::Expired)
            }
            Err(e) => {
                warn!(error = %e, "invalid token");
                Err(AuthFailure::InvalidToken)
            }
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::new(&state.config.jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::Role;
    use uuid::Uuid;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 60,
        })
    }

    fn user(role: Role) -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            email: "ann@x.com".into(),
            username: "ann".into(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            role,
            profile_image: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sign_and_verify_carries_identity_and_role() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let admin = user(Role::Admin);
        let token = keys.sign(&admin).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.email, "ann@x.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        let keys = JwtKeys::new(&JwtConfig {
            secret: "dev-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: i64::MAX,
        });
        assert_eq!(keys.ttl, Duration::from_secs(MAX_TTL_MINUTES as u64 * 60));
        let claims = keys.verify(&keys.sign(&user(Role::User)).expect("sign")).expect("verify");
        assert_eq!(claims.exp - claims.iat, MAX_TTL_MINUTES as usize * 60);

        let negative = JwtKeys::new(&JwtConfig {
            secret: "dev-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: -5,
        });
        assert_eq!(negative.ttl, Duration::ZERO);
    }

    #[test]
    fn expired_token_is_distinguished() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let long_ago = OffsetDateTime::now_utc() - TimeDuration::days(2);
        let token = keys.sign_at(&user(Role::User), long_ago).expect("sign");
        assert_eq!(keys.verify(&token).unwrap_err(), AuthFailure::Expired);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let good = make_keys("secret-a", "iss", "aud");
        let bad = make_keys("secret-b", "iss", "aud");
        let token = good.sign(&user(Role::Admin)).expect("sign");
        assert_eq!(bad.verify(&token).unwrap_err(), AuthFailure::InvalidToken);
    }

    #[test]
    fn wrong_issuer_or_audience_is_invalid() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.sign(&user(Role::User)).expect("sign");
        assert_eq!(bad.verify(&token).unwrap_err(), AuthFailure::InvalidToken);
    }

    #[test]
    fn garbage_is_invalid() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert_eq!(keys.verify("not.a.jwt").unwrap_err(), AuthFailure::InvalidToken);
    }
}
