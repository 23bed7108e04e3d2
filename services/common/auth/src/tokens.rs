use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::TokenError;

/// Stateless issuer and verifier of HS256 bearer tokens.
pub struct TokenService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
    pub token_type: &'static str,
}

#[derive(Serialize)]
struct AccessClaims<'a> {
    sub: String,
    iss: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    jti: String,
}

impl TokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(&config.secret);
        let decoding_key = DecodingKey::from_secret(&config.secret);

        // Expiry is checked against the caller-supplied clock in `verify_at`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn issue(&self, user_id: Uuid) -> Result<IssuedToken, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let issued_at = now.timestamp();
        let expires = issued_at
            .checked_add(self.config.ttl_seconds)
            .ok_or_else(|| {
                TokenError::Signing(format!("lifetime {}s overflows expiry", self.config.ttl_seconds))
            })?;
        let expires_at = Utc
            .timestamp_opt(expires, 0)
            .single()
            .ok_or_else(|| TokenError::Signing(format!("expiry {expires} out of range")))?;

        let claims = AccessClaims {
            sub: user_id.to_string(),
            iss: &self.config.issuer,
            aud: &self.config.audience,
            iat: issued_at,
            exp: expires,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Signing(err.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at,
            expires_in: self.config.ttl_seconds,
            token_type: "Bearer",
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<Value>(token, &self.decoding_key, &self.validation).map_err(|err| {
            debug!(error = %err, "rejected bearer token");
            TokenError::Malformed
        })?;
        let claims = Claims::try_from(data.claims)?;

        if now >= claims.expires_at {
            debug!(subject = %claims.subject, "rejected expired bearer token");
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn service() -> TokenService {
        TokenService::new(
            JwtConfig::new("test-secret-which-is-long-enough", "test-issuer", "test-audience")
                .with_ttl_seconds(3600),
        )
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp")
    }

    #[test]
    fn issued_token_verifies_to_same_subject() {
        let tokens = service();
        let user = Uuid::new_v4();
        let issued = tokens.issue(user).expect("issue");
        let claims = tokens.verify(&issued.token).expect("verify");
        assert_eq!(claims.subject, user);
        assert_eq!(claims.issuer, "test-issuer");
        assert_eq!(claims.audience, vec!["test-audience".to_string()]);
        assert_eq!(issued.expires_in, 3600);
    }

    #[test]
    fn token_expires_exactly_at_lifetime() {
        let tokens = service();
        let now = fixed_now();
        let issued = tokens.issue_at(Uuid::new_v4(), now).expect("issue");
        assert_eq!(issued.expires_at, now + Duration::seconds(3600));

        let just_before = now + Duration::seconds(3599);
        assert!(tokens.verify_at(&issued.token, just_before).is_ok());

        let at_expiry = now + Duration::seconds(3600);
        assert_eq!(
            tokens.verify_at(&issued.token, at_expiry).unwrap_err(),
            TokenError::Expired
        );
        let later = now + Duration::hours(5);
        assert_eq!(
            tokens.verify_at(&issued.token, later).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn lifetime_comes_from_config() {
        let tokens = TokenService::new(
            JwtConfig::new("another-secret", "test-issuer", "test-audience")
                .with_ttl_seconds(5 * 3600),
        );
        let now = fixed_now();
        let issued = tokens.issue_at(Uuid::new_v4(), now).expect("issue");
        assert!(tokens
            .verify_at(&issued.token, now + Duration::hours(4))
            .is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_malformed() {
        let forger = TokenService::new(JwtConfig::new(
            "not-the-real-secret",
            "test-issuer",
            "test-audience",
        ));
        let issued = forger.issue(Uuid::new_v4()).expect("issue");
        assert_eq!(
            service().verify(&issued.token).unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn wrong_issuer_is_malformed() {
        let other = TokenService::new(JwtConfig::new(
            "test-secret-which-is-long-enough",
            "somebody-else",
            "test-audience",
        ));
        let issued = other.issue(Uuid::new_v4()).expect("issue");
        assert_eq!(
            service().verify(&issued.token).unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn oversized_lifetime_is_a_signing_error() {
        let tokens = TokenService::new(
            JwtConfig::new("test-secret-which-is-long-enough", "test-issuer", "test-audience")
                .with_ttl_seconds(i64::MAX),
        );
        let err = tokens.issue_at(Uuid::new_v4(), fixed_now()).unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service();
        for raw in ["", "abc", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30.sig"] {
            assert_eq!(tokens.verify(raw).unwrap_err(), TokenError::Malformed, "{raw}");
        }
    }

    #[test]
    fn expired_forged_token_reports_malformed_not_expired() {
        let forger = TokenService::new(JwtConfig::new(
            "not-the-real-secret",
            "test-issuer",
            "test-audience",
        ));
        let now = fixed_now();
        let issued = forger.issue_at(Uuid::new_v4(), now).expect("issue");
        let err = service()
            .verify_at(&issued.token, now + Duration::days(2))
            .unwrap_err();
        assert_eq!(err, TokenError::Malformed);
    }
}
