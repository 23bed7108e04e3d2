use std::fmt;

/// Runtime configuration for token issuance and verification.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC secret shared by signer and verifier.
    pub secret: Vec<u8>,
    /// Issuer claim (iss) written into and required on every token.
    pub issuer: String,
    /// Audience claim (aud) written into and required on every token.
    pub audience: String,
    /// Lifetime of an issued token in seconds.
    pub ttl_seconds: i64,
}

impl JwtConfig {
    /// Construct config with a one hour token lifetime.
    pub fn new(
        secret: impl Into<Vec<u8>>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_seconds: 3600,
        }
    }

    /// Adjust the token lifetime.
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds;
        self
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}
