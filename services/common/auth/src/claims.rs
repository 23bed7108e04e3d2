use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

/// Application-focused representation of verified JWT claims.
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub subject: Uuid,
    pub token_id: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub issuer: String,
    pub audience: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    sub: String,
    #[serde(default)]
    jti: Option<String>,
    iat: i64,
    exp: i64,
    iss: String,
    #[serde(default)]
    aud: Option<AudienceRepr>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AudienceRepr {
    Single(String),
    Many(Vec<String>),
}

fn timestamp(value: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(value, 0)
        .single()
        .ok_or(TokenError::Malformed)
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = TokenError;

    fn try_from(value: ClaimsRepr) -> Result<Self, TokenError> {
        let subject = Uuid::parse_str(&value.sub).map_err(|_| TokenError::Malformed)?;
        let issued_at = timestamp(value.iat)?;
        let expires_at = timestamp(value.exp)?;

        let audience = match value.aud {
            Some(AudienceRepr::Single(item)) => vec![item],
            Some(AudienceRepr::Many(items)) => items,
            None => Vec::new(),
        };

        Ok(Self {
            subject,
            token_id: value.jti,
            issued_at,
            expires_at,
            issuer: value.iss,
            audience,
        })
    }
}

impl TryFrom<serde_json::Value> for Claims {
    type Error = TokenError;

    fn try_from(value: serde_json::Value) -> Result<Self, TokenError> {
        let repr: ClaimsRepr =
            serde_json::from_value(value).map_err(|_| TokenError::Malformed)?;
        Claims::try_from(repr)
    }
}
