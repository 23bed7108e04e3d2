use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderValue};
use tracing::Span;
use uuid::Uuid;

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::roles::RoleSet;
use crate::tokens::TokenService;

/// Looks up the current role set of a token subject.
///
/// `Ok(None)` means the user no longer exists.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_roles(&self, user_id: Uuid) -> AuthResult<Option<RoleSet>>;
}

/// Caller identity resolved from a verified bearer token.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_id: Uuid,
    pub roles: RoleSet,
    pub claims: Claims,
}

impl CallerIdentity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    Arc<TokenService>: FromRef<S>,
    Arc<dyn IdentityResolver>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        let resolver = Arc::<dyn IdentityResolver>::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(parse_bearer)
            .ok_or(AuthError::MissingToken)?;

        let claims = tokens.verify(&token)?;
        let user_id = claims.subject;

        let roles = resolver
            .resolve_roles(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Span::current().record("user_id", tracing::field::display(user_id));

        Ok(Self {
            user_id,
            roles,
            claims,
        })
    }
}

fn parse_bearer(value: &HeaderValue) -> Option<String> {
    let raw = value.to_str().ok()?.trim();
    let token = raw.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }

    Some(token.to_owned())
}
