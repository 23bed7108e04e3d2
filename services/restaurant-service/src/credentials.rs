use std::collections::HashSet;
use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use common_auth::{AuthError, AuthResult, IdentityResolver, RoleSet, ROLE_ADMIN, ROLE_USER};
use rand_core::OsRng;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{stored_now, User};
use crate::store::{StoreError, UserRecord, UserStore};

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashing {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordHashing {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    #[error("{field} is already registered")]
    DuplicateIdentity { field: &'static str },
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CredentialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } => CredentialError::DuplicateIdentity { field },
            other => CredentialError::Store(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct CredentialService {
    users: Arc<dyn UserStore>,
    hasher: Argon2<'static>,
    admin_emails: HashSet<String>,
    dummy_hash: String,
}

impl CredentialService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hashing: PasswordHashing,
        admin_emails: HashSet<String>,
    ) -> Result<Self, CredentialError> {
        let params = Params::new(hashing.memory_kib, hashing.iterations, hashing.parallelism, None)
            .map_err(|err| CredentialError::Hashing(err.to_string()))?;
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = hasher
            .hash_password(Uuid::new_v4().as_bytes(), &salt)
            .map_err(|err| CredentialError::Hashing(err.to_string()))?
            .to_string();
        let admin_emails = admin_emails
            .into_iter()
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect();

        Ok(Self {
            users,
            hasher,
            admin_emails,
            dummy_hash,
        })
    }

    pub async fn register(&self, registration: Registration) -> Result<User, CredentialError> {
        let username = registration.username.trim().to_string();
        let email = registration.email.trim().to_lowercase();
        let password = registration.password;

        if username.is_empty() {
            return Err(validation("username", "Username is required"));
        }
        if username.contains('@') {
            return Err(validation("username", "Username must not contain '@'"));
        }
        if email.is_empty() {
            return Err(validation("email", "Email is required"));
        }
        if !is_plausible_email(&email) {
            return Err(validation("email", "Email address is invalid"));
        }
        if password.trim().is_empty() {
            return Err(validation("password", "Password is required"));
        }

        let password_hash = self.hash_password(&password)?;
        let mut roles = RoleSet::from_iter([ROLE_USER]);
        if self.admin_emails.contains(&email) {
            roles.insert(ROLE_ADMIN);
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            roles,
            created_at: stored_now(),
        };
        let stored = self.users.insert_user(record).await?;
        info!(user_id = %stored.id, roles = %stored.roles, "user registered");
        Ok(User::from(stored))
    }

    /// Unknown identifiers and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<User, CredentialError> {
        let identifier = identifier.trim();
        let record = if identifier.is_empty() {
            None
        } else {
            self.users.find_user_by_identifier(identifier).await?
        };

        let Some(record) = record else {
            let _ = self.verify_password(password, &self.dummy_hash);
            return Err(CredentialError::InvalidCredentials);
        };

        if self.verify_password(password, &record.password_hash) {
            Ok(User::from(record))
        } else {
            Err(CredentialError::InvalidCredentials)
        }
    }

    pub async fn find_user(&self, id: Uuid) -> Result<Option<User>, CredentialError> {
        Ok(self.users.find_user_by_id(id).await?.map(User::from))
    }

    fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| CredentialError::Hashing(err.to_string()))
    }

    fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .hasher
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(err) => {
                warn!(error = %err, "stored password hash is unreadable");
                false
            }
        }
    }
}

#[async_trait]
impl IdentityResolver for CredentialService {
    async fn resolve_roles(&self, user_id: Uuid) -> AuthResult<Option<RoleSet>> {
        self.users
            .find_user_by_id(user_id)
            .await
            .map(|record| record.map(|record| record.roles))
            .map_err(|err| AuthError::Resolver(err.to_string()))
    }
}

fn validation(field: &'static str, message: &str) -> CredentialError {
    CredentialError::Validation {
        field,
        message: message.to_string(),
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn cheap_hashing() -> PasswordHashing {
        PasswordHashing {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn service(admins: &[&str]) -> CredentialService {
        CredentialService::new(
            Arc::new(MemoryStore::new()),
            cheap_hashing(),
            admins.iter().map(|email| email.to_string()).collect(),
        )
        .unwrap()
    }

    fn registration(username: &str, email: &str, password: &str) -> Registration {
        Registration {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_normalizes_email_and_assigns_user_role() {
        let credentials = service(&[]);
        let user = credentials
            .register(registration(" alice ", " Alice@Example.COM ", "s3cret"))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(user.roles.contains(ROLE_USER));
        assert!(!user.roles.contains(ROLE_ADMIN));
    }

    #[tokio::test]
    async fn configured_admin_email_gets_admin_role() {
        let credentials = service(&["Chef@Example.com"]);
        let user = credentials
            .register(registration("chef", "chef@example.com", "pw"))
            .await
            .unwrap();
        assert!(user.roles.contains(ROLE_ADMIN));
        assert!(user.roles.contains(ROLE_USER));
    }

    #[tokio::test]
    async fn register_rejects_blank_and_malformed_fields() {
        let credentials = service(&[]);
        for (input, expected_field) in [
            (registration("", "a@b.c", "pw"), "username"),
            (registration("a@b", "a@b.c", "pw"), "username"),
            (registration("alice", "  ", "pw"), "email"),
            (registration("alice", "not-an-email", "pw"), "email"),
            (registration("alice", "a@b.c", "   "), "password"),
        ] {
            match credentials.register(input).await {
                Err(CredentialError::Validation { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected validation error for {expected_field}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn duplicate_username_or_email_is_rejected() {
        let credentials = service(&[]);
        credentials
            .register(registration("alice", "alice@example.com", "pw"))
            .await
            .unwrap();

        let err = credentials
            .register(registration("alice", "fresh@example.com", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::DuplicateIdentity { field: "username" }));

        let err = credentials
            .register(registration("fresh", "ALICE@example.com", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::DuplicateIdentity { field: "email" }));
    }

    #[tokio::test]
    async fn authenticate_by_username_or_email() {
        let credentials = service(&[]);
        let registered = credentials
            .register(registration("alice", "alice@example.com", "s3cret"))
            .await
            .unwrap();

        let by_name = credentials.authenticate("alice", "s3cret").await.unwrap();
        assert_eq!(by_name.id, registered.id);
        let by_email = credentials.authenticate("ALICE@example.com", "s3cret").await.unwrap();
        assert_eq!(by_email.id, registered.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_fail_identically() {
        let credentials = service(&[]);
        credentials
            .register(registration("alice", "alice@example.com", "s3cret"))
            .await
            .unwrap();

        let wrong = credentials.authenticate("alice", "nope").await.unwrap_err();
        let unknown = credentials.authenticate("mallory", "s3cret").await.unwrap_err();
        let blank = credentials.authenticate("  ", "s3cret").await.unwrap_err();
        assert!(matches!(wrong, CredentialError::InvalidCredentials));
        assert!(matches!(unknown, CredentialError::InvalidCredentials));
        assert!(matches!(blank, CredentialError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn stored_hash_is_argon2id_and_not_the_password() {
        let store = Arc::new(MemoryStore::new());
        let credentials =
            CredentialService::new(store.clone(), cheap_hashing(), HashSet::new()).unwrap();
        let user = credentials
            .register(registration("alice", "alice@example.com", "s3cret"))
            .await
            .unwrap();

        let record = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert!(record.password_hash.starts_with("$argon2id$"));
        assert!(!record.password_hash.contains("s3cret"));
    }

    #[tokio::test]
    async fn resolver_reports_missing_users_as_none() {
        let credentials = service(&[]);
        let user = credentials
            .register(registration("alice", "alice@example.com", "pw"))
            .await
            .unwrap();

        let roles = credentials.resolve_roles(user.id).await.unwrap().unwrap();
        assert!(roles.contains(ROLE_USER));
        assert!(credentials.resolve_roles(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[test]
    fn invalid_cost_parameters_are_rejected() {
        let result = CredentialService::new(
            Arc::new(MemoryStore::new()),
            PasswordHashing {
                memory_kib: 1,
                iterations: 0,
                parallelism: 0,
            },
            HashSet::new(),
        );
        assert!(matches!(result, Err(CredentialError::Hashing(_))));
    }
}
