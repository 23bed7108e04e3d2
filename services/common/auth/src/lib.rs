pub mod claims;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod roles;
pub mod tokens;

pub use claims::Claims;
pub use config::JwtConfig;
pub use error::{AuthError, AuthResult, TokenError};
pub use extractors::{CallerIdentity, IdentityResolver};
pub use guards::ensure_role;
pub use roles::{RoleSet, ROLE_ADMIN, ROLE_USER};
pub use tokens::{IssuedToken, TokenService};
