use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::env;

use common_auth::JwtConfig;

use crate::credentials::PasswordHashing;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ISSUER: &str = "restaurant-service";
const DEFAULT_AUDIENCE: &str = "restaurant-clients";
const DEFAULT_TTL_SECONDS: i64 = 3600;
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:5173",
];

pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub hashing: PasswordHashing,
    pub admin_emails: HashSet<String>,
    pub cors_allowed_origins: Vec<String>,
}

pub fn load_service_config() -> Result<ServiceConfig> {
    load_from(|key| env::var(key).ok())
}

/// Builds the configuration from an arbitrary key lookup.
pub fn load_from<F>(lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("HOST")
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = parse_number(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);

    let database_url = lookup("DATABASE_URL").and_then(|value| normalize_optional(&value));

    let secret = lookup("JWT_SECRET")
        .and_then(|value| normalize_optional(&value))
        .context("JWT_SECRET must be set")?;
    let issuer = lookup("JWT_ISSUER")
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| DEFAULT_ISSUER.to_string());
    let audience = lookup("JWT_AUDIENCE")
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string());
    let ttl_seconds = parse_number::<i64, _>(&lookup, "JWT_TTL_SECONDS")?.unwrap_or(DEFAULT_TTL_SECONDS);
    if ttl_seconds <= 0 {
        return Err(anyhow!("JWT_TTL_SECONDS must be positive, got {ttl_seconds}"));
    }
    let jwt = JwtConfig::new(secret.into_bytes(), issuer, audience).with_ttl_seconds(ttl_seconds);

    let defaults = PasswordHashing::default();
    let hashing = PasswordHashing {
        memory_kib: parse_number(&lookup, "PASSWORD_HASH_MEMORY_KIB")?.unwrap_or(defaults.memory_kib),
        iterations: parse_number(&lookup, "PASSWORD_HASH_ITERATIONS")?.unwrap_or(defaults.iterations),
        parallelism: parse_number(&lookup, "PASSWORD_HASH_PARALLELISM")?.unwrap_or(defaults.parallelism),
    };

    let admin_emails = lookup("ADMIN_EMAILS")
        .map(|value| parse_list(&value).into_iter().map(|email| email.to_lowercase()).collect())
        .unwrap_or_default();

    let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
        .map(|value| parse_list(&value))
        .filter(|origins| !origins.is_empty())
        .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(|origin| origin.to_string()).collect());

    Ok(ServiceConfig {
        host,
        port,
        database_url,
        jwt,
        hashing,
        admin_emails,
        cors_allowed_origins,
    })
}

fn parse_number<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).and_then(|value| normalize_optional(&value)) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|err| anyhow!("Failed to parse {key} '{raw}': {err}")),
        None => Ok(None),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(normalize_optional)
        .collect()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn secret_is_required() {
        let err = load_from(lookup(&[])).err().expect("missing secret must fail");
        assert!(err.to_string().contains("JWT_SECRET"));

        assert!(load_from(lookup(&[("JWT_SECRET", "   ")])).is_err());
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load_from(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(config.database_url.is_none());
        assert_eq!(config.jwt.ttl_seconds, 3600);
        assert_eq!(config.jwt.issuer, DEFAULT_ISSUER);
        assert_eq!(config.hashing, PasswordHashing::default());
        assert!(config.admin_emails.is_empty());
        assert_eq!(config.cors_allowed_origins.len(), DEFAULT_CORS_ORIGINS.len());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load_from(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("PORT", "9090"),
            ("DATABASE_URL", "postgres://localhost/restaurant"),
            ("JWT_TTL_SECONDS", "120"),
            ("ADMIN_EMAILS", "Chef@Example.com; owner@example.com"),
            ("PASSWORD_HASH_ITERATIONS", "3"),
            ("CORS_ALLOWED_ORIGINS", "https://shop.example.com"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/restaurant"));
        assert_eq!(config.jwt.ttl_seconds, 120);
        assert!(config.admin_emails.contains("chef@example.com"));
        assert!(config.admin_emails.contains("owner@example.com"));
        assert_eq!(config.hashing.iterations, 3);
        assert_eq!(config.cors_allowed_origins, vec!["https://shop.example.com".to_string()]);
    }

    #[test]
    fn malformed_numbers_are_errors() {
        assert!(load_from(lookup(&[("JWT_SECRET", "s"), ("PORT", "eighty")])).is_err());
        assert!(load_from(lookup(&[("JWT_SECRET", "s"), ("JWT_TTL_SECONDS", "0")])).is_err());
        assert!(load_from(lookup(&[("JWT_SECRET", "s"), ("PASSWORD_HASH_MEMORY_KIB", "-1")])).is_err());
    }
}
