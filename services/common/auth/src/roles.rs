use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Canonical set of role tags attached to a user.
///
/// Every entry is trimmed and lowercased on the way in, so callers never
/// branch on how a role list was spelled or shaped at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role: &str) {
        if let Some(normalized) = normalize(role) {
            self.0.insert(normalized);
        }
    }

    pub fn contains(&self, role: &str) -> bool {
        normalize(role).is_some_and(|value| self.0.contains(&value))
    }

    /// True when at least one of `required` is held.
    pub fn intersects(&self, required: &[&str]) -> bool {
        required.iter().any(|role| self.contains(role))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

fn normalize(role: &str) -> Option<String> {
    let trimmed = role.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}

impl<S: AsRef<str>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = RoleSet::new();
        for role in iter {
            set.insert(role.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for RoleSet {
    fn from(value: Vec<String>) -> Self {
        value.into_iter().collect()
    }
}

impl From<RoleSet> for Vec<String> {
    fn from(value: RoleSet) -> Self {
        value.0.into_iter().collect()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.0.iter().cloned().collect::<Vec<_>>().join(", ");
        f.write_str(&joined)
    }
}
