//! Caller identity and the policy applied when none is available.
//!
//! Every caller-dependent repository operation receives the caller as an
//! explicit `Option<&dyn Identity>`. `None` (or an identity with a blank
//! name) means the caller is unauthenticated; what that implies is decided by
//! [`UnauthenticatedAccess`].

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// The authenticated principal on whose behalf an operation runs.
pub trait Identity: Send + Sync {
    /// Principal name; stored as the owner of the definitions it saves.
    fn name(&self) -> &str;
}

/// A plain named principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    name: String,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Identity for Principal {
    fn name(&self) -> &str {
        &self.name
    }
}

/// What to do with callers that carry no principal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnauthenticatedAccess {
    /// Reads are not owner-filtered; saves are stamped with the anonymous owner.
    #[default]
    Unscoped,
    /// Caller-dependent operations fail with [`DataError::Unauthenticated`].
    Deny,
}

impl std::str::FromStr for UnauthenticatedAccess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unscoped" => Ok(UnauthenticatedAccess::Unscoped),
            "deny" => Ok(UnauthenticatedAccess::Deny),
            other => Err(format!("unknown unauthenticated access policy: {other}")),
        }
    }
}

impl UnauthenticatedAccess {
    /// Owner filter for a read issued by `caller`; `None` leaves results unscoped.
    pub fn read_owner(self, caller: Option<&dyn Identity>) -> Result<Option<String>, DataError> {
        match (principal_name(caller), self) {
            (Some(name), _) => Ok(Some(name.to_string())),
            (None, UnauthenticatedAccess::Unscoped) => Ok(None),
            (None, UnauthenticatedAccess::Deny) => Err(DataError::Unauthenticated(
                "listing task definitions requires an authenticated principal".into(),
            )),
        }
    }

    /// Owner recorded on a definition saved by `caller`.
    pub fn write_owner(
        self,
        caller: Option<&dyn Identity>,
        anonymous_owner: &str,
    ) -> Result<String, DataError> {
        match (principal_name(caller), self) {
            (Some(name), _) => Ok(name.to_string()),
            (None, UnauthenticatedAccess::Unscoped) => Ok(anonymous_owner.to_string()),
            (None, UnauthenticatedAccess::Deny) => Err(DataError::Unauthenticated(
                "saving a task definition requires an authenticated principal".into(),
            )),
        }
    }
}

fn principal_name(caller: Option<&dyn Identity>) -> Option<&str> {
    caller.map(|c| c.name().trim()).filter(|name| !name.is_empty())
}
