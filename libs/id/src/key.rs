//! Namespaced object keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IdError;
use crate::name::validate_name;

/// Namespace used when a key is written without one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Identity of a desired-state record: `namespace/name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    /// Builds a key after validating both parts.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self, IdError> {
        let namespace = namespace.into();
        let name = name.into();
        validate_name("namespace", &namespace)?;
        validate_name("name", &name)?;
        Ok(Self { namespace, name })
    }

    /// Key in the `default` namespace.
    pub fn in_default(name: impl Into<String>) -> Result<Self, IdError> {
        Self::new(DEFAULT_NAMESPACE, name)
    }

    /// Parses `namespace/name`.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        let Some((namespace, name)) = s.split_once('/') else {
            return Err(IdError::MissingSeparator(s.to_string()));
        };

        Self::new(namespace, name)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ObjectKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
