//! Camp moniker: the human-readable public key of a camp.

use core::hash::{Hash, Hasher};
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Longest moniker accepted by the domain.
pub const MAX_MONIKER_LEN: usize = 64;

/// Unique, human-readable identifier of a camp (e.g. `ATL2018`).
///
/// The original spelling is preserved for display, but equality and hashing
/// ignore ASCII case, so `atl2018` and `ATL2018` refer to the same camp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Moniker(String);

impl Moniker {
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("moniker must not be blank"));
        }
        if trimmed.chars().count() > MAX_MONIKER_LEN {
            return Err(DomainError::validation(format!(
                "moniker must be at most {MAX_MONIKER_LEN} characters"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw route value.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl PartialEq for Moniker {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Moniker {}

impl Hash for Moniker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl core::fmt::Display for Moniker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Moniker {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Moniker {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Moniker> for String {
    fn from(value: Moniker) -> Self {
        value.0
    }
}

impl AsRef<str> for Moniker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
