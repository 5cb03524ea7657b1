//! API version selection.
//!
//! Clients pick a version out-of-path: the `X-Version` header wins, then the
//! `ver` query parameter, then the configured default. Routes that behave
//! differently per version resolve their variant through a [`VersionTable`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const VERSION_HEADER: &str = "x-version";
pub const VERSION_QUERY_PARAM: &str = "ver";
pub const SUPPORTED_VERSIONS_HEADER: &str = "api-supported-versions";

pub const V1_0: ApiVersion = ApiVersion::new(1, 0);
pub const V1_1: ApiVersion = ApiVersion::new(1, 1);

/// Every version this server answers to, oldest first.
pub const SUPPORTED: [ApiVersion; 2] = [V1_0, V1_1];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    major: u16,
    minor: u16,
}

impl ApiVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    pub fn major(&self) -> u16 {
        self.major
    }

    pub fn minor(&self) -> u16 {
        self.minor
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED.contains(self)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("'{0}' is not a valid API version")]
    Malformed(String),

    #[error("API version {0} is not supported")]
    Unsupported(ApiVersion),
}

impl FromStr for ApiVersion {
    type Err = VersionError;

    /// Accepts `major.minor` or a bare `major` (read as `major.0`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let malformed = || VersionError::Malformed(raw.to_string());
        let (major, minor) = match raw.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (raw, "0"),
        };
        let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
        if !digits(major) || !digits(minor) {
            return Err(malformed());
        }
        Ok(Self::new(
            major.parse().map_err(|_| malformed())?,
            minor.parse().map_err(|_| malformed())?,
        ))
    }
}

/// Parse a requested version and check it against [`SUPPORTED`].
pub fn negotiate(raw: &str) -> Result<ApiVersion, VersionError> {
    let version: ApiVersion = raw.parse()?;
    if version.is_supported() {
        Ok(version)
    } else {
        Err(VersionError::Unsupported(version))
    }
}

/// Value of the `api-supported-versions` response header.
pub fn supported_versions_header() -> String {
    SUPPORTED
        .iter()
        .map(ApiVersion::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Per-route mapping from version to behaviour variant.
#[derive(Debug, Clone)]
pub struct VersionTable<V> {
    entries: BTreeMap<ApiVersion, V>,
}

impl<V: Copy> VersionTable<V> {
    pub fn new(entries: impl IntoIterator<Item = (ApiVersion, V)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn resolve(&self, version: ApiVersion) -> Result<V, VersionError> {
        self.entries
            .get(&version)
            .copied()
            .ok_or(VersionError::Unsupported(version))
    }

    pub fn versions(&self) -> impl Iterator<Item = ApiVersion> + '_ {
        self.entries.keys().copied()
    }
}

/// How `GET /api/camps/{moniker}` loads its camp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetCampVariant {
    /// 1.0: the camp alone.
    WithoutTalks,
    /// 1.1: the camp with its talks.
    WithTalks,
}

impl GetCampVariant {
    pub fn include_talks(self) -> bool {
        matches!(self, Self::WithTalks)
    }
}

pub fn get_camp_table() -> VersionTable<GetCampVariant> {
    VersionTable::new([
        (V1_0, GetCampVariant::WithoutTalks),
        (V1_1, GetCampVariant::WithTalks),
    ])
}
