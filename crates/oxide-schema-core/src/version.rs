//! Engine versions and the ALTER capabilities they unlock.

use std::fmt;
use std::str::FromStr;

use crate::error::DefinitionError;

/// A SQLite library version, as reported by `sqlite_version()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SqliteVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl SqliteVersion {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns true if this version has `capability`.
    #[must_use]
    pub fn supports(self, capability: Capability) -> bool {
        self >= capability.minimum_version()
    }
}

impl FromStr for SqliteVersion {
    type Err = DefinitionError;

    /// Parses `major.minor[.patch]`; a missing patch counts as zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DefinitionError::InvalidVersion(s.to_string());

        let mut parts = s.trim().split('.');
        let mut next = |required: bool| -> Result<u32, DefinitionError> {
            match parts.next() {
                Some(part) => part.parse().map_err(|_| invalid()),
                None if required => Err(invalid()),
                None => Ok(0),
            }
        };

        let major = next(true)?;
        let minor = next(true)?;
        let patch = next(false)?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for SqliteVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Schema operations that only some engine versions run natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `ALTER TABLE ... RENAME COLUMN`.
    RenameColumn,
    /// `ALTER TABLE ... DROP COLUMN`.
    DropColumn,
    /// `ALTER TABLE ... RENAME TO` also rewriting triggers and views.
    RenameTableCascade,
}

impl Capability {
    /// First engine version with this capability.
    #[must_use]
    pub const fn minimum_version(self) -> SqliteVersion {
        match self {
            Self::RenameColumn => SqliteVersion::new(3, 25, 0),
            Self::DropColumn => SqliteVersion::new(3, 35, 0),
            Self::RenameTableCascade => SqliteVersion::new(3, 26, 0),
        }
    }
}
