//! Entity identifier.

use std::fmt;
use std::str::FromStr;

/// Numeric identifier of a saved entity.
///
/// Entity IDs are issued by the per-type counter and are:
/// - Positive and increasing within one entity type
/// - Immutable once assigned
/// - Never reused (gaps are allowed)
///
/// In the store an ID is written as its decimal text.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an entity ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Creates an entity ID from a counter value.
    ///
    /// Returns `None` unless the value is positive.
    #[must_use]
    pub fn from_counter(value: i64) -> Option<Self> {
        u64::try_from(value).ok().filter(|v| *v > 0).map(Self)
    }

    /// Parses an ID stored as decimal text.
    ///
    /// Returns `None` if the bytes are not a positive decimal integer.
    #[must_use]
    pub fn from_stored(bytes: &[u8]) -> Option<Self> {
        std::str::from_utf8(bytes).ok()?.parse().ok()
    }

    /// Returns the stored (decimal text) form.
    #[must_use]
    pub fn to_stored(self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when text is not a valid [`EntityId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEntityIdError;

impl fmt::Display for ParseEntityIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("entity id must be a positive integer")
    }
}

impl std::error::Error for ParseEntityIdError {}

impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u64>() {
            Ok(v) if v > 0 && !s.starts_with('+') => Ok(Self(v)),
            _ => Err(ParseEntityIdError),
        }
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}
