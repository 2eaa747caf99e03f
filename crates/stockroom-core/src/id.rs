//! Strongly-typed identifiers for Stockroom entities.
//!
//! All identifiers are:
//! - **Strongly typed**: a `CategoryId` cannot be passed where an `ItemId` is expected
//! - **Lexicographically sortable**: ids come from one monotonic generator, so
//!   sorting by id yields creation order within the process, even inside one
//!   millisecond
//! - **Globally unique**: No coordination required for generation
//!
//! # Example
//!
//! ```rust
//! use stockroom_core::id::{CategoryId, ItemId};
//!
//! let category = CategoryId::generate();
//! let item = ItemId::generate();
//!
//! // IDs are different types - this won't compile:
//! // let wrong: CategoryId = item;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock, PoisonError};
use ulid::{Generator, Ulid};

use crate::error::{Error, Result};

static GENERATOR: OnceLock<Mutex<Generator>> = OnceLock::new();

/// Next ULID from the process-wide monotonic generator.
///
/// Ids minted in the same millisecond increment the random part instead of
/// redrawing it.
fn next_ulid() -> Ulid {
    let mut generator = GENERATOR
        .get_or_init(|| Mutex::new(Generator::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    // Overflow needs 2^80 ids in one millisecond.
    generator.generate().unwrap_or_else(|_| Ulid::new())
}

/// A unique identifier for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(Ulid);

impl CategoryId {
    /// Generates a new unique category ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(next_ulid())
    }

    /// Creates a category ID from a raw ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }

    /// Returns the creation timestamp encoded in the ID.
    #[must_use]
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        let ms = i64::try_from(self.0.timestamp_ms()).unwrap_or(i64::MAX);
        chrono::DateTime::from_timestamp_millis(ms).unwrap_or_else(chrono::Utc::now)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ulid::from_string(s.trim())
            .map(Self)
            .map_err(|e| Error::InvalidId {
                message: format!("invalid category ID '{s}': {e}"),
            })
    }
}

/// A unique identifier for an inventory item.
///
/// Items reference their owning category by [`CategoryId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Ulid);

impl ItemId {
    /// Generates a new unique item ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(next_ulid())
    }

    /// Creates an item ID from a raw ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ulid::from_string(s.trim())
            .map(Self)
            .map_err(|e| Error::InvalidId {
                message: format!("invalid item ID '{s}': {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_id_roundtrip() {
        let id = CategoryId::generate();
        let parsed: CategoryId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn item_id_roundtrip() {
        let id = ItemId::generate();
        let parsed: ItemId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ids_sort_by_creation() {
        let first = CategoryId::from_ulid(Ulid::from_parts(1_000, 7));
        let second = CategoryId::from_ulid(Ulid::from_parts(2_000, 1));
        assert!(first < second);
        assert!(first.to_string() < second.to_string());
    }

    #[test]
    fn back_to_back_ids_keep_creation_order() {
        let categories: Vec<CategoryId> = (0..1_000).map(|_| CategoryId::generate()).collect();
        assert!(categories.windows(2).all(|pair| pair[0] < pair[1]));

        let items: Vec<String> = (0..1_000).map(|_| ItemId::generate().to_string()).collect();
        assert!(items.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn invalid_id_returns_error() {
        let result: Result<ItemId> = "not-a-valid-ulid".parse();
        assert!(matches!(result, Err(Error::InvalidId { .. })));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = CategoryId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
