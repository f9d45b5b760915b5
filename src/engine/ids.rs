//! Newtype IDs for type-safe identification of engine objects.
//!
//! Using newtypes prevents accidentally mixing up different kinds of IDs
//! (e.g., passing an annotation ID where a region ID is expected).

use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of generated region identifiers.
const REGION_ID_LEN: usize = 10;

/// The in-memory identity of a region.
///
/// Distinct from the persisted id: a region's `RegionId` may be
/// regenerated across loads, while the persisted id survives
/// serialize/deserialize round trips.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    /// Creates a RegionId from an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random alphanumeric identifier.
    pub fn generate() -> Self {
        Self(Alphanumeric.sample_string(&mut rand::rng(), REGION_ID_LEN))
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionId({})", self.0)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RegionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A unique identifier for an annotation or prediction in a collection.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

impl AnnotationId {
    /// Creates a new AnnotationId.
    #[inline]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationId({})", self.0)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AnnotationId {
    fn from(id: u64) -> Self {
        AnnotationId::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_region_ids_are_unique() {
        let a = RegionId::generate();
        let b = RegionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), REGION_ID_LEN);
    }

    #[test]
    fn test_id_equality() {
        assert_eq!(RegionId::new("r1"), RegionId::from("r1"));
        assert_ne!(AnnotationId(1), AnnotationId(2));
    }

    #[test]
    fn test_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(AnnotationId(1));
        set.insert(AnnotationId(2));
        set.insert(AnnotationId(1)); // duplicate
        assert_eq!(set.len(), 2);
    }
}
