//! Directed links between regions: relations and normalizations.
//!
//! A relation is an ordered, kind-tagged pair of regions; a normalization
//! has the same shape but models "these refer to the same real-world
//! entity". Both stores enforce at most one link per ordered endpoint
//! pair, remove links in cascade when an endpoint region is destroyed,
//! and are exclusively owned by one annotation.

use serde::{Deserialize, Serialize};

use super::ids::RegionId;
use super::region::Region;
use super::region_store::RegionStore;
use super::results::{RelationEntry, WireEntry};

/// A directed, kind-tagged link between two regions in the same annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub node1: RegionId,
    pub node2: RegionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// An equivalence link between two regions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub node1: RegionId,
    pub node2: RegionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Per-annotation collection of relations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationStore {
    pub relations: Vec<Relation>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a link between the ordered pair `(a, b)`.
    ///
    /// A duplicate add is a no-op, not an error; returns whether a link
    /// was created.
    pub fn add(&mut self, a: &RegionId, b: &RegionId, kind: Option<String>) -> bool {
        if self.linked(a, b) {
            log::debug!("relation {} -> {} already exists, ignored", a, b);
            return false;
        }
        self.relations.push(Relation {
            node1: a.clone(),
            node2: b.clone(),
            kind,
        });
        true
    }

    /// Links touching `a`; with `b` given, only links matching the exact
    /// ordered pair.
    pub fn find_links(&self, a: &RegionId, b: Option<&RegionId>) -> Vec<&Relation> {
        self.relations
            .iter()
            .filter(|link| match b {
                Some(b) => link.node1 == *a && link.node2 == *b,
                None => link.node1 == *a || link.node2 == *a,
            })
            .collect()
    }

    /// True iff a link for the ordered pair `(a, b)` exists.
    pub fn linked(&self, a: &RegionId, b: &RegionId) -> bool {
        !self.find_links(a, Some(b)).is_empty()
    }

    /// Removes every link touching `region`; returns how many were removed.
    pub fn remove_for_region(&mut self, region: &RegionId) -> usize {
        let before = self.relations.len();
        self.relations
            .retain(|link| link.node1 != *region && link.node2 != *region);
        before - self.relations.len()
    }

    /// Produces one wire entry per link, referencing persisted region ids.
    pub fn serialize(&self, regions: &RegionStore) -> Vec<WireEntry> {
        self.relations
            .iter()
            .filter_map(|link| {
                let from = regions.get(&link.node1)?;
                let to = regions.get(&link.node2)?;
                Some(WireEntry::Relation(RelationEntry::new(
                    from.persisted_id(),
                    to.persisted_id(),
                    link.kind.clone(),
                )))
            })
            .collect()
    }

    /// Re-establishes a link from already-resolved regions during a load.
    pub fn deserialize_link(&mut self, a: &Region, b: &Region, kind: Option<String>) {
        self.add(&a.id, &b.id, kind);
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

/// Per-annotation collection of normalizations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStore {
    pub normalizations: Vec<Normalization>,
}

impl NormalizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equivalence link; duplicate adds are no-ops.
    pub fn add(&mut self, a: &RegionId, b: &RegionId, kind: Option<String>) -> bool {
        if self.linked(a, b) {
            log::debug!("normalization {} -> {} already exists, ignored", a, b);
            return false;
        }
        self.normalizations.push(Normalization {
            node1: a.clone(),
            node2: b.clone(),
            kind,
        });
        true
    }

    /// Links touching `a`; with `b` given, only the exact ordered pair.
    pub fn find_links(&self, a: &RegionId, b: Option<&RegionId>) -> Vec<&Normalization> {
        self.normalizations
            .iter()
            .filter(|link| match b {
                Some(b) => link.node1 == *a && link.node2 == *b,
                None => link.node1 == *a || link.node2 == *a,
            })
            .collect()
    }

    pub fn linked(&self, a: &RegionId, b: &RegionId) -> bool {
        !self.find_links(a, Some(b)).is_empty()
    }

    /// Removes every link touching `region`; returns how many were removed.
    pub fn remove_for_region(&mut self, region: &RegionId) -> usize {
        let before = self.normalizations.len();
        self.normalizations
            .retain(|link| link.node1 != *region && link.node2 != *region);
        before - self.normalizations.len()
    }

    /// Produces one wire entry per link, referencing persisted region ids.
    pub fn serialize(&self, regions: &RegionStore) -> Vec<WireEntry> {
        self.normalizations
            .iter()
            .filter_map(|link| {
                let from = regions.get(&link.node1)?;
                let to = regions.get(&link.node2)?;
                Some(WireEntry::Relation(RelationEntry::normalization(
                    from.persisted_id(),
                    to.persisted_id(),
                    link.kind.clone(),
                )))
            })
            .collect()
    }

    /// Re-establishes a link from already-resolved regions during a load.
    pub fn deserialize_link(&mut self, a: &Region, b: &Region, kind: Option<String>) {
        self.add(&a.id, &b.id, kind);
    }

    pub fn len(&self) -> usize {
        self.normalizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalizations.is_empty()
    }
}
