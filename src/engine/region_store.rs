//! Per-annotation region collection.

use serde::{Deserialize, Serialize};

use super::ids::RegionId;
use super::region::Region;

/// The mutable set of regions belonging to one annotation.
///
/// The store itself does not cascade link removal or fire host callbacks;
/// the owning annotation is responsible for both.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionStore {
    regions: Vec<Region>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a region. Callers are responsible for generating unique
    /// identities; two regions with the same id must not coexist.
    pub fn add(&mut self, region: Region) -> &Region {
        debug_assert!(
            self.get(&region.id).is_none(),
            "duplicate region id {}",
            region.id
        );
        log::debug!("region {} added ({})", region.id, region.shape.result_type());
        self.regions.push(region);
        self.regions.last().expect("just pushed")
    }

    /// Looks up a region by live identity.
    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == *id)
    }

    /// Looks up a region by live identity, mutably.
    pub fn get_mut(&mut self, id: &RegionId) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.id == *id)
    }

    /// Looks up a region by its stable persisted identifier. Used during
    /// deserialization to resolve relation endpoints expressed by
    /// persisted id rather than live identity.
    pub fn find_by_persisted_id(&self, pid: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.persisted_id() == pid)
    }

    /// Looks up a region by persisted identifier, mutably.
    pub fn find_by_persisted_id_mut(&mut self, pid: &str) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.persisted_id() == pid)
    }

    /// Removes the first region matching `id` and returns it.
    pub fn remove(&mut self, id: &RegionId) -> Option<Region> {
        let index = self.regions.iter().position(|r| r.id == *id)?;
        let region = self.regions.remove(index);
        log::debug!("region {} removed", region.id);
        Some(region)
    }

    /// Clears the selected flag on every region.
    pub fn unselect_all(&mut self) {
        for region in &mut self.regions {
            region.selected = false;
        }
    }

    /// Clears the highlighted flag on every region.
    pub fn unhighlight_all(&mut self) {
        for region in &mut self.regions {
            region.highlighted = false;
        }
    }

    /// Regions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Regions in insertion order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Region> {
        self.regions.iter_mut()
    }

    /// Currently selected regions.
    pub fn selected(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|r| r.selected)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Snapshot support: the full region list.
    pub(crate) fn to_vec(&self) -> Vec<Region> {
        self.regions.clone()
    }

    /// Snapshot support: replaces the full region list.
    pub(crate) fn restore(&mut self, regions: Vec<Region>) {
        self.regions = regions;
    }
}
