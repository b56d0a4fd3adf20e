use bstr::{BString, ByteSlice};
use log::debug;

use super::{ContainmentId, Graph, SegmentId};
use crate::{
    gfa::Containment,
    parser::{GFAError, GFAResult},
};

impl Graph {
    /// Add a containment line; unknown segments are created as
    /// virtual segments.
    pub fn add_containment(
        &mut self,
        containment: Containment<BString>,
    ) -> GFAResult<ContainmentId> {
        let container = self.segment_or_virtual(containment.container_name.as_bstr())?;
        let contained = self.segment_or_virtual(containment.contained_name.as_bstr())?;
        let containment = containment.map_segments(|name| {
            if *name == containment.container_name {
                container
            } else {
                contained
            }
        });
        Ok(self.insert_containment(containment))
    }

    pub(crate) fn insert_containment(
        &mut self,
        containment: Containment<SegmentId>,
    ) -> ContainmentId {
        let id = ContainmentId(self.containments.len());
        if let Ok(slot) = self.segment_slot_mut(containment.container_name) {
            slot.as_container.push(id);
        }
        if let Ok(slot) = self.segment_slot_mut(containment.contained_name) {
            slot.as_contained.push(id);
        }
        debug!(
            "Adding containment of {} in {}",
            self.name_of(containment.contained_name),
            self.name_of(containment.container_name)
        );
        self.containments.push(Some(containment));
        id
    }

    pub fn containment_ids(&self) -> impl Iterator<Item = ContainmentId> + '_ {
        self.containments
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|_| ContainmentId(i)))
    }

    pub fn containment_by_id(
        &self,
        id: ContainmentId,
    ) -> Option<&Containment<SegmentId>> {
        self.containments.get(id.0).and_then(Option::as_ref)
    }

    /// The containment with segment handles replaced by the current
    /// names.
    pub fn containment_line(&self, id: ContainmentId) -> GFAResult<Containment<BString>> {
        self.containment_by_id(id)
            .map(|c| c.map_segments(|&s| self.name_of(s)))
            .ok_or_else(|| GFAError::LineMissing(format!("containment #{}", id.0)))
    }

    /// Containments whose container is the given segment.
    pub fn contained_in<N: AsRef<[u8]>>(&self, container: N) -> Vec<ContainmentId> {
        self.segment_id(container)
            .and_then(|id| self.segment_slot(id).ok())
            .map(|slot| slot.as_container.clone())
            .unwrap_or_default()
    }

    /// Containments in which the given segment is contained.
    pub fn containing<N: AsRef<[u8]>>(&self, contained: N) -> Vec<ContainmentId> {
        self.segment_id(contained)
            .and_then(|id| self.segment_slot(id).ok())
            .map(|slot| slot.as_contained.clone())
            .unwrap_or_default()
    }

    /// The first containment of `contained` in `container`.
    pub fn containment<N, M>(&self, container: N, contained: M) -> Option<ContainmentId>
    where
        N: AsRef<[u8]>,
        M: AsRef<[u8]>,
    {
        let contained = self.segment_id(contained)?;
        self.contained_in(container).into_iter().find(|&id| {
            self.containment_by_id(id)
                .map_or(false, |c| c.contained_name == contained)
        })
    }

    pub fn delete_containment(&mut self, id: ContainmentId) -> GFAResult<()> {
        let containment = self
            .containments
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| GFAError::LineMissing(format!("containment #{}", id.0)))?;
        debug!(
            "Deleting containment of {} in {}",
            self.name_of(containment.contained_name),
            self.name_of(containment.container_name)
        );
        if let Ok(slot) = self.segment_slot_mut(containment.container_name) {
            slot.as_container.retain(|&c| c != id);
        }
        if let Ok(slot) = self.segment_slot_mut(containment.contained_name) {
            slot.as_contained.retain(|&c| c != id);
        }
        Ok(())
    }
}
