use std::collections::VecDeque;

use bstr::{BString, ByteSlice};
use fnv::FnvHashSet;

use super::{Graph, LinkId, SegmentId};
use crate::parser::{GFAError, GFAResult};

impl Graph {
    /// Segments sharing a link with `segment`, ignoring link `skip`.
    fn linked_segments(&self, segment: SegmentId, skip: Option<LinkId>) -> Vec<SegmentId> {
        let slot = match self.segment_slot(segment) {
            Ok(slot) => slot,
            Err(_) => return Vec::new(),
        };
        slot.links
            .all()
            .into_iter()
            .filter(|&id| Some(id) != skip)
            .filter_map(|id| self.link_by_id(id))
            .map(|link| {
                if link.from_segment == segment {
                    link.to_segment
                } else {
                    link.from_segment
                }
            })
            .collect()
    }

    /// Breadth-first walk over links from `start`, stopping early if
    /// `target` is reached. Returns the segments visited in order.
    fn walk(
        &self,
        start: SegmentId,
        skip: Option<LinkId>,
        target: Option<SegmentId>,
    ) -> Vec<SegmentId> {
        let mut visited = FnvHashSet::default();
        let mut order = vec![start];
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);
        while let Some(segment) = queue.pop_front() {
            for next in self.linked_segments(segment, skip) {
                if visited.insert(next) {
                    order.push(next);
                    if Some(next) == target {
                        return order;
                    }
                    queue.push_back(next);
                }
            }
        }
        order
    }

    /// Whether removing a link would split its connected component in
    /// two. A link from a segment to itself never does.
    pub fn is_cut_link(&self, id: LinkId) -> GFAResult<bool> {
        let link = &self.link_slot(id)?.link;
        if link.is_circular() {
            return Ok(false);
        }
        let (from, to) = (link.from_segment, link.to_segment);
        let reached = self.walk(from, Some(id), Some(to));
        Ok(!reached.contains(&to))
    }

    /// The names of the segments connected to `name` through links,
    /// starting with `name` itself.
    pub fn segment_connected_component<N: AsRef<[u8]>>(
        &self,
        name: N,
    ) -> GFAResult<Vec<BString>> {
        let name = name.as_ref();
        let id = self.segment_id(name).ok_or_else(|| {
            GFAError::LineMissing(format!("segment {}", name.as_bstr()))
        })?;
        Ok(self
            .walk(id, None, None)
            .into_iter()
            .map(|s| self.name_of(s))
            .collect())
    }

    /// Partition the segments into connected components, in the order
    /// in which segments were added.
    pub fn connected_components(&self) -> Vec<Vec<BString>> {
        let mut seen = FnvHashSet::default();
        let mut components = Vec::new();
        for (id, _) in self.segment_slots() {
            if seen.contains(&id) {
                continue;
            }
            let component = self.walk(id, None, None);
            seen.extend(component.iter().copied());
            components.push(component.into_iter().map(|s| self.name_of(s)).collect());
        }
        components
    }
}
