use bstr::{BStr, ByteSlice};
use log::debug;

use super::{Graph, LinkId, PathId, PathSlot};
use crate::{
    gfa::*,
    parser::{GFAError, GFAResult},
};

impl Graph {
    /// Add a path line. Every pair of consecutive steps must go
    /// through a link; links that aren't in the graph yet are created
    /// as virtual links, to be promoted when their line is added.
    pub fn add_path(&mut self, path: Path) -> GFAResult<PathId> {
        if self.path_map.contains_key(&path.path_name) {
            return Err(GFAError::NotUnique(path.path_name.to_string()));
        }
        let mut steps = Vec::with_capacity(path.segment_names.len());
        for step in path.segment_names.iter() {
            let segment = self.segment_or_virtual(step.segment.as_bstr())?;
            steps.push(OrientedSegment::new(segment, step.orient()));
        }

        let id = PathId(self.paths.len());
        let mut links = Vec::with_capacity(steps.len().saturating_sub(1));
        for (i, pair) in steps.windows(2).enumerate() {
            let (from, to) = (&pair[0], &pair[1]);
            let overlap = path.overlap(i);
            let link_id = match self.link_from_to_handles(from, to, &overlap, true) {
                Some(link_id) => link_id,
                None => {
                    let mut link = Link {
                        from_segment: from.segment,
                        from_orient: from.orient(),
                        to_segment: to.segment,
                        to_orient: to.orient(),
                        overlap,
                        optional: Default::default(),
                    };
                    self.canonicize_link(&mut link);
                    self.insert_link(link, true)
                }
            };
            let slot = self.link_slot_mut(link_id)?;
            let orient = if slot.link.oriented_from() == *from {
                Orientation::Forward
            } else {
                Orientation::Backward
            };
            slot.paths.push((id, orient));
            links.push(link_id);
        }

        for step in steps.iter() {
            let slot = self.segment_slot_mut(step.segment)?;
            if !slot.paths.contains(&id) {
                slot.paths.push(id);
            }
        }

        debug!("Adding path {}", path.path_name);
        self.path_map.insert(path.path_name.clone(), id);
        self.paths.push(Some(PathSlot { path, links }));
        Ok(id)
    }

    pub(crate) fn path_slot(&self, id: PathId) -> GFAResult<&PathSlot> {
        self.paths
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| GFAError::LineMissing(format!("path #{}", id.0)))
    }

    pub(crate) fn path_slot_mut(&mut self, id: PathId) -> GFAResult<&mut PathSlot> {
        self.paths
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| GFAError::LineMissing(format!("path #{}", id.0)))
    }

    pub fn path_id<N: AsRef<[u8]>>(&self, name: N) -> Option<PathId> {
        self.path_map.get(name.as_ref().as_bstr()).copied()
    }

    pub fn path<N: AsRef<[u8]>>(&self, name: N) -> Option<&Path> {
        let id = self.path_id(name)?;
        self.path_by_id(id)
    }

    pub fn path_by_id(&self, id: PathId) -> Option<&Path> {
        self.path_slot(id).ok().map(|p| &p.path)
    }

    pub fn path_ids(&self) -> impl Iterator<Item = PathId> + '_ {
        self.paths
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|_| PathId(i)))
    }

    pub fn paths(&self) -> impl Iterator<Item = &'_ Path> {
        self.paths.iter().flatten().map(|p| &p.path)
    }

    pub fn path_names(&self) -> Vec<&'_ BStr> {
        self.paths().map(|p| p.path_name.as_bstr()).collect()
    }

    /// The paths going through a segment.
    pub fn paths_with<N: AsRef<[u8]>>(&self, segment: N) -> Vec<&'_ Path> {
        self.segment_id(segment)
            .and_then(|id| self.segment_slot(id).ok())
            .map(|slot| {
                slot.paths
                    .iter()
                    .filter_map(|&p| self.path_by_id(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The links a path goes through, one per pair of consecutive
    /// steps.
    pub fn path_links(&self, id: PathId) -> GFAResult<&[LinkId]> {
        Ok(self.path_slot(id)?.links.as_slice())
    }

    /// Remove a path. Virtual links that were only there for paths
    /// are removed once no path goes through them.
    pub fn delete_path(&mut self, id: PathId) -> GFAResult<()> {
        let slot = self
            .paths
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| GFAError::LineMissing(format!("path #{}", id.0)))?;
        debug!("Deleting path {}", slot.path.path_name);
        self.path_map.remove(&slot.path.path_name);

        for step in slot.path.segment_names.iter() {
            if let Some(segment) = self.segment_id(&step.segment) {
                if let Ok(s) = self.segment_slot_mut(segment) {
                    s.paths.retain(|&p| p != id);
                }
            }
        }
        for &link in slot.links.iter() {
            let orphan = match self.link_slot_mut(link) {
                Ok(l) => {
                    l.paths.retain(|&(p, _)| p != id);
                    l.is_virtual && l.paths.is_empty()
                }
                Err(_) => false,
            };
            if orphan {
                self.delete_link(link)?;
            }
        }
        Ok(())
    }
}
