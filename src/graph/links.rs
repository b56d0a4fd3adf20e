use bstr::{BString, ByteSlice};
use log::{debug, trace};

use super::{Graph, LinkId, LinkSlot, PathId, SegmentId};
use crate::{
    cigar::CIGAR,
    gfa::*,
    parser::{GFAError, GFAResult},
};

fn with_handles(link: Link<BString>, from: SegmentId, to: SegmentId) -> Link<SegmentId> {
    Link {
        from_segment: from,
        from_orient: link.from_orient,
        to_segment: to,
        to_orient: link.to_orient,
        overlap: link.overlap,
        optional: link.optional,
    }
}

fn push_unique(list: &mut Vec<LinkId>, ids: &[LinkId]) {
    for &id in ids {
        if !list.contains(&id) {
            list.push(id);
        }
    }
}

impl Graph {
    /// Add a link line, stored in its canonical representation.
    ///
    /// If both segments are known and a link equivalent to this one
    /// already exists, nothing is inserted: a virtual link is promoted
    /// with the content of the new line, a real one is left as it is.
    /// Either way the handle of the existing link is returned.
    /// Unknown segments are created as virtual segments.
    pub fn add_link(&mut self, mut link: Link<BString>) -> GFAResult<LinkId> {
        link.canonicize();
        let from = self.segment_id(&link.from_segment);
        let to = self.segment_id(&link.to_segment);
        if let (Some(from), Some(to)) = (from, to) {
            let existing = self.link_from_to_handles(
                &OrientedSegment::new(from, link.from_orient),
                &OrientedSegment::new(to, link.to_orient),
                &link.overlap,
                true,
            );
            if let Some(id) = existing {
                let slot = self.link_slot_mut(id)?;
                if slot.is_virtual {
                    debug!(
                        "Promoting virtual link {} {}",
                        link.oriented_from(),
                        link.oriented_to()
                    );
                    let mut new_link = with_handles(link, from, to);
                    // keep the segment indices valid
                    if new_link.oriented_from() != slot.link.oriented_from() {
                        new_link.complement_mut();
                    }
                    slot.link = new_link;
                    slot.is_virtual = false;
                } else {
                    trace!(
                        "Link {} {} is already in the graph",
                        link.oriented_from(),
                        link.oriented_to()
                    );
                }
                return Ok(id);
            }
        }
        let from = self.segment_or_virtual(link.from_segment.as_bstr())?;
        let to = self.segment_or_virtual(link.to_segment.as_bstr())?;
        Ok(self.insert_link(with_handles(link, from, to), false))
    }

    pub(crate) fn insert_link(
        &mut self,
        link: Link<SegmentId>,
        is_virtual: bool,
    ) -> LinkId {
        let id = LinkId(self.links.len());
        if let Ok(slot) = self.segment_slot_mut(link.from_segment) {
            slot.links.from[link.from_orient.index()].push(id);
        }
        if let Ok(slot) = self.segment_slot_mut(link.to_segment) {
            slot.links.to[link.to_orient.index()].push(id);
        }
        debug!(
            "Adding {}link {}{} {}{}",
            if is_virtual { "virtual " } else { "" },
            self.name_of(link.from_segment),
            link.from_orient,
            self.name_of(link.to_segment),
            link.to_orient
        );
        self.links.push(Some(LinkSlot {
            link,
            is_virtual,
            paths: Vec::new(),
        }));
        id
    }

    /// Switch a link to the representation that is canonical for the
    /// current segment names.
    pub(crate) fn canonicize_link(&self, link: &mut Link<SegmentId>) {
        let by_name = link.map_segments(|&id| self.name_of(id));
        if !by_name.is_canonical() {
            link.complement_mut();
        }
    }

    pub(crate) fn link_slot(&self, id: LinkId) -> GFAResult<&LinkSlot> {
        self.links
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| GFAError::LineMissing(format!("link #{}", id.0)))
    }

    pub(crate) fn link_slot_mut(&mut self, id: LinkId) -> GFAResult<&mut LinkSlot> {
        self.links
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| GFAError::LineMissing(format!("link #{}", id.0)))
    }

    pub(crate) fn link_slots(&self) -> impl Iterator<Item = (LinkId, &'_ LinkSlot)> {
        self.links
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.as_ref().map(|l| (LinkId(i), l)))
    }

    /// Handles of all links, virtual ones included, in insertion order.
    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.link_slots().map(|(id, _)| id)
    }

    pub fn link_by_id(&self, id: LinkId) -> Option<&Link<SegmentId>> {
        self.link_slot(id).ok().map(|l| &l.link)
    }

    /// The link with segment handles replaced by the current names.
    pub fn link_line(&self, id: LinkId) -> GFAResult<Link<BString>> {
        let slot = self.link_slot(id)?;
        Ok(slot.link.map_segments(|&s| self.name_of(s)))
    }

    pub fn is_virtual_link(&self, id: LinkId) -> bool {
        self.link_slot(id).map_or(false, |l| l.is_virtual)
    }

    /// The paths going through a link, with the orientation in which
    /// they traverse it.
    pub fn link_paths(&self, id: LinkId) -> GFAResult<&[(PathId, Orientation)]> {
        Ok(self.link_slot(id)?.paths.as_slice())
    }

    /// Remove a link from the graph, along with every path that goes
    /// through it.
    pub fn delete_link(&mut self, id: LinkId) -> GFAResult<()> {
        let slot = self
            .links
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| GFAError::LineMissing(format!("link #{}", id.0)))?;
        let link = &slot.link;
        debug!(
            "Deleting link {}{} {}{}",
            self.name_of(link.from_segment),
            link.from_orient,
            self.name_of(link.to_segment),
            link.to_orient
        );
        for &segment in &[link.from_segment, link.to_segment] {
            if let Ok(s) = self.segment_slot_mut(segment) {
                s.links.remove(id);
            }
        }
        for (path, _) in slot.paths {
            if self.path_slot(path).is_ok() {
                self.delete_path(path)?;
            }
        }
        Ok(())
    }

    /// Remove every link of `segment_end` except those reaching
    /// `keep_end`. With `conserve_components`, links whose removal
    /// would split a connected component are kept as well.
    pub fn delete_other_links(
        &mut self,
        segment_end: &SegmentEnd,
        keep_end: &SegmentEnd,
        conserve_components: bool,
    ) -> GFAResult<()> {
        let end = match self.resolve(segment_end) {
            Some(end) => end,
            None => return Ok(()),
        };
        let keep = self.resolve(keep_end);
        for id in self.links_of_handle(&end) {
            let other = match self.link_by_id(id) {
                Some(link) => link.other_end(&end),
                // already removed along with a path
                None => continue,
            };
            if keep.is_some() && other == keep {
                continue;
            }
            if conserve_components && self.is_cut_link(id)? {
                debug!("Keeping link #{}, needed for connectivity", id.0);
                continue;
            }
            self.delete_link(id)?;
        }
        Ok(())
    }

    pub(crate) fn resolve<A: Attribute>(
        &self,
        info: &SegmentInfo<BString, A>,
    ) -> Option<SegmentInfo<SegmentId, A>> {
        let id = self.segment_id(&info.segment)?;
        Some(SegmentInfo::new(id, info.attribute))
    }

    pub(crate) fn links_of_handle(&self, end: &SegmentEnd<SegmentId>) -> Vec<LinkId> {
        let slot = match self.segment_slot(end.segment) {
            Ok(slot) => slot,
            Err(_) => return Vec::new(),
        };
        let (from, to) = match end.end_type() {
            EndType::End => (Orientation::Forward, Orientation::Backward),
            EndType::Begin => (Orientation::Backward, Orientation::Forward),
        };
        let mut result = slot.links.from[from.index()].clone();
        push_unique(&mut result, &slot.links.to[to.index()]);
        result
    }

    /// The links attached to a segment end. For the end of a segment,
    /// these are the links from the segment in forward orientation and
    /// the links to it in reverse orientation; the other way around
    /// for the beginning.
    pub fn links_of(&self, segment_end: &SegmentEnd) -> Vec<LinkId> {
        self.resolve(segment_end)
            .map(|end| self.links_of_handle(&end))
            .unwrap_or_default()
    }

    /// The segment ends connected to `segment_end`, one per link.
    pub fn neighbours(&self, segment_end: &SegmentEnd) -> Vec<SegmentEnd> {
        let end = match self.resolve(segment_end) {
            Some(end) => end,
            None => return Vec::new(),
        };
        self.links_of_handle(&end)
            .into_iter()
            .filter_map(|id| self.link_by_id(id)?.other_end(&end))
            .map(|other| other.map_segment(|&id| self.name_of(id)))
            .collect()
    }

    pub fn links_between(&self, end1: &SegmentEnd, end2: &SegmentEnd) -> Vec<LinkId> {
        let (end1, end2) = match (self.resolve(end1), self.resolve(end2)) {
            (Some(e1), Some(e2)) => (e1, e2),
            _ => return Vec::new(),
        };
        self.links_of_handle(&end1)
            .into_iter()
            .filter(|&id| {
                self.link_by_id(id)
                    .and_then(|l| l.other_end(&end1))
                    .map_or(false, |other| other == end2)
            })
            .collect()
    }

    /// The first link between two segment ends.
    pub fn link(&self, end1: &SegmentEnd, end2: &SegmentEnd) -> Option<LinkId> {
        self.links_between(end1, end2).into_iter().next()
    }

    /// Like `link`, but fails with `LineMissing`.
    pub fn link_required(&self, end1: &SegmentEnd, end2: &SegmentEnd) -> GFAResult<LinkId> {
        self.link(end1, end2).ok_or_else(|| {
            GFAError::LineMissing(format!("link {} -- {}", end1, end2))
        })
    }

    fn links_from_handle(
        &self,
        oriented: &OrientedSegment<SegmentId>,
        equivalent: bool,
        outgoing: bool,
    ) -> Vec<LinkId> {
        let slot = match self.segment_slot(oriented.segment) {
            Ok(slot) => slot,
            Err(_) => return Vec::new(),
        };
        let (direct, mirrored) = if outgoing {
            (&slot.links.from, &slot.links.to)
        } else {
            (&slot.links.to, &slot.links.from)
        };
        let orient = oriented.orient();
        let mut result = direct[orient.index()].clone();
        if equivalent {
            push_unique(&mut result, &mirrored[orient.invert().index()]);
        }
        result
    }

    /// Links from a segment in the given orientation. If `equivalent`
    /// is set, the links to the segment in the opposite orientation
    /// are included, as they describe the same connections.
    pub fn links_from(&self, oriented: &OrientedSegment, equivalent: bool) -> Vec<LinkId> {
        self.resolve(oriented)
            .map(|o| self.links_from_handle(&o, equivalent, true))
            .unwrap_or_default()
    }

    /// Links to a segment in the given orientation, and, if
    /// `equivalent` is set, from the segment in the opposite one.
    pub fn links_to(&self, oriented: &OrientedSegment, equivalent: bool) -> Vec<LinkId> {
        self.resolve(oriented)
            .map(|o| self.links_from_handle(&o, equivalent, false))
            .unwrap_or_default()
    }

    fn links_from_to_handles(
        &self,
        from: &OrientedSegment<SegmentId>,
        to: &OrientedSegment<SegmentId>,
        overlap: &CIGAR,
        equivalent: bool,
    ) -> Vec<LinkId> {
        self.links_from_handle(from, equivalent, true)
            .into_iter()
            .filter(|&id| {
                self.link_by_id(id)
                    .map_or(false, |l| l.compatible(from, to, overlap, equivalent))
            })
            .collect()
    }

    pub(crate) fn link_from_to_handles(
        &self,
        from: &OrientedSegment<SegmentId>,
        to: &OrientedSegment<SegmentId>,
        overlap: &CIGAR,
        equivalent: bool,
    ) -> Option<LinkId> {
        self.links_from_to_handles(from, to, overlap, equivalent)
            .into_iter()
            .next()
    }

    /// Links from one oriented segment to another whose overlap is
    /// compatible with `overlap` (an empty overlap matches any link).
    /// With `equivalent`, links stored in the mirrored representation
    /// match too.
    pub fn links_from_to(
        &self,
        from: &OrientedSegment,
        to: &OrientedSegment,
        overlap: &CIGAR,
        equivalent: bool,
    ) -> Vec<LinkId> {
        match (self.resolve(from), self.resolve(to)) {
            (Some(from), Some(to)) => {
                self.links_from_to_handles(&from, &to, overlap, equivalent)
            }
            _ => Vec::new(),
        }
    }

    pub fn link_from_to(
        &self,
        from: &OrientedSegment,
        to: &OrientedSegment,
        overlap: &CIGAR,
        equivalent: bool,
    ) -> Option<LinkId> {
        self.links_from_to(from, to, overlap, equivalent)
            .into_iter()
            .next()
    }

    /// Like `link_from_to`, but fails with `LineMissing`.
    pub fn link_from_to_required(
        &self,
        from: &OrientedSegment,
        to: &OrientedSegment,
        overlap: &CIGAR,
        equivalent: bool,
    ) -> GFAResult<LinkId> {
        self.link_from_to(from, to, overlap, equivalent)
            .ok_or_else(|| GFAError::LineMissing(format!("link {} -> {}", from, to)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{graph, os, se};
    use super::*;

    fn lines(g: &Graph, ids: &[LinkId]) -> Vec<String> {
        ids.iter()
            .map(|&id| g.link_line(id).unwrap().to_string())
            .collect()
    }

    fn three_links() -> Graph {
        graph(&[
            "S\t0\t*",
            "S\t1\t*",
            "S\t2\t*",
            "L\t2\t-\t1\t-\t12M",
            "L\t2\t+\t0\t-\t12M",
            "L\t0\t-\t1\t+\t12M",
        ])
    }

    #[test]
    fn links_are_stored_canonically() {
        let g = three_links();
        let all: Vec<LinkId> = g.link_ids().collect();
        assert_eq!(
            vec![
                "L\t1\t+\t2\t+\t12M",
                "L\t0\t+\t2\t-\t12M",
                "L\t0\t-\t1\t+\t12M"
            ],
            lines(&g, &all)
        );
    }

    #[test]
    fn equivalent_links_are_added_once() {
        let mut g = graph(&["S\t1\t*", "S\t2\t*"]);
        let link = |s: &str| -> Link<BString> { Link::from_line(s.as_bytes()).unwrap() };

        let id = g.add_link(link("L\t1\t+\t2\t+\t3M1I")).unwrap();
        assert_eq!(id, g.add_link(link("L\t1\t+\t2\t+\t3M1I")).unwrap());
        assert_eq!(id, g.add_link(link("L\t2\t-\t1\t-\t1D3M")).unwrap());
        assert_eq!(id, g.add_link(link("L\t1\t+\t2\t+\t*")).unwrap());
        assert_eq!(1, g.link_ids().count());

        // a parallel link that isn't equivalent to the first one
        g.add_link(link("L\t1\t+\t2\t-\t3M1I")).unwrap();
        g.add_link(link("L\t1\t+\t2\t+\t4M")).unwrap();
        assert_eq!(3, g.link_ids().count());
    }

    #[test]
    fn links_of_segment_ends() {
        let g = three_links();
        assert_eq!(vec!["L\t1\t+\t2\t+\t12M"], lines(&g, &g.links_of(&se("1", "E"))));
        assert_eq!(vec!["L\t0\t-\t1\t+\t12M"], lines(&g, &g.links_of(&se("1", "B"))));
        assert_eq!(vec!["L\t0\t+\t2\t-\t12M"], lines(&g, &g.links_of(&se("2", "E"))));
        assert!(g.links_of(&se("5", "E")).is_empty());

        assert_eq!(vec![se("2", "B")], g.neighbours(&se("1", "E")));
        assert_eq!(vec![se("0", "B")], g.neighbours(&se("1", "B")));
        assert_eq!(vec![se("0", "E")], g.neighbours(&se("2", "E")));
        assert_eq!(vec![se("1", "E")], g.neighbours(&se("2", "B")));
    }

    #[test]
    fn link_between_segment_ends() {
        let g = three_links();
        assert!(g.link(&se("1", "E"), &se("2", "B")).is_some());
        assert!(g.link(&se("2", "B"), &se("1", "E")).is_some());
        assert_eq!(None, g.link(&se("1", "B"), &se("2", "B")));
        assert_eq!(None, g.link(&se("1a", "E"), &se("2", "B")));
        assert_eq!(1, g.links_between(&se("0", "E"), &se("2", "E")).len());
        assert!(matches!(
            g.link_required(&se("1", "B"), &se("2", "B")),
            Err(GFAError::LineMissing(_))
        ));
    }

    #[test]
    fn links_from_and_to_oriented_segments() {
        let g = three_links();
        let l12 = vec!["L\t1\t+\t2\t+\t12M"];
        assert_eq!(l12, lines(&g, &g.links_from(&os("1", "+"), true)));
        assert_eq!(l12, lines(&g, &g.links_from(&os("2", "-"), true)));
        assert!(g.links_from(&os("2", "-"), false).is_empty());
        assert_eq!(l12, lines(&g, &g.links_to(&os("2", "+"), false)));
        assert_eq!(l12, lines(&g, &g.links_to(&os("1", "-"), true)));
        assert!(g.links_to(&os("1", "-"), false).is_empty());
    }

    #[test]
    fn links_from_to_with_overlap() {
        let g = three_links();
        let m12: CIGAR = "12M".parse().unwrap();
        let m11: CIGAR = "11M".parse().unwrap();
        let any = CIGAR::default();

        assert_eq!(1, g.links_from_to(&os("1", "+"), &os("2", "+"), &m12, false).len());
        assert_eq!(1, g.links_from_to(&os("1", "+"), &os("2", "+"), &any, false).len());
        assert!(g.links_from_to(&os("1", "+"), &os("2", "+"), &m11, true).is_empty());
        assert!(g.link_from_to(&os("2", "-"), &os("1", "-"), &m12, false).is_none());
        assert!(g.link_from_to(&os("2", "-"), &os("1", "-"), &m12, true).is_some());
        assert!(g.link_from_to_required(&os("2", "-"), &os("1", "-"), &any, true).is_ok());
        assert!(matches!(
            g.link_from_to_required(&os("2", "+"), &os("1", "+"), &any, true),
            Err(GFAError::LineMissing(_))
        ));
    }

    #[test]
    fn delete_link_cascades_to_paths() {
        let mut g = graph(&[
            "S\t1\t*",
            "S\t2\t*",
            "S\t3\t*",
            "S\t4\t*",
            "L\t1\t+\t2\t+\t*",
            "L\t2\t+\t3\t+\t*",
            "L\t3\t+\t4\t+\t*",
            "P\tp\t2+,3+\t*",
            "P\tq\t3+,4+\t*",
        ]);
        let l2 = g.link(&se("2", "E"), &se("3", "B")).unwrap();
        assert_eq!(1, g.link_paths(l2).unwrap().len());
        g.delete_link(l2).unwrap();

        assert!(g.path(b"p").is_none());
        assert!(g.path(b"q").is_some());
        assert_eq!(2, g.link_ids().count());
        assert!(g.link(&se("1", "E"), &se("2", "B")).is_some());
        assert!(g.link(&se("3", "E"), &se("4", "B")).is_some());
        assert!(g.links_of(&se("2", "E")).is_empty());
        assert!(g.delete_link(l2).is_err());
    }

    #[test]
    fn delete_other_links() {
        let lines = [
            "S\t0\t*",
            "S\t1\t*",
            "S\t2\t*",
            "S\t3\t*",
            "L\t0\t+\t1\t+\t*",
            "L\t0\t+\t2\t+\t*",
            "L\t0\t+\t3\t+\t*",
            "L\t2\t+\t3\t+\t*",
        ];

        let mut g = graph(&lines);
        g.delete_other_links(&se("0", "E"), &se("2", "B"), false)
            .unwrap();
        assert_eq!(vec![se("2", "B")], g.neighbours(&se("0", "E")));
        assert_eq!(2, g.link_ids().count());

        let mut g = graph(&lines);
        g.delete_other_links(&se("0", "E"), &se("2", "B"), true)
            .unwrap();
        assert_eq!(
            vec![se("1", "B"), se("2", "B")],
            g.neighbours(&se("0", "E"))
        );
        assert_eq!(3, g.link_ids().count());
    }
}
