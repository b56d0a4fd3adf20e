//! The in-memory assembly graph.
//!
//! Segments live in an arena and are referred to by `SegmentId`
//! handles, which links and containments store in place of names; a
//! rename therefore only touches the segment itself and the paths,
//! which keep plain names. A segment referenced before its own line
//! is seen is created as a *virtual* placeholder and promoted later.

mod connectivity;
mod containments;
mod links;
mod multiply;
mod paths;

pub use self::multiply::CopyNames;

use std::fmt;

use bstr::{BStr, BString, ByteSlice};
use fnv::FnvHashMap;
use log::debug;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::{
    cigar::CIGAR,
    gfa::*,
    parser::{self, FieldKind, GFAError, GFAParser, GFAResult, ParserTolerance},
};

macro_rules! handle_type {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
            #[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
            pub struct $name(usize);

            impl $name {
                pub fn index(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

handle_type!(
    /// Stable handle to a segment; survives renames.
    SegmentId,
    LinkId,
    ContainmentId,
    PathId,
);

/// Graph construction settings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GraphConfig {
    /// Fail with `LineMissing` when a link, containment or path
    /// refers to a segment that hasn't been added yet, instead of
    /// creating a virtual segment.
    pub segments_first_order: bool,
    /// Which lines `Graph::add_lines` may skip.
    pub tolerance: ParserTolerance,
}

/// Links incident to a segment, by direction and by the orientation
/// of the segment in the link.
#[derive(Debug, Default, Clone)]
pub(crate) struct LinkIndex {
    pub(crate) from: [Vec<LinkId>; 2],
    pub(crate) to: [Vec<LinkId>; 2],
}

impl LinkIndex {
    fn remove(&mut self, id: LinkId) {
        for list in self.from.iter_mut().chain(self.to.iter_mut()) {
            list.retain(|&l| l != id);
        }
    }

    /// Every incident link once, in index order.
    pub(crate) fn all(&self) -> Vec<LinkId> {
        let mut result: Vec<LinkId> = Vec::new();
        for &id in self.from.iter().chain(self.to.iter()).flatten() {
            if !result.contains(&id) {
                result.push(id);
            }
        }
        result
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SegmentSlot {
    pub(crate) segment: Segment,
    pub(crate) is_virtual: bool,
    pub(crate) links: LinkIndex,
    /// Containments in which this segment is the container.
    pub(crate) as_container: Vec<ContainmentId>,
    /// Containments in which this segment is the contained one.
    pub(crate) as_contained: Vec<ContainmentId>,
    pub(crate) paths: Vec<PathId>,
}

impl SegmentSlot {
    fn new(segment: Segment, is_virtual: bool) -> Self {
        SegmentSlot {
            segment,
            is_virtual,
            links: Default::default(),
            as_container: Vec::new(),
            as_contained: Vec::new(),
            paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LinkSlot {
    pub(crate) link: Link<SegmentId>,
    /// Created to support a path, with no link line of its own.
    pub(crate) is_virtual: bool,
    /// Paths through this link, with the direction they traverse it.
    pub(crate) paths: Vec<(PathId, Orientation)>,
}

#[derive(Debug, Clone)]
pub(crate) struct PathSlot {
    pub(crate) path: Path,
    pub(crate) links: Vec<LinkId>,
}

/// A GFA graph: the header, the segments, and the links,
/// containments and paths between them.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    config: GraphConfig,
    header: Header,
    segments: Vec<Option<SegmentSlot>>,
    segment_map: FnvHashMap<BString, SegmentId>,
    links: Vec<Option<LinkSlot>>,
    containments: Vec<Option<Containment<SegmentId>>>,
    paths: Vec<Option<PathSlot>>,
    path_map: FnvHashMap<BString, PathId>,
}

impl Graph {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Graph {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Add a parsed line of any record type.
    pub fn add_line(&mut self, line: Line) -> GFAResult<()> {
        match line {
            Line::Header(h) => self.add_header(h),
            Line::Segment(s) => self.add_segment(s).map(|_| ()),
            Line::Link(l) => self.add_link(l).map(|_| ()),
            Line::Containment(c) => self.add_containment(c).map(|_| ()),
            Line::Path(p) => self.add_path(p).map(|_| ()),
        }
    }

    /// Parse and add a sequence of lines. Lines that fail are skipped
    /// or reported depending on the configured tolerance.
    pub fn add_lines<I>(&mut self, lines: I) -> GFAResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let parser = GFAParser::with_tolerance(self.config.tolerance);
        for line in lines {
            let line = line.as_ref();
            let result = match parser.parse_gfa_line(line)? {
                Some(parsed) => self.add_line(parsed),
                None => Ok(()),
            };
            if let Err(err) = result {
                parser.skip_or_fail(err, line)?;
            }
        }
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Merge a header line into the graph header.
    pub fn add_header(&mut self, header: Header) -> GFAResult<()> {
        self.header.merge(&header)
    }

    /// Add a segment line. If the segment was only known as a virtual
    /// placeholder, it's promoted in place, keeping its handle and
    /// connections.
    pub fn add_segment(&mut self, segment: Segment) -> GFAResult<SegmentId> {
        if let Some(id) = self.segment_id(&segment.name) {
            let slot = self.segment_slot_mut(id)?;
            if !slot.is_virtual {
                return Err(GFAError::NotUnique(segment.name.to_string()));
            }
            debug!("Promoting virtual segment {}", segment.name);
            slot.segment = segment;
            slot.is_virtual = false;
            return Ok(id);
        }
        Ok(self.insert_segment(segment, false))
    }

    pub(crate) fn insert_segment(
        &mut self,
        segment: Segment,
        is_virtual: bool,
    ) -> SegmentId {
        let id = SegmentId(self.segments.len());
        self.segment_map.insert(segment.name.clone(), id);
        self.segments.push(Some(SegmentSlot::new(segment, is_virtual)));
        id
    }

    /// The handle of a segment, creating a virtual segment if the name
    /// is unknown and the configuration allows it.
    pub(crate) fn segment_or_virtual(
        &mut self,
        name: &BStr,
    ) -> GFAResult<SegmentId> {
        if let Some(id) = self.segment_id(name) {
            return Ok(id);
        }
        if self.config.segments_first_order {
            return Err(GFAError::LineMissing(format!("segment {}", name)));
        }
        debug!("Creating virtual segment {}", name);
        let segment = Segment {
            name: name.to_owned(),
            ..Default::default()
        };
        Ok(self.insert_segment(segment, true))
    }

    pub fn segment_id<N: AsRef<[u8]>>(&self, name: N) -> Option<SegmentId> {
        self.segment_map.get(name.as_ref().as_bstr()).copied()
    }

    pub(crate) fn segment_slot(&self, id: SegmentId) -> GFAResult<&SegmentSlot> {
        self.segments
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| GFAError::LineMissing(format!("segment #{}", id.0)))
    }

    pub(crate) fn segment_slot_mut(
        &mut self,
        id: SegmentId,
    ) -> GFAResult<&mut SegmentSlot> {
        self.segments
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| GFAError::LineMissing(format!("segment #{}", id.0)))
    }

    pub(crate) fn segment_slots(
        &self,
    ) -> impl Iterator<Item = (SegmentId, &'_ SegmentSlot)> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (SegmentId(i), s)))
    }

    /// The segment with the given name, virtual or not.
    pub fn segment<N: AsRef<[u8]>>(&self, name: N) -> Option<&Segment> {
        let id = self.segment_id(name)?;
        self.segment_slot(id).ok().map(|s| &s.segment)
    }

    /// Like `segment`, but fails with `LineMissing`.
    pub fn segment_required<N: AsRef<[u8]>>(&self, name: N) -> GFAResult<&Segment> {
        let name = name.as_ref();
        self.segment(name).ok_or_else(|| {
            GFAError::LineMissing(format!("segment {}", name.as_bstr()))
        })
    }

    pub fn segment_by_id(&self, id: SegmentId) -> Option<&Segment> {
        self.segment_slot(id).ok().map(|s| &s.segment)
    }

    pub fn segment_name(&self, id: SegmentId) -> Option<&BStr> {
        self.segment_by_id(id).map(|s| s.name.as_bstr())
    }

    pub(crate) fn name_of(&self, id: SegmentId) -> BString {
        self.segment_name(id).map(BStr::to_owned).unwrap_or_default()
    }

    pub fn is_virtual_segment<N: AsRef<[u8]>>(&self, name: N) -> bool {
        self.segment_id(name)
            .and_then(|id| self.segment_slot(id).ok())
            .map_or(false, |s| s.is_virtual)
    }

    /// All segments, in insertion order, including virtual ones.
    pub fn segments(&self) -> impl Iterator<Item = &'_ Segment> {
        self.segment_slots().map(|(_, s)| &s.segment)
    }

    pub fn segment_names(&self) -> Vec<&'_ BStr> {
        self.segments().map(|s| s.name.as_bstr()).collect()
    }

    /// Remove a segment together with every link, containment and
    /// path that refers to it.
    pub fn delete_segment<N: AsRef<[u8]>>(&mut self, name: N) -> GFAResult<()> {
        let name = name.as_ref();
        let id = self
            .segment_id(name)
            .ok_or_else(|| GFAError::LineMissing(format!("segment {}", name.as_bstr())))?;
        let slot = self.segment_slot(id)?;
        let links = slot.links.all();
        let containments: Vec<ContainmentId> = slot
            .as_container
            .iter()
            .chain(slot.as_contained.iter())
            .copied()
            .collect();
        let paths = slot.paths.clone();

        for path in paths {
            if self.path_slot(path).is_ok() {
                self.delete_path(path)?;
            }
        }
        for link in links {
            if self.link_slot(link).is_ok() {
                self.delete_link(link)?;
            }
        }
        for containment in containments {
            if self.containment_by_id(containment).is_some() {
                self.delete_containment(containment)?;
            }
        }

        debug!("Deleting segment {}", name.as_bstr());
        self.segment_map.remove(name.as_bstr());
        self.segments[id.0] = None;
        Ok(())
    }

    /// Give a segment a new name. Links and containments refer to the
    /// segment by handle and see the new name at once; the paths going
    /// through the segment are rewritten.
    pub fn rename<N, M>(&mut self, old_name: N, new_name: M) -> GFAResult<()>
    where
        N: AsRef<[u8]>,
        M: AsRef<[u8]>,
    {
        let (old_name, new_name) = (old_name.as_ref(), new_name.as_ref());
        let id = self.segment_id(old_name).ok_or_else(|| {
            GFAError::LineMissing(format!("segment {}", old_name.as_bstr()))
        })?;
        if old_name == new_name {
            return Ok(());
        }
        if self.segment_id(new_name).is_some() {
            return Err(GFAError::NotUnique(new_name.to_str_lossy().into_owned()));
        }
        FieldKind::Name.validate("name", new_name)?;
        let paths = self.segment_slot(id)?.paths.clone();
        if !paths.is_empty() {
            parser::validate_step_name("name", new_name)?;
        }

        debug!("Renaming segment {} to {}", old_name.as_bstr(), new_name.as_bstr());
        let new_name = BString::from(new_name);
        self.segment_slot_mut(id)?.segment.name = new_name.clone();
        self.segment_map.remove(old_name.as_bstr());
        self.segment_map.insert(new_name.clone(), id);

        for path in paths {
            if let Ok(slot) = self.path_slot_mut(path) {
                slot.path.rename_segment(old_name, new_name.as_bstr());
            }
        }
        Ok(())
    }

    /// Check that every segment referenced by a link, containment or
    /// path has been backed by a segment line. Links created for paths
    /// may stay virtual.
    pub fn validate_connect(&self) -> GFAResult<()> {
        match self.segment_slots().find(|(_, s)| s.is_virtual) {
            Some((_, slot)) => Err(GFAError::LineMissing(format!(
                "segment {}",
                slot.segment.name
            ))),
            None => Ok(()),
        }
    }

    /// Replace every segment sequence with `*`.
    pub fn delete_sequences(&mut self) {
        for slot in self.segments.iter_mut().flatten() {
            slot.segment.sequence = None;
        }
    }

    /// Replace every link, containment and path overlap with `*`.
    pub fn delete_alignments(&mut self) {
        for slot in self.links.iter_mut().flatten() {
            slot.link.overlap = CIGAR::default();
        }
        for containment in self.containments.iter_mut().flatten() {
            containment.overlap = CIGAR::default();
        }
        for slot in self.paths.iter_mut().flatten() {
            for overlap in slot.path.overlaps.iter_mut() {
                *overlap = CIGAR::default();
            }
        }
    }
}

impl std::str::FromStr for Graph {
    type Err = GFAError;

    fn from_str(s: &str) -> GFAResult<Self> {
        let mut graph = Graph::new();
        graph.add_lines(s.lines())?;
        Ok(graph)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::writer::write_gfa(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn graph(lines: &[&str]) -> Graph {
        let mut graph = Graph::new();
        graph.add_lines(lines).unwrap();
        graph
    }

    pub(crate) fn se(name: &str, end: &str) -> SegmentEnd {
        SegmentEnd::from_pair(&[name, end]).unwrap()
    }

    pub(crate) fn os(name: &str, orient: &str) -> OrientedSegment {
        OrientedSegment::from_pair(&[name, orient]).unwrap()
    }

    #[test]
    fn delete_sequences() {
        let seqs = ["ACCAGCTAGCGAGC", "CGCTAGTGCTG", "GCTAGCTAG"];
        let mut g = Graph::new();
        for (i, seq) in seqs.iter().enumerate() {
            g.add_line(format!("S\t{}\t{}", i, seq).parse().unwrap())
                .unwrap();
        }
        let found: Vec<_> = g.segments().map(|s| s.sequence_str().to_string()).collect();
        assert_eq!(seqs.to_vec(), found);
        g.delete_sequences();
        let found: Vec<_> = g.segments().map(|s| s.sequence_str().to_string()).collect();
        assert_eq!(vec!["*", "*", "*"], found);
    }

    #[test]
    fn delete_alignments() {
        let mut g = graph(&[
            "S\t0\t*",
            "S\t1\t*",
            "S\t2\t*",
            "L\t2\t-\t1\t-\t12M",
            "L\t2\t+\t0\t-\t12M",
            "L\t0\t-\t1\t+\t12M",
            "C\t1\t+\t0\t+\t12\t12M",
            "P\t4\t2+,0-,1+\t12M,12M,12M",
        ]);
        let link = g.link_ids().next().unwrap();
        assert_eq!("12M", g.link_by_id(link).unwrap().overlap.to_string());
        g.delete_alignments();
        assert!(g.link_by_id(link).unwrap().overlap.is_empty());
        let c = g.containment_ids().next().unwrap();
        assert!(g.containment_by_id(c).unwrap().overlap.is_empty());
        let p = g.path(b"4").unwrap();
        assert!(p.overlaps.iter().all(CIGAR::is_empty));
        assert_eq!("P\t4\t2+,0-,1+\t*,*,*", p.to_string());
    }

    #[test]
    fn rename() {
        let mut g = graph(&[
            "S\t0\t*",
            "S\t1\t*",
            "S\t2\t*",
            "L\t0\t+\t2\t-\t12M",
            "C\t1\t+\t0\t+\t12\t12M",
            "P\t4\t2+,0-\t12M",
        ]);
        g.rename("0", "X").unwrap();

        let mut names: Vec<_> = g.segment_names().iter().map(|n| n.to_string()).collect();
        names.sort();
        assert_eq!(vec!["1", "2", "X"], names);

        let link = g.link_ids().next().unwrap();
        assert_eq!("L\tX\t+\t2\t-\t12M", g.link_line(link).unwrap().to_string());
        let c = g.containment_ids().next().unwrap();
        assert_eq!("C\t1\t+\tX\t+\t12\t12M", g.containment_line(c).unwrap().to_string());
        assert_eq!("P\t4\t2+,X-\t12M", g.path(b"4").unwrap().to_string());
        assert!(g.validate_connect().is_ok());

        assert!(g.links_of(&se("0", "E")).is_empty());
        let links = g.links_of(&se("X", "E"));
        assert_eq!("L\tX\t+\t2\t-\t12M", g.link_line(links[0]).unwrap().to_string());
        let c = g.contained_in("1");
        assert_eq!("C\t1\t+\tX\t+\t12\t12M", g.containment_line(c[0]).unwrap().to_string());
        assert!(g.containing("0").is_empty());
        let c = g.containing("X");
        assert_eq!("C\t1\t+\tX\t+\t12\t12M", g.containment_line(c[0]).unwrap().to_string());
        assert!(g.paths_with("0").is_empty());
        assert_eq!("P\t4\t2+,X-\t12M", g.paths_with("X")[0].to_string());

        assert_eq!(Err(GFAError::NotUnique("1".into())), g.rename("X", "1"));
        assert!(matches!(g.rename("0", "Y"), Err(GFAError::LineMissing(_))));
    }

    #[test]
    fn renamed_path_members_round_trip() {
        let mut g = graph(&["S\t1\t*", "S\t2\t*", "S\t3\t*", "P\tp\t1+,2+\t*"]);
        assert!(matches!(g.rename("1", "a,b"), Err(GFAError::Format { .. })));
        assert!(matches!(g.rename("1", "a b"), Err(GFAError::Format { .. })));
        assert_eq!("P\tp\t1+,2+\t*", g.path(b"p").unwrap().to_string());
        assert!(g.segment("1").is_some());

        // no path goes through 3
        g.rename("3", "c,d").unwrap();
        g.rename("1", "a.b").unwrap();
        assert_eq!("P\tp\ta.b+,2+\t*", g.path(b"p").unwrap().to_string());
        let reparsed: Graph = g.to_string().parse().unwrap();
        assert_eq!(g.to_string(), reparsed.to_string());
    }

    #[test]
    fn virtual_segments_are_promoted() {
        let mut g = graph(&["L\t1\t+\t2\t+\t*"]);
        let id = g.segment_id("2").unwrap();
        assert!(g.is_virtual_segment("2"));
        assert!(matches!(g.validate_connect(), Err(GFAError::LineMissing(_))));

        g.add_lines(&["S\t1\tACGT", "S\t2\tGG\tRC:i:20"]).unwrap();
        assert_eq!(Some(id), g.segment_id("2"));
        assert!(!g.is_virtual_segment("2"));
        assert_eq!(1, g.links_of(&se("2", "B")).len());
        assert!(g.validate_connect().is_ok());
        assert_eq!(
            Err(GFAError::NotUnique("2".into())),
            g.add_segment(Segment::new(b"2", b"*"))
        );
    }

    #[test]
    fn segments_first_order() {
        let mut g = Graph::with_config(GraphConfig {
            segments_first_order: true,
            ..Default::default()
        });
        g.add_lines(&["S\t1\t*"]).unwrap();
        assert!(matches!(
            g.add_lines(&["L\t1\t+\t2\t+\t*"]),
            Err(GFAError::LineMissing(_))
        ));
        assert_eq!(None, g.segment("2"));
        assert_eq!(0, g.link_ids().count());
    }

    #[test]
    fn tolerant_loading() {
        let lines = ["H\tVN:Z:1.0", "# comment", "S\t1\t*", "S\t1\t*", "S\t2\t*"];
        let mut g = Graph::new();
        assert_eq!(
            Err(GFAError::NotUnique("1".into())),
            g.add_lines(&lines)
        );

        let mut g = Graph::with_config(GraphConfig {
            tolerance: ParserTolerance::IgnoreAll,
            ..Default::default()
        });
        g.add_lines(&lines).unwrap();
        assert_eq!(2, g.segments().count());
        assert_eq!(Some("1.0".as_bytes().as_bstr()), g.header().version());
    }

    #[test]
    fn header_lines_merge() {
        let mut g = graph(&["H\tVN:Z:1.0", "H\txx:i:2"]);
        assert_eq!("H\tVN:Z:1.0\txx:i:2", g.header().to_string());
        assert_eq!(
            Err(GFAError::DuplicatedOptfieldName("VN".into())),
            g.add_lines(&["H\tVN:Z:2.0"])
        );
    }

    #[test]
    fn delete_segment_cascades() {
        let mut g = graph(&[
            "S\t0\t*",
            "S\t1\t*",
            "S\t2\t*",
            "L\t0\t+\t1\t+\t*",
            "L\t1\t+\t2\t+\t*",
            "C\t1\t+\t0\t+\t0\t*",
            "P\tp\t0+,1+\t*",
            "P\tq\t1+,2+\t*",
        ]);
        g.delete_segment("0").unwrap();
        assert_eq!(None, g.segment("0"));
        assert_eq!(1, g.link_ids().count());
        assert_eq!(0, g.containment_ids().count());
        assert!(g.path(b"p").is_none());
        assert!(g.path(b"q").is_some());
        assert!(g.delete_segment("0").is_err());
    }

    #[test]
    fn display_omits_virtual_lines() {
        let text = "H\tVN:Z:1.0\nS\t1\t*\nS\t2\t*\nL\t1\t+\t2\t-\t*\nP\tp\t1+,3-\t*\n";
        let g: Graph = text.parse().unwrap();
        assert!(g.is_virtual_segment("3"));
        assert_eq!(text, g.to_string());
    }
}
