//! The GFA line types and the accessor contract they share. Links
//! and containments are generic over the type used to refer to their
//! segments: names (`BString`) for lines on their own, graph handles
//! once they belong to a graph.

pub mod orientation;
pub mod segment_info;
pub mod traits;

pub use self::orientation::*;
pub use self::segment_info::*;
pub use self::traits::*;

use self::traits::field_kind;

use std::fmt;

use bstr::{BStr, BString, ByteSlice};

use crate::{
    cigar::CIGAR,
    optfields::*,
    parser::{self, FieldDefs, FieldKind, GFAError, GFAResult},
};

/// The record type letter at the start of each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Header,
    Segment,
    Link,
    Containment,
    Path,
}

impl RecordType {
    pub fn from_bytes(bs: &[u8]) -> Option<Self> {
        use RecordType::*;
        match bs {
            b"H" => Some(Header),
            b"S" => Some(Segment),
            b"L" => Some(Link),
            b"C" => Some(Containment),
            b"P" => Some(Path),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        use RecordType::*;
        match self {
            Header => 'H',
            Segment => 'S',
            Link => 'L',
            Containment => 'C',
            Path => 'P',
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Enum containing the different kinds of GFA lines.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Header(Header),
    Segment(Segment),
    Link(Link<BString>),
    Containment(Containment<BString>),
    Path(Path),
}

impl Line {
    pub fn record_type(&self) -> RecordType {
        match self {
            Line::Header(_) => RecordType::Header,
            Line::Segment(_) => RecordType::Segment,
            Line::Link(_) => RecordType::Link,
            Line::Containment(_) => RecordType::Containment,
            Line::Path(_) => RecordType::Path,
        }
    }
}

impl std::str::FromStr for Line {
    type Err = GFAError;

    fn from_str(s: &str) -> GFAResult<Self> {
        parser::parse_line(s.as_bytes())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Header(x) => fmt::Display::fmt(x, f),
            Line::Segment(x) => fmt::Display::fmt(x, f),
            Line::Link(x) => fmt::Display::fmt(x, f),
            Line::Containment(x) => fmt::Display::fmt(x, f),
            Line::Path(x) => fmt::Display::fmt(x, f),
        }
    }
}

macro_rules! impl_line_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Line {
                fn from(x: $ty) -> Self {
                    Line::$variant(x)
                }
            }
        )*
    };
}

impl_line_from!(
    Header(Header),
    Segment(Segment),
    Link(Link<BString>),
    Containment(Containment<BString>),
    Path(Path),
);

fn write_optional(
    f: &mut fmt::Formatter<'_>,
    optional: &OptionalFields,
) -> fmt::Result {
    for opt in optional.iter() {
        write!(f, "\t{}", opt)?;
    }
    Ok(())
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i != 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn joined<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// The header line of a GFA graph
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Header {
    pub optional: OptionalFields,
}

impl Header {
    pub fn version(&self) -> Option<&BStr> {
        self.str_tag("VN").ok().flatten()
    }

    /// Merge the tags of another header line into this one. The same
    /// tag may only appear twice if both have the same value.
    pub fn merge(&mut self, other: &Header) -> GFAResult<()> {
        for field in other.optional.iter() {
            match self.optional.get(field.tag) {
                Some(existing) if existing == field => (),
                Some(_) => {
                    return Err(GFAError::DuplicatedOptfieldName(
                        field.tag.to_string(),
                    ))
                }
                None => self
                    .optional
                    .push(field.clone(), Self::PREDEFINED_TAGS)?,
            }
        }
        Ok(())
    }
}

impl Tagged for Header {
    const PREDEFINED_TAGS: PredefinedTags = &[("VN", TagType::String)];
    const FIELD_NAMES: &'static [&'static str] = &[];

    fn optional(&self) -> &OptionalFields {
        &self.optional
    }

    fn optional_mut(&mut self) -> &mut OptionalFields {
        &mut self.optional
    }
}

impl Record for Header {
    const RECORD_TYPE: RecordType = RecordType::Header;
    const FIELDS: FieldDefs = &[];

    fn from_fields<T: AsRef<[u8]>>(fields: &[T]) -> GFAResult<Self> {
        Ok(Header {
            optional: OptionalFields::parse(fields, Self::PREDEFINED_TAGS)?,
        })
    }

    fn field_to_string(&self, name: &str) -> GFAResult<String> {
        Err(GFAError::InvalidTagName(name.to_string()))
    }

    fn set_field(&mut self, name: &str, _value: &[u8]) -> GFAResult<()> {
        Err(GFAError::InvalidTagName(name.to_string()))
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H")?;
        write_optional(f, &self.optional)
    }
}

/// A segment in a GFA graph. A sequence of `None` is written as `*`.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Segment {
    pub name: BString,
    pub sequence: Option<BString>,
    pub optional: OptionalFields,
}

impl Segment {
    pub fn new(name: &[u8], sequence: &[u8]) -> Self {
        Segment {
            name: BString::from(name),
            sequence: parser::parse_sequence(sequence),
            optional: Default::default(),
        }
    }

    /// If the sequence is known, it must agree with the LN tag.
    pub fn validate_length(&self) -> GFAResult<()> {
        if let (Some(seq), Some(ln)) = (&self.sequence, self.int_tag("LN")?) {
            if ln < 0 || ln as usize != seq.len() {
                return Err(GFAError::InconsistentLength {
                    declared: ln,
                    actual: seq.len(),
                });
            }
        }
        Ok(())
    }

    /// Sequence length, taken from the LN tag or the sequence itself.
    pub fn length(&self) -> Option<usize> {
        match self.int_tag("LN") {
            Ok(Some(ln)) if ln >= 0 => Some(ln as usize),
            _ => self.sequence.as_ref().map(|s| s.len()),
        }
    }

    /// Coverage computed from a count tag (e.g. `RC`, `FC`, `KC`) and
    /// the LN tag; `None` unless both are set.
    pub fn coverage(&self, count_tag: &str) -> GFAResult<Option<f64>> {
        let count = self.float_tag(count_tag)?;
        let length = self.int_tag("LN")?;
        match (count, length) {
            (Some(c), Some(l)) => Ok(Some(c / l as f64)),
            _ => Ok(None),
        }
    }

    /// Like `coverage`, but fails with `TagMissing` naming the first
    /// tag that isn't set.
    pub fn coverage_required(&self, count_tag: &str) -> GFAResult<f64> {
        let count = self.tag_required(count_tag)?;
        let count = count.as_float().ok_or_else(|| {
            GFAError::format(count_tag, "[-+]?[0-9]+", count.to_string().as_bytes())
        })?;
        Ok(count / self.int_tag_required("LN")? as f64)
    }

    pub fn sequence_str(&self) -> &BStr {
        match &self.sequence {
            Some(seq) => seq.as_bstr(),
            None => b"*".as_bstr(),
        }
    }
}

impl Tagged for Segment {
    const PREDEFINED_TAGS: PredefinedTags = &[
        ("LN", TagType::Int),
        ("RC", TagType::Int),
        ("FC", TagType::Int),
        ("KC", TagType::Int),
        ("SH", TagType::ByteArray),
        ("UR", TagType::String),
    ];
    const FIELD_NAMES: &'static [&'static str] = &["name", "sequence"];

    fn optional(&self) -> &OptionalFields {
        &self.optional
    }

    fn optional_mut(&mut self) -> &mut OptionalFields {
        &mut self.optional
    }

    // LN must keep agreeing with the sequence
    fn set_tag<V: Into<TagValue>>(
        &mut self,
        name: &str,
        value: V,
    ) -> GFAResult<()> {
        let tag = Self::tag_name(name)?;
        let previous = self.optional.clone();
        self.optional.set(tag, value.into(), Self::PREDEFINED_TAGS)?;
        if let Err(err) = self.validate_length() {
            self.optional = previous;
            return Err(err);
        }
        Ok(())
    }
}

impl Record for Segment {
    const RECORD_TYPE: RecordType = RecordType::Segment;
    const FIELDS: FieldDefs =
        &[("name", FieldKind::Name), ("sequence", FieldKind::Sequence)];

    fn from_fields<T: AsRef<[u8]>>(fields: &[T]) -> GFAResult<Self> {
        let (req, opt) = parser::split_required(Self::FIELDS, fields)?;
        let segment = Segment {
            name: parser::parse_name(req[0].as_ref()),
            sequence: parser::parse_sequence(req[1].as_ref()),
            optional: OptionalFields::parse(opt, Self::PREDEFINED_TAGS)?,
        };
        segment.validate_length()?;
        Ok(segment)
    }

    fn field_to_string(&self, name: &str) -> GFAResult<String> {
        match name {
            "name" => Ok(self.name.to_string()),
            "sequence" => Ok(self.sequence_str().to_string()),
            _ => Err(GFAError::InvalidTagName(name.to_string())),
        }
    }

    fn set_field(&mut self, name: &str, value: &[u8]) -> GFAResult<()> {
        field_kind(Self::FIELDS, name)?.validate(name, value)?;
        if name == "name" {
            self.name = parser::parse_name(value);
        } else {
            let previous = std::mem::replace(
                &mut self.sequence,
                parser::parse_sequence(value),
            );
            if let Err(err) = self.validate_length() {
                self.sequence = previous;
                return Err(err);
            }
        }
        Ok(())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S\t{}\t{}", self.name, self.sequence_str())?;
        write_optional(f, &self.optional)
    }
}

/// A link between two oriented segments. Every link has a mirror
/// representation (see `complement`) describing the same edge.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Link<N> {
    pub from_segment: N,
    pub from_orient: Orientation,
    pub to_segment: N,
    pub to_orient: Orientation,
    pub overlap: CIGAR,
    pub optional: OptionalFields,
}

impl Link<BString> {
    pub fn new(
        from_segment: &[u8],
        from_orient: Orientation,
        to_segment: &[u8],
        to_orient: Orientation,
        overlap: CIGAR,
    ) -> Link<BString> {
        Link {
            from_segment: from_segment.into(),
            from_orient,
            to_segment: to_segment.into(),
            to_orient,
            overlap,
            optional: Default::default(),
        }
    }
}

impl<N> Link<N> {
    /// Replace the segment identities, keeping everything else.
    pub fn map_segments<M, F: FnMut(&N) -> M>(&self, mut f: F) -> Link<M> {
        Link {
            from_segment: f(&self.from_segment),
            from_orient: self.from_orient,
            to_segment: f(&self.to_segment),
            to_orient: self.to_orient,
            overlap: self.overlap.clone(),
            optional: self.optional.clone(),
        }
    }

    /// Turn this link into its mirror representation: endpoints
    /// swapped, orientations inverted, overlap complemented.
    pub fn complement_mut(&mut self) {
        std::mem::swap(&mut self.from_segment, &mut self.to_segment);
        let from_orient = self.from_orient;
        self.from_orient = self.to_orient.invert();
        self.to_orient = from_orient.invert();
        self.overlap = self.overlap.complement();
    }
}

impl<N: Clone> Link<N> {
    pub fn oriented_from(&self) -> OrientedSegment<N> {
        OrientedSegment::new(self.from_segment.clone(), self.from_orient)
    }

    pub fn oriented_to(&self) -> OrientedSegment<N> {
        OrientedSegment::new(self.to_segment.clone(), self.to_orient)
    }

    /// The segment end the link leaves from: the end of a forward
    /// segment, the beginning of a reversed one.
    pub fn from_end(&self) -> SegmentEnd<N> {
        let end = match self.from_orient {
            Orientation::Forward => EndType::End,
            Orientation::Backward => EndType::Begin,
        };
        SegmentEnd::new(self.from_segment.clone(), end)
    }

    /// The segment end the link arrives at.
    pub fn to_end(&self) -> SegmentEnd<N> {
        let end = match self.to_orient {
            Orientation::Forward => EndType::Begin,
            Orientation::Backward => EndType::End,
        };
        SegmentEnd::new(self.to_segment.clone(), end)
    }

    pub fn complement(&self) -> Self {
        let mut link = self.clone();
        link.complement_mut();
        link
    }
}

impl<N: Clone + PartialEq> Link<N> {
    pub fn is_circular(&self) -> bool {
        self.from_segment == self.to_segment
    }

    /// The end connected by this link to the given segment end, or
    /// `None` if the link isn't attached to it.
    pub fn other_end(&self, segment_end: &SegmentEnd<N>) -> Option<SegmentEnd<N>> {
        let (from, to) = (self.from_end(), self.to_end());
        if &from == segment_end {
            Some(to)
        } else if &to == segment_end {
            Some(from)
        } else {
            None
        }
    }

    /// Whether this link connects `from` to `to` with an overlap
    /// compatible with `overlap`. If `equivalent` is set, the mirror
    /// representation of the query is also accepted.
    pub fn compatible(
        &self,
        from: &OrientedSegment<N>,
        to: &OrientedSegment<N>,
        overlap: &CIGAR,
        equivalent: bool,
    ) -> bool {
        let direct = self.oriented_from() == *from
            && self.oriented_to() == *to
            && self.overlap.compatible(overlap);
        direct
            || (equivalent
                && self.oriented_from() == to.flip()
                && self.oriented_to() == from.flip()
                && self.overlap.compatible(&overlap.complement()))
    }
}

impl<N: Ord> Link<N> {
    /// Of the two representations of a link, the canonical one goes
    /// from the smaller segment to the larger; a link from a segment
    /// to itself is canonical if either orientation is forward.
    pub fn is_canonical(&self) -> bool {
        match self.from_segment.cmp(&self.to_segment) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => {
                !self.from_orient.is_reverse() || !self.to_orient.is_reverse()
            }
        }
    }

    /// Switch to the canonical representation; returns true if the
    /// link was complemented.
    pub fn canonicize(&mut self) -> bool {
        if self.is_canonical() {
            false
        } else {
            self.complement_mut();
            true
        }
    }
}

impl<N> Tagged for Link<N> {
    const PREDEFINED_TAGS: PredefinedTags = &[
        ("MQ", TagType::Int),
        ("NM", TagType::Int),
        ("RC", TagType::Int),
        ("FC", TagType::Int),
        ("KC", TagType::Int),
        ("ID", TagType::String),
    ];
    const FIELD_NAMES: &'static [&'static str] = &[
        "from_segment",
        "from_orient",
        "to_segment",
        "to_orient",
        "overlap",
    ];

    fn optional(&self) -> &OptionalFields {
        &self.optional
    }

    fn optional_mut(&mut self) -> &mut OptionalFields {
        &mut self.optional
    }
}

impl Record for Link<BString> {
    const RECORD_TYPE: RecordType = RecordType::Link;
    const FIELDS: FieldDefs = &[
        ("from_segment", FieldKind::Name),
        ("from_orient", FieldKind::Orient),
        ("to_segment", FieldKind::Name),
        ("to_orient", FieldKind::Orient),
        ("overlap", FieldKind::Overlap),
    ];

    fn from_fields<T: AsRef<[u8]>>(fields: &[T]) -> GFAResult<Self> {
        let (req, opt) = parser::split_required(Self::FIELDS, fields)?;
        Ok(Link {
            from_segment: parser::parse_name(req[0].as_ref()),
            from_orient: parser::parse_orient("from_orient", req[1].as_ref())?,
            to_segment: parser::parse_name(req[2].as_ref()),
            to_orient: parser::parse_orient("to_orient", req[3].as_ref())?,
            overlap: CIGAR::parse(req[4].as_ref())?,
            optional: OptionalFields::parse(opt, Self::PREDEFINED_TAGS)?,
        })
    }

    fn field_to_string(&self, name: &str) -> GFAResult<String> {
        match name {
            "from_segment" => Ok(self.from_segment.to_string()),
            "from_orient" => Ok(self.from_orient.to_string()),
            "to_segment" => Ok(self.to_segment.to_string()),
            "to_orient" => Ok(self.to_orient.to_string()),
            "overlap" => Ok(self.overlap.to_string()),
            _ => Err(GFAError::InvalidTagName(name.to_string())),
        }
    }

    fn set_field(&mut self, name: &str, value: &[u8]) -> GFAResult<()> {
        field_kind(Self::FIELDS, name)?.validate(name, value)?;
        match name {
            "from_segment" => self.from_segment = parser::parse_name(value),
            "from_orient" => self.from_orient = parser::parse_orient(name, value)?,
            "to_segment" => self.to_segment = parser::parse_name(value),
            "to_orient" => self.to_orient = parser::parse_orient(name, value)?,
            _ => self.overlap = CIGAR::parse(value)?,
        }
        Ok(())
    }
}

impl<N: fmt::Display> fmt::Display for Link<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L\t{}\t{}\t{}\t{}\t{}",
            self.from_segment,
            self.from_orient,
            self.to_segment,
            self.to_orient,
            self.overlap
        )?;
        write_optional(f, &self.optional)
    }
}

/// A containment of one segment in another, starting at `pos` of the
/// container.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Containment<N> {
    pub container_name: N,
    pub container_orient: Orientation,
    pub contained_name: N,
    pub contained_orient: Orientation,
    pub pos: usize,
    pub overlap: CIGAR,
    pub optional: OptionalFields,
}

impl<N> Containment<N> {
    pub fn map_segments<M, F: FnMut(&N) -> M>(&self, mut f: F) -> Containment<M> {
        Containment {
            container_name: f(&self.container_name),
            container_orient: self.container_orient,
            contained_name: f(&self.contained_name),
            contained_orient: self.contained_orient,
            pos: self.pos,
            overlap: self.overlap.clone(),
            optional: self.optional.clone(),
        }
    }
}

impl<N> Tagged for Containment<N> {
    const PREDEFINED_TAGS: PredefinedTags = &[
        ("NM", TagType::Int),
        ("RC", TagType::Int),
        ("ID", TagType::String),
    ];
    const FIELD_NAMES: &'static [&'static str] = &[
        "container_name",
        "container_orient",
        "contained_name",
        "contained_orient",
        "pos",
        "overlap",
    ];

    fn optional(&self) -> &OptionalFields {
        &self.optional
    }

    fn optional_mut(&mut self) -> &mut OptionalFields {
        &mut self.optional
    }
}

impl Record for Containment<BString> {
    const RECORD_TYPE: RecordType = RecordType::Containment;
    const FIELDS: FieldDefs = &[
        ("container_name", FieldKind::Name),
        ("container_orient", FieldKind::Orient),
        ("contained_name", FieldKind::Name),
        ("contained_orient", FieldKind::Orient),
        ("pos", FieldKind::Pos),
        ("overlap", FieldKind::Overlap),
    ];

    fn from_fields<T: AsRef<[u8]>>(fields: &[T]) -> GFAResult<Self> {
        let (req, opt) = parser::split_required(Self::FIELDS, fields)?;
        Ok(Containment {
            container_name: parser::parse_name(req[0].as_ref()),
            container_orient: parser::parse_orient(
                "container_orient",
                req[1].as_ref(),
            )?,
            contained_name: parser::parse_name(req[2].as_ref()),
            contained_orient: parser::parse_orient(
                "contained_orient",
                req[3].as_ref(),
            )?,
            pos: parser::parse_pos("pos", req[4].as_ref())?,
            overlap: CIGAR::parse(req[5].as_ref())?,
            optional: OptionalFields::parse(opt, Self::PREDEFINED_TAGS)?,
        })
    }

    fn field_to_string(&self, name: &str) -> GFAResult<String> {
        match name {
            "container_name" => Ok(self.container_name.to_string()),
            "container_orient" => Ok(self.container_orient.to_string()),
            "contained_name" => Ok(self.contained_name.to_string()),
            "contained_orient" => Ok(self.contained_orient.to_string()),
            "pos" => Ok(self.pos.to_string()),
            "overlap" => Ok(self.overlap.to_string()),
            _ => Err(GFAError::InvalidTagName(name.to_string())),
        }
    }

    fn set_field(&mut self, name: &str, value: &[u8]) -> GFAResult<()> {
        field_kind(Self::FIELDS, name)?.validate(name, value)?;
        match name {
            "container_name" => self.container_name = parser::parse_name(value),
            "container_orient" => {
                self.container_orient = parser::parse_orient(name, value)?
            }
            "contained_name" => self.contained_name = parser::parse_name(value),
            "contained_orient" => {
                self.contained_orient = parser::parse_orient(name, value)?
            }
            "pos" => self.pos = parser::parse_pos(name, value)?,
            _ => self.overlap = CIGAR::parse(value)?,
        }
        Ok(())
    }
}

impl<N: fmt::Display> fmt::Display for Containment<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C\t{}\t{}\t{}\t{}\t{}\t{}",
            self.container_name,
            self.container_orient,
            self.contained_name,
            self.contained_orient,
            self.pos,
            self.overlap
        )?;
        write_optional(f, &self.optional)
    }
}

/// A path through the graph. Unlike links, a path refers to its
/// segments by name, so renaming a segment means rewriting the paths
/// that go through it.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Path {
    pub path_name: BString,
    pub segment_names: Vec<OrientedSegment>,
    pub overlaps: Vec<CIGAR>,
    pub optional: OptionalFields,
}

impl Path {
    pub fn new(
        path_name: BString,
        segment_names: Vec<OrientedSegment>,
        overlaps: Vec<CIGAR>,
    ) -> Self {
        Path {
            path_name,
            segment_names,
            overlaps,
            optional: Default::default(),
        }
    }

    /// Produces an iterator over the segments of the given path,
    /// producing a slice to each segment name and its orientation
    pub fn iter(&self) -> impl Iterator<Item = (&'_ BStr, Orientation)> {
        self.segment_names
            .iter()
            .map(|s| (s.segment.as_bstr(), s.orient()))
    }

    /// The overlap between step `i` and step `i + 1`; unspecified if
    /// the path doesn't give one.
    pub fn overlap(&self, i: usize) -> CIGAR {
        self.overlaps.get(i).cloned().unwrap_or_default()
    }

    /// Consecutive pairs of steps with the overlap between them, i.e.
    /// the links the path goes through.
    pub fn junctions(
        &self,
    ) -> impl Iterator<Item = (&'_ OrientedSegment, &'_ OrientedSegment, CIGAR)> + '_
    {
        self.segment_names
            .windows(2)
            .enumerate()
            .map(move |(i, w)| (&w[0], &w[1], self.overlap(i)))
    }

    pub fn contains_segment(&self, name: &[u8]) -> bool {
        self.segment_names.iter().any(|s| s.segment == name)
    }

    /// Replace every reference to segment `old` by `new`; returns
    /// true if anything changed.
    pub fn rename_segment(&mut self, old: &[u8], new: &BStr) -> bool {
        let mut changed = false;
        for step in self.segment_names.iter_mut() {
            if step.segment == old {
                step.segment = new.to_owned();
                changed = true;
            }
        }
        changed
    }
}

impl Tagged for Path {
    const PREDEFINED_TAGS: PredefinedTags = &[];
    const FIELD_NAMES: &'static [&'static str] =
        &["path_name", "segment_names", "overlaps"];

    fn optional(&self) -> &OptionalFields {
        &self.optional
    }

    fn optional_mut(&mut self) -> &mut OptionalFields {
        &mut self.optional
    }
}

impl Record for Path {
    const RECORD_TYPE: RecordType = RecordType::Path;
    const FIELDS: FieldDefs = &[
        ("path_name", FieldKind::Name),
        ("segment_names", FieldKind::PathSegments),
        ("overlaps", FieldKind::PathOverlaps),
    ];

    fn from_fields<T: AsRef<[u8]>>(fields: &[T]) -> GFAResult<Self> {
        let (req, opt) = parser::split_required(Self::FIELDS, fields)?;
        Ok(Path {
            path_name: parser::parse_name(req[0].as_ref()),
            segment_names: parser::parse_path_segments(
                "segment_names",
                req[1].as_ref(),
            )?,
            overlaps: parser::parse_path_overlaps(req[2].as_ref())?,
            optional: OptionalFields::parse(opt, Self::PREDEFINED_TAGS)?,
        })
    }

    fn field_to_string(&self, name: &str) -> GFAResult<String> {
        match name {
            "path_name" => Ok(self.path_name.to_string()),
            "segment_names" => Ok(joined(&self.segment_names)),
            "overlaps" => Ok(joined(&self.overlaps)),
            _ => Err(GFAError::InvalidTagName(name.to_string())),
        }
    }

    fn set_field(&mut self, name: &str, value: &[u8]) -> GFAResult<()> {
        field_kind(Self::FIELDS, name)?.validate(name, value)?;
        match name {
            "path_name" => self.path_name = parser::parse_name(value),
            "segment_names" => {
                self.segment_names = parser::parse_path_segments(name, value)?
            }
            _ => self.overlaps = parser::parse_path_overlaps(value)?,
        }
        Ok(())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P\t{}\t", self.path_name)?;
        write_joined(f, &self.segment_names)?;
        write!(f, "\t")?;
        write_joined(f, &self.overlaps)?;
        write_optional(f, &self.optional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(s: &str) -> Line {
        s.parse().unwrap()
    }

    #[test]
    fn round_trip() {
        for s in &[
            "H\tVN:Z:1.0",
            "H\txx:i:13\tVN:Z:HI",
            "S\t1\tACCTT\tLN:i:5\tSH:H:AACCFF05\tRC:i:123\tUR:Z:http://test.com/\tij:A:x\tab:B:I,1,2,3,52124",
            "S\t12\t*\txx:f:1.50\tKC:i:+10",
            "L\t11\t+\t12\t-\t4M\tzz:Z:yes\tKC:i:100",
            "L\t1\t-\t2\t+\t*",
            "C\t1\t-\t2\t+\t110\t100M",
            "P\t14\t11+,12-,13+\t4M,5M",
            "P\t4\t2+,0-\t*\tzj:J:{\"a\":1.0,\"b\":1}",
        ] {
            assert_eq!(*s, line(s).to_string());
        }
    }

    #[test]
    fn required_field_count() {
        assert!(Segment::from_fields(&["1", "*"]).is_ok());
        assert_eq!(
            Err(GFAError::RequiredFieldMissing("sequence")),
            Segment::from_fields(&["1"])
        );
        assert!(matches!(
            Segment::from_fields(&["1", "*", "*"]),
            Err(GFAError::Format { .. })
        ));
        assert!(matches!(
            Segment::from_fields(&["1\t1", "*", "*"]),
            Err(GFAError::Format { .. })
        ));
        assert_eq!(
            Err(GFAError::RequiredFieldMissing("overlap")),
            Link::from_fields(&["1", "+", "2", "-"])
        );
    }

    #[test]
    fn header_tags() {
        assert!(Header::from_fields(&["VN:Z:1"]).is_ok());
        assert!(matches!(
            Header::from_fields(&["VN:i:1"]),
            Err(GFAError::PredefinedOptfieldType { .. })
        ));
        assert!(matches!(
            Header::from_fields(&["VN i:1"]),
            Err(GFAError::Format { .. })
        ));
        assert!(matches!(
            Header::from_fields(&["zz:i:1A"]),
            Err(GFAError::Format { .. })
        ));
        assert_eq!(
            Err(GFAError::DuplicatedOptfieldName("zz".into())),
            Header::from_fields(&["zz:i:1", "VN:Z:1", "zz:i:2"])
        );
        assert_eq!(
            Err(GFAError::CustomOptfieldName("ZZ".into())),
            Header::from_fields(&["ZZ:Z:1"])
        );
    }

    #[test]
    fn clones_are_independent() {
        let l = Header::from_line(b"H\tVN:Z:1.0").unwrap();
        let mut l2 = l.clone();
        assert_eq!(l, l2);
        l2.set_tag("VN", "2.0").unwrap();
        assert_eq!(Some(b"2.0".as_bstr()), l2.version());
        assert_eq!(Some(b"1.0".as_bstr()), l.version());
        assert_ne!(l, l2);
    }

    #[test]
    fn tag_accessors() {
        let mut l = Segment::from_fields(&["12", "*", "xx:i:13", "KC:i:10"]).unwrap();
        assert_eq!(
            vec!["name", "sequence", "xx", "KC"],
            l.field_names()
        );
        assert_eq!(Some("13".to_string()), l.tag_to_string("xx").unwrap());
        assert_eq!(Some(13), l.int_tag("xx").unwrap());
        assert_eq!(10, l.int_tag_required("KC").unwrap());
        assert_eq!(None, l.tag("zz").unwrap());
        assert_eq!(
            Err(GFAError::TagMissing("zz".into())),
            l.tag_required("zz")
        );
        assert!(matches!(l.tag("zzz"), Err(GFAError::InvalidTagName(_))));
        assert!(matches!(l.tag("name"), Err(GFAError::InvalidTagName(_))));

        l.set_tag("zz", "1").unwrap();
        assert_eq!(Some(TagType::String), l.tag_datatype("zz").unwrap());
        l.set_tag("zi", 1i64).unwrap();
        assert_eq!(Some(TagType::Int), l.tag_datatype("zi").unwrap());
        l.set_tag("bh", serde_json::json!({"a": 1.0, "b": 1})).unwrap();
        let reparsed: Line = l.to_string().parse().unwrap();
        match reparsed {
            Line::Segment(s) => assert_eq!(
                Some(&TagValue::Json(serde_json::json!({"a": 1.0, "b": 1}))),
                s.tag("bh").unwrap()
            ),
            _ => panic!("Expected a segment"),
        }
        assert!(matches!(l.set_tag("zzz", "1"), Err(GFAError::InvalidTagName(_))));

        l.set_tag("xx", 15i64).unwrap();
        assert!(matches!(l.set_tag("xx", "1A"), Err(GFAError::Format { .. })));
        l.set_datatype("xx", TagType::String).unwrap();
        l.set_tag("xx", "1A").unwrap();
        assert_eq!(Some("1A".to_string()), l.tag_to_string("xx").unwrap());
        assert_eq!(Some(TagValue::Int(1)), l.delete_tag("zi").unwrap());
    }

    #[test]
    fn required_field_setters() {
        let mut l = Segment::from_fields(&["12", "*", "xx:i:13", "KC:i:1200"]).unwrap();
        assert!(matches!(
            l.set_field("name", b"A\t1"),
            Err(GFAError::Format { .. })
        ));
        l.set_field("name", b"14").unwrap();
        assert_eq!("14", l.name);
        assert_eq!("14", l.field_to_string("name").unwrap());
        assert!(l.set_field("zzz", b"1").is_err());
        assert_eq!(RecordType::Segment, l.record_type());
    }

    #[test]
    fn segment_length_invariant() {
        assert!(Segment::from_fields(&["1", "ACG", "LN:i:3"]).is_ok());
        assert_eq!(
            Err(GFAError::InconsistentLength {
                declared: 4,
                actual: 3
            }),
            Segment::from_fields(&["1", "ACG", "LN:i:4"])
        );
        assert!(Segment::from_fields(&["1", "*", "LN:i:4"]).is_ok());

        let mut s = Segment::from_fields(&["1", "ACG", "LN:i:3"]).unwrap();
        assert!(s.set_tag("LN", 5i64).is_err());
        assert_eq!(Some(3), s.int_tag("LN").unwrap());
        assert!(s.set_field("sequence", b"ACGT").is_err());
        assert_eq!("ACG", s.sequence_str());
        s.set_field("sequence", b"*").unwrap();
        s.set_tag("LN", 5i64).unwrap();
        assert_eq!(Some(5), s.length());
    }

    #[test]
    fn segment_coverage() {
        let s = Segment::from_fields(&["1", "*", "RC:i:6000", "LN:i:20"]).unwrap();
        assert_eq!(Some(300.0), s.coverage("RC").unwrap());
        assert_eq!(300.0, s.coverage_required("RC").unwrap());
        assert_eq!(None, s.coverage("KC").unwrap());
        assert_eq!(
            Err(GFAError::TagMissing("KC".into())),
            s.coverage_required("KC")
        );

        let s = Segment::from_fields(&["1", "*", "RC:i:6000"]).unwrap();
        assert_eq!(None, s.coverage("RC").unwrap());
        assert_eq!(
            Err(GFAError::TagMissing("LN".into())),
            s.coverage_required("RC")
        );
    }

    #[test]
    fn link_ends_and_canonical_form() {
        let l = Link::from_line(b"L\t2\t-\t1\t-\t2M1I").unwrap();
        assert_eq!("2B", l.from_end().to_string());
        assert_eq!("1E", l.to_end().to_string());
        assert!(!l.is_canonical());

        let mut c = l.clone();
        assert!(c.canonicize());
        assert_eq!("L\t1\t+\t2\t+\t1D2M", c.to_string());
        assert!(c.is_canonical());
        assert!(!c.canonicize());

        let end = SegmentEnd::from_pair(&["1", "E"]).unwrap();
        assert_eq!(Some(SegmentEnd::from_pair(&["2", "B"]).unwrap()), l.other_end(&end));
        assert_eq!(None, l.other_end(&end.flip()));

        let self_loop = Link::new(b"1", Orientation::Backward, b"1", Orientation::Backward, CIGAR::default());
        assert!(!self_loop.is_canonical());
        assert!(self_loop.is_circular());
    }

    #[test]
    fn link_compatibility() {
        let l = Link::from_line(b"L\t1\t+\t2\t-\t12M").unwrap();
        let os = |n: &str, o: &str| OrientedSegment::from_pair(&[n, o]).unwrap();
        let m12: CIGAR = "12M".parse().unwrap();
        assert!(l.compatible(&os("1", "+"), &os("2", "-"), &m12, false));
        assert!(l.compatible(&os("1", "+"), &os("2", "-"), &CIGAR::default(), false));
        assert!(!l.compatible(&os("1", "+"), &os("2", "-"), &"11M".parse().unwrap(), true));
        assert!(!l.compatible(&os("2", "+"), &os("1", "-"), &m12, false));
        assert!(l.compatible(&os("2", "+"), &os("1", "-"), &m12, true));
    }

    #[test]
    fn path_steps() {
        let mut p = Path::from_line(b"P\t14\t11+,12-,13+\t4M,5M").unwrap();
        {
            let mut iter = p.iter();
            assert_eq!(Some(("11".into(), Orientation::Forward)), iter.next());
            assert_eq!(Some(("12".into(), Orientation::Backward)), iter.next());
            assert_eq!(Some(("13".into(), Orientation::Forward)), iter.next());
            assert_eq!(None, iter.next());
        }

        let junctions: Vec<_> = p
            .junctions()
            .map(|(a, b, o)| format!("{}>{}:{}", a, b, o))
            .collect();
        assert_eq!(vec!["11+>12-:4M", "12->13+:5M"], junctions);

        assert!(p.rename_segment(b"12", b"X".as_bstr()));
        assert!(!p.contains_segment(b"12"));
        assert_eq!("P\t14\t11+,X-,13+\t4M,5M", p.to_string());
        assert_eq!("11+,X-,13+", p.field_to_string("segment_names").unwrap());
    }

    #[test]
    fn header_merge() {
        let mut h = Header::from_line(b"H\tVN:Z:1.0").unwrap();
        h.merge(&Header::from_line(b"H\tVN:Z:1.0\txx:i:1").unwrap()).unwrap();
        assert_eq!("H\tVN:Z:1.0\txx:i:1", h.to_string());
        assert!(h.merge(&Header::from_line(b"H\tVN:Z:2.0").unwrap()).is_err());
    }
}
