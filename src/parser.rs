pub mod error;

pub use self::error::*;

use bstr::{BString, ByteSlice};

use lazy_static::lazy_static;
use log::warn;
use regex::bytes::Regex;

use crate::{
    cigar::CIGAR,
    gfa::{Line, Orientation, OrientedSegment, Record, RecordType},
};

/// The grammar of a positional (required) field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Orient,
    Sequence,
    Overlap,
    Pos,
    PathSegments,
    PathOverlaps,
}

impl FieldKind {
    pub fn pattern(self) -> &'static str {
        use FieldKind::*;
        match self {
            Name => "[!-)+-<>-~][!-~]*",
            Orient => "[+-]",
            Sequence => "\\*|[A-Za-z=.]+",
            Overlap => "\\*|([0-9]+[MIDNSHPX=])+",
            Pos => "[0-9]+",
            PathSegments => "[!-)+\\-.-<>-~][!-+\\-.-~]*[+-](,[!-)+\\-.-<>-~][!-+\\-.-~]*[+-])*",
            PathOverlaps => {
                "(\\*|([0-9]+[MIDNSHPX=])+)(,(\\*|([0-9]+[MIDNSHPX=])+))*"
            }
        }
    }

    fn regex(self) -> &'static Regex {
        lazy_static! {
            static ref RE_NAME: Regex =
                Regex::new(r"(?-u)^[!-)+-<>-~][!-~]*$").unwrap();
            static ref RE_ORIENT: Regex = Regex::new(r"(?-u)^[+-]$").unwrap();
            static ref RE_SEQUENCE: Regex =
                Regex::new(r"(?-u)^(\*|[A-Za-z=.]+)$").unwrap();
            static ref RE_OVERLAP: Regex =
                Regex::new(r"(?-u)^(\*|([0-9]+[MIDNSHPX=])+)$").unwrap();
            static ref RE_POS: Regex = Regex::new(r"(?-u)^[0-9]+$").unwrap();
            // segment names in paths can't contain commas
            static ref RE_PATH_SEGMENTS: Regex = Regex::new(
                r"(?-u)^[!-)+\-.-<>-~][!-+\-.-~]*[+-](,[!-)+\-.-<>-~][!-+\-.-~]*[+-])*$"
            )
            .unwrap();
            static ref RE_PATH_OVERLAPS: Regex = Regex::new(
                r"(?-u)^(\*|([0-9]+[MIDNSHPX=])+)(,(\*|([0-9]+[MIDNSHPX=])+))*$"
            )
            .unwrap();
        }
        use FieldKind::*;
        match self {
            Name => &RE_NAME,
            Orient => &RE_ORIENT,
            Sequence => &RE_SEQUENCE,
            Overlap => &RE_OVERLAP,
            Pos => &RE_POS,
            PathSegments => &RE_PATH_SEGMENTS,
            PathOverlaps => &RE_PATH_OVERLAPS,
        }
    }

    /// Check a field value against this grammar.
    pub fn validate(self, field: &str, value: &[u8]) -> GFAResult<()> {
        if self.regex().is_match(value) {
            Ok(())
        } else {
            Err(GFAError::format(field, self.pattern(), value))
        }
    }
}

/// Name and grammar of every required field of a record type, in
/// line order.
pub type FieldDefs = &'static [(&'static str, FieldKind)];

/// Split the fields following the record type letter into required
/// and optional fields, validating each required field against its
/// grammar.
pub(crate) fn split_required<'a, T: AsRef<[u8]>>(
    defs: FieldDefs,
    fields: &'a [T],
) -> GFAResult<(&'a [T], &'a [T])> {
    if fields.len() < defs.len() {
        return Err(GFAError::RequiredFieldMissing(defs[fields.len()].0));
    }
    let (required, optional) = fields.split_at(defs.len());
    for ((name, kind), value) in defs.iter().zip(required) {
        kind.validate(name, value.as_ref())?;
    }
    Ok((required, optional))
}

pub(crate) fn parse_name(input: &[u8]) -> BString {
    BString::from(input)
}

pub(crate) fn parse_orient(field: &str, input: &[u8]) -> GFAResult<Orientation> {
    Orientation::from_bytes_plus_minus(input).ok_or_else(|| {
        GFAError::format(field, FieldKind::Orient.pattern(), input)
    })
}

pub(crate) fn parse_sequence(input: &[u8]) -> Option<BString> {
    if input == b"*" {
        None
    } else {
        Some(input.into())
    }
}

pub(crate) fn parse_pos(field: &str, input: &[u8]) -> GFAResult<usize> {
    input
        .to_str()
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| GFAError::format(field, FieldKind::Pos.pattern(), input))
}

pub(crate) fn parse_path_segments(
    field: &str,
    input: &[u8],
) -> GFAResult<Vec<OrientedSegment>> {
    input
        .split_str(b",")
        .map(|step| {
            let (name, orient) = step.split_at(step.len().saturating_sub(1));
            Ok(OrientedSegment::new(
                parse_name(name),
                parse_orient(field, orient)?,
            ))
        })
        .collect()
}

/// Check that a segment name can be written as a path step.
pub(crate) fn validate_step_name(field: &str, name: &[u8]) -> GFAResult<()> {
    let mut step = name.to_vec();
    step.push(b'+');
    if FieldKind::PathSegments.regex().is_match(&step) {
        Ok(())
    } else {
        Err(GFAError::format(field, "[!-+\\-.-~]+", name))
    }
}

pub(crate) fn parse_path_overlaps(input: &[u8]) -> GFAResult<Vec<CIGAR>> {
    input.split_str(b",").map(CIGAR::parse).collect()
}

/// Parse a single GFA line (without the line terminator).
pub fn parse_line(line: &[u8]) -> GFAResult<Line> {
    let line = line.trim_end_with(|c| c == '\n' || c == '\r');
    if line.is_empty() {
        return Err(GFAError::EmptyLine);
    }
    let fields: Vec<&[u8]> = line.split_str(b"\t").collect();
    let record_type = RecordType::from_bytes(fields[0]).ok_or_else(|| {
        GFAError::UnknownRecordType(fields[0].to_str_lossy().into_owned())
    })?;
    let fields = &fields[1..];

    use crate::gfa::{Containment, Header, Link, Path, Segment};
    let line = match record_type {
        RecordType::Header => Line::Header(Header::from_fields(fields)?),
        RecordType::Segment => Line::Segment(Segment::from_fields(fields)?),
        RecordType::Link => Line::Link(Link::from_fields(fields)?),
        RecordType::Containment => {
            Line::Containment(Containment::from_fields(fields)?)
        }
        RecordType::Path => Line::Path(Path::from_fields(fields)?),
    };
    Ok(line)
}

/// Parses sequences of lines, skipping the lines that fail in a way
/// allowed by its tolerance.
#[derive(Debug, Default, Clone, Copy)]
pub struct GFAParser {
    tolerance: ParserTolerance,
}

impl GFAParser {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_tolerance(tolerance: ParserTolerance) -> Self {
        GFAParser { tolerance }
    }

    pub fn tolerance(&self) -> ParserTolerance {
        self.tolerance
    }

    /// Parse one line; `Ok(None)` means the line was skipped.
    pub fn parse_gfa_line(&self, line: &[u8]) -> GFAResult<Option<Line>> {
        match parse_line(line) {
            Ok(line) => Ok(Some(line)),
            Err(err) => self.skip_or_fail(err, line).map(|_| None),
        }
    }

    pub fn parse_lines<I>(&self, lines: I) -> GFAResult<Vec<Line>>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut result = Vec::new();
        for line in lines {
            if let Some(line) = self.parse_gfa_line(line.as_ref())? {
                result.push(line);
            }
        }
        Ok(result)
    }

    pub(crate) fn skip_or_fail(
        &self,
        err: GFAError,
        line: &[u8],
    ) -> GFAResult<()> {
        if err.can_safely_continue(&self.tolerance) {
            if !matches!(err, GFAError::EmptyLine) {
                warn!("Skipping line `{}`: {}", line.to_str_lossy(), err);
            }
            Ok(())
        } else {
            Err(err)
        }
    }
}
