//! Segments paired with one of two attributes: a segment end (begin
//! or end) or an oriented segment (forward or reverse).

use std::fmt;

use bstr::{BString, ByteSlice};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::Orientation;
use crate::parser::{GFAError, GFAResult};

/// A binary attribute attached to a segment.
pub trait Attribute: Copy + Eq + fmt::Display {
    /// Both values of the attribute.
    const VALUES: [Self; 2];

    fn from_bytes(bs: &[u8]) -> Option<Self>;

    /// The other value of the attribute.
    fn other(self) -> Self {
        if self == Self::VALUES[0] {
            Self::VALUES[1]
        } else {
            Self::VALUES[0]
        }
    }
}

/// Which end of a segment a link is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum EndType {
    Begin,
    End,
}

impl Attribute for EndType {
    const VALUES: [Self; 2] = [EndType::Begin, EndType::End];

    fn from_bytes(bs: &[u8]) -> Option<Self> {
        match bs {
            b"B" => Some(EndType::Begin),
            b"E" => Some(EndType::End),
            _ => None,
        }
    }
}

impl fmt::Display for EndType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndType::Begin => write!(f, "B"),
            EndType::End => write!(f, "E"),
        }
    }
}

impl Attribute for Orientation {
    const VALUES: [Self; 2] = [Orientation::Forward, Orientation::Backward];

    fn from_bytes(bs: &[u8]) -> Option<Self> {
        Orientation::from_bytes_plus_minus(bs)
    }
}

/// A segment identity `N` (a name, or a handle into a graph) plus an
/// attribute. Pure value; never owns the segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct SegmentInfo<N, A> {
    pub segment: N,
    pub attribute: A,
}

pub type SegmentEnd<N = BString> = SegmentInfo<N, EndType>;
pub type OrientedSegment<N = BString> = SegmentInfo<N, Orientation>;

impl<N, A: Attribute> SegmentInfo<N, A> {
    pub fn new(segment: N, attribute: A) -> Self {
        SegmentInfo { segment, attribute }
    }

    /// Same segment, other attribute.
    pub fn flip(&self) -> Self
    where
        N: Clone,
    {
        SegmentInfo::new(self.segment.clone(), self.attribute.other())
    }

    /// Map the segment identity, keeping the attribute.
    pub fn map_segment<M, F: FnOnce(&N) -> M>(&self, f: F) -> SegmentInfo<M, A> {
        SegmentInfo::new(f(&self.segment), self.attribute)
    }
}

impl<A: Attribute> SegmentInfo<BString, A> {
    /// Build from a raw (segment name, attribute) pair, e.g.
    /// `["1", "E"]` or `["1", "+"]`.
    pub fn from_pair<S: AsRef<[u8]>>(pair: &[S]) -> GFAResult<Self> {
        if pair.len() != 2 {
            return Err(GFAError::WrongArity(pair.len()));
        }
        let attr = pair[1].as_ref();
        let attribute = A::from_bytes(attr).ok_or_else(|| {
            GFAError::InvalidAttribute(attr.to_str_lossy().into_owned())
        })?;
        Ok(SegmentInfo::new(pair[0].as_ref().into(), attribute))
    }
}

impl<N> SegmentEnd<N> {
    pub fn end_type(&self) -> EndType {
        self.attribute
    }
}

impl<N> OrientedSegment<N> {
    pub fn orient(&self) -> Orientation {
        self.attribute
    }
}

impl<N: fmt::Display, A: Attribute> fmt::Display for SegmentInfo<N, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.segment, self.attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_pairs() {
        let se = SegmentEnd::from_pair(&["1", "E"]).unwrap();
        assert_eq!(SegmentEnd::new(BString::from("1"), EndType::End), se);
        assert_eq!(EndType::Begin, se.flip().end_type());

        let os = OrientedSegment::from_pair(&["a", "-"]).unwrap();
        assert_eq!(Orientation::Backward, os.orient());
        assert_eq!("a+", os.flip().to_string());

        assert_eq!(
            Err(GFAError::InvalidAttribute("+".into())),
            SegmentEnd::from_pair(&["1", "+"])
        );
        assert_eq!(
            Err(GFAError::InvalidAttribute("X".into())),
            OrientedSegment::from_pair(&["1", "X"])
        );
        assert_eq!(
            Err(GFAError::WrongArity(3)),
            SegmentEnd::from_pair(&["1", "E", "B"])
        );
    }

    #[test]
    fn equality_is_by_value() {
        let a = SegmentEnd::from_pair(&["7", "B"]).unwrap();
        let b = SegmentEnd::new(BString::from("7"), EndType::Begin);
        assert_eq!(a, b);
        assert_ne!(a, b.flip());
        assert_eq!(a, a.flip().flip());
        assert_eq!(SegmentEnd::new(3usize, EndType::End), a.map_segment(|_| 3usize).flip());
    }
}
