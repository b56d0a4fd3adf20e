use bytemuck::{Contiguous, Pod, Zeroable};

use nom::{bytes::complete::*, IResult};

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::parser::{GFAError, GFAResult};

#[repr(u8)]
#[derive(
    Contiguous, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum CIGAROp {
    M = 0,
    I = 1,
    D = 2,
    N = 3,
    S = 4,
    H = 5,
    P = 6,
    E = 7,
    X = 8,
}

impl CIGAROp {
    fn from_u8_byte(value: u8) -> Option<Self> {
        Self::from_integer(value)
    }

    fn to_u8_char(self) -> u8 {
        use CIGAROp::*;
        match self {
            M => b'M',
            I => b'I',
            D => b'D',
            N => b'N',
            S => b'S',
            H => b'H',
            P => b'P',
            E => b'=',
            X => b'X',
        }
    }

    /// The operation as seen from the other sequence of the
    /// alignment: insertions become deletions and vice versa.
    #[inline]
    pub fn complement(self) -> Self {
        use CIGAROp::*;
        match self {
            I => D,
            D => I,
            op => op,
        }
    }
}

impl std::fmt::Display for CIGAROp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sym = char::from(self.to_u8_char());
        write!(f, "{}", sym)
    }
}

/// A single CIGAR op + length packed into a u32. Lengths must fit in
/// 28 bits.
#[repr(transparent)]
#[derive(
    Zeroable, Pod, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct CIGARPair(u32);

#[allow(clippy::len_without_is_empty)]
impl CIGARPair {
    pub fn new(len: u32, op: CIGAROp) -> Option<Self> {
        if len < (1 << 28) {
            Some(CIGARPair((len << 4) | (op as u32)))
        } else {
            None
        }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.0 >> 4
    }

    #[inline]
    pub fn op(&self) -> CIGAROp {
        let op = (self.0 & 0xF) as u8;
        // only ever constructed from a valid CIGAROp
        CIGAROp::from_u8_byte(op).unwrap_or(CIGAROp::M)
    }

    pub fn into_pair(&self) -> (u32, CIGAROp) {
        (self.len(), self.op())
    }
}

impl std::fmt::Display for CIGARPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.len(), self.op())
    }
}

/// An alignment overlap. The empty CIGAR stands for an unspecified
/// overlap (`*` in GFA) and matches any other overlap.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct CIGAR(pub Vec<CIGARPair>);

impl CIGAR {
    /// Build a CIGAR from (length, op) pairs; returns None if any
    /// length is too large to be stored.
    pub fn from_pairs<I>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (u32, CIGAROp)>,
    {
        pairs
            .into_iter()
            .map(|(len, op)| CIGARPair::new(len, op))
            .collect::<Option<Vec<_>>>()
            .map(CIGAR)
    }

    fn parse_op_cmd(input: &[u8]) -> IResult<&[u8], CIGAROp> {
        use nom::{branch::alt, combinator::map};
        use CIGAROp::*;
        alt((
            map(tag("M"), |_| M),
            map(tag("I"), |_| I),
            map(tag("D"), |_| D),
            map(tag("N"), |_| N),
            map(tag("S"), |_| S),
            map(tag("H"), |_| H),
            map(tag("P"), |_| P),
            map(tag("="), |_| E),
            map(tag("X"), |_| X),
        ))(input)
    }

    fn parse_len(input: &[u8]) -> IResult<&[u8], u32> {
        use nom::{character::complete::digit1, combinator::map_res};
        map_res(digit1, |bs: &[u8]| {
            std::str::from_utf8(bs)
                .map_err(|_| ())
                .and_then(|s| s.parse::<u32>().map_err(|_| ()))
        })(input)
    }

    pub(crate) fn parser_bytestring(i: &[u8]) -> IResult<&[u8], Self> {
        use nom::{
            combinator::{map, map_opt},
            multi::many1,
            sequence::pair,
        };
        map(
            many1(map_opt(
                pair(Self::parse_len, Self::parse_op_cmd),
                |(len, op)| CIGARPair::new(len, op),
            )),
            CIGAR,
        )(i)
    }

    /// Parse a complete overlap field. `*` yields the empty CIGAR;
    /// trailing garbage is an error.
    pub fn parse(i: &[u8]) -> GFAResult<Self> {
        if i == b"*" {
            return Ok(CIGAR::default());
        }
        match Self::parser_bytestring(i) {
            Ok((rest, cigar)) if rest.is_empty() => Ok(cigar),
            _ => Err(GFAError::format(
                "overlap",
                "\\*|([0-9]+[MIDNSHPX=])+",
                i,
            )),
        }
    }

    /// Total length of all operations.
    pub fn len(&self) -> usize {
        self.0.iter().fold(0, |s, pair| s + pair.len() as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, CIGAROp)> + '_ {
        self.0.iter().map(CIGARPair::into_pair)
    }

    /// The same alignment read from the other sequence: operations in
    /// reverse order, with insertions and deletions swapped.
    pub fn complement(&self) -> Self {
        CIGAR(
            self.0
                .iter()
                .rev()
                .filter_map(|p| CIGARPair::new(p.len(), p.op().complement()))
                .collect(),
        )
    }

    /// Two overlaps are compatible if they are equal, or if either of
    /// them is unspecified.
    pub fn compatible(&self, other: &CIGAR) -> bool {
        self.is_empty() || other.is_empty() || self == other
    }
}

impl std::fmt::Display for CIGAR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "*");
        }
        for pair in self.0.iter() {
            write!(f, "{}", pair)?
        }
        Ok(())
    }
}

impl std::str::FromStr for CIGAR {
    type Err = GFAError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CIGAR::parse(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cg(s: &str) -> CIGAR {
        s.parse().unwrap()
    }

    #[test]
    fn cigar_display() {
        let input = "20M12D3M4N9S10H5P11=9X";
        assert_eq!(input, cg(input).to_string());
        assert_eq!("*", CIGAR::default().to_string());
    }

    #[test]
    fn cigar_parser_bytestring() {
        use CIGAROp::*;

        let input = b"20M12D3M4N9S10H5P11=9X";
        let (i, cigar) = CIGAR::parser_bytestring(input).unwrap();
        assert_eq!(b"", i);
        assert_eq!(
            CIGAR::from_pairs(vec![
                (20, M),
                (12, D),
                (3, M),
                (4, N),
                (9, S),
                (10, H),
                (5, P),
                (11, E),
                (9, X)
            ])
            .unwrap(),
            cigar
        );

        let input = b"20M12D93  X";
        let (i, cigar) = CIGAR::parser_bytestring(input).unwrap();
        assert_eq!(b"93  X", i);
        assert_eq!(CIGAR::from_pairs(vec![(20, M), (12, D)]).unwrap(), cigar);

        assert!(CIGAR::parser_bytestring(b"M20").is_err());
        assert!(CIGAR::parser_bytestring(b"20").is_err());
        assert!(CIGAR::parser_bytestring(b"").is_err());
    }

    #[test]
    fn full_field_parse() {
        assert!(cg("*").is_empty());
        assert_eq!(12, cg("12M").len());
        assert!(CIGAR::parse(b"20M12D93  X").is_err());
        assert!(CIGAR::parse(b"").is_err());
        assert!(CIGAR::parse(b"4294967295M").is_err());
    }

    #[test]
    fn complement_swaps_indels() {
        assert_eq!(cg("2I1M3D"), cg("3I1M2D").complement());
        assert_eq!(cg("12M"), cg("12M").complement());
        let c = cg("5M2D4M");
        assert_eq!(c, c.complement().complement());
        assert!(CIGAR::default().complement().is_empty());
    }

    #[test]
    fn unspecified_overlap_is_compatible() {
        let empty = CIGAR::default();
        assert!(empty.compatible(&cg("12M")));
        assert!(cg("12M").compatible(&empty));
        assert!(cg("12M").compatible(&cg("12M")));
        assert!(!cg("12M").compatible(&cg("11M")));
    }
}
