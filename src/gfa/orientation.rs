#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::parser::{GFAError, GFAResult};

/// Represents segment orientation/strand
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum Orientation {
    Forward,
    Backward,
}

impl Orientation {
    /// Parse an orientation from a single-element, where + is
    /// Forward, - is Backward
    #[inline]
    pub fn from_bytes_plus_minus<T: AsRef<[u8]>>(bs: T) -> Option<Self> {
        match bs.as_ref() {
            b"+" => Some(Orientation::Forward),
            b"-" => Some(Orientation::Backward),
            _ => None,
        }
    }

    #[inline]
    pub fn plus_minus_as_byte(&self) -> u8 {
        match self {
            Self::Forward => b'+',
            Self::Backward => b'-',
        }
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        !bool::from(*self)
    }

    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    /// Position in per-orientation tables.
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Forward => 0,
            Self::Backward => 1,
        }
    }
}

/// Default orientation is forward
impl Default for Orientation {
    #[inline]
    fn default() -> Orientation {
        Orientation::Forward
    }
}

/// Forward is true, backward is false
impl From<Orientation> for bool {
    #[inline]
    fn from(o: Orientation) -> bool {
        match o {
            Orientation::Forward => true,
            Orientation::Backward => false,
        }
    }
}

/// The default parser follows GFA, with + as Forward, - as Backward
impl std::str::FromStr for Orientation {
    type Err = GFAError;

    #[inline]
    fn from_str(s: &str) -> GFAResult<Self> {
        Orientation::from_bytes_plus_minus(s.as_bytes())
            .ok_or_else(|| GFAError::InvalidAttribute(s.to_string()))
    }
}

/// Display follows GFA, mapping `Forward` to "+", `Backward`
/// to "-".
///
/// # Examples
///
/// ```
/// use gfa_graph::gfa::Orientation as O;
///
/// assert_eq!(&format!("{}", O::Forward), "+");
/// assert_eq!(&format!("{}", O::Backward), "-");
/// ```
impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", char::from(self.plus_minus_as_byte()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_invert() {
        use Orientation::*;
        assert_eq!(Ok(Forward), "+".parse());
        assert_eq!(Ok(Backward), "-".parse());
        assert!("x".parse::<Orientation>().is_err());
        assert_eq!(Backward, Forward.invert());
        assert!(Backward.is_reverse());
    }
}
