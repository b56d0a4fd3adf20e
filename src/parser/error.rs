use std::fmt::Display;

use bstr::ByteSlice;
use thiserror::Error;

pub type GFAResult<T> = Result<T, GFAError>;

/// How much a bulk loader should tolerate when a line fails to parse
/// or to be added to a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserTolerance {
    IgnoreAll,
    Safe,
    Pedantic,
}

impl Default for ParserTolerance {
    fn default() -> Self {
        Self::Safe
    }
}

/// Every way a GFA line or a graph operation can fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GFAError {
    /// A required field or a tag value doesn't match its grammar.
    #[error("Field `{field}` has value `{value}`, expected `{expected}`")]
    Format {
        field: String,
        expected: &'static str,
        value: String,
    },
    /// The line has fewer positional fields than its record type
    /// requires. Includes the name of the first missing field.
    #[error("Required field `{0}` is missing")]
    RequiredFieldMissing(&'static str),
    /// A predefined tag was given a type other than the reserved one.
    #[error("Predefined tag {tag} must have type {expected}, not {found}")]
    PredefinedOptfieldType {
        tag: String,
        expected: char,
        found: char,
    },
    /// Upper-case tag names are reserved for predefined tags.
    #[error("Custom tag {0} must have a lower-case name")]
    CustomOptfieldName(String),
    #[error("Tag {0} is defined more than once")]
    DuplicatedOptfieldName(String),
    /// The forcing accessor was used on an unset tag.
    #[error("No value defined for tag {0}")]
    TagMissing(String),
    /// The name can't be a tag name, nor is it a required field.
    #[error("No field or tag accessor named `{0}`")]
    InvalidTagName(String),
    #[error("Invalid attribute `{0}`")]
    InvalidAttribute(String),
    #[error("Wrong number of elements, 2 expected, got {0}")]
    WrongArity(usize),
    #[error("Line missing: {0}")]
    LineMissing(String),
    #[error("Name already in use: {0}")]
    NotUnique(String),
    #[error(
        "Length in LN tag ({declared}) is different from length of sequence field ({actual})"
    )]
    InconsistentLength { declared: i64, actual: usize },
    /// The line type was something other than 'H', 'S', 'L', 'C', or
    /// 'P'.
    #[error("Unknown record type `{0}`")]
    UnknownRecordType(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Line was empty")]
    EmptyLine,
}

impl GFAError {
    #[inline]
    pub(crate) fn format<F: Display>(
        field: F,
        expected: &'static str,
        value: &[u8],
    ) -> Self {
        GFAError::Format {
            field: field.to_string(),
            expected,
            value: value.to_str_lossy().into_owned(),
        }
    }

    #[inline]
    pub fn can_safely_continue(&self, tol: &ParserTolerance) -> bool {
        use ParserTolerance as Tol;
        match tol {
            Tol::IgnoreAll => true,
            Tol::Safe => matches!(
                self,
                GFAError::EmptyLine | GFAError::UnknownRecordType(_)
            ),
            Tol::Pedantic => false,
        }
    }
}
