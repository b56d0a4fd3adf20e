use std::convert::TryFrom;
use std::fmt;

use bstr::{BStr, BString, ByteSlice};

use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::parser::{GFAError, GFAResult};

/// Predefined tags of a record type, with their reserved datatype.
pub type PredefinedTags = &'static [(&'static str, TagType)];

/// A tag name, matching `[A-Za-z][A-Za-z0-9]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagName([u8; 2]);

impl TagName {
    pub fn new(name: &[u8]) -> GFAResult<Self> {
        match name {
            [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphanumeric() => {
                Ok(TagName([*a, *b]))
            }
            _ => Err(GFAError::InvalidTagName(
                name.to_str_lossy().into_owned(),
            )),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Custom tags must be lower case; upper case names are reserved
    /// for predefined tags.
    pub fn is_custom(&self) -> bool {
        self.0[0].is_ascii_lowercase()
            && (self.0[1].is_ascii_lowercase() || self.0[1].is_ascii_digit())
    }

    fn predefined_type(&self, predefined: PredefinedTags) -> Option<TagType> {
        predefined
            .iter()
            .find(|(name, _)| name.as_bytes() == self.as_bytes())
            .map(|(_, ty)| *ty)
    }
}

impl TryFrom<&str> for TagName {
    type Error = GFAError;

    fn try_from(name: &str) -> GFAResult<Self> {
        TagName::new(name.as_bytes())
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", char::from(self.0[0]), char::from(self.0[1]))
    }
}

/// The datatype letter of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    Char,
    Int,
    Float,
    String,
    Json,
    ByteArray,
    NumArray,
}

impl TagType {
    pub fn from_letter(letter: u8) -> Option<Self> {
        use TagType::*;
        match letter {
            b'A' => Some(Char),
            b'i' => Some(Int),
            b'f' => Some(Float),
            b'Z' => Some(String),
            b'J' => Some(Json),
            b'H' => Some(ByteArray),
            b'B' => Some(NumArray),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        use TagType::*;
        match self {
            Char => 'A',
            Int => 'i',
            Float => 'f',
            String => 'Z',
            Json => 'J',
            ByteArray => 'H',
            NumArray => 'B',
        }
    }

    fn pattern(self) -> &'static str {
        use TagType::*;
        match self {
            Char => "[!-~]",
            Int => "[-+]?[0-9]+",
            Float => "[-+]?[0-9]*\\.?[0-9]+([eE][-+]?[0-9]+)?",
            String | Json => "[ !-~]+",
            ByteArray => "([0-9A-F][0-9A-F])+",
            NumArray => "[cCsSiI](,[-+]?[0-9]+)+|f(,[-+]?[0-9]*\\.?[0-9]+([eE][-+]?[0-9]+)?)+",
        }
    }

    fn regex(self) -> &'static Regex {
        lazy_static! {
            static ref RE_CHAR: Regex = Regex::new(r"(?-u)^[!-~]$").unwrap();
            static ref RE_INT: Regex = Regex::new(r"(?-u)^[-+]?[0-9]+$").unwrap();
            static ref RE_FLOAT: Regex =
                Regex::new(r"(?-u)^[-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?$")
                    .unwrap();
            static ref RE_STRING: Regex = Regex::new(r"(?-u)^[ !-~]+$").unwrap();
            static ref RE_BYTES: Regex =
                Regex::new(r"(?-u)^([0-9A-F][0-9A-F])+$").unwrap();
            static ref RE_ARRAY: Regex = Regex::new(
                r"(?-u)^([cCsSiI](,[-+]?[0-9]+)+|f(,[-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?)+)$"
            )
            .unwrap();
        }
        use TagType::*;
        match self {
            Char => &RE_CHAR,
            Int => &RE_INT,
            Float => &RE_FLOAT,
            String | Json => &RE_STRING,
            ByteArray => &RE_BYTES,
            NumArray => &RE_ARRAY,
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Element type of a `B` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BArraySubtype {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
}

impl BArraySubtype {
    fn from_letter(letter: u8) -> Option<Self> {
        use BArraySubtype::*;
        match letter {
            b'c' => Some(I8),
            b'C' => Some(U8),
            b's' => Some(I16),
            b'S' => Some(U16),
            b'i' => Some(I32),
            b'I' => Some(U32),
            _ => None,
        }
    }

    fn letter(self) -> char {
        use BArraySubtype::*;
        match self {
            I8 => 'c',
            U8 => 'C',
            I16 => 's',
            U16 => 'S',
            I32 => 'i',
            U32 => 'I',
        }
    }

    fn range(self) -> (i64, i64) {
        use BArraySubtype::*;
        match self {
            I8 => (i8::MIN.into(), i8::MAX.into()),
            U8 => (0, u8::MAX.into()),
            I16 => (i16::MIN.into(), i16::MAX.into()),
            U16 => (0, u16::MAX.into()),
            I32 => (i32::MIN.into(), i32::MAX.into()),
            U32 => (0, u32::MAX.into()),
        }
    }

    fn contains(self, v: i64) -> bool {
        let (min, max) = self.range();
        v >= min && v <= max
    }

    /// The narrowest subtype that can hold every value.
    fn fitting(values: &[i64]) -> Option<Self> {
        use BArraySubtype::*;
        [U8, I8, U16, I16, U32, I32]
            .iter()
            .copied()
            .find(|st| values.iter().all(|v| st.contains(*v)))
    }
}

/// A decoded tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Char(u8),
    Int(i64),
    Float(f64),
    String(BString),
    Json(serde_json::Value),
    ByteArray(Vec<u8>),
    IntArray(BArraySubtype, Vec<i64>),
    FloatArray(Vec<f64>),
}

impl TagValue {
    /// The datatype used when a value is stored without an explicit
    /// one.
    pub fn default_type(&self) -> TagType {
        use TagValue::*;
        match self {
            Char(_) => TagType::Char,
            Int(_) => TagType::Int,
            Float(_) => TagType::Float,
            String(_) => TagType::String,
            Json(_) => TagType::Json,
            ByteArray(_) => TagType::ByteArray,
            IntArray(..) | FloatArray(_) => TagType::NumArray,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TagValue::Int(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            TagValue::Float(x) => Some(*x),
            TagValue::Int(x) => Some(*x as f64),
            _ => None,
        }
    }

    pub fn as_bstr(&self) -> Option<&BStr> {
        match self {
            TagValue::String(x) => Some(x.as_bstr()),
            _ => None,
        }
    }

    /// Decode the textual value of a tag of the given type.
    pub fn decode<F: fmt::Display>(
        field: F,
        datatype: TagType,
        text: &[u8],
    ) -> GFAResult<Self> {
        let invalid = || GFAError::format(&field, datatype.pattern(), text);
        if !datatype.regex().is_match(text) {
            return Err(invalid());
        }
        let text_str = text.to_str().map_err(|_| invalid())?;

        let value = match datatype {
            TagType::Char => TagValue::Char(text[0]),
            TagType::Int => {
                TagValue::Int(text_str.parse().map_err(|_| invalid())?)
            }
            TagType::Float => {
                TagValue::Float(text_str.parse().map_err(|_| invalid())?)
            }
            TagType::String => TagValue::String(text.into()),
            TagType::Json => TagValue::Json(
                serde_json::from_slice(text).map_err(|_| invalid())?,
            ),
            TagType::ByteArray => TagValue::ByteArray(
                text.chunks(2)
                    .map(|pair| {
                        std::str::from_utf8(pair)
                            .ok()
                            .and_then(|s| u8::from_str_radix(s, 16).ok())
                            .ok_or_else(invalid)
                    })
                    .collect::<GFAResult<_>>()?,
            ),
            TagType::NumArray => {
                let mut items = text_str.split(',');
                let subtype = items.next().unwrap_or_default();
                if subtype == "f" {
                    TagValue::FloatArray(
                        items
                            .map(|s| s.parse().map_err(|_| invalid()))
                            .collect::<GFAResult<_>>()?,
                    )
                } else {
                    let subtype = BArraySubtype::from_letter(subtype.as_bytes()[0])
                        .ok_or_else(invalid)?;
                    let values = items
                        .map(|s| s.parse::<i64>().map_err(|_| invalid()))
                        .collect::<GFAResult<Vec<_>>>()?;
                    if !values.iter().all(|v| subtype.contains(*v)) {
                        return Err(invalid());
                    }
                    TagValue::IntArray(subtype, values)
                }
            }
        };
        Ok(value)
    }

    /// Bring a value into the given datatype, by re-reading its text
    /// representation if it isn't natively of that type.
    fn coerce<F: fmt::Display>(
        self,
        field: F,
        datatype: TagType,
    ) -> GFAResult<Self> {
        // NaN and infinities have no GFA text form
        let finite = match &self {
            TagValue::Float(x) => x.is_finite(),
            TagValue::FloatArray(xs) => xs.iter().all(|x| x.is_finite()),
            _ => true,
        };
        if !finite {
            return Err(GFAError::format(
                field,
                TagType::Float.pattern(),
                self.to_string().as_bytes(),
            ));
        }
        if self.default_type() == datatype {
            Ok(self)
        } else {
            Self::decode(field, datatype, self.to_string().as_bytes())
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TagValue::*;
        match self {
            Char(x) => write!(f, "{}", char::from(*x)),
            Int(x) => write!(f, "{}", x),
            Float(x) => write!(f, "{:?}", x),
            String(x) => write!(f, "{}", x),
            Json(x) => write!(f, "{}", x),
            ByteArray(x) => {
                for b in x {
                    write!(f, "{:02X}", b)?
                }
                Ok(())
            }
            IntArray(st, x) => {
                write!(f, "{}", st.letter())?;
                for a in x {
                    write!(f, ",{}", a)?
                }
                Ok(())
            }
            FloatArray(x) => {
                write!(f, "f")?;
                for a in x {
                    write!(f, ",{:?}", a)?
                }
                Ok(())
            }
        }
    }
}

impl From<i64> for TagValue {
    fn from(x: i64) -> Self {
        TagValue::Int(x)
    }
}

impl From<i32> for TagValue {
    fn from(x: i32) -> Self {
        TagValue::Int(x.into())
    }
}

impl From<f64> for TagValue {
    fn from(x: f64) -> Self {
        TagValue::Float(x)
    }
}

impl From<&str> for TagValue {
    fn from(x: &str) -> Self {
        TagValue::String(x.into())
    }
}

impl From<String> for TagValue {
    fn from(x: String) -> Self {
        TagValue::String(x.into())
    }
}

impl From<BString> for TagValue {
    fn from(x: BString) -> Self {
        TagValue::String(x)
    }
}

/// Integer arrays become `B` arrays of the narrowest subtype, or `J`
/// arrays if no subtype can hold them.
impl From<Vec<i64>> for TagValue {
    fn from(x: Vec<i64>) -> Self {
        match BArraySubtype::fitting(&x) {
            Some(st) if !x.is_empty() => TagValue::IntArray(st, x),
            _ => TagValue::Json(x.into()),
        }
    }
}

impl From<Vec<f64>> for TagValue {
    fn from(x: Vec<f64>) -> Self {
        if x.is_empty() {
            TagValue::Json(serde_json::Value::Array(Vec::new()))
        } else {
            TagValue::FloatArray(x)
        }
    }
}

impl From<serde_json::Value> for TagValue {
    fn from(x: serde_json::Value) -> Self {
        TagValue::Json(x)
    }
}

/// An optional field: a name, a value, and the datatype used to write
/// the value back out.
#[derive(Debug, Clone)]
pub struct OptField {
    pub tag: TagName,
    value: TagValue,
    datatype: TagType,
    // original text, dropped as soon as the value changes
    text: Option<BString>,
}

impl PartialEq for OptField {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.datatype == other.datatype
            && self.value == other.value
    }
}

impl OptField {
    /// Create a new OptField with the value's default datatype.
    pub fn new(tag: TagName, value: TagValue) -> Self {
        let datatype = value.default_type();
        OptField {
            tag,
            value,
            datatype,
            text: None,
        }
    }

    /// Create a new OptField with an explicit datatype; the value
    /// must be representable in it.
    pub fn with_type(
        tag: TagName,
        value: TagValue,
        datatype: TagType,
    ) -> GFAResult<Self> {
        let value = value.coerce(tag, datatype)?;
        Ok(OptField {
            tag,
            value,
            datatype,
            text: None,
        })
    }

    /// Parses an optional field from a bytestring in the format
    /// <TAG>:<TYPE>:<VALUE>
    pub fn parse(input: &[u8]) -> GFAResult<Self> {
        lazy_static! {
            static ref RE_FIELD: Regex =
                Regex::new(r"(?-u)^[A-Za-z][A-Za-z0-9]:[AifZJHB]:").unwrap();
        }
        if !RE_FIELD.is_match(input) {
            return Err(GFAError::format(
                "optional field",
                "[A-Za-z][A-Za-z0-9]:[AifZJHB]:<value>",
                input,
            ));
        }
        let tag = TagName::new(&input[0..=1])?;
        let datatype = TagType::from_letter(input[3]).ok_or_else(|| {
            GFAError::format(tag, "[AifZJHB]", &input[3..=3])
        })?;
        let text = &input[5..];
        let value = TagValue::decode(tag, datatype, text)?;
        Ok(OptField {
            tag,
            value,
            datatype,
            text: Some(text.into()),
        })
    }

    pub fn value(&self) -> &TagValue {
        &self.value
    }

    pub fn datatype(&self) -> TagType {
        self.datatype
    }

    /// Replace the value, keeping the current datatype.
    pub fn set_value(&mut self, value: TagValue) -> GFAResult<()> {
        self.value = value.coerce(self.tag, self.datatype)?;
        self.text = None;
        Ok(())
    }

    /// Change the datatype used to write this field, converting the
    /// value if needed.
    pub fn set_datatype(&mut self, datatype: TagType) -> GFAResult<()> {
        if datatype != self.datatype {
            self.value = self.value.clone().coerce(self.tag, datatype)?;
            self.datatype = datatype;
            self.text = None;
        }
        Ok(())
    }

    /// The value as written in a GFA line.
    pub fn value_to_string(&self) -> String {
        match &self.text {
            Some(text) => text.to_string(),
            None => self.value.to_string(),
        }
    }
}

/// The Display implementation output that can be parsed back to OptField
impl fmt::Display for OptField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:", self.tag, self.datatype)?;
        match &self.text {
            Some(text) => write!(f, "{}", text),
            None => write!(f, "{}", self.value),
        }
    }
}

/// The optional fields of a line, in the order they were added. Tag
/// names are unique within a collection.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OptionalFields(Vec<OptField>);

impl OptionalFields {
    /// Given a sequence of bytestrings, parse them as optional fields
    /// of a line with the given predefined tags.
    pub fn parse<T>(input: T, predefined: PredefinedTags) -> GFAResult<Self>
    where
        T: IntoIterator,
        T::Item: AsRef<[u8]>,
    {
        let mut fields = OptionalFields::default();
        for f in input {
            fields.push(OptField::parse(f.as_ref())?, predefined)?;
        }
        Ok(fields)
    }

    /// Append a field, checking its name against the predefined tags
    /// and the fields already present.
    pub fn push(
        &mut self,
        field: OptField,
        predefined: PredefinedTags,
    ) -> GFAResult<()> {
        check_name(field.tag, Some(field.datatype), predefined)?;
        if self.get(field.tag).is_some() {
            return Err(GFAError::DuplicatedOptfieldName(field.tag.to_string()));
        }
        self.0.push(field);
        Ok(())
    }

    /// Return the optional field with the given tag, if it exists.
    pub fn get(&self, tag: TagName) -> Option<&OptField> {
        self.0.iter().find(|o| o.tag == tag)
    }

    pub fn get_mut(&mut self, tag: TagName) -> Option<&mut OptField> {
        self.0.iter_mut().find(|o| o.tag == tag)
    }

    /// Set the value of a tag. Existing tags keep their datatype; new
    /// predefined tags get their reserved type, new custom tags the
    /// value's default type.
    pub fn set(
        &mut self,
        tag: TagName,
        value: TagValue,
        predefined: PredefinedTags,
    ) -> GFAResult<()> {
        if let Some(field) = self.get_mut(tag) {
            return field.set_value(value);
        }
        check_name(tag, None, predefined)?;
        let datatype = tag
            .predefined_type(predefined)
            .unwrap_or_else(|| value.default_type());
        let field = OptField::with_type(tag, value, datatype)?;
        self.0.push(field);
        Ok(())
    }

    pub fn set_datatype(
        &mut self,
        tag: TagName,
        datatype: TagType,
        predefined: PredefinedTags,
    ) -> GFAResult<()> {
        check_name(tag, Some(datatype), predefined)?;
        let field = self
            .get_mut(tag)
            .ok_or_else(|| GFAError::TagMissing(tag.to_string()))?;
        field.set_datatype(datatype)
    }

    pub fn remove(&mut self, tag: TagName) -> Option<OptField> {
        let ix = self.0.iter().position(|o| o.tag == tag)?;
        Some(self.0.remove(ix))
    }

    /// Return all optional fields.
    pub fn fields(&self) -> &[OptField] {
        self.0.as_slice()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptField> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn check_name(
    tag: TagName,
    datatype: Option<TagType>,
    predefined: PredefinedTags,
) -> GFAResult<()> {
    match tag.predefined_type(predefined) {
        Some(expected) => match datatype {
            Some(found) if found != expected => {
                Err(GFAError::PredefinedOptfieldType {
                    tag: tag.to_string(),
                    expected: expected.letter(),
                    found: found.letter(),
                })
            }
            _ => Ok(()),
        },
        None if tag.is_custom() => Ok(()),
        None => Err(GFAError::CustomOptfieldName(tag.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: PredefinedTags = &[("VN", TagType::String)];

    fn tag(s: &str) -> TagName {
        TagName::try_from(s).unwrap()
    }

    #[test]
    fn tag_names() {
        assert!(TagName::new(b"zz").is_ok());
        assert!(TagName::new(b"a1").is_ok());
        assert!(matches!(
            TagName::new(b"zzz"),
            Err(GFAError::InvalidTagName(_))
        ));
        assert!(TagName::new(b"1a").is_err());
        assert!(tag("zz").is_custom());
        assert!(!tag("ZZ").is_custom());
        assert!(!tag("zZ").is_custom());
    }

    #[test]
    fn parse_each_type() {
        use TagValue::*;
        let parse = |s: &str| OptField::parse(s.as_bytes()).unwrap();

        assert_eq!(&Char(b'x'), parse("IJ:A:x").value());
        assert_eq!(&Int(-123), parse("LN:i:-123").value());
        assert_eq!(&Float(1.5e3), parse("xf:f:1.5e3").value());
        assert_eq!(
            &String("http://test.com/".into()),
            parse("UR:Z:http://test.com/").value()
        );
        assert_eq!(
            &ByteArray(vec![0xAA, 0xCC, 0xFF, 0x05]),
            parse("SH:H:AACCFF05").value()
        );
        assert_eq!(
            &IntArray(BArraySubtype::I32, vec![1, 2, 3, 52124]),
            parse("AB:B:i,1,2,3,52124").value()
        );
        assert_eq!(&FloatArray(vec![1.0, -0.5]), parse("fa:B:f,1.0,-0.5").value());
        assert_eq!(
            &Json(serde_json::json!({"a": 1.0, "b": 1})),
            parse("bh:J:{\"a\":1.0,\"b\":1}").value()
        );
    }

    #[test]
    fn reject_malformed_values() {
        for s in &[
            "zz:i:1A",
            "zz:A:ab",
            "zz:f:1.0.0",
            "zz:H:ABC",
            "zz:H:ab",
            "zz:B:c,200",
            "zz:B:q,1",
            "zz:J:{not json",
            "zz:Z:",
            "VN i:1",
            "zz:Q:1",
        ] {
            assert!(
                matches!(OptField::parse(s.as_bytes()), Err(GFAError::Format { .. })),
                "{} should not parse",
                s
            );
        }
    }

    #[test]
    fn display_keeps_original_text() {
        for s in &["xf:f:1.50", "xi:i:+5", "VN:Z:1.0", "AB:B:C,1,2", "bh:J:{\"a\": 1}"] {
            assert_eq!(*s, OptField::parse(s.as_bytes()).unwrap().to_string());
        }
    }

    #[test]
    fn mutation_keeps_datatype() {
        let mut f = OptField::parse(b"xx:i:13").unwrap();
        f.set_value(TagValue::Int(15)).unwrap();
        assert_eq!("xx:i:15", f.to_string());
        assert!(matches!(
            f.set_value("1A".into()),
            Err(GFAError::Format { .. })
        ));
        f.set_value("16".into()).unwrap();
        assert_eq!(&TagValue::Int(16), f.value());

        f.set_datatype(TagType::String).unwrap();
        f.set_value("1A".into()).unwrap();
        assert_eq!("xx:Z:1A", f.to_string());
    }

    #[test]
    fn default_types() {
        assert_eq!(TagType::String, TagValue::from("1").default_type());
        assert_eq!(TagType::Int, TagValue::from(1i64).default_type());
        assert_eq!(TagType::Float, TagValue::from(1.0f64).default_type());
        assert_eq!(TagType::NumArray, TagValue::from(vec![1.0f64, 1.0]).default_type());
        assert_eq!(TagType::NumArray, TagValue::from(vec![1i64, 1]).default_type());
        assert_eq!(
            TagType::Json,
            TagValue::from(serde_json::json!([1.0, 1])).default_type()
        );
        assert_eq!(
            TagType::Json,
            TagValue::from(vec![1i64 << 40]).default_type()
        );
    }

    #[test]
    fn collection_checks_names() {
        let fields = OptionalFields::parse(vec!["zz:i:1", "VN:Z:1", "zz:i:2"], HEADER);
        assert_eq!(
            Err(GFAError::DuplicatedOptfieldName("zz".into())),
            fields
        );

        let fields = OptionalFields::parse(vec!["VN:i:1"], HEADER);
        assert!(matches!(
            fields,
            Err(GFAError::PredefinedOptfieldType { expected: 'Z', found: 'i', .. })
        ));

        let fields = OptionalFields::parse(vec!["ZZ:Z:1"], HEADER);
        assert_eq!(Err(GFAError::CustomOptfieldName("ZZ".into())), fields);

        let fields = OptionalFields::parse(vec!["xx:i:13", "VN:Z:HI"], HEADER).unwrap();
        assert_eq!(2, fields.len());
        assert_eq!(Some(&TagValue::Int(13)), fields.get(tag("xx")).map(|f| f.value()));
    }

    #[test]
    fn set_new_tags() {
        let mut fields = OptionalFields::default();
        fields.set(tag("VN"), TagValue::Int(1), HEADER).unwrap();
        assert_eq!(TagType::String, fields.get(tag("VN")).unwrap().datatype());
        assert_eq!("VN:Z:1", fields.get(tag("VN")).unwrap().to_string());

        fields.set(tag("zf"), TagValue::Float(1.0), HEADER).unwrap();
        assert_eq!("zf:f:1.0", fields.get(tag("zf")).unwrap().to_string());

        fields.set(tag("bi"), vec![1i64, 1].into(), HEADER).unwrap();
        assert_eq!("bi:B:C,1,1", fields.get(tag("bi")).unwrap().to_string());

        assert_eq!(
            Err(GFAError::CustomOptfieldName("XY".into())),
            fields.set(tag("XY"), TagValue::Int(1), HEADER)
        );
        assert_eq!(
            vec!["VN", "zf", "bi"],
            fields.iter().map(|f| f.tag.to_string()).collect::<Vec<_>>()
        );
        assert!(fields.remove(tag("zf")).is_some());
        assert!(fields.get(tag("zf")).is_none());
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let mut fields = OptionalFields::default();
        for x in &[f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                fields.set(tag("zf"), TagValue::Float(*x), HEADER),
                Err(GFAError::Format { .. })
            ));
        }
        assert!(matches!(
            fields.set(tag("fa"), vec![1.0, f64::INFINITY].into(), HEADER),
            Err(GFAError::Format { .. })
        ));
        assert!(fields.is_empty());

        fields.set(tag("zf"), TagValue::Float(2.5), HEADER).unwrap();
        assert!(fields.set(tag("zf"), TagValue::Float(f64::NAN), HEADER).is_err());
        assert_eq!("zf:f:2.5", fields.get(tag("zf")).unwrap().to_string());
        let reparsed = OptField::parse(b"zf:f:2.5").unwrap();
        assert_eq!(&reparsed, fields.get(tag("zf")).unwrap());
    }
}
