use std::fmt;

use bstr::BStr;

use crate::optfields::*;
use crate::parser::{FieldDefs, GFAError, GFAResult};

use super::RecordType;

/// Access to the optional fields of a line by tag name. Any
/// syntactically valid tag name can be read or written, whether or
/// not the line had it when it was created.
pub trait Tagged {
    /// Tags reserved for this record type, with their datatype.
    const PREDEFINED_TAGS: PredefinedTags;

    /// Names of the required fields; these can't be used as tag names.
    const FIELD_NAMES: &'static [&'static str];

    fn optional(&self) -> &OptionalFields;

    fn optional_mut(&mut self) -> &mut OptionalFields;

    fn tag_name(name: &str) -> GFAResult<TagName> {
        if Self::FIELD_NAMES.contains(&name) {
            return Err(GFAError::InvalidTagName(name.to_string()));
        }
        TagName::new(name.as_bytes())
    }

    /// The value of a tag, or `None` if it's not set.
    fn tag(&self, name: &str) -> GFAResult<Option<&TagValue>> {
        let tag = Self::tag_name(name)?;
        Ok(self.optional().get(tag).map(OptField::value))
    }

    /// The value of a tag, failing with `TagMissing` if it's not set.
    fn tag_required(&self, name: &str) -> GFAResult<&TagValue> {
        self.tag(name)?
            .ok_or_else(|| GFAError::TagMissing(name.to_string()))
    }

    fn set_tag<V: Into<TagValue>>(
        &mut self,
        name: &str,
        value: V,
    ) -> GFAResult<()> {
        let tag = Self::tag_name(name)?;
        self.optional_mut()
            .set(tag, value.into(), Self::PREDEFINED_TAGS)
    }

    fn set_datatype(&mut self, name: &str, datatype: TagType) -> GFAResult<()> {
        let tag = Self::tag_name(name)?;
        self.optional_mut()
            .set_datatype(tag, datatype, Self::PREDEFINED_TAGS)
    }

    fn delete_tag(&mut self, name: &str) -> GFAResult<Option<TagValue>> {
        let tag = Self::tag_name(name)?;
        Ok(self.optional_mut().remove(tag).map(|f| f.value().clone()))
    }

    fn tag_datatype(&self, name: &str) -> GFAResult<Option<TagType>> {
        let tag = Self::tag_name(name)?;
        Ok(self.optional().get(tag).map(OptField::datatype))
    }

    /// The tag value as it's written in a line.
    fn tag_to_string(&self, name: &str) -> GFAResult<Option<String>> {
        let tag = Self::tag_name(name)?;
        Ok(self.optional().get(tag).map(OptField::value_to_string))
    }

    fn int_tag(&self, name: &str) -> GFAResult<Option<i64>> {
        match self.tag(name)? {
            None => Ok(None),
            Some(v) => v.as_int().map(Some).ok_or_else(|| {
                GFAError::format(name, "[-+]?[0-9]+", v.to_string().as_bytes())
            }),
        }
    }

    fn int_tag_required(&self, name: &str) -> GFAResult<i64> {
        self.int_tag(name)?
            .ok_or_else(|| GFAError::TagMissing(name.to_string()))
    }

    fn float_tag(&self, name: &str) -> GFAResult<Option<f64>> {
        match self.tag(name)? {
            None => Ok(None),
            Some(v) => v.as_float().map(Some).ok_or_else(|| {
                GFAError::format(name, "float", v.to_string().as_bytes())
            }),
        }
    }

    fn str_tag(&self, name: &str) -> GFAResult<Option<&BStr>> {
        match self.tag(name)? {
            None => Ok(None),
            Some(v) => v.as_bstr().map(Some).ok_or_else(|| {
                GFAError::format(name, "[ !-~]+", v.to_string().as_bytes())
            }),
        }
    }
}

/// The shared contract of every line type that can be parsed from
/// text: positional required fields, then tags.
pub trait Record: Tagged + fmt::Display + Sized {
    const RECORD_TYPE: RecordType;

    const FIELDS: FieldDefs;

    /// Build a record from the fields following the record type
    /// letter.
    fn from_fields<T: AsRef<[u8]>>(fields: &[T]) -> GFAResult<Self>;

    /// A required field as it's written in a line.
    fn field_to_string(&self, name: &str) -> GFAResult<String>;

    /// Replace a required field, validating the new value against the
    /// field's grammar.
    fn set_field(&mut self, name: &str, value: &[u8]) -> GFAResult<()>;

    fn record_type(&self) -> RecordType {
        Self::RECORD_TYPE
    }

    /// Required field names followed by tag names, in line order.
    fn field_names(&self) -> Vec<String> {
        Self::FIELDS
            .iter()
            .map(|(name, _)| name.to_string())
            .chain(self.optional().iter().map(|f| f.tag.to_string()))
            .collect()
    }

    /// Parse a complete line, which must be of this record type.
    fn from_line(line: &[u8]) -> GFAResult<Self> {
        let mut fields = line.split(|&b| b == b'\t');
        let letter = fields.next().unwrap_or_default();
        if RecordType::from_bytes(letter) != Some(Self::RECORD_TYPE) {
            return Err(GFAError::UnknownRecordType(
                String::from_utf8_lossy(letter).into_owned(),
            ));
        }
        let fields: Vec<&[u8]> = fields.collect();
        Self::from_fields(&fields)
    }
}

/// Look up the grammar of a required field.
pub(crate) fn field_kind(
    defs: FieldDefs,
    name: &str,
) -> GFAResult<crate::parser::FieldKind> {
    defs.iter()
        .find(|(n, _)| *n == name)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| GFAError::InvalidTagName(name.to_string()))
}
