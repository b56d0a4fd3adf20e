use bstr::{BString, ByteSlice};
use lazy_static::lazy_static;
use log::debug;
use regex::bytes::Regex;

use super::{ContainmentId, Graph, LinkId, SegmentId};
use crate::{
    gfa::Tagged,
    parser::{FieldKind, GFAError, GFAResult},
};

/// Count tags shared out among the copies of a multiplied segment.
const COUNT_TAGS: [&str; 3] = ["RC", "FC", "KC"];

/// How `Graph::multiply` names the copies of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyNames {
    /// Use these names, in order; there must be one per copy.
    Names(Vec<BString>),
    /// Increment a trailing lowercase letter, or append `b`.
    Lowercase,
    /// Increment a trailing uppercase letter, or append `B`.
    Uppercase,
    /// Increment a trailing number, or append `2`.
    Number,
    /// Append `_copy`, then `_copy2`, `_copy3` and so on.
    Copy,
    /// The integers following the largest integer segment name.
    NextInteger,
}

impl Default for CopyNames {
    fn default() -> Self {
        CopyNames::Lowercase
    }
}

/// The alphanumeric successor of a name: the rightmost letter or
/// digit is incremented, carrying leftwards over other letters and
/// digits, e.g. `a9` -> `b0`, `Az` -> `Ba`, `zz` -> `aaa`.
pub(crate) fn successor(name: &[u8]) -> BString {
    let mut name = name.to_vec();
    let mut i = match name.iter().rposition(u8::is_ascii_alphanumeric) {
        Some(i) => i,
        None => {
            match name.pop() {
                Some(last) if last < b'~' => name.push(last + 1),
                Some(last) => name.extend_from_slice(&[last, b'!']),
                None => name.push(b'!'),
            }
            return name.into();
        }
    };
    loop {
        let (next, carry) = match name[i] {
            b'9' => (b'0', b'1'),
            b'z' => (b'a', b'a'),
            b'Z' => (b'A', b'A'),
            c => {
                name[i] = c + 1;
                break;
            }
        };
        name[i] = next;
        match name[..i].iter().rposition(u8::is_ascii_alphanumeric) {
            Some(j) => i = j,
            None => {
                name.insert(i, carry);
                break;
            }
        }
    }
    name.into()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Suffix {
    Lowercase,
    Uppercase,
    Number,
    Copy,
}

impl Suffix {
    fn first_name(self, name: &[u8]) -> (BString, Suffix) {
        lazy_static! {
            static ref RE_COPY: Regex = Regex::new(r"(?-u)_copy(\d*)$").unwrap();
        }
        let last = name.last().copied().unwrap_or(b'\0');
        let mut next = BString::from(name);
        match self {
            Suffix::Lowercase if last.is_ascii_lowercase() => {
                return (successor(name), self)
            }
            Suffix::Uppercase if last.is_ascii_uppercase() => {
                return (successor(name), self)
            }
            Suffix::Number if last.is_ascii_digit() => return (successor(name), self),
            Suffix::Lowercase => next.push(b'b'),
            Suffix::Uppercase => next.push(b'B'),
            Suffix::Number => next.push(b'2'),
            Suffix::Copy => match RE_COPY.captures(name) {
                Some(caps) => {
                    if caps.get(1).map_or(true, |m| m.as_bytes().is_empty()) {
                        next.push(b'1');
                    }
                    return (successor(&next), Suffix::Number);
                }
                None => next.extend_from_slice(b"_copy"),
            },
        }
        (next, self)
    }
}

impl Graph {
    fn is_name_taken(&self, name: &[u8], chosen: &[BString]) -> bool {
        self.segment_id(name).is_some() || chosen.iter().any(|c| c == name)
    }

    /// Compute `count` unused names for copies of segment `name`.
    pub(crate) fn copy_names(
        &self,
        name: &[u8],
        count: usize,
        strategy: &CopyNames,
    ) -> GFAResult<Vec<BString>> {
        let suffix = match strategy {
            CopyNames::Names(names) => {
                if names.len() != count {
                    return Err(GFAError::InvalidArgument(format!(
                        "{} copy names given, {} needed",
                        names.len(),
                        count
                    )));
                }
                for (i, n) in names.iter().enumerate() {
                    FieldKind::Name.validate("name", n)?;
                    if self.is_name_taken(n, &names[..i]) {
                        return Err(GFAError::NotUnique(n.to_string()));
                    }
                }
                return Ok(names.clone());
            }
            CopyNames::NextInteger => {
                let mut next = self
                    .segments()
                    .filter_map(|s| s.name.to_str().ok()?.parse::<u64>().ok())
                    .max()
                    .map_or(1, |max| max + 1);
                let mut result = Vec::with_capacity(count);
                while result.len() < count {
                    let name = BString::from(next.to_string());
                    if !self.is_name_taken(&name, &result) {
                        result.push(name);
                    }
                    next += 1;
                }
                return Ok(result);
            }
            CopyNames::Lowercase => Suffix::Lowercase,
            CopyNames::Uppercase => Suffix::Uppercase,
            CopyNames::Number => Suffix::Number,
            CopyNames::Copy => Suffix::Copy,
        };

        let (mut next, mut suffix) = suffix.first_name(name);
        let mut result: Vec<BString> = Vec::with_capacity(count);
        while result.len() < count {
            while self.is_name_taken(&next, &result) {
                if suffix == Suffix::Copy {
                    next.push(b'1');
                    suffix = Suffix::Number;
                }
                next = successor(&next);
            }
            result.push(next.clone());
        }
        Ok(result)
    }

    /// Replace a segment by `factor` copies of it. The original
    /// segment is the first copy and keeps its name; the others are
    /// named according to `copy_names`. Every link and containment of
    /// the segment is duplicated for each copy, and the count tags
    /// (`RC`, `FC`, `KC`) are divided among the copies, the remainder
    /// going to the original. A factor of 0 deletes the segment.
    /// Virtual links and paths are not copied.
    ///
    /// Returns the handles of all copies, the original first.
    pub fn multiply<N: AsRef<[u8]>>(
        &mut self,
        name: N,
        factor: usize,
        copy_names: CopyNames,
    ) -> GFAResult<Vec<SegmentId>> {
        let name = name.as_ref();
        let id = self.segment_id(name).ok_or_else(|| {
            GFAError::LineMissing(format!("segment {}", name.as_bstr()))
        })?;
        match factor {
            0 => return self.delete_segment(name).map(|_| Vec::new()),
            1 => return Ok(vec![id]),
            _ => (),
        }
        let names = self.copy_names(name, factor - 1, &copy_names)?;

        let slot = self.segment_slot(id)?;
        let is_virtual = slot.is_virtual;
        let mut template = slot.segment.clone();
        let links: Vec<LinkId> = slot
            .links
            .all()
            .into_iter()
            .filter(|&l| self.link_slot(l).map_or(false, |l| !l.is_virtual))
            .collect();
        let mut containments: Vec<ContainmentId> = slot.as_container.clone();
        for &c in slot.as_contained.iter() {
            if !containments.contains(&c) {
                containments.push(c);
            }
        }

        let n = factor as i64;
        for tag in COUNT_TAGS.iter() {
            if let Some(total) = template.int_tag(tag)? {
                template.set_tag(tag, total / n)?;
                self.segment_slot_mut(id)?
                    .segment
                    .set_tag(tag, total / n + total % n)?;
            }
        }

        debug!(
            "Multiplying segment {} by {}",
            name.as_bstr(),
            factor
        );
        let mut copies = vec![id];
        for copy_name in names {
            let mut segment = template.clone();
            segment.name = copy_name;
            let copy = self.insert_segment(segment, is_virtual);

            for &l in links.iter() {
                let mut link = match self.link_by_id(l) {
                    Some(link) => link.clone(),
                    None => continue,
                };
                if link.from_segment == id {
                    link.from_segment = copy;
                }
                if link.to_segment == id {
                    link.to_segment = copy;
                }
                self.canonicize_link(&mut link);
                self.insert_link(link, false);
            }

            for &c in containments.iter() {
                let mut containment = match self.containment_by_id(c) {
                    Some(containment) => containment.clone(),
                    None => continue,
                };
                if containment.container_name == id {
                    containment.container_name = copy;
                }
                if containment.contained_name == id {
                    containment.contained_name = copy;
                }
                self.insert_containment(containment);
            }
            copies.push(copy);
        }
        Ok(copies)
    }
}
