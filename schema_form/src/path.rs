/* Field paths: where a field instance sits in the value tree
 *
 * A path is a sequence of segments. Record fields and variant cases are
 * `Name` segments, list elements and the inside of an optional are `Index`
 * segments, and settings tables may use `AnyIndex` to address every element
 * of a list at once. The string form joins segments with '.', spells the
 * wildcard as '*', and treats all-digit segments as indexes. */

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Name(String),
    AnyIndex,
    Index(usize),
}

impl Segment {
    /* Segment for a record field or variant case. All-digit names (tuple
     * fields) take their index form so paths survive a string round trip. */
    pub fn name(name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = name.parse() {
                return Segment::Index(i);
            }
        }
        Segment::Name(name)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::AnyIndex)
    }

    /* Does a declared segment cover a concrete one? */
    pub fn covers(&self, concrete: &Segment) -> bool {
        match (self, concrete) {
            (Segment::Name(a), Segment::Name(b)) => a == b,
            (Segment::AnyIndex, Segment::Index(_)) => true,
            (Segment::AnyIndex, Segment::AnyIndex) => true,
            (Segment::Index(a), Segment::Index(b)) => a == b,
            /* tuple fields are named "0", "1", ... */
            (Segment::Index(i), Segment::Name(n)) | (Segment::Name(n), Segment::Index(i)) => {
                *n == i.to_string()
            }
            _ => false,
        }
    }

    fn parse(raw: &str) -> Self {
        if raw == WILDCARD {
            Segment::AnyIndex
        } else {
            Segment::name(raw)
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(n) => f.write_str(n),
            Segment::AnyIndex => f.write_str(WILDCARD),
            Segment::Index(i) => write!(f, "{}", i),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    pub fn root() -> Self {
        FieldPath(Vec::new())
    }

    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::root();
        }
        FieldPath(raw.split('.').map(Segment::parse).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /* New path with one more segment */
    pub fn extend(&self, segment: Segment) -> FieldPath {
        let mut segments = self.0.clone();
        segments.push(segment);
        FieldPath(segments)
    }

    pub fn child(&self, name: &str) -> FieldPath {
        self.extend(Segment::name(name))
    }

    pub fn index(&self, index: usize) -> FieldPath {
        self.extend(Segment::Index(index))
    }

    pub fn parent(&self) -> Option<FieldPath> {
        if self.0.is_empty() {
            None
        } else {
            Some(FieldPath(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn to_key(&self) -> String {
        self.to_string()
    }

    /* Does this (declared) path address the concrete path? */
    pub fn matches(&self, concrete: &FieldPath) -> bool {
        self.0.len() == concrete.0.len()
            && self.0.iter().zip(&concrete.0).all(|(d, c)| d.covers(c))
    }

    /* Order two declared paths by specificity: scanning left to right, the
     * first position where one is exact and the other a wildcard decides. */
    pub fn specificity_cmp(&self, other: &FieldPath) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            match (a.is_wildcard(), b.is_wildcard()) {
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                _ => {}
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldPath::parse(s))
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        FieldPath::parse(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        FieldPath::parse(&s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl From<Vec<Segment>> for FieldPath {
    fn from(segments: Vec<Segment>) -> Self {
        FieldPath(segments)
    }
}
