//! IRC identifier comparison under rfc1459 casemapping.
//!
//! Besides ASCII letters, `[]\~` are the uppercase forms of `{}|^`.
//! Folding is bytewise, so non-ASCII bytes compare as-is.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Fold one byte to its rfc1459 lowercase form.
#[inline]
pub fn fold_byte(b: u8) -> u8 {
    match b {
        b'A'..=b'Z' => b + (b'a' - b'A'),
        b'[' => b'{',
        b']' => b'}',
        b'\\' => b'|',
        b'~' => b'^',
        _ => b,
    }
}

/// Fold a whole identifier.
pub fn fold(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { fold_byte(c as u8) as char } else { c })
        .collect()
}

/// Total order over byte strings that agrees with casemapped equality.
pub fn identifier_compare_bytes(a: &[u8], b: &[u8]) -> Ordering {
    a.iter()
        .map(|&c| fold_byte(c))
        .cmp(b.iter().map(|&c| fold_byte(c)))
}

pub fn identifier_compare(a: &str, b: &str) -> Ordering {
    identifier_compare_bytes(a.as_bytes(), b.as_bytes())
}

pub fn identifier_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && identifier_compare(a, b) == Ordering::Equal
}

/// A nick or channel name whose equality, ordering and hashing follow the
/// casemapping. Displays with its original case.
#[derive(Clone)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn folded(&self) -> String {
        fold(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        identifier_eq(&self.0, &other.0)
    }
}

impl Eq for Identifier {}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        identifier_compare(&self.0, &other.0)
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(fold_byte(b));
        }
        state.write_u8(0xff);
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        identifier_eq(&self.0, other)
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        identifier_eq(&self.0, other)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({:?})", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}
