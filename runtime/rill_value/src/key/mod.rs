//! Array keys.

use std::fmt;

use crate::numeric;
use crate::string::StrValue;
use crate::value::Value;

/// Normalized array key: an integer or a byte string.
///
/// A string key whose bytes are the canonical spelling of an integer (see
/// [`ArrayKey::from_bytes`]) is always stored as `Int`, so `"5"` and `5`
/// address the same slot while `"05"` and `"5 "` stay strings.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    Str(StrValue),
}

impl ArrayKey {
    /// Key for a string, canonicalizing integer spellings.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match numeric::canonical_int(bytes) {
            Some(n) => ArrayKey::Int(n),
            None => ArrayKey::Str(StrValue::new(bytes)),
        }
    }

    /// Key for an existing string value, reusing its allocation.
    pub fn from_str_value(s: &StrValue) -> Self {
        match numeric::canonical_int(s.as_bytes()) {
            Some(n) => ArrayKey::Int(n),
            None => ArrayKey::Str(s.clone()),
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArrayKey::Int(n) => Some(*n),
            ArrayKey::Str(_) => None,
        }
    }

    /// The key as a language value.
    pub fn to_value(&self) -> Value {
        match self {
            ArrayKey::Int(n) => Value::int(*n),
            ArrayKey::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl From<i64> for ArrayKey {
    fn from(n: i64) -> Self {
        ArrayKey::Int(n)
    }
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        ArrayKey::from_bytes(s.as_bytes())
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(n) => write!(f, "{n}"),
            ArrayKey::Str(s) => write!(f, "{s}"),
        }
    }
}

impl fmt::Debug for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(n) => write!(f, "{n}"),
            ArrayKey::Str(s) => write!(f, "{s:?}"),
        }
    }
}

#[cfg(test)]
mod tests;
