//! Immutable byte strings.
//!
//! Language strings are byte sequences with no encoding guarantee. Every
//! `StrValue` is an immutable `Heap<[u8]>`, so clones are pointer copies and
//! "mutation" always builds a new string.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::heap::{Heap, ValueId};
use crate::numeric::{self, Number, NumericKind};

/// Immutable byte string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StrValue(Heap<[u8]>);

impl StrValue {
    /// Fresh (non-interned) string from raw bytes.
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        StrValue(Heap::from_arc(Arc::from(bytes.as_ref())))
    }

    /// The empty string.
    pub fn empty() -> Self {
        Self::new(b"")
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text view, replacing invalid UTF-8.
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// True if both handles are the same instance.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Heap::ptr_eq(&a.0, &b.0)
    }

    #[inline]
    pub fn id(&self) -> ValueId {
        self.0.id()
    }

    /// `""` and `"0"` are false; every other string is true.
    pub fn to_bool(&self) -> bool {
        !matches!(self.as_bytes(), b"" | b"0")
    }

    #[inline]
    pub fn to_long(&self) -> i64 {
        numeric::parse_long(self.as_bytes())
    }

    #[inline]
    pub fn to_double(&self) -> f64 {
        numeric::parse_double(self.as_bytes())
    }

    #[inline]
    pub fn to_number(&self) -> Number {
        numeric::parse_number(self.as_bytes())
    }

    #[inline]
    pub fn numeric_kind(&self) -> NumericKind {
        numeric::numeric_kind(self.as_bytes())
    }

    /// Alphanumeric increment: `"a"` → `"b"`, `"Az"` → `"Ba"`, `"zz"` → `"aaa"`,
    /// `"a9"` → `"b0"`.
    ///
    /// Digits, lowercase and uppercase letters each wrap within their own
    /// range and carry left. The carry stops at the first byte that is not
    /// alphanumeric. A carry out of the first byte prepends `1`, `a` or `A`
    /// matching the class of that byte. The empty string becomes `"1"`.
    pub fn increment(&self) -> StrValue {
        if self.is_empty() {
            return StrValue::new(b"1");
        }

        let mut bytes = self.as_bytes().to_vec();
        for i in (0..bytes.len()).rev() {
            let (wrapped, carry) = match bytes[i] {
                b'z' => (b'a', true),
                b'Z' => (b'A', true),
                b'9' => (b'0', true),
                b @ (b'a'..=b'y' | b'A'..=b'Y' | b'0'..=b'8') => (b + 1, false),
                _ => return StrValue::new(bytes),
            };
            bytes[i] = wrapped;
            if !carry {
                return StrValue::new(bytes);
            }
            if i == 0 {
                let lead = match wrapped {
                    b'0' => b'1',
                    b'a' => b'a',
                    _ => b'A',
                };
                bytes.insert(0, lead);
            }
        }
        StrValue::new(bytes)
    }

    /// Concatenation into a new string.
    pub fn concat(&self, other: &StrValue) -> StrValue {
        let mut bytes = Vec::with_capacity(self.len() + other.len());
        bytes.extend_from_slice(self.as_bytes());
        bytes.extend_from_slice(other.as_bytes());
        StrValue::new(bytes)
    }
}

impl PartialOrd for StrValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StrValue {
    /// Byte-wise lexicographic order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl From<&str> for StrValue {
    fn from(s: &str) -> Self {
        StrValue::new(s)
    }
}

impl From<String> for StrValue {
    fn from(s: String) -> Self {
        StrValue::new(s)
    }
}

impl From<&[u8]> for StrValue {
    fn from(b: &[u8]) -> Self {
        StrValue::new(b)
    }
}

impl fmt::Display for StrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

impl fmt::Debug for StrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_str_lossy())
    }
}
