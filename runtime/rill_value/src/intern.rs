//! Process-wide canonical instances.
//!
//! Two tables back the runtime: one for string values (so equal literal
//! strings share one allocation) and one for identifiers such as class
//! names. Both are append-only and safe to use from any thread.

use std::sync::LazyLock;

use rill_intern::{CanonicalTable, NameInterner};

use crate::string::StrValue;

static STRINGS: LazyLock<CanonicalTable<StrValue>> = LazyLock::new(CanonicalTable::new);
static NAMES: LazyLock<NameInterner> = LazyLock::new(NameInterner::new);

/// Canonical string value for `bytes`.
///
/// Every call with equal bytes returns a handle to the same instance, from
/// any thread.
pub fn intern(bytes: impl AsRef<[u8]>) -> StrValue {
    STRINGS.intern(bytes.as_ref(), |b| StrValue::new(b))
}

/// Number of distinct interned strings.
pub fn interned_count() -> usize {
    STRINGS.len()
}

/// The process-wide identifier interner.
pub fn names() -> &'static NameInterner {
    &NAMES
}
