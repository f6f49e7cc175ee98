//! Rill Value - the value model of the rill runtime.
//!
//! This crate provides:
//! - `Value`, the closed family of weakly-typed runtime values, with the
//!   scripting language's coercion and loose comparison rules
//! - `Var` and `EnvVar`, the aliasing model: many names bound to one cell,
//!   with per-context lazy materialization of statics and globals
//! - `ArrayValue` / `ConstArray`, ordered copy-on-write arrays
//! - `ExecContext`, the per-execution state that owns materialized cells
//!   and runs cleanup hooks at teardown
//! - identity-preserving deep copy (`Value::copy_tree`) and interning of
//!   strings and hot integers
//!
//! # Thread Safety
//!
//! Every heap-backed value is an `Arc` handle with `parking_lot` locks inside,
//! so values are `Send + Sync`. Isolation between execution contexts comes from
//! ownership: a context only ever touches cells it created or checked out.

mod array;
mod compare;
mod context;
mod copy;
mod env_var;
mod error;
mod heap;
mod int_cache;
mod intern;
mod key;
mod numeric;
mod object;
mod string;
mod value;
mod var;

pub use array::{ArrayIter, ArrayValue, ConstArray};
pub use compare::{cmp, loose_eq};
pub use context::{CleanupHandle, ContextId, ExecContext, GlobalLayout, TeardownReport};
pub use copy::{CopyMap, DirtyFlag};
pub use env_var::{EnvVar, GlobalSlotId, StaticDecl, StaticId};
pub use error::{CleanupError, RuntimeError};
pub use heap::{Heap, ValueId};
pub use int_cache::{IntHandle, IntSlot, INT_CACHE_MAX, INT_CACHE_MIN};
pub use intern::{intern, interned_count, names};
pub use key::ArrayKey;
pub use numeric::{format_double, numeric_kind, parse_double, parse_long, Number, NumericKind};
pub use object::{language_error, ObjectValue, ResourceValue};
pub use rill_intern::Name;
pub use string::StrValue;
pub use value::{Value, ValueKind};
pub use var::Var;
