//! Alias slots: a name's binding to a cell, possibly deferred.
//!
//! Most names hold their `Var` directly. Function statics and globals are
//! different: their declarations are shared by every execution of a program,
//! but each execution needs its own cell. Their slots hold a *recipe* (the
//! shared prototype) and resolve to a per-context cell on first access.

use std::fmt;
use std::sync::Arc;

use crate::context::ExecContext;
use crate::copy::CopyMap;
use crate::error::RuntimeError;
use crate::value::Value;
use crate::var::Var;

/// Identity of a static variable declaration within a program.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StaticId(u32);

impl StaticId {
    pub const fn new(raw: u32) -> Self {
        StaticId(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Index of a global within a [`GlobalLayout`].
///
/// [`GlobalLayout`]: crate::GlobalLayout
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalSlotId(u32);

impl GlobalSlotId {
    pub const fn new(raw: u32) -> Self {
        GlobalSlotId(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Compiled declaration of a function-level static: its id and initial
/// value. Shared read-only by every context.
#[derive(Debug)]
pub struct StaticDecl {
    id: StaticId,
    prototype: Value,
}

impl StaticDecl {
    /// Declaration with a private frozen copy of `prototype` as its initial
    /// value. Handles the caller keeps cannot reach the stored prototype.
    pub fn new(id: StaticId, prototype: Value) -> Arc<Self> {
        Arc::new(StaticDecl {
            id,
            prototype: prototype.copy_tree(&mut CopyMap::new()).freeze(),
        })
    }

    #[inline]
    pub fn id(&self) -> StaticId {
        self.id
    }

    #[inline]
    pub fn prototype(&self) -> &Value {
        &self.prototype
    }
}

/// A name's slot.
#[derive(Clone)]
pub enum EnvVar {
    /// Bound to a cell.
    Direct(Var),
    /// A function static; materialized per context from its declaration.
    LazyStatic(Arc<StaticDecl>),
    /// A global; materialized per context from the layout default.
    LazySave(GlobalSlotId),
}

impl EnvVar {
    pub fn direct(var: Var) -> Self {
        EnvVar::Direct(var)
    }

    pub fn lazy_static(decl: Arc<StaticDecl>) -> Self {
        EnvVar::LazyStatic(decl)
    }

    pub fn lazy_global(slot: GlobalSlotId) -> Self {
        EnvVar::LazySave(slot)
    }

    /// Current value of the slot's cell in `ctx`.
    pub fn get(&self, ctx: &mut ExecContext) -> Result<Value, RuntimeError> {
        Ok(self.get_cell(ctx)?.get())
    }

    /// Write through the slot's cell in `ctx`, returning what was stored.
    pub fn set(&self, ctx: &mut ExecContext, value: Value) -> Result<Value, RuntimeError> {
        Ok(self.get_cell(ctx)?.set(value))
    }

    /// The cell this slot resolves to in `ctx`, materializing it on first
    /// access. Repeated calls in one context return the same cell.
    pub fn get_cell(&self, ctx: &mut ExecContext) -> Result<Var, RuntimeError> {
        ctx.ensure_active()?;
        match self {
            EnvVar::Direct(var) => Ok(var.clone()),
            EnvVar::LazyStatic(decl) => ctx.static_cell(decl),
            EnvVar::LazySave(slot) => ctx.global_cell(*slot),
        }
    }

    /// Rebind the slot to `var` (reference assignment). For lazy slots the
    /// binding is made in `ctx` only.
    pub fn set_cell(&mut self, ctx: &mut ExecContext, var: Var) -> Result<(), RuntimeError> {
        ctx.ensure_active()?;
        match self {
            EnvVar::Direct(current) => {
                *current = var;
                Ok(())
            }
            EnvVar::LazyStatic(decl) => ctx.bind_static(decl.id(), var),
            EnvVar::LazySave(slot) => ctx.bind_global(*slot, var),
        }
    }

    /// True if the slot already has a cell of its own in `ctx`.
    pub fn is_materialized(&self, ctx: &ExecContext) -> bool {
        match self {
            EnvVar::Direct(_) => true,
            EnvVar::LazyStatic(decl) => ctx.has_static(decl.id()),
            EnvVar::LazySave(slot) => ctx.has_global(*slot),
        }
    }
}

impl fmt::Debug for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvVar::Direct(var) => write!(f, "Direct({var:?})"),
            EnvVar::LazyStatic(decl) => write!(f, "LazyStatic({})", decl.id.0),
            EnvVar::LazySave(slot) => write!(f, "LazySave({})", slot.0),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
