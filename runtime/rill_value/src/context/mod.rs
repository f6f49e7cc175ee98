//! Per-execution state.
//!
//! An `ExecContext` is the state of one script execution: its global cells,
//! the materialized cells of function statics, and the cleanup hooks that
//! must run when the execution ends. Contexts are never shared; each thread
//! of execution owns its own.
//!
//! # Lazy materialization
//!
//! Globals start out as the compiled defaults of a [`GlobalLayout`] and
//! statics as the prototype of their [`StaticDecl`]. Neither gets a cell of
//! its own until first touched through an [`EnvVar`]; at that point the
//! context deep-copies the prototype into a fresh `Var` and keeps it for the
//! rest of the execution.
//!
//! [`EnvVar`]: crate::EnvVar

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::copy::CopyMap;
use crate::env_var::{GlobalSlotId, StaticDecl, StaticId};
use crate::error::{CleanupError, RuntimeError};
use crate::value::Value;
use crate::var::Var;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id of an execution context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context #{}", self.0)
    }
}

/// Ticket for a registered cleanup hook.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CleanupHandle(u64);

type CleanupFn = Box<dyn FnOnce() -> Result<(), String> + Send>;

struct Cleanup {
    handle: CleanupHandle,
    name: &'static str,
    run: CleanupFn,
}

/// Outcome of [`ExecContext::teardown`].
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Hooks that ran, successfully or not.
    pub ran: usize,
    pub failures: Vec<CleanupError>,
}

impl TeardownReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compiled default values of a program's globals, shared by every context
/// that runs the program.
#[derive(Clone, Debug, Default)]
pub struct GlobalLayout {
    defaults: Arc<[Value]>,
}

impl GlobalLayout {
    /// Layout from per-slot defaults. Each default is deep-copied and frozen,
    /// so neither a context nor the caller can write through it.
    pub fn new(defaults: impl IntoIterator<Item = Value>) -> Self {
        let mut map = CopyMap::new();
        GlobalLayout {
            defaults: defaults
                .into_iter()
                .map(|v| v.copy_tree(&mut map).freeze())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }

    /// Slot id for position `index`, if the layout has one.
    pub fn slot(&self, index: u32) -> Option<GlobalSlotId> {
        usize::try_from(index)
            .is_ok_and(|i| i < self.defaults.len())
            .then_some(GlobalSlotId::new(index))
    }
}

enum GlobalSlot {
    /// Not yet touched: the shared compiled default.
    Prototype(Value),
    Materialized(Var),
}

/// State of one execution.
pub struct ExecContext {
    id: ContextId,
    torn_down: bool,
    globals: Vec<GlobalSlot>,
    statics: FxHashMap<StaticId, Var>,
    cleanups: Vec<Cleanup>,
    next_cleanup: u64,
}

impl ExecContext {
    /// Context with no globals.
    pub fn new() -> Self {
        Self::with_globals(&GlobalLayout::default())
    }

    /// Context whose globals start as the defaults of `layout`.
    pub fn with_globals(layout: &GlobalLayout) -> Self {
        let id = ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
        trace!(%id, globals = layout.len(), "context created");
        ExecContext {
            id,
            torn_down: false,
            globals: layout
                .defaults
                .iter()
                .map(|v| GlobalSlot::Prototype(v.clone()))
                .collect(),
            statics: FxHashMap::default(),
            cleanups: Vec::new(),
            next_cleanup: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// False once [`ExecContext::teardown`] has run.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.torn_down
    }

    pub(crate) fn ensure_active(&self) -> Result<(), RuntimeError> {
        if self.torn_down {
            return Err(RuntimeError::StaleAliasUse { context: self.id });
        }
        Ok(())
    }

    /// Deep copy of `value` for use inside this context.
    pub fn copy_value(&self, value: &Value) -> Value {
        value.copy_tree(&mut CopyMap::new())
    }

    // Cleanup hooks

    /// Register `run` to be called at teardown. Hooks run in reverse order
    /// of registration.
    ///
    /// Registering on a torn-down context is a stale use.
    pub fn add_cleanup(
        &mut self,
        name: &'static str,
        run: impl FnOnce() -> Result<(), String> + Send + 'static,
    ) -> Result<CleanupHandle, RuntimeError> {
        self.ensure_active()?;
        let handle = CleanupHandle(self.next_cleanup);
        self.next_cleanup += 1;
        self.cleanups.push(Cleanup {
            handle,
            name,
            run: Box::new(run),
        });
        Ok(handle)
    }

    /// Unregister a hook without running it. Returns whether it was pending.
    pub fn remove_cleanup(&mut self, handle: CleanupHandle) -> bool {
        let before = self.cleanups.len();
        self.cleanups.retain(|c| c.handle != handle);
        self.cleanups.len() != before
    }

    pub fn pending_cleanups(&self) -> usize {
        self.cleanups.len()
    }

    /// End the execution: run every pending cleanup hook in reverse order
    /// of registration and drop all materialized cells.
    ///
    /// A failing or panicking hook is logged and reported; the remaining
    /// hooks still run. Calling this again is a no-op.
    pub fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        if self.torn_down {
            return report;
        }
        self.torn_down = true;

        while let Some(cleanup) = self.cleanups.pop() {
            report.ran += 1;
            let outcome = panic::catch_unwind(AssertUnwindSafe(cleanup.run))
                .unwrap_or_else(|payload| Err(panic_reason(payload.as_ref())));
            if let Err(reason) = outcome {
                warn!(context = %self.id, cleanup = cleanup.name, %reason, "cleanup failed");
                report.failures.push(CleanupError {
                    name: cleanup.name,
                    reason,
                });
            }
        }

        self.statics.clear();
        self.globals.clear();
        debug!(
            context = %self.id,
            ran = report.ran,
            failed = report.failures.len(),
            "context torn down"
        );
        report
    }

    // Alias slots

    pub(crate) fn static_cell(&mut self, decl: &StaticDecl) -> Result<Var, RuntimeError> {
        self.ensure_active()?;
        let context = self.id;
        let var = self.statics.entry(decl.id()).or_insert_with(|| {
            trace!(%context, id = ?decl.id(), "materializing static");
            Var::new(decl.prototype().copy_tree(&mut CopyMap::new()))
        });
        Ok(var.clone())
    }

    pub(crate) fn bind_static(&mut self, id: StaticId, var: Var) -> Result<(), RuntimeError> {
        self.ensure_active()?;
        self.statics.insert(id, var);
        Ok(())
    }

    pub(crate) fn global_cell(&mut self, slot: GlobalSlotId) -> Result<Var, RuntimeError> {
        self.ensure_active()?;
        let id = self.id;
        let len = self.globals.len();
        let entry = self
            .globals
            .get_mut(slot.index())
            .ok_or(RuntimeError::UnknownGlobalSlot {
                context: id,
                slot: slot.raw(),
                len,
            })?;
        let var = match entry {
            GlobalSlot::Materialized(var) => return Ok(var.clone()),
            GlobalSlot::Prototype(default) => {
                trace!(context = %id, slot = slot.raw(), "materializing global");
                Var::new(default.copy_tree(&mut CopyMap::new()))
            }
        };
        *entry = GlobalSlot::Materialized(var.clone());
        Ok(var)
    }

    pub(crate) fn bind_global(&mut self, slot: GlobalSlotId, var: Var) -> Result<(), RuntimeError> {
        self.ensure_active()?;
        let id = self.id;
        let len = self.globals.len();
        let entry = self
            .globals
            .get_mut(slot.index())
            .ok_or(RuntimeError::UnknownGlobalSlot {
                context: id,
                slot: slot.raw(),
                len,
            })?;
        *entry = GlobalSlot::Materialized(var);
        Ok(())
    }

    /// True if the static has its own cell in this context.
    pub(crate) fn has_static(&self, id: StaticId) -> bool {
        self.statics.contains_key(&id)
    }

    /// True if the global slot has its own cell in this context.
    pub(crate) fn has_global(&self, slot: GlobalSlotId) -> bool {
        matches!(
            self.globals.get(slot.index()),
            Some(GlobalSlot::Materialized(_))
        )
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ExecContext {
    fn drop(&mut self) {
        if !self.torn_down {
            let report = self.teardown();
            if report.ran > 0 {
                debug!(context = %self.id, ran = report.ran, "teardown ran on drop");
            }
        }
    }
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("id", &self.id)
            .field("active", &!self.torn_down)
            .field("globals", &self.globals.len())
            .field("statics", &self.statics.len())
            .field("cleanups", &self.cleanups.len())
            .finish()
    }
}

/// Message carried by a cleanup hook's panic.
fn panic_reason(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown payload");
    format!("panicked: {message}")
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
