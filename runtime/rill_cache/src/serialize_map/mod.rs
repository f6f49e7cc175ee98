//! Back-reference bookkeeping for one serialization pass.

use rill_value::{Value, ValueId};
use rustc_hash::FxHashMap;

/// Map from value identity to the 1-based index of its first occurrence in
/// a serialization pass.
///
/// Every newly emitted value consumes one index, in visit order. Arrays,
/// objects, and reference cells are recorded so a later visit of the same
/// instance can be written as a back-reference; scalars and strings only
/// consume their index.
#[derive(Default)]
pub struct SerializeMap {
    /// The recorded value is kept alive so its identity cannot be reused.
    indices: FxHashMap<ValueId, (Value, u32)>,
    next: u32,
}

impl SerializeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next index to `value` and return it. An instance already
    /// recorded returns its first index and consumes nothing.
    pub fn put(&mut self, value: &Value) -> u32 {
        let Some(id) = recorded_identity(value) else {
            return self.skip();
        };
        if let Some(index) = self.lookup(id) {
            return index;
        }
        let index = self.skip();
        self.indices.insert(id, (value.clone(), index));
        index
    }

    /// Consume an index without recording anything.
    pub fn skip(&mut self) -> u32 {
        self.next = self.next.saturating_add(1);
        self.next
    }

    /// Index of an earlier occurrence of `value`. A reference that was never
    /// recorded itself resolves to the index of the value it points at.
    pub fn get(&self, value: &Value) -> Option<u32> {
        if let Some(index) = recorded_identity(value).and_then(|id| self.lookup(id)) {
            return Some(index);
        }
        match value {
            Value::Reference(var) => recorded_identity(&var.get()).and_then(|id| self.lookup(id)),
            _ => None,
        }
    }

    fn lookup(&self, id: ValueId) -> Option<u32> {
        self.indices.get(&id).map(|&(_, index)| index)
    }

    /// Indices assigned so far.
    pub fn len(&self) -> usize {
        self.next as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next == 0
    }

    /// Instances recorded for back-references.
    pub fn recorded(&self) -> usize {
        self.indices.len()
    }
}

fn recorded_identity(value: &Value) -> Option<ValueId> {
    match value {
        Value::Array(_) | Value::ConstArray(_) | Value::Object(_) | Value::Reference(_) => {
            value.identity()
        }
        _ => None,
    }
}

impl std::fmt::Debug for SerializeMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializeMap")
            .field("assigned", &self.next)
            .field("recorded", &self.indices.len())
            .finish()
    }
}
