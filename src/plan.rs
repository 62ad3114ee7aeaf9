//! The compiled, schema-resolved representation of a query.

use crate::filter::Filter;
use crate::schema::MessageDescriptor;

/// One step of a compiled path: the wire tag a record must match, and the
/// filter that must hold for a matching record to be kept.
#[derive(Clone, Debug, PartialEq)]
pub struct PathStep {
    pub tag: u32,
    pub filter: Filter,
}

/// A compiled query: the root descriptor it was compiled against, plus an
/// ordered list of `(tag, filter)` steps.
///
/// The descriptor reached after descending through steps `0..i` is always
/// the `Message` kind of the field matched by step `i`; the compiler
/// guarantees this, so the evaluator never needs to re-check it.
///
/// A `Plan` owns its steps and any nested plans inside `Item::Path` items
/// outright (through `Box`), and holds no interior mutability, so it is
/// `Send + Sync` and may be shared read-only across threads for concurrent
/// evaluations.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    pub root: MessageDescriptor,
    pub steps: Vec<PathStep>,
}

impl Plan {
    pub(crate) fn new(root: MessageDescriptor, steps: Vec<PathStep>) -> Self {
        Plan { root, steps }
    }

    /// Number of steps in the compiled path. Always at least 1 for a plan
    /// produced by `compile`.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
