//! Per-path-node predicates restricting which matches a [`Plan`](crate::plan::Plan) step keeps.

use crate::item::Item;

/// A predicate attached to one node of a compiled path.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Always true.
    None,
    /// Positional index over a repeated field. Parsed, never evaluated: the
    /// evaluator rejects it with `EvalErrorKind::Unsupported`.
    Idx(i64),
    /// Equality (`invert = false`) or inequality (`invert = true`).
    Eq {
        invert: bool,
        left: Item,
        right: Item,
    },
    /// `=~` regex match. Parsed, never evaluated.
    Match { left: Item },
    /// `in` list membership. Parsed, never evaluated.
    List { left: Item, members: Vec<Item> },
}

impl Filter {
    /// Shorthand used throughout the compiler: every path node starts with
    /// no filter attached until bracket syntax says otherwise.
    pub const NONE: Filter = Filter::None;
}
