//! Parses the query grammar against a schema, resolving every identifier to
//! a wire tag as it goes, and emits a schema-resolved [`Plan`].
//!
//! ```text
//! path     := node ('.' node)*
//! node     := ident ('[' (int | expr) ']')?
//! expr     := item op item
//! op       := '=' | '!=' | '=~' | 'in'
//! item     := path | str | int | float | '@'
//! str      := '"' chars '"' | "'" chars "'"
//! int      := '-'? digit+
//! float    := '-'? digit+ '.' digit*
//! ident    := [A-Za-z_][A-Za-z0-9_]*
//! ```

mod parser;

use crate::error::CompileError;
use crate::plan::Plan;
use crate::schema::MessageDescriptor;

/// Compiles `query` against `root`, resolving each identifier to a field tag
/// of `root` (or a descendant message reached by `.`-transitions).
///
/// Compilation is all-or-nothing: on the first structural error, no partial
/// `Plan` is produced.
pub fn compile(root: &MessageDescriptor, query: &str) -> Result<Plan, CompileError> {
    let mut p = parser::Parser::new(query);
    let plan = p.parse_path(root)?;
    p.expect_exhausted()?;
    log::debug!(
        "compiled query `{query}` against `{}` into a {}-step plan",
        root.name(),
        plan.len()
    );
    Ok(plan)
}
