//! Errors produced by schema resolution, compilation and evaluation.

use std::fmt;

/// Failure to resolve a descriptor from a [`SchemaRegistry`](crate::schema::SchemaRegistry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaError {
    kind: SchemaErrorKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum SchemaErrorKind {
    /// `resolve_root` found no descriptor for the mangled symbol.
    RootNotFound { type_name: String, symbol: String },
    /// `field_by_name` found no field with the given name on the descriptor.
    FieldNotFound { field: String, in_type: String },
}

impl SchemaError {
    pub(crate) fn root_not_found(type_name: impl Into<String>, symbol: impl Into<String>) -> Self {
        SchemaError {
            kind: SchemaErrorKind::RootNotFound {
                type_name: type_name.into(),
                symbol: symbol.into(),
            },
        }
    }

    pub(crate) fn field_not_found(field: impl Into<String>, in_type: impl Into<String>) -> Self {
        SchemaError {
            kind: SchemaErrorKind::FieldNotFound {
                field: field.into(),
                in_type: in_type.into(),
            },
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SchemaErrorKind::RootNotFound { type_name, symbol } => write!(
                f,
                "no descriptor registered for type `{type_name}` (looked up symbol `{symbol}`)"
            ),
            SchemaErrorKind::FieldNotFound { field, in_type } => {
                write!(f, "type `{in_type}` has no field named `{field}`")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// Why compilation of a query string against a schema failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// A character or token could not be parsed as any grammar production.
    InvalidToken,
    /// An identifier did not name a field of the current descriptor.
    UnknownField { field: String, in_type: String },
    /// A `.`-transition was attempted through a field that isn't a message.
    TypeMismatch { field: String, in_type: String },
    /// Non-empty input remained after a complete path was parsed.
    TrailingGarbage { found: char },
    /// `=~` or `in` were used; both are reserved but not implemented.
    UnsupportedOperator { operator: &'static str },
    /// A `[` was never matched by a closing `]`.
    UnbalancedBrackets,
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileErrorKind::InvalidToken => write!(f, "invalid token"),
            CompileErrorKind::UnknownField { field, in_type } => {
                write!(f, "unknown field `{field}` on type `{in_type}`")
            }
            CompileErrorKind::TypeMismatch { field, in_type } => write!(
                f,
                "field `{field}` on type `{in_type}` is not a message, cannot descend with `.`"
            ),
            CompileErrorKind::TrailingGarbage { found } => {
                write!(f, "trailing garbage starting with `{found}`")
            }
            CompileErrorKind::UnsupportedOperator { operator } => {
                write!(f, "operator `{operator}` is reserved and not implemented")
            }
            CompileErrorKind::UnbalancedBrackets => write!(f, "unbalanced brackets"),
        }
    }
}

/// A query string failed to compile against a schema.
///
/// Compilation is all-or-nothing: on error no partial [`Plan`](crate::plan::Plan)
/// is produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    kind: CompileErrorKind,
    /// Byte offset into the query string where the error was detected.
    at: usize,
}

impl CompileError {
    pub(crate) fn new(kind: CompileErrorKind, at: usize) -> Self {
        CompileError { kind, at }
    }

    /// The kind of failure.
    pub fn kind(&self) -> &CompileErrorKind {
        &self.kind
    }

    /// The byte offset into the query string where the error was detected.
    pub fn offset(&self) -> usize {
        self.at
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compile error at byte {}: {}", self.at, self.kind)
    }
}

impl std::error::Error for CompileError {}

/// Why evaluating a [`Plan`](crate::plan::Plan) against a buffer failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// The buffer did not contain a well-formed tag-length-value stream at
    /// the point the error was detected.
    MalformedWire { reason: String },
    /// A filter or operand that the evaluator doesn't implement was reached.
    Unsupported { what: &'static str },
    /// `find_paths` recursed deeper than the configured limit.
    RecursionLimitExceeded,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalErrorKind::MalformedWire { reason } => write!(f, "malformed wire data: {reason}"),
            EvalErrorKind::Unsupported { what } => write!(f, "unsupported at evaluation: {what}"),
            EvalErrorKind::RecursionLimitExceeded => write!(f, "recursion limit exceeded"),
        }
    }
}

/// Evaluating a plan against a buffer failed.
///
/// Evaluation errors are positional: they carry the byte offset into the
/// buffer passed to `evaluate_all`/`evaluate_first` (not the offset into any
/// submessage) where the problem was found. A fatal error discards any
/// results already collected for that call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    kind: EvalErrorKind,
    offset: Option<usize>,
}

impl EvalError {
    pub(crate) fn malformed_wire(reason: impl Into<String>) -> Self {
        EvalError {
            kind: EvalErrorKind::MalformedWire {
                reason: reason.into(),
            },
            offset: None,
        }
    }

    pub(crate) fn unsupported(what: &'static str) -> Self {
        EvalError {
            kind: EvalErrorKind::Unsupported { what },
            offset: None,
        }
    }

    pub(crate) fn recursion_limit_exceeded() -> Self {
        EvalError {
            kind: EvalErrorKind::RecursionLimitExceeded,
            offset: None,
        }
    }

    /// Attach a byte offset to this error, if one isn't already attached.
    ///
    /// Errors are annotated at the point closest to where they were raised;
    /// callers further up the call stack should not overwrite an offset that
    /// a callee already set.
    pub(crate) fn at(mut self, offset: usize) -> Self {
        if self.offset.is_none() {
            self.offset = Some(offset);
        }
        self
    }

    /// The kind of failure.
    pub fn kind(&self) -> &EvalErrorKind {
        &self.kind
    }

    /// The byte offset into the input buffer where the error was detected,
    /// if one was recorded.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "at byte {offset}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for EvalError {}
