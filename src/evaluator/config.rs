//! Evaluation-time configuration and the recursion-depth guard.

use crate::error::EvalError;

/// Tuning knobs for `evaluate_*_with_config`. The zero-config `evaluate_all`
/// / `evaluate_first` entry points use [`EvaluatorConfig::default`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Upper bound on how deep `find_paths` may recurse, counting both
    /// plan-depth (descending through `.`-separated steps) and
    /// buffer-nesting depth (descending into submessage payloads). Guards
    /// against stack exhaustion on crafted or corrupt input.
    pub recursion_limit: u32,
    /// Initial capacity reserved for a `QueryResult` returned by
    /// `evaluate_all`. Matches are pushed with amortized-doubling growth
    /// past this point.
    pub initial_capacity: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        EvaluatorConfig {
            recursion_limit: 64,
            initial_capacity: 16,
        }
    }
}

/// Tracks remaining recursion budget across nested `find_paths` calls.
///
/// Modeled on a decrement-and-check token passed down through recursive
/// decode calls: each level of recursion must obtain a fresh context via
/// `enter_recursion`, which fails once the budget is exhausted rather than
/// letting the recursion itself blow the stack.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DecodeContext {
    remaining: u32,
}

impl DecodeContext {
    pub(crate) fn new(limit: u32) -> Self {
        DecodeContext { remaining: limit }
    }

    pub(crate) fn enter_recursion(&self) -> Result<DecodeContext, EvalError> {
        match self.remaining.checked_sub(1) {
            Some(remaining) => Ok(DecodeContext { remaining }),
            None => Err(EvalError::recursion_limit_exceeded()),
        }
    }
}
