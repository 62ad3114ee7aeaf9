//! Walks encoded wire bytes against a compiled [`Plan`], matching tags,
//! evaluating filters, and collecting matching submessage slices -- without
//! ever decoding a field the plan doesn't care about.

mod config;

pub use config::EvaluatorConfig;

use crate::error::EvalError;
use crate::filter::Filter;
use crate::item::Item;
use crate::plan::{PathStep, Plan};
use crate::result::{QueryResult, Slice};
use crate::wire::{self, WireType};

use config::DecodeContext;

/// What a `for_each` callback tells the walk to do after seeing a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlFlow {
    /// Keep walking for more matches.
    Continue,
    /// Stop the walk immediately; no further matches are reported.
    Stop,
}

/// Collects every match of `plan` in `buf`, in depth-first, in-buffer
/// encounter order, using [`EvaluatorConfig::default`].
pub fn evaluate_all<'buf>(buf: &'buf [u8], plan: &Plan) -> Result<QueryResult<'buf>, EvalError> {
    evaluate_all_with_config(buf, plan, &EvaluatorConfig::default())
}

/// Like [`evaluate_all`], with an explicit [`EvaluatorConfig`].
pub fn evaluate_all_with_config<'buf>(
    buf: &'buf [u8],
    plan: &Plan,
    config: &EvaluatorConfig,
) -> Result<QueryResult<'buf>, EvalError> {
    let mut results = Vec::with_capacity(config.initial_capacity);
    for_each(buf, plan, config, |slice| {
        results.push(slice);
        ControlFlow::Continue
    })?;
    Ok(results)
}

/// Returns the first match of `plan` in `buf`, short-circuiting the walk,
/// using [`EvaluatorConfig::default`].
pub fn evaluate_first<'buf>(
    buf: &'buf [u8],
    plan: &Plan,
) -> Result<Option<Slice<'buf>>, EvalError> {
    evaluate_first_with_config(buf, plan, &EvaluatorConfig::default())
}

/// Like [`evaluate_first`], with an explicit [`EvaluatorConfig`].
pub fn evaluate_first_with_config<'buf>(
    buf: &'buf [u8],
    plan: &Plan,
    config: &EvaluatorConfig,
) -> Result<Option<Slice<'buf>>, EvalError> {
    let mut found = None;
    for_each(buf, plan, config, |slice| {
        found = Some(slice);
        ControlFlow::Stop
    })?;
    Ok(found)
}

/// Streams every match of `plan` in `buf` to `callback`, stopping early if
/// the callback returns [`ControlFlow::Stop`]. This is the cancellation
/// mechanism described for the engine: there is no separate cancel API,
/// returning `Stop` from the callback halts the walk immediately.
pub fn for_each<'buf>(
    buf: &'buf [u8],
    plan: &Plan,
    config: &EvaluatorConfig,
    mut callback: impl FnMut(Slice<'buf>) -> ControlFlow,
) -> Result<(), EvalError> {
    if plan.steps.is_empty() {
        return Ok(());
    }
    let ctx = DecodeContext::new(config.recursion_limit);
    find_paths(buf, &plan.steps, ctx, &mut |payload| {
        callback(Slice::new(payload))
    })?;
    Ok(())
}

/// The core traversal: walks `buf` left to right, matching each record's
/// field number against `steps[0].tag` and `steps[0].filter`, then either
/// reporting a leaf match or recursing into the submessage payload with
/// `steps[1..]`.
fn find_paths<'buf>(
    buf: &'buf [u8],
    steps: &[PathStep],
    ctx: DecodeContext,
    callback: &mut dyn FnMut(&'buf [u8]) -> ControlFlow,
) -> Result<ControlFlow, EvalError> {
    let mut offset = 0;
    while offset < buf.len() {
        let record = wire::read_record(buf, &mut offset)?;

        if record.field_number != steps[0].tag {
            continue;
        }
        if !eval_filter(record.payload, &steps[0].filter, ctx)? {
            continue;
        }

        if steps.len() == 1 {
            log::trace!("matched tag {} at the end of the path", steps[0].tag);
            match callback(record.payload) {
                ControlFlow::Continue => continue,
                ControlFlow::Stop => return Ok(ControlFlow::Stop),
            }
        }

        if record.wire_type != WireType::LengthDelimited {
            log::debug!(
                "tag {} matched a path step but its wire type isn't length-delimited, can't descend",
                steps[0].tag
            );
            return Err(EvalError::malformed_wire(
                "cannot descend into a non-message field",
            ));
        }

        let child_ctx = ctx.enter_recursion()?;
        if find_paths(record.payload, &steps[1..], child_ctx, callback)? == ControlFlow::Stop {
            return Ok(ControlFlow::Stop);
        }
    }
    Ok(ControlFlow::Continue)
}

/// Evaluates `filter` against the payload of the record it's attached to.
fn eval_filter(payload: &[u8], filter: &Filter, ctx: DecodeContext) -> Result<bool, EvalError> {
    match filter {
        Filter::None => Ok(true),
        Filter::Idx(_) => Err(EvalError::unsupported(
            "positional index filter ([N]) is not evaluated",
        )),
        Filter::Match { .. } => Err(EvalError::unsupported("regex match filter (=~)")),
        Filter::List { .. } => Err(EvalError::unsupported("list membership filter (in)")),
        Filter::Eq {
            invert,
            left,
            right,
        } => {
            let left_slice = match left {
                Item::At => payload,
                Item::Path(nested_plan) => {
                    let child_ctx = ctx.enter_recursion()?;
                    match find_first(payload, nested_plan, child_ctx)? {
                        Some(slice) => slice,
                        // "if that lookup finds nothing, the filter is false" --
                        // this short-circuits before invert is applied.
                        None => return Ok(false),
                    }
                }
                Item::Int(_) | Item::Float(_) | Item::Str(_) => {
                    return Err(EvalError::unsupported(
                        "left side of a comparison must be a path or @",
                    ))
                }
            };
            let result = compare(left_slice, right)?;
            Ok(result ^ invert)
        }
    }
}

/// Internal variant of `evaluate_first` that reuses an in-flight recursion
/// budget, used by `eval_filter` to resolve a `PATH` operand relative to the
/// enclosing submessage.
fn find_first<'buf>(
    buf: &'buf [u8],
    plan: &Plan,
    ctx: DecodeContext,
) -> Result<Option<&'buf [u8]>, EvalError> {
    if plan.steps.is_empty() {
        return Ok(None);
    }
    let mut found = None;
    find_paths(buf, &plan.steps, ctx, &mut |payload| {
        found = Some(payload);
        ControlFlow::Stop
    })?;
    Ok(found)
}

/// Compares `slice` against a literal `item`, dispatching on the literal's
/// type. `PATH`/`AT` are never valid on the right side of a comparison.
fn compare(slice: &[u8], item: &Item) -> Result<bool, EvalError> {
    match item {
        Item::Str(bytes) => Ok(slice == bytes.as_slice()),
        Item::Int(value) => Ok(read_uint_le(slice)? as i64 == *value),
        Item::Float(value) => Ok(read_float_le(slice)? == *value),
        Item::Path(_) | Item::At => Err(EvalError::unsupported(
            "path/@ is not supported on the right side of a comparison",
        )),
    }
}

/// Interprets `slice` as a little-endian unsigned integer. Only 4- and
/// 8-byte slices (FIXED32/FIXED64 payloads) are accepted: a VARINT-wire
/// operand is not decoded here, matching the comparator's narrow contract of
/// being a pure function of slice bytes plus declared width.
fn read_uint_le(slice: &[u8]) -> Result<u64, EvalError> {
    match slice.len() {
        4 => Ok(u32::from_le_bytes(slice.try_into().unwrap()) as u64),
        8 => Ok(u64::from_le_bytes(slice.try_into().unwrap())),
        _ => Err(EvalError::unsupported(
            "integer comparison requires a 4- or 8-byte slice",
        )),
    }
}

/// Interprets `slice` as a little-endian IEEE-754 float: 4 bytes as
/// `binary32` promoted to `f64`, 8 bytes as `binary64`.
fn read_float_le(slice: &[u8]) -> Result<f64, EvalError> {
    match slice.len() {
        4 => Ok(f64::from(f32::from_le_bytes(slice.try_into().unwrap()))),
        8 => Ok(f64::from_le_bytes(slice.try_into().unwrap())),
        _ => Err(EvalError::unsupported(
            "float comparison requires a 4- or 8-byte slice",
        )),
    }
}
