//! Explicit coercion functions (§4.4 "coercion" category). Distinct
//! from the interpreter's implicit coercions (`+` on strings, etc.).

use crate::error::{Span, UtlxError};
use crate::udm::{Udm, UdmArray};

use super::{type_error, Invoker, StdlibFn};

fn to_string_fn(args: &[Udm], _span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::string(args[0].coerce_to_string()))
}

fn to_integer(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    match &args[0] {
        Udm::Integer(i) => Ok(Udm::Integer(*i)),
        Udm::Float(f) => Ok(Udm::Integer(*f as i64)),
        Udm::Boolean(b) => Ok(Udm::Integer(if *b { 1 } else { 0 })),
        Udm::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Udm::Integer)
            .map_err(|_| type_error("toInteger", 0, format!("'{s}' is not an integer"), span)),
        _ => Err(type_error("toInteger", 0, "cannot coerce to an integer", span)),
    }
}

fn to_float(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    match &args[0] {
        Udm::Integer(i) => Ok(Udm::Float(*i as f64)),
        Udm::Float(f) => Ok(Udm::Float(*f)),
        Udm::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Udm::Float)
            .map_err(|_| type_error("toFloat", 0, format!("'{s}' is not a number"), span)),
        _ => Err(type_error("toFloat", 0, "cannot coerce to a float", span)),
    }
}

fn to_boolean(args: &[Udm], _span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::Boolean(args[0].is_truthy()))
}

/// Wraps a scalar or object in a single-element array; leaves arrays
/// untouched. Useful after a path access that may or may not have
/// distributed over a sequence (§3.1 "arrays of length 1 and scalars
/// are distinct").
fn to_array(args: &[Udm], _span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    match &args[0] {
        Udm::Array(_) => Ok(args[0].clone()),
        Udm::Null => Ok(Udm::empty_array()),
        other => {
            let mut a = UdmArray::new();
            a.push(other.clone());
            Ok(Udm::Array(Box::new(a)))
        }
    }
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "toString", min_arity: 1, max_arity: 1, implementation: to_string_fn });
    v.push(StdlibFn { name: "toInteger", min_arity: 1, max_arity: 1, implementation: to_integer });
    v.push(StdlibFn { name: "toFloat", min_arity: 1, max_arity: 1, implementation: to_float });
    v.push(StdlibFn { name: "toBoolean", min_arity: 1, max_arity: 1, implementation: to_boolean });
    v.push(StdlibFn { name: "toArray", min_arity: 1, max_arity: 1, implementation: to_array });
}
