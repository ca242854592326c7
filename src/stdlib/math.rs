//! Math functions (§4.4 "math" category).

use crate::error::{Span, UtlxError};
use crate::udm::Udm;

use super::{type_error, Invoker, StdlibFn};

fn arg_num(args: &[Udm], i: usize, func: &str, span: Span) -> Result<f64, UtlxError> {
    args[i]
        .as_float()
        .ok_or_else(|| type_error(func, i, "expected a number", span))
}

fn abs(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    match &args[0] {
        Udm::Integer(i) => Ok(Udm::Integer(i.abs())),
        Udm::Float(f) => Ok(Udm::Float(f.abs())),
        _ => Err(type_error("abs", 0, "expected a number", span)),
    }
}

fn ceil(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::Float(arg_num(args, 0, "ceil", span)?.ceil()))
}

fn floor(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::Float(arg_num(args, 0, "floor", span)?.floor()))
}

fn round(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let n = arg_num(args, 0, "round", span)?;
    let decimals = if args.len() > 1 {
        args[1]
            .as_integer()
            .ok_or_else(|| type_error("round", 1, "expected an integer", span))?
    } else {
        0
    };
    let factor = 10f64.powi(decimals as i32);
    Ok(Udm::Float((n * factor).round() / factor))
}

fn pow(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let base = arg_num(args, 0, "pow", span)?;
    let exp = arg_num(args, 1, "pow", span)?;
    Ok(Udm::Float(base.powf(exp)))
}

fn sqrt(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::Float(arg_num(args, 0, "sqrt", span)?.sqrt()))
}

fn sum(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = args[0]
        .as_array()
        .ok_or_else(|| type_error("sum", 0, "expected an array", span))?;
    let mut int_total: i64 = 0;
    let mut float_total = 0.0;
    let mut is_float = false;
    for item in arr.iter() {
        match item {
            Udm::Integer(i) => int_total += i,
            Udm::Float(f) => {
                is_float = true;
                float_total += f;
            }
            _ => return Err(type_error("sum", 0, "array must contain only numbers", span)),
        }
    }
    if is_float {
        Ok(Udm::Float(float_total + int_total as f64))
    } else {
        Ok(Udm::Integer(int_total))
    }
}

fn avg(args: &[Udm], span: Span, inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = args[0]
        .as_array()
        .ok_or_else(|| type_error("avg", 0, "expected an array", span))?;
    if arr.is_empty() {
        return Ok(Udm::Null);
    }
    let total = sum(args, span, inv)?;
    let total = total.as_float().unwrap_or(0.0);
    Ok(Udm::Float(total / arr.len() as f64))
}

fn min(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = args[0]
        .as_array()
        .ok_or_else(|| type_error("min", 0, "expected an array", span))?;
    arr.iter()
        .cloned()
        .reduce(|a, b| if a.as_float() <= b.as_float() { a } else { b })
        .ok_or_else(|| type_error("min", 0, "array must not be empty", span))
}

fn max(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = args[0]
        .as_array()
        .ok_or_else(|| type_error("max", 0, "expected an array", span))?;
    arr.iter()
        .cloned()
        .reduce(|a, b| if a.as_float() >= b.as_float() { a } else { b })
        .ok_or_else(|| type_error("max", 0, "array must not be empty", span))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "abs", min_arity: 1, max_arity: 1, implementation: abs });
    v.push(StdlibFn { name: "ceil", min_arity: 1, max_arity: 1, implementation: ceil });
    v.push(StdlibFn { name: "floor", min_arity: 1, max_arity: 1, implementation: floor });
    v.push(StdlibFn { name: "round", min_arity: 1, max_arity: 2, implementation: round });
    v.push(StdlibFn { name: "pow", min_arity: 2, max_arity: 2, implementation: pow });
    v.push(StdlibFn { name: "sqrt", min_arity: 1, max_arity: 1, implementation: sqrt });
    v.push(StdlibFn { name: "sum", min_arity: 1, max_arity: 1, implementation: sum });
    v.push(StdlibFn { name: "avg", min_arity: 1, max_arity: 1, implementation: avg });
    v.push(StdlibFn { name: "min", min_arity: 1, max_arity: 1, implementation: min });
    v.push(StdlibFn { name: "max", min_arity: 1, max_arity: 1, implementation: max });
}
