//! Array functions (§4.4 "array" category).
//!
//! `map`/`filter`/`reduce`/`sortBy`/`flatten`/`flatMap` are the
//! functions §4.4 and §8 pin exact behavioral contracts for: order
//! preservation, left-fold semantics, stability, and one-level-only
//! flattening.

use crate::error::{Span, UtlxError};
use crate::udm::{Udm, UdmArray};

use super::{type_error, Invoker, StdlibFn};

fn arg_array<'a>(args: &'a [Udm], i: usize, func: &str, span: Span) -> Result<&'a UdmArray, UtlxError> {
    args[i]
        .as_array()
        .ok_or_else(|| type_error(func, i, "expected an array", span))
}

fn map(args: &[Udm], span: Span, inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "map", span)?;
    let mut out = UdmArray::with_capacity(arr.len());
    for item in arr.iter() {
        out.push(inv.call_lambda(&args[1], std::slice::from_ref(item), span)?);
    }
    Ok(Udm::Array(Box::new(out)))
}

fn filter(args: &[Udm], span: Span, inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "filter", span)?;
    let mut out = UdmArray::new();
    for item in arr.iter() {
        if inv.call_lambda(&args[1], std::slice::from_ref(item), span)?.is_truthy() {
            out.push(item.clone());
        }
    }
    Ok(Udm::Array(Box::new(out)))
}

fn reduce(args: &[Udm], span: Span, inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "reduce", span)?;
    let mut iter = arr.iter();
    let mut acc = if args.len() > 2 {
        args[2].clone()
    } else {
        iter.next()
            .cloned()
            .ok_or_else(|| type_error("reduce", 0, "empty array requires an initial value", span))?
    };
    for item in iter {
        acc = inv.call_lambda(&args[1], &[acc, item.clone()], span)?;
    }
    Ok(acc)
}

fn sort_by(args: &[Udm], span: Span, inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "sortBy", span)?;
    let mut keyed: Vec<(Udm, Udm)> = Vec::with_capacity(arr.len());
    for item in arr.iter() {
        let key = inv.call_lambda(&args[1], std::slice::from_ref(item), span)?;
        keyed.push((key, item.clone()));
    }
    keyed.sort_by(|(ka, _), (kb, _)| compare_udm(ka, kb));
    Ok(Udm::array(keyed.into_iter().map(|(_, v)| v)))
}

fn compare_udm(a: &Udm, b: &Udm) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Udm::Integer(x), Udm::Integer(y)) => x.cmp(y),
        (Udm::Float(x), Udm::Integer(y)) => x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal),
        (Udm::Integer(x), Udm::Float(y)) => (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal),
        (Udm::Float(x), Udm::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Udm::String(x), Udm::String(y)) => x.cmp(y),
        (Udm::Boolean(x), Udm::Boolean(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn flatten(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "flatten", span)?;
    let mut out = UdmArray::new();
    for item in arr.iter() {
        match item {
            Udm::Array(inner) => out.extend(inner.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Ok(Udm::Array(Box::new(out)))
}

fn flat_map(args: &[Udm], span: Span, inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let mapped = map(args, span, inv)?;
    flatten(&[mapped], span, inv)
}

fn length(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let n = match &args[0] {
        Udm::Array(a) => a.len(),
        Udm::String(s) => s.chars().count(),
        Udm::Object(o) => o.properties.len(),
        _ => return Err(type_error("length", 0, "expected an array, string, or object", span)),
    };
    Ok(Udm::Integer(n as i64))
}

fn first(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "first", span)?;
    Ok(arr.first().cloned().unwrap_or(Udm::Null))
}

fn last(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "last", span)?;
    Ok(arr.last().cloned().unwrap_or(Udm::Null))
}

fn reverse(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "reverse", span)?;
    let mut out: UdmArray = arr.clone();
    out.reverse();
    Ok(Udm::Array(Box::new(out)))
}

fn distinct(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "distinct", span)?;
    let mut out = UdmArray::new();
    for item in arr.iter() {
        if !out.iter().any(|existing| existing == item) {
            out.push(item.clone());
        }
    }
    Ok(Udm::Array(Box::new(out)))
}

fn slice(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "slice", span)?;
    let len = arr.len();
    let start = args[1]
        .as_integer()
        .ok_or_else(|| type_error("slice", 1, "expected an integer", span))?
        .clamp(0, len as i64) as usize;
    let end = if args.len() > 2 {
        args[2]
            .as_integer()
            .ok_or_else(|| type_error("slice", 2, "expected an integer", span))?
            .clamp(0, len as i64) as usize
    } else {
        len
    };
    let end = end.max(start);
    Ok(Udm::array(arr[start..end].iter().cloned()))
}

fn any(args: &[Udm], span: Span, inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "any", span)?;
    for item in arr.iter() {
        if inv.call_lambda(&args[1], std::slice::from_ref(item), span)?.is_truthy() {
            return Ok(Udm::Boolean(true));
        }
    }
    Ok(Udm::Boolean(false))
}

fn all(args: &[Udm], span: Span, inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "all", span)?;
    for item in arr.iter() {
        if !inv.call_lambda(&args[1], std::slice::from_ref(item), span)?.is_truthy() {
            return Ok(Udm::Boolean(false));
        }
    }
    Ok(Udm::Boolean(true))
}

fn contains_item(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "arrayContains", span)?;
    Ok(Udm::Boolean(arr.iter().any(|item| item == &args[1])))
}

fn index_of(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = arg_array(args, 0, "arrayIndexOf", span)?;
    match arr.iter().position(|item| item == &args[1]) {
        Some(i) => Ok(Udm::Integer(i as i64)),
        None => Ok(Udm::Integer(-1)),
    }
}

fn zip(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let a = arg_array(args, 0, "zip", span)?;
    let b = arg_array(args, 1, "zip", span)?;
    let out = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| Udm::array([x.clone(), y.clone()]));
    Ok(Udm::array(out))
}

fn concat(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let a = arg_array(args, 0, "concat", span)?;
    let b = arg_array(args, 1, "concat", span)?;
    let mut out = a.clone();
    out.extend(b.iter().cloned());
    Ok(Udm::Array(Box::new(out)))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "map", min_arity: 2, max_arity: 2, implementation: map });
    v.push(StdlibFn { name: "filter", min_arity: 2, max_arity: 2, implementation: filter });
    v.push(StdlibFn { name: "reduce", min_arity: 2, max_arity: 3, implementation: reduce });
    v.push(StdlibFn { name: "sortBy", min_arity: 2, max_arity: 2, implementation: sort_by });
    v.push(StdlibFn { name: "flatten", min_arity: 1, max_arity: 1, implementation: flatten });
    v.push(StdlibFn { name: "flatMap", min_arity: 2, max_arity: 2, implementation: flat_map });
    v.push(StdlibFn { name: "length", min_arity: 1, max_arity: 1, implementation: length });
    v.push(StdlibFn { name: "first", min_arity: 1, max_arity: 1, implementation: first });
    v.push(StdlibFn { name: "last", min_arity: 1, max_arity: 1, implementation: last });
    v.push(StdlibFn { name: "reverse", min_arity: 1, max_arity: 1, implementation: reverse });
    v.push(StdlibFn { name: "distinct", min_arity: 1, max_arity: 1, implementation: distinct });
    v.push(StdlibFn { name: "slice", min_arity: 2, max_arity: 3, implementation: slice });
    v.push(StdlibFn { name: "any", min_arity: 2, max_arity: 2, implementation: any });
    v.push(StdlibFn { name: "all", min_arity: 2, max_arity: 2, implementation: all });
    v.push(StdlibFn { name: "arrayContains", min_arity: 2, max_arity: 2, implementation: contains_item });
    v.push(StdlibFn { name: "arrayIndexOf", min_arity: 2, max_arity: 2, implementation: index_of });
    v.push(StdlibFn { name: "zip", min_arity: 2, max_arity: 2, implementation: zip });
    v.push(StdlibFn { name: "concat", min_arity: 2, max_arity: 2, implementation: concat });
}
