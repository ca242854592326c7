//! Tree-shaped helpers (§4.4 "tree" category) that operate on nested
//! Array/Object structures rather than a single flat level — the
//! complement to `array::flatten`'s one-level contract.

use crate::error::{Span, UtlxError};
use crate::udm::{Udm, UdmArray};

use super::{Invoker, StdlibFn};

fn flatten_deep_into(value: &Udm, out: &mut UdmArray) {
    match value {
        Udm::Array(a) => {
            for item in a.iter() {
                flatten_deep_into(item, out);
            }
        }
        other => out.push(other.clone()),
    }
}

fn flatten_deep(args: &[Udm], _span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let mut out = UdmArray::new();
    flatten_deep_into(&args[0], &mut out);
    Ok(Udm::Array(Box::new(out)))
}

fn count_nodes(value: &Udm) -> usize {
    match value {
        Udm::Array(a) => 1 + a.iter().map(count_nodes).sum::<usize>(),
        Udm::Object(o) => 1 + o.properties.values().map(count_nodes).sum::<usize>(),
        _ => 1,
    }
}

fn count_nodes_fn(args: &[Udm], _span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::Integer(count_nodes(&args[0]) as i64))
}

/// Depth-first collection of every Object property named `name`,
/// preserving document order — the stdlib-callable form of the `..name`
/// path operator (§4.3), usable when the property name is itself a
/// runtime value rather than a literal path segment.
fn find_all_into(value: &Udm, name: &str, out: &mut UdmArray) {
    if let Udm::Object(o) = value {
        if let Some(v) = o.properties.get(name) {
            out.push(v.clone());
        }
        for child in o.properties.values() {
            find_all_into(child, name, out);
        }
    } else if let Udm::Array(a) = value {
        for item in a.iter() {
            find_all_into(item, name, out);
        }
    }
}

fn find_all(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let name = args[1]
        .as_str()
        .ok_or_else(|| super::type_error("findAll", 1, "expected a string", span))?;
    let mut out = UdmArray::new();
    find_all_into(&args[0], name, &mut out);
    Ok(Udm::Array(Box::new(out)))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "flattenDeep", min_arity: 1, max_arity: 1, implementation: flatten_deep });
    v.push(StdlibFn { name: "countNodes", min_arity: 1, max_arity: 1, implementation: count_nodes_fn });
    v.push(StdlibFn { name: "findAll", min_arity: 2, max_arity: 2, implementation: find_all });
}
