//! Object functions (§4.4 "object" category).
//!
//! `keys`/`values`/`entries`/`hasKey` operate on `properties` only —
//! the attributes map is never visible through these views (§4.4,
//! §8 property 4).

use crate::error::{Span, UtlxError};
use crate::udm::{Udm, UdmObject};

use super::{type_error, Invoker, StdlibFn};

fn arg_object<'a>(args: &'a [Udm], i: usize, func: &str, span: Span) -> Result<&'a UdmObject, UtlxError> {
    args[i]
        .as_object()
        .ok_or_else(|| type_error(func, i, "expected an object", span))
}

fn keys(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let obj = arg_object(args, 0, "keys", span)?;
    Ok(Udm::array(obj.property_keys().map(Udm::string)))
}

fn values(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let obj = arg_object(args, 0, "values", span)?;
    Ok(Udm::array(obj.properties.values().cloned()))
}

fn entries(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let obj = arg_object(args, 0, "entries", span)?;
    Ok(Udm::array(obj.properties.iter().map(|(k, v)| {
        let mut entry = UdmObject::new();
        entry.properties.insert("key".to_string(), Udm::string(k.clone()));
        entry.properties.insert("value".to_string(), v.clone());
        Udm::object(entry)
    })))
}

fn has_key(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let obj = arg_object(args, 0, "hasKey", span)?;
    let key = args[1]
        .as_str()
        .ok_or_else(|| type_error("hasKey", 1, "expected a string", span))?;
    Ok(Udm::Boolean(obj.properties.contains_key(key)))
}

fn merge(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let a = arg_object(args, 0, "merge", span)?;
    let b = arg_object(args, 1, "merge", span)?;
    let mut out = a.clone();
    for (k, v) in b.properties.iter() {
        out.properties.insert(k.clone(), v.clone());
    }
    for (k, v) in b.attributes.iter() {
        out.attributes.insert(k.clone(), v.clone());
    }
    Ok(Udm::object(out))
}

fn attributes_of(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let obj = arg_object(args, 0, "attributesOf", span)?;
    let mut out = UdmObject::new();
    for (k, v) in obj.attributes.iter() {
        out.properties.insert(k.clone(), Udm::string(v.clone()));
    }
    Ok(Udm::object(out))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "keys", min_arity: 1, max_arity: 1, implementation: keys });
    v.push(StdlibFn { name: "values", min_arity: 1, max_arity: 1, implementation: values });
    v.push(StdlibFn { name: "entries", min_arity: 1, max_arity: 1, implementation: entries });
    v.push(StdlibFn { name: "hasKey", min_arity: 2, max_arity: 2, implementation: has_key });
    v.push(StdlibFn { name: "containsKey", min_arity: 2, max_arity: 2, implementation: has_key });
    v.push(StdlibFn { name: "merge", min_arity: 2, max_arity: 2, implementation: merge });
    v.push(StdlibFn { name: "attributesOf", min_arity: 1, max_arity: 1, implementation: attributes_of });
}
