//! Type-inspection functions (§4.4 "type" category).

use crate::error::{Span, UtlxError};
use crate::udm::Udm;

use super::{Invoker, StdlibFn};

fn type_of(args: &[Udm], _span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::string(args[0].type_name()))
}

macro_rules! is_fn {
    ($name:ident, $pat:pat) => {
        fn $name(args: &[Udm], _span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
            Ok(Udm::Boolean(matches!(&args[0], $pat)))
        }
    };
}

is_fn!(is_string, Udm::String(_));
is_fn!(is_integer, Udm::Integer(_));
is_fn!(is_float, Udm::Float(_));
is_fn!(is_boolean, Udm::Boolean(_));
is_fn!(is_null, Udm::Null);
is_fn!(is_array, Udm::Array(_));
is_fn!(is_object, Udm::Object(_));

fn is_number(args: &[Udm], _span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::Boolean(matches!(&args[0], Udm::Integer(_) | Udm::Float(_))))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "typeOf", min_arity: 1, max_arity: 1, implementation: type_of });
    v.push(StdlibFn { name: "isString", min_arity: 1, max_arity: 1, implementation: is_string });
    v.push(StdlibFn { name: "isInteger", min_arity: 1, max_arity: 1, implementation: is_integer });
    v.push(StdlibFn { name: "isFloat", min_arity: 1, max_arity: 1, implementation: is_float });
    v.push(StdlibFn { name: "isNumber", min_arity: 1, max_arity: 1, implementation: is_number });
    v.push(StdlibFn { name: "isBoolean", min_arity: 1, max_arity: 1, implementation: is_boolean });
    v.push(StdlibFn { name: "isNull", min_arity: 1, max_arity: 1, implementation: is_null });
    v.push(StdlibFn { name: "isArray", min_arity: 1, max_arity: 1, implementation: is_array });
    v.push(StdlibFn { name: "isObject", min_arity: 1, max_arity: 1, implementation: is_object });
}
