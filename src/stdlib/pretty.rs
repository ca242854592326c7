//! Pretty-printing helpers (§4.4 "pretty-print" category). Debug-aid
//! functions, distinct from the format adapters' own serializers.

use crate::error::{Span, UtlxError};
use crate::udm::Udm;

use super::{Invoker, StdlibFn};

fn pretty_print(value: &Udm, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    let child_pad = "  ".repeat(indent + 1);
    match value {
        Udm::Object(o) => {
            if o.properties.is_empty() && o.attributes.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (k, v) in o.attributes.iter() {
                out.push_str(&format!("{child_pad}@{k}: \"{v}\"\n"));
            }
            for (k, v) in o.properties.iter() {
                out.push_str(&format!("{child_pad}{k}: "));
                pretty_print(v, indent + 1, out);
                out.push('\n');
            }
            out.push_str(&pad);
            out.push('}');
        }
        Udm::Array(a) => {
            if a.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[\n");
            for item in a.iter() {
                out.push_str(&child_pad);
                pretty_print(item, indent + 1, out);
                out.push('\n');
            }
            out.push_str(&pad);
            out.push(']');
        }
        Udm::String(s) => out.push_str(&format!("\"{s}\"")),
        other => out.push_str(&other.coerce_to_string()),
    }
}

fn pretty_print_fn(args: &[Udm], _span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let mut out = String::new();
    pretty_print(&args[0], 0, &mut out);
    Ok(Udm::string(out))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "prettyPrint", min_arity: 1, max_arity: 1, implementation: pretty_print_fn });
}
