//! Generic parse/serialize stdlib functions (§4.4, §4.6) that expose
//! the format adapters to script code directly — useful when a
//! transform needs to re-encode a fragment of its own output (e.g.
//! stash a JSON string inside a CSV cell) rather than only converting
//! at the script's declared input/output boundary.

use crate::ast::OptionsMap;
use crate::error::{Span, UtlxError};
use crate::formats;
use crate::udm::Udm;

use super::{type_error, Invoker, StdlibFn};

fn parse_with(format: &'static str, args: &[Udm], span: Span) -> Result<Udm, UtlxError> {
    let text = args[0]
        .as_str()
        .ok_or_else(|| type_error(format, 0, "expected a string", span))?;
    formats::parse(format, text.as_bytes(), &OptionsMap::new())
}

fn serialize_with(format: &'static str, args: &[Udm], _span: Span) -> Result<Udm, UtlxError> {
    let bytes = formats::serialize(format, &args[0], &OptionsMap::new())?;
    Ok(Udm::string(String::from_utf8_lossy(&bytes).into_owned()))
}

fn parse_json(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    parse_with("json", args, span)
}

fn to_json(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    serialize_with("json", args, span)
}

fn parse_yaml(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    parse_with("yaml", args, span)
}

fn to_yaml(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    serialize_with("yaml", args, span)
}

fn parse_csv(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    parse_with("csv", args, span)
}

fn to_csv(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    serialize_with("csv", args, span)
}

fn parse_xml(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    parse_with("xml", args, span)
}

fn to_xml(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    serialize_with("xml", args, span)
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "parseJson", min_arity: 1, max_arity: 1, implementation: parse_json });
    v.push(StdlibFn { name: "toJson", min_arity: 1, max_arity: 1, implementation: to_json });
    v.push(StdlibFn { name: "parseYaml", min_arity: 1, max_arity: 1, implementation: parse_yaml });
    v.push(StdlibFn { name: "toYaml", min_arity: 1, max_arity: 1, implementation: to_yaml });
    v.push(StdlibFn { name: "parseCsv", min_arity: 1, max_arity: 1, implementation: parse_csv });
    v.push(StdlibFn { name: "toCsv", min_arity: 1, max_arity: 1, implementation: to_csv });
    v.push(StdlibFn { name: "parseXml", min_arity: 1, max_arity: 1, implementation: parse_xml });
    v.push(StdlibFn { name: "toXml", min_arity: 1, max_arity: 1, implementation: to_xml });
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopInvoker;
    impl Invoker for NoopInvoker {
        fn call_lambda(&self, _lambda: &Udm, _args: &[Udm], _span: Span) -> Result<Udm, UtlxError> {
            unimplemented!()
        }
    }

    #[test]
    fn json_round_trips_through_stdlib_functions() {
        let span = Span::single(crate::error::Position::new());
        let parsed = parse_json(&[Udm::string(r#"{"a":1}"#)], span, &NoopInvoker).unwrap();
        assert!(matches!(parsed.as_object().unwrap().properties.get("a"), Some(Udm::Integer(1))));
        let text = to_json(&[parsed], span, &NoopInvoker).unwrap();
        assert!(text.as_str().unwrap().contains('1'));
    }
}
