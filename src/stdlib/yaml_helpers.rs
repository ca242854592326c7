//! YAML-specific stdlib helpers (§4.4, §8 Scenario D). Thin wrapper
//! around [`crate::formats::yaml::split_documents`] so the adapter and
//! the stdlib function share one definition of "document boundary".

use crate::error::{Span, UtlxError};
use crate::formats::yaml;
use crate::udm::{Udm, UdmArray};

use super::{type_error, Invoker, StdlibFn};

fn yaml_split_documents(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let text = args[0]
        .as_str()
        .ok_or_else(|| type_error("yamlSplitDocuments", 0, "expected a string", span))?;
    let mut out = UdmArray::new();
    for doc in yaml::split_documents(text) {
        out.push(Udm::string(doc));
    }
    Ok(Udm::Array(Box::new(out)))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn {
        name: "yamlSplitDocuments",
        min_arity: 1,
        max_arity: 1,
        implementation: yaml_split_documents,
    });
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
    fn splits_multi_document_stream() {
        let span = Span::single(crate::error::Position::new());
        let result = yaml_split_documents(&[Udm::string("a: 1\n---\nb: 2\n")], span, &NoopInvoker).unwrap();
        assert_eq!(result.as_array().unwrap().len(), 2);
    }
}
