//! Standard library registry (§4.4): a static table mapping name →
//! function descriptor, populated once and never mutated afterward —
//! a sparse static table with no reflection, generalized to UDM
//! functions.

pub mod array;
pub mod coercion;
pub mod compression;
pub mod crypto;
pub mod date;
pub mod encoding;
pub mod math;
pub mod object;
pub mod pretty;
pub mod regional;
pub mod serialize_helpers;
pub mod string;
pub mod timer;
pub mod tree;
pub mod types;
pub mod yaml_helpers;

use std::sync::OnceLock;

use crate::error::{RuntimeError, Span, UtlxError};
use crate::udm::Udm;

/// Callback the interpreter hands to stdlib functions that need to
/// invoke a lambda argument (`map`, `filter`, `reduce`, `sortBy`, …).
/// Decouples this module from `crate::interpreter` so stdlib code
/// never has to know about environments or AST nodes.
pub trait Invoker {
    fn call_lambda(&self, lambda: &Udm, args: &[Udm], span: Span) -> Result<Udm, UtlxError>;
}

pub type StdlibImpl = fn(&[Udm], Span, &dyn Invoker) -> Result<Udm, UtlxError>;

pub struct StdlibFn {
    pub name: &'static str,
    pub min_arity: usize,
    pub max_arity: usize,
    pub implementation: StdlibImpl,
}

impl StdlibFn {
    pub fn check_arity(&self, got: usize, span: Span) -> Result<(), UtlxError> {
        if got < self.min_arity || got > self.max_arity {
            return Err(RuntimeError::ArityMismatch {
                function: self.name.to_string(),
                min: self.min_arity,
                max: self.max_arity,
                got,
                span,
            }
            .into());
        }
        Ok(())
    }

    pub fn call(&self, args: &[Udm], span: Span, invoker: &dyn Invoker) -> Result<Udm, UtlxError> {
        self.check_arity(args.len(), span)?;
        (self.implementation)(args, span, invoker)
    }
}

fn registry() -> &'static Vec<StdlibFn> {
    static REGISTRY: OnceLock<Vec<StdlibFn>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut v = Vec::new();
        string::register(&mut v);
        array::register(&mut v);
        math::register(&mut v);
        date::register(&mut v);
        object::register(&mut v);
        types::register(&mut v);
        encoding::register(&mut v);
        crypto::register(&mut v);
        compression::register(&mut v);
        yaml_helpers::register(&mut v);
        serialize_helpers::register(&mut v);
        pretty::register(&mut v);
        regional::register(&mut v);
        timer::register(&mut v);
        tree::register(&mut v);
        coercion::register(&mut v);
        v
    })
}

pub fn lookup(name: &str) -> Option<&'static StdlibFn> {
    registry().iter().find(|f| f.name == name)
}

/// Argument-shape helper: every stdlib function raises the same typed
/// error for "called with wrong type" (§4.4).
pub(crate) fn type_error(function: &str, index: usize, hint: impl Into<String>, span: Span) -> UtlxError {
    RuntimeError::ArgumentType {
        function: function.to_string(),
        index,
        hint: hint.into(),
        span,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopInvoker;
    impl Invoker for NoopInvoker {
        fn call_lambda(&self, _lambda: &Udm, _args: &[Udm], _span: Span) -> Result<Udm, UtlxError> {
            unimplemented!("not needed by these tests")
        }
    }

    #[test]
    fn registry_contains_core_functions() {
        for name in ["map", "filter", "reduce", "keys", "values", "length", "upper"] {
            assert!(lookup(name).is_some(), "missing stdlib function: {name}");
        }
    }

    #[test]
    fn arity_mismatch_is_reported() {
        let f = lookup("upper").unwrap();
        let span = Span::single(crate::error::Position::new());
        let err = f.call(&[], span, &NoopInvoker);
        assert!(matches!(err, Err(UtlxError::Runtime(RuntimeError::ArityMismatch { .. }))));
    }
}
