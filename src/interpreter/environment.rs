//! Lexical environment: a chain of frames mapping name → UDM (§4.3).
//!
//! Threads an explicit scope chain rather than mutating a single
//! global table, supporting full closures over nested `let` and
//! lambda scopes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::udm::Udm;

#[derive(Debug, Default)]
struct Frame {
    bindings: HashMap<String, Udm>,
}

/// A reference-counted, immutable-after-construction scope. Cloning an
/// `Environment` clones the `Rc`, not the bindings — this is what lets
/// a `Lambda` capture its defining scope cheaply.
#[derive(Debug, Clone)]
pub struct Environment {
    frame: Rc<RefCell<Frame>>,
    parent: Option<Box<Environment>>,
}

impl Environment {
    /// A fresh root environment with no bindings.
    pub fn root() -> Self {
        Self {
            frame: Rc::new(RefCell::new(Frame::default())),
            parent: None,
        }
    }

    /// A child scope that can shadow names from `self` without
    /// mutating it.
    pub fn child(&self) -> Self {
        Self {
            frame: Rc::new(RefCell::new(Frame::default())),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Binds `name` in the current (innermost) frame only.
    pub fn bind(&self, name: impl Into<String>, value: Udm) {
        self.frame.borrow_mut().bindings.insert(name.into(), value);
    }

    /// Looks up `name`, walking outward through parent frames.
    pub fn lookup(&self, name: &str) -> Option<Udm> {
        if let Some(v) = self.frame.borrow().bindings.get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.frame, &other.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_shadows_without_mutating_parent() {
        let root = Environment::root();
        root.bind("x", Udm::Integer(1));
        let child = root.child();
        child.bind("x", Udm::Integer(2));
        assert_eq!(child.lookup("x"), Some(Udm::Integer(2)));
        assert_eq!(root.lookup("x"), Some(Udm::Integer(1)));
    }

    #[test]
    fn lookup_falls_through_to_parent() {
        let root = Environment::root();
        root.bind("y", Udm::Boolean(true));
        let child = root.child();
        assert_eq!(child.lookup("y"), Some(Udm::Boolean(true)));
        assert_eq!(child.lookup("missing"), None);
    }
}
