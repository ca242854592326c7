//! Template registry for `template match="..." { ... }` declarations
//! and the `apply(path)` dispatch rule (§4.3).
//!
//! Kept as a flat `Vec` of `(predicate, handler, priority)` — no
//! dynamic dispatch table, predicates tried in a fixed priority order
//! computed once at registration time.

use std::rc::Rc;

use crate::ast::{Expr, TemplateDecl, TemplateMatcher};

/// One registered template, ready for priority-ordered matching.
pub struct CompiledTemplate {
    pub matcher: TemplateMatcher,
    pub body: Rc<Expr>,
    pub order: usize,
}

#[derive(Default)]
pub struct TemplateRegistry {
    templates: Vec<CompiledTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, decl: &TemplateDecl) {
        self.templates.push(CompiledTemplate {
            matcher: decl.matcher.clone(),
            body: Rc::new((*decl.body).clone()),
            order: decl.order,
        });
    }

    /// Name-matching templates, in registration order, then
    /// predicate templates, in registration order — predicate
    /// templates always outrank name templates (§4.3 priority rule
    /// (a)), and later declarations win ties within each group ((b)).
    pub fn candidates_for_name<'a>(&'a self, name: &str) -> Vec<&'a CompiledTemplate> {
        let mut predicate_matches: Vec<&CompiledTemplate> = self
            .templates
            .iter()
            .filter(|t| matches!(t.matcher, TemplateMatcher::Predicate(_)))
            .collect();
        predicate_matches.sort_by_key(|t| std::cmp::Reverse(t.order));

        let mut name_matches: Vec<&CompiledTemplate> = self
            .templates
            .iter()
            .filter(|t| matches!(&t.matcher, TemplateMatcher::Name(n) if n == name))
            .collect();
        name_matches.sort_by_key(|t| std::cmp::Reverse(t.order));

        predicate_matches.extend(name_matches);
        predicate_matches
    }

    /// All predicate templates (used when the matched node has no
    /// obvious "name", e.g. scalars), newest declaration first.
    pub fn predicate_templates(&self) -> Vec<&CompiledTemplate> {
        let mut v: Vec<&CompiledTemplate> = self
            .templates
            .iter()
            .filter(|t| matches!(t.matcher, TemplateMatcher::Predicate(_)))
            .collect();
        v.sort_by_key(|t| std::cmp::Reverse(t.order));
        v
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
