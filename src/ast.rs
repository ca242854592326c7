//! Abstract syntax tree produced by the parser and consumed by the
//! interpreter (§3.2). Every node carries a [`Span`] for diagnostics,
//! threaded through every token and parse result.

use crate::error::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// One step of a path selector (§3.2): member access, attribute
/// access, index, wildcard, or descendant search.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Property(String),
    /// `@name` — only legal as the final segment (enforced by the
    /// parser, §4.2).
    Attribute(String),
    Index(i64),
    Wildcard,
    /// `..name` — depth-first collection of every `name` property.
    Descendant(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    /// `None` is the wildcard arm `_`.
    pub pattern: Option<Literal>,
    pub body: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKey {
    Name(String),
    /// `@name: value` places `value` in the constructed object's
    /// attribute map instead of its properties.
    Attribute(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub key: ObjectKey,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateMatcher {
    Name(String),
    Predicate(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDecl {
    pub matcher: TemplateMatcher,
    pub body: Box<Expr>,
    /// Declaration order; later declarations win ties (§4.3).
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    ArrayLit(Vec<Expr>),
    ObjectLit(Vec<ObjectEntry>),

    /// A plain name: a let-binding, lambda parameter, or stdlib/lambda
    /// call target.
    Identifier(String),

    /// `$input` or `$input-name` — a reference to a bound input value.
    InputRef(String),

    /// Bare `@` as a primary expression: the current predicate/template
    /// context value.
    CurrentContext,

    Path {
        base: Box<Expr>,
        segments: Vec<PathSegment>,
    },

    /// `base[cond]` — predicate filter over a sequence.
    Predicate {
        base: Box<Expr>,
        cond: Box<Expr>,
    },

    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Ternary {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    Let {
        bindings: Vec<Binding>,
        body: Box<Expr>,
    },

    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    /// `a |> f(args...)` ≡ `f(a, args...)`.
    Pipeline {
        value: Box<Expr>,
        call: Box<Expr>,
    },

    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
    },

    TemplateDecl(TemplateDecl),

    Apply {
        path: Box<Expr>,
    },

    /// The script body: zero or more template declarations followed by
    /// a final result expression.
    Program {
        templates: Vec<Expr>,
        result: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// True for literal and literal-built nodes; used by the compiler's
    /// trivial constant-folding pass (§1.2).
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_))
    }
}

/// A literal value inside an adapter option block (§4.2): scalars plus
/// lists and nested maps, enough to express `arrays: ["a","b"]` and
/// `namespaces: { foo: "urn:..." }`.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    List(Vec<OptionValue>),
    Map(indexmap::IndexMap<String, OptionValue>),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[OptionValue]> {
        match self {
            OptionValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&indexmap::IndexMap<String, OptionValue>> {
        match self {
            OptionValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// An adapter option block, parsed as a map of literal values (§4.2).
pub type OptionsMap = indexmap::IndexMap<String, OptionValue>;

/// A single `input <format> [name] [{ options }]` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDirective {
    pub format: String,
    /// `None` for the sole/default input, bound as `input`; `Some(name)`
    /// for a named input declared `input <format> <name>`, bound as
    /// `input-<name>`.
    pub name: Option<String>,
    pub options: OptionsMap,
    pub span: Span,
}

impl InputDirective {
    /// The environment binding name this directive's parsed UDM is
    /// bound under: `input` for the default, `input-<name>` otherwise.
    pub fn binding_name(&self) -> String {
        match &self.name {
            Some(n) => format!("input-{n}"),
            None => "input".to_string(),
        }
    }
}

/// A single named output target inside an `output { ... }` block, or
/// the solitary target of a single-output script.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTarget {
    pub name: Option<String>,
    pub format: String,
    pub options: OptionsMap,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputSpec {
    Single(OutputTarget),
    Multi(Vec<OutputTarget>),
}

impl OutputSpec {
    pub fn is_multi(&self) -> bool {
        matches!(self, OutputSpec::Multi(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: String,
    pub inputs: Vec<InputDirective>,
    pub output: OutputSpec,
}

/// A fully parsed script: header metadata plus the expression body.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub header: Header,
    pub body: Expr,
}
