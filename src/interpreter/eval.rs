//! Tree-walking evaluator (§4.3). Stateless over its own inputs: a
//! compiled script's `TemplateRegistry` is built once at compile time
//! (§4.6, `CompileCache`) and handed in by reference on every
//! transform run, matching the "compiled engines are immutable,
//! per-run state lives in the caller" resource model (§5).

use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, ExprKind, Literal, MatchArm, ObjectKey, PathSegment, UnaryOp};
use crate::error::{RuntimeError, Span, UtlxError};
use crate::interpreter::environment::Environment;
use crate::interpreter::templates::TemplateRegistry;
use crate::stdlib::{self, Invoker};
use crate::udm::{LambdaValue, Udm, UdmArray, UdmObject};

/// Bound in the innermost frame wherever `@` has meaning: predicate
/// filters, template bodies, and `apply` dispatch. An ordinary
/// identifier can never collide with it (`@` is not a legal identifier
/// character, §4.1).
const CURRENT_CONTEXT_BINDING: &str = "@";

/// Evaluates a compiled script's result expression against a prepared
/// environment (inputs already bound) and a template registry built
/// from that same script's `template` declarations.
pub fn evaluate(
    result: &Expr,
    templates: &TemplateRegistry,
    env: &Environment,
    max_depth: usize,
) -> Result<Udm, UtlxError> {
    let ctx = EvalCtx { templates, max_depth };
    ctx.eval(result, env, 0)
}

struct EvalCtx<'a> {
    templates: &'a TemplateRegistry,
    max_depth: usize,
}

struct StdlibInvoker<'a, 'b> {
    ctx: &'a EvalCtx<'b>,
    env: &'a Environment,
    depth: usize,
}

impl<'a, 'b> Invoker for StdlibInvoker<'a, 'b> {
    fn call_lambda(&self, lambda: &Udm, args: &[Udm], span: Span) -> Result<Udm, UtlxError> {
        self.ctx.call_lambda(lambda, args, span, self.env, self.depth)
    }
}

impl<'a> EvalCtx<'a> {
    fn check_depth(&self, depth: usize, span: Span) -> Result<(), UtlxError> {
        if depth > self.max_depth {
            return Err(RuntimeError::StackOverflow { max_depth: self.max_depth, span }.into());
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr, env: &Environment, depth: usize) -> Result<Udm, UtlxError> {
        self.check_depth(depth, expr.span)?;
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal_to_udm(lit)),

            ExprKind::ArrayLit(items) => {
                let mut arr = UdmArray::new();
                for item in items {
                    arr.push(self.eval(item, env, depth + 1)?);
                }
                Ok(Udm::Array(Box::new(arr)))
            }

            ExprKind::ObjectLit(entries) => {
                let mut obj = UdmObject::new();
                for entry in entries {
                    let value = self.eval(&entry.value, env, depth + 1)?;
                    match &entry.key {
                        ObjectKey::Name(name) => {
                            obj.properties.insert(name.clone(), value);
                        }
                        ObjectKey::Attribute(name) => {
                            obj.attributes.insert(name.clone(), value.coerce_to_string());
                        }
                        ObjectKey::Computed(key_expr) => {
                            let key = self.eval(key_expr, env, depth + 1)?.coerce_to_string();
                            obj.properties.insert(key, value);
                        }
                    }
                }
                Ok(Udm::object(obj))
            }

            ExprKind::Identifier(name) => env
                .lookup(name)
                .ok_or_else(|| RuntimeError::UndefinedIdentifier { name: name.clone(), span: expr.span }.into()),

            ExprKind::InputRef(name) => env
                .lookup(name)
                .ok_or_else(|| RuntimeError::UndefinedIdentifier { name: name.clone(), span: expr.span }.into()),

            ExprKind::CurrentContext => env.lookup(CURRENT_CONTEXT_BINDING).ok_or_else(|| {
                RuntimeError::UndefinedIdentifier { name: "@".to_string(), span: expr.span }.into()
            }),

            ExprKind::Path { base, segments } => {
                let mut value = self.eval(base, env, depth + 1)?;
                for segment in segments {
                    value = apply_path_segment(&value, segment);
                }
                Ok(value)
            }

            ExprKind::Predicate { base, cond } => {
                let value = self.eval(base, env, depth + 1)?;
                match &value {
                    Udm::Array(items) => {
                        let mut kept = UdmArray::new();
                        for item in items.iter() {
                            let child = env.child();
                            child.bind(CURRENT_CONTEXT_BINDING, item.clone());
                            if self.eval(cond, &child, depth + 1)?.is_truthy() {
                                kept.push(item.clone());
                            }
                        }
                        Ok(Udm::Array(Box::new(kept)))
                    }
                    other => {
                        let child = env.child();
                        child.bind(CURRENT_CONTEXT_BINDING, other.clone());
                        if self.eval(cond, &child, depth + 1)?.is_truthy() {
                            Ok(other.clone())
                        } else {
                            Ok(Udm::Null)
                        }
                    }
                }
            }

            ExprKind::Unary { op, expr: inner } => {
                let value = self.eval(inner, env, depth + 1)?;
                match op {
                    UnaryOp::Not => Ok(Udm::Boolean(!value.is_truthy())),
                    UnaryOp::Neg => match value {
                        Udm::Integer(i) => Ok(Udm::Integer(-i)),
                        Udm::Float(f) => Ok(Udm::Float(-f)),
                        _ => Err(RuntimeError::ArgumentType {
                            function: "unary -".to_string(),
                            index: 0,
                            hint: "expected a number".to_string(),
                            span: expr.span,
                        }
                        .into()),
                    },
                }
            }

            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right, env, depth, expr.span),

            ExprKind::Ternary { cond, then_branch, else_branch } => {
                if self.eval(cond, env, depth + 1)?.is_truthy() {
                    self.eval(then_branch, env, depth + 1)
                } else {
                    self.eval(else_branch, env, depth + 1)
                }
            }

            ExprKind::Let { bindings, body } => {
                let child = env.child();
                for binding in bindings {
                    let value = self.eval(&binding.value, &child, depth + 1)?;
                    child.bind(binding.name.clone(), value);
                }
                self.eval(body, &child, depth + 1)
            }

            ExprKind::Lambda { params, body } => Ok(Udm::Lambda(Rc::new(LambdaValue {
                params: params.clone(),
                body: Rc::new((**body).clone()),
                closure: env.clone(),
            }))),

            ExprKind::Call { callee, args } => {
                let arg_values = args
                    .iter()
                    .map(|a| self.eval(a, env, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                self.eval_call(callee, arg_values, env, depth, expr.span)
            }

            ExprKind::Pipeline { value, call } => {
                let piped = self.eval(value, env, depth + 1)?;
                match &call.kind {
                    ExprKind::Call { callee, args } => {
                        let mut arg_values = Vec::with_capacity(args.len() + 1);
                        arg_values.push(piped);
                        for a in args {
                            arg_values.push(self.eval(a, env, depth + 1)?);
                        }
                        self.eval_call(callee, arg_values, env, depth, expr.span)
                    }
                    ExprKind::Identifier(_) => self.eval_call(call, vec![piped], env, depth, expr.span),
                    _ => Err(RuntimeError::UnknownFunction {
                        name: "<pipeline target>".to_string(),
                        span: expr.span,
                    }
                    .into()),
                }
            }

            ExprKind::Match { scrutinee, arms } => {
                let value = self.eval(scrutinee, env, depth + 1)?;
                self.eval_match(&value, arms, env, depth)
            }

            ExprKind::TemplateDecl(_) => Ok(Udm::Null),

            ExprKind::Apply { path } => {
                let value = self.eval(path, env, depth + 1)?;
                self.apply_templates(&value, env, depth, expr.span)
            }

            ExprKind::Program { result, .. } => self.eval(result, env, depth + 1),
        }
    }

    fn eval_match(&self, value: &Udm, arms: &[MatchArm], env: &Environment, depth: usize) -> Result<Udm, UtlxError> {
        for arm in arms {
            match &arm.pattern {
                None => return self.eval(&arm.body, env, depth + 1),
                Some(lit) => {
                    if *value == literal_to_udm(lit) {
                        return self.eval(&arm.body, env, depth + 1);
                    }
                }
            }
        }
        Ok(Udm::Null)
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        env: &Environment,
        depth: usize,
        span: Span,
    ) -> Result<Udm, UtlxError> {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let left_val = self.eval(left, env, depth + 1)?;
            return match op {
                BinaryOp::And => {
                    if !left_val.is_truthy() {
                        Ok(left_val)
                    } else {
                        self.eval(right, env, depth + 1)
                    }
                }
                BinaryOp::Or => {
                    if left_val.is_truthy() {
                        Ok(left_val)
                    } else {
                        self.eval(right, env, depth + 1)
                    }
                }
                _ => unreachable!(),
            };
        }

        let left_val = self.eval(left, env, depth + 1)?;
        let right_val = self.eval(right, env, depth + 1)?;

        match op {
            BinaryOp::Add => add(&left_val, &right_val, span),
            BinaryOp::Sub => arithmetic(&left_val, &right_val, span, "-", |a, b| a - b, i64::saturating_sub),
            BinaryOp::Mul => arithmetic(&left_val, &right_val, span, "*", |a, b| a * b, i64::saturating_mul),
            BinaryOp::Div => divide(&left_val, &right_val, span),
            BinaryOp::Mod => modulo(&left_val, &right_val, span),
            BinaryOp::Eq => Ok(Udm::Boolean(left_val == right_val)),
            BinaryOp::Ne => Ok(Udm::Boolean(left_val != right_val)),
            BinaryOp::Lt => compare(&left_val, &right_val, span).map(|o| Udm::Boolean(o == std::cmp::Ordering::Less)),
            BinaryOp::Le => {
                compare(&left_val, &right_val, span).map(|o| Udm::Boolean(o != std::cmp::Ordering::Greater))
            }
            BinaryOp::Gt => {
                compare(&left_val, &right_val, span).map(|o| Udm::Boolean(o == std::cmp::Ordering::Greater))
            }
            BinaryOp::Ge => compare(&left_val, &right_val, span).map(|o| Udm::Boolean(o != std::cmp::Ordering::Less)),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_call(
        &self,
        callee: &Expr,
        args: Vec<Udm>,
        env: &Environment,
        depth: usize,
        span: Span,
    ) -> Result<Udm, UtlxError> {
        if let ExprKind::Identifier(name) = &callee.kind {
            if let Some(bound) = env.lookup(name) {
                return self.call_lambda(&bound, &args, span, env, depth);
            }
            if let Some(stdlib_fn) = stdlib::lookup(name) {
                let invoker = StdlibInvoker { ctx: self, env, depth };
                return stdlib_fn.call(&args, span, &invoker);
            }
            return Err(RuntimeError::UnknownFunction { name: name.clone(), span }.into());
        }
        let callee_val = self.eval(callee, env, depth + 1)?;
        self.call_lambda(&callee_val, &args, span, env, depth)
    }

    fn call_lambda(
        &self,
        lambda: &Udm,
        args: &[Udm],
        span: Span,
        _env: &Environment,
        depth: usize,
    ) -> Result<Udm, UtlxError> {
        let Udm::Lambda(l) = lambda else {
            return Err(RuntimeError::ArgumentType {
                function: "<call>".to_string(),
                index: 0,
                hint: "value is not callable".to_string(),
                span,
            }
            .into());
        };
        if args.len() != l.params.len() {
            return Err(RuntimeError::ArityMismatch {
                function: "<lambda>".to_string(),
                min: l.params.len(),
                max: l.params.len(),
                got: args.len(),
                span,
            }
            .into());
        }
        let child = l.closure.child();
        for (param, value) in l.params.iter().zip(args.iter()) {
            child.bind(param.clone(), value.clone());
        }
        self.eval(&l.body, &child, depth + 1)
    }

    /// `apply(path)` (§4.3). When the evaluated path is an Array, every
    /// element is dispatched independently and the results collected
    /// into an Array — empty input yields an empty Array (§9.1 open
    /// question 4), never null. A non-Array value is dispatched once
    /// and its bare result returned.
    fn apply_templates(&self, value: &Udm, env: &Environment, depth: usize, span: Span) -> Result<Udm, UtlxError> {
        match value {
            Udm::Array(items) => {
                let mut out = UdmArray::new();
                for item in items.iter() {
                    out.push(self.dispatch_one(item, env, depth, span)?);
                }
                Ok(Udm::Array(Box::new(out)))
            }
            other => self.dispatch_one(other, env, depth, span),
        }
    }

    fn dispatch_one(&self, node: &Udm, env: &Environment, depth: usize, span: Span) -> Result<Udm, UtlxError> {
        use crate::ast::TemplateMatcher;

        let dispatch_name = node
            .as_object()
            .and_then(|o| o.metadata.as_ref())
            .and_then(|m| m.get("__elementName"))
            .and_then(Udm::as_str);

        let candidates = match dispatch_name {
            Some(name) => self.templates.candidates_for_name(name),
            None => self.templates.predicate_templates(),
        };

        for candidate in candidates {
            let matched = match &candidate.matcher {
                TemplateMatcher::Name(_) => true,
                TemplateMatcher::Predicate(pred) => {
                    let child = env.child();
                    child.bind(CURRENT_CONTEXT_BINDING, node.clone());
                    self.eval(pred, &child, depth + 1)?.is_truthy()
                }
            };
            if matched {
                let child = env.child();
                child.bind(CURRENT_CONTEXT_BINDING, node.clone());
                return self.eval(&candidate.body, &child, depth + 1);
            }
        }

        Err(RuntimeError::NoMatchingTemplate { span }.into())
    }
}

fn literal_to_udm(lit: &Literal) -> Udm {
    match lit {
        Literal::String(s) => Udm::string(s.clone()),
        Literal::Integer(i) => Udm::Integer(*i),
        Literal::Float(f) => Udm::Float(*f),
        Literal::Boolean(b) => Udm::Boolean(*b),
        Literal::Null => Udm::Null,
    }
}

/// Depth-first collection for `..name` and the `Descendant` path
/// segment, preserving document order (§4.3).
fn collect_descendants(value: &Udm, name: &str, out: &mut UdmArray) {
    match value {
        Udm::Object(o) => {
            if let Some(v) = o.properties.get(name) {
                out.push(v.clone());
            }
            for child in o.properties.values() {
                collect_descendants(child, name, out);
            }
        }
        Udm::Array(items) => {
            for item in items.iter() {
                collect_descendants(item, name, out);
            }
        }
        _ => {}
    }
}

fn resolve_index(len: usize, index: i64) -> Option<usize> {
    if index >= 0 {
        let i = index as usize;
        if i < len {
            Some(i)
        } else {
            None
        }
    } else {
        let from_end = (-index) as usize;
        if from_end <= len {
            Some(len - from_end)
        } else {
            None
        }
    }
}

/// A single path segment applied to `value`, distributing over arrays
/// for every segment kind except `Index` (§4.3 "path access on array
/// with a name distributes; index access does not").
fn apply_path_segment(value: &Udm, segment: &PathSegment) -> Udm {
    if let Udm::Array(items) = value {
        if !matches!(segment, PathSegment::Index(_)) {
            let mut out = UdmArray::new();
            for item in items.iter() {
                out.push(apply_path_segment_single(item, segment));
            }
            return Udm::Array(Box::new(out));
        }
    }
    apply_path_segment_single(value, segment)
}

fn apply_path_segment_single(value: &Udm, segment: &PathSegment) -> Udm {
    match segment {
        PathSegment::Property(name) => match value {
            Udm::Object(o) => o.properties.get(name).cloned().unwrap_or(Udm::Null),
            _ => Udm::Null,
        },
        PathSegment::Attribute(name) => match value {
            Udm::Object(o) => o.attributes.get(name).map(|s| Udm::string(s.clone())).unwrap_or(Udm::Null),
            _ => Udm::Null,
        },
        PathSegment::Index(i) => match value {
            Udm::Array(items) => resolve_index(items.len(), *i).and_then(|idx| items.get(idx).cloned()).unwrap_or(Udm::Null),
            _ => Udm::Null,
        },
        PathSegment::Wildcard => match value {
            Udm::Object(o) => Udm::array(o.properties.values().cloned()),
            Udm::Array(items) => Udm::Array(Box::new((**items).clone())),
            other => Udm::array([other.clone()]),
        },
        PathSegment::Descendant(name) => {
            let mut out = UdmArray::new();
            collect_descendants(value, name, &mut out);
            Udm::Array(Box::new(out))
        }
    }
}

/// Integer arithmetic saturates at `i64::MIN`/`i64::MAX` on overflow
/// rather than erroring (§4.3); float arithmetic is never checked.
fn add(left: &Udm, right: &Udm, span: Span) -> Result<Udm, UtlxError> {
    match (left, right) {
        (Udm::String(_), _) | (_, Udm::String(_)) => {
            Ok(Udm::string(format!("{}{}", left.coerce_to_string(), right.coerce_to_string())))
        }
        (Udm::Integer(a), Udm::Integer(b)) => Ok(Udm::Integer(a.saturating_add(*b))),
        (Udm::Integer(_) | Udm::Float(_), Udm::Integer(_) | Udm::Float(_)) => {
            Ok(Udm::Float(left.as_float().unwrap() + right.as_float().unwrap()))
        }
        _ => Err(type_mismatch("+", left, right, span)),
    }
}

fn arithmetic(
    left: &Udm,
    right: &Udm,
    span: Span,
    name: &'static str,
    float_op: fn(f64, f64) -> f64,
    int_op: fn(i64, i64) -> i64,
) -> Result<Udm, UtlxError> {
    match (left, right) {
        (Udm::Integer(a), Udm::Integer(b)) => Ok(Udm::Integer(int_op(*a, *b))),
        (Udm::Integer(_) | Udm::Float(_), Udm::Integer(_) | Udm::Float(_)) => {
            Ok(Udm::Float(float_op(left.as_float().unwrap(), right.as_float().unwrap())))
        }
        _ => Err(type_mismatch(name, left, right, span)),
    }
}

fn divide(left: &Udm, right: &Udm, span: Span) -> Result<Udm, UtlxError> {
    match (left, right) {
        (Udm::Integer(_) | Udm::Float(_), Udm::Integer(_) | Udm::Float(_)) => {
            let divisor = right.as_float().unwrap();
            if divisor == 0.0 {
                return Err(RuntimeError::DivisionByZero { span }.into());
            }
            if let (Udm::Integer(a), Udm::Integer(b)) = (left, right) {
                if a % b == 0 {
                    return Ok(Udm::Integer(a / b));
                }
            }
            Ok(Udm::Float(left.as_float().unwrap() / divisor))
        }
        _ => Err(type_mismatch("/", left, right, span)),
    }
}

fn modulo(left: &Udm, right: &Udm, span: Span) -> Result<Udm, UtlxError> {
    match (left, right) {
        (Udm::Integer(a), Udm::Integer(b)) => {
            if *b == 0 {
                return Err(RuntimeError::DivisionByZero { span }.into());
            }
            Ok(Udm::Integer(a % b))
        }
        (Udm::Integer(_) | Udm::Float(_), Udm::Integer(_) | Udm::Float(_)) => {
            let divisor = right.as_float().unwrap();
            if divisor == 0.0 {
                return Err(RuntimeError::DivisionByZero { span }.into());
            }
            Ok(Udm::Float(left.as_float().unwrap() % divisor))
        }
        _ => Err(type_mismatch("%", left, right, span)),
    }
}

fn compare(left: &Udm, right: &Udm, span: Span) -> Result<std::cmp::Ordering, UtlxError> {
    match (left, right) {
        (Udm::Integer(_) | Udm::Float(_), Udm::Integer(_) | Udm::Float(_)) => left
            .as_float()
            .unwrap()
            .partial_cmp(&right.as_float().unwrap())
            .ok_or_else(|| type_mismatch("comparison", left, right, span)),
        (Udm::String(a), Udm::String(b)) => Ok(a.cmp(b)),
        _ => Err(type_mismatch("comparison", left, right, span)),
    }
}

fn type_mismatch(op: &'static str, left: &Udm, right: &Udm, span: Span) -> UtlxError {
    RuntimeError::ArgumentType {
        function: op.to_string(),
        index: 0,
        hint: format!("cannot apply to {} and {}", left.type_name(), right.type_name()),
        span,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn run(source: &str, env: &Environment) -> Result<Udm, UtlxError> {
        let script = Parser::parse_script(source).unwrap();
        let mut templates = TemplateRegistry::new();
        if let ExprKind::Program { templates: decls, .. } = &script.body.kind {
            for t in decls {
                if let ExprKind::TemplateDecl(decl) = &t.kind {
                    templates.register(decl);
                }
            }
        }
        let result_expr = match &script.body.kind {
            ExprKind::Program { result, .. } => (**result).clone(),
            _ => script.body.clone(),
        };
        evaluate(&result_expr, &templates, env, 512)
    }

    fn minimal_header() -> &'static str {
        "%utlx 1.0\ninput json\noutput json\n---\n"
    }

    #[test]
    fn arithmetic_and_string_concat() {
        let env = Environment::root();
        let out = run(&format!("{}1 + 2", minimal_header()), &env).unwrap();
        assert_eq!(out, Udm::Integer(3));

        let out = run(&format!("{}\"a\" + \"b\"", minimal_header()), &env).unwrap();
        assert_eq!(out, Udm::string("ab"));
    }

    #[test]
    fn integer_overflow_saturates_instead_of_erroring() {
        let env = Environment::root();
        let out = run(&format!("{}9223372036854775807 + 1", minimal_header()), &env).unwrap();
        assert_eq!(out, Udm::Integer(i64::MAX));

        let out = run(&format!("{}-9223372036854775807 - 10", minimal_header()), &env).unwrap();
        assert_eq!(out, Udm::Integer(i64::MIN));

        let out = run(&format!("{}9223372036854775807 * 2", minimal_header()), &env).unwrap();
        assert_eq!(out, Udm::Integer(i64::MAX));
    }

    #[test]
    fn let_bindings_are_sequential_and_scoped() {
        let env = Environment::root();
        let out = run(&format!("{}let x = 1, y = x + 1 => y", minimal_header()), &env).unwrap();
        assert_eq!(out, Udm::Integer(2));
    }

    #[test]
    fn immediately_invoked_lambda_call() {
        let env = Environment::root();
        let out = run(&format!("{}((x) => x * 2)(5)", minimal_header()), &env).unwrap();
        assert_eq!(out, Udm::Integer(10));
    }

    #[test]
    fn path_access_distributes_over_arrays() {
        use crate::udm::UdmObject;
        let env = Environment::root();
        let mut a = UdmObject::new();
        a.properties.insert("x".to_string(), Udm::Integer(1));
        let mut b = UdmObject::new();
        b.properties.insert("x".to_string(), Udm::Integer(2));
        let arr = Udm::array([Udm::object(a), Udm::object(b)]);
        env.bind("input", arr);
        let out = run(&format!("{}$input.x", minimal_header()), &env).unwrap();
        assert_eq!(out, Udm::array([Udm::Integer(1), Udm::Integer(2)]));
    }

    #[test]
    fn pipeline_desugars_into_prepended_call_argument() {
        let env = Environment::root();
        env.bind("input", Udm::array([Udm::Integer(1), Udm::Integer(2), Udm::Integer(3)]));
        let out = run(&format!("{}$input |> map((x) => x * 10)", minimal_header()), &env).unwrap();
        assert_eq!(out, Udm::array([Udm::Integer(10), Udm::Integer(20), Udm::Integer(30)]));
    }

    #[test]
    fn apply_dispatches_by_element_name_in_priority_order() {
        let env = Environment::root();
        let mut item = UdmObject::new();
        item.properties.insert("sku".to_string(), Udm::string("A1"));
        let mut meta = crate::udm::Metadata::new();
        meta.insert("__elementName".to_string(), Udm::string("Item"));
        item.metadata = Some(meta);
        env.bind("input", Udm::object(item));

        let source = format!(
            "{}template match=\"Item\" {{ {{ code: @sku }} }}\napply($input)",
            minimal_header()
        );
        let out = run(&source, &env).unwrap();
        let obj = out.as_object().unwrap();
        assert_eq!(obj.properties.get("code").unwrap().as_str(), Some("A1"));
    }

    #[test]
    fn apply_over_empty_array_yields_empty_array_not_null() {
        let env = Environment::root();
        env.bind("input", Udm::empty_array());
        let source = format!("{}template match=\"Item\" {{ 1 }}\napply($input)", minimal_header());
        let out = run(&source, &env).unwrap();
        assert_eq!(out, Udm::empty_array());
    }

    #[test]
    fn match_first_arm_wins_and_wildcard_is_fallback() {
        let env = Environment::root();
        let out = run(&format!("{}match 2 {{ 1 => \"one\", 2 => \"two\", _ => \"other\" }}", minimal_header()), &env)
            .unwrap();
        assert_eq!(out, Udm::string("two"));
    }
}
