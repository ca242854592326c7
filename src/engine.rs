//! Embedding façade (§4.6): the one entry point a host (CLI, IDE
//! plugin, daemon) needs — `compile` once, `transform`/`transform_multi`
//! many times. A compiled [`Engine`] is immutable after construction
//! and safe to share across threads (§5); only the per-run environment
//! chain varies between calls.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use tracing::{debug, instrument, trace};

use crate::ast::{BinaryOp, Expr, ExprKind, Header, Literal, Script};
use crate::error::{EngineError, UtlxError};
use crate::interpreter::{evaluate, Environment, TemplateRegistry};
use crate::parser::Parser;
use crate::stdlib::timer;
use crate::udm::Udm;
use crate::{ast::OptionsMap, formats};

/// Builder for engine-wide behavior that isn't part of any one script:
/// a `Default` impl plus consuming `with_*` setters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Recursion-depth guard threaded through every `eval` call (§9
    /// design note: "provide an explicit stack overflow guard").
    pub max_recursion_depth: usize,
    /// Whether `compile` consults/populates the script-hash cache.
    pub cache_compiled_scripts: bool,
    /// Per-format default adapter options, merged *underneath* whatever
    /// a script's own `input`/`output` directive options specify.
    pub default_adapter_options: HashMap<String, OptionsMap>,
    /// Clear the process-wide timer table (§4.4 `timer*` functions)
    /// after every `transform`/`transform_multi` call, so one run's
    /// timers can't leak into the next.
    pub clear_timers_after_run: bool,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn with_cache_compiled_scripts(mut self, enabled: bool) -> Self {
        self.cache_compiled_scripts = enabled;
        self
    }

    pub fn with_default_adapter_options(mut self, format: impl Into<String>, options: OptionsMap) -> Self {
        self.default_adapter_options.insert(format.into(), options);
        self
    }

    pub fn with_clear_timers_after_run(mut self, enabled: bool) -> Self {
        self.clear_timers_after_run = enabled;
        self
    }

    fn merged_options(&self, format: &str, script_options: &OptionsMap) -> OptionsMap {
        let mut merged = self.default_adapter_options.get(format).cloned().unwrap_or_default();
        for (k, v) in script_options.iter() {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: 512,
            cache_compiled_scripts: true,
            default_adapter_options: HashMap::new(),
            clear_timers_after_run: true,
        }
    }
}

/// The immutable product of a successful `compile()`: parsed header,
/// the template registry built once from the script body's
/// declarations, and the (possibly constant-folded) result expression.
struct Program {
    header: Header,
    templates: TemplateRegistry,
    result: Expr,
}

fn script_hash(source: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

/// A compiled script, ready to run. Cheap to clone: the cache and the
/// compiled program are both behind shared ownership internally.
pub struct Engine {
    config: EngineConfig,
    program: std::rc::Rc<Program>,
}

/// Script-hash-keyed cache of compiled programs (§4.6: "compilation is
/// idempotent and cacheable by script hash"). Guarded by a `Mutex`
/// rather than `RefCell` since an embedding host may call `compile`
/// from more than one thread.
struct CompileCache {
    entries: Mutex<HashMap<u64, std::rc::Rc<Program>>>,
}

impl CompileCache {
    fn global() -> &'static CompileCache {
        static CACHE: std::sync::OnceLock<CompileCache> = std::sync::OnceLock::new();
        CACHE.get_or_init(|| CompileCache { entries: Mutex::new(HashMap::new()) })
    }
}

/// The result of `Engine::transform_multi`: either one blob (a script
/// with a single `output` directive) or a name-keyed map (a script
/// with an `output { ... }` block).
pub enum TransformOutput {
    Single(Vec<u8>),
    Multi(HashMap<String, Vec<u8>>),
}

impl Engine {
    /// Compiles `source` with default engine-wide behavior (§4.6:
    /// `compile(source) -> Engine`).
    pub fn compile(source: &str) -> Result<Engine, UtlxError> {
        Self::compile_with_config(source, EngineConfig::default())
    }

    /// Compiles `source` into a reusable [`Engine`]. Lexing, parsing,
    /// template registration and the trivial constant-folding pass all
    /// happen here, once; nothing here varies per-call.
    #[instrument(level = "debug", skip(source, config))]
    pub fn compile_with_config(source: &str, config: EngineConfig) -> Result<Engine, UtlxError> {
        let hash = script_hash(source);

        if config.cache_compiled_scripts {
            if let Some(cached) = CompileCache::global().entries.lock().unwrap().get(&hash) {
                debug!(hash, "compile cache hit");
                return Ok(Engine { config, program: cached.clone() });
            }
        }

        let script: Script = Parser::parse_script(source)?;
        let program = std::rc::Rc::new(build_program(script));

        if config.cache_compiled_scripts {
            CompileCache::global().entries.lock().unwrap().insert(hash, program.clone());
        }

        debug!(hash, "compiled a new script");
        Ok(Engine { config, program })
    }

    /// Single-input, single-output transform (§4.6). Fails with
    /// [`EngineError::ExpectedMultiOutput`] if the script declares a
    /// multi-output block — use [`Engine::transform_multi`] for that.
    #[instrument(level = "debug", skip(self, input_bytes))]
    pub fn transform(&self, input_bytes: &[u8]) -> Result<Vec<u8>, UtlxError> {
        if self.program.header.output.is_multi() {
            return Err(EngineError::ExpectedMultiOutput.into());
        }
        let mut inputs = HashMap::new();
        inputs.insert(self.default_input_name(), input_bytes.to_vec());
        let out = self.run(inputs)?;
        match out {
            TransformOutput::Single(bytes) => {
                self.maybe_clear_timers();
                Ok(bytes)
            }
            TransformOutput::Multi(_) => unreachable!("single-output header cannot produce a map"),
        }
    }

    /// Multi-input and/or multi-output transform (§4.6). Named inputs
    /// are keyed by the name used in the script's `input <format>
    /// <name>` directive (not the `input-<name>` binding form).
    #[instrument(level = "debug", skip(self, inputs))]
    pub fn transform_multi(&self, inputs: HashMap<String, Vec<u8>>) -> Result<TransformOutput, UtlxError> {
        let out = self.run(inputs)?;
        self.maybe_clear_timers();
        Ok(out)
    }

    fn default_input_name(&self) -> String {
        self.program
            .header
            .inputs
            .first()
            .map(|d| d.name.clone().unwrap_or_else(|| "input".to_string()))
            .unwrap_or_else(|| "input".to_string())
    }

    fn maybe_clear_timers(&self) {
        if self.config.clear_timers_after_run {
            timer::clear_all();
        }
    }

    fn run(&self, mut inputs: HashMap<String, Vec<u8>>) -> Result<TransformOutput, UtlxError> {
        let env = Environment::root();

        for input_dir in &self.program.header.inputs {
            let key = input_dir.name.clone().unwrap_or_else(|| "input".to_string());
            let bytes = inputs.remove(&key).ok_or_else(|| EngineError::MissingNamedInput { name: key.clone() })?;
            trace!(format = %input_dir.format, binding = %input_dir.binding_name(), "parsing input");
            let options = self.config.merged_options(&input_dir.format, &input_dir.options);
            let udm = formats::parse(&input_dir.format, &bytes, &options)?;
            env.bind(input_dir.binding_name(), udm);
        }

        let result = evaluate(&self.program.result, &self.program.templates, &env, self.config.max_recursion_depth)?;

        match &self.program.header.output {
            crate::ast::OutputSpec::Single(target) => {
                trace!(format = %target.format, "serializing output");
                let options = self.config.merged_options(&target.format, &target.options);
                let bytes = formats::serialize(&target.format, &result, &options)?;
                Ok(TransformOutput::Single(bytes))
            }
            crate::ast::OutputSpec::Multi(targets) => {
                let obj = result.as_object().ok_or_else(|| EngineError::ExpectedSingleOutput)?;
                let mut out = HashMap::new();
                for target in targets {
                    let name = target.name.clone().unwrap_or_default();
                    let value = obj
                        .properties
                        .get(&name)
                        .cloned()
                        .ok_or_else(|| EngineError::UnknownOutputName { name: name.clone() })?;
                    trace!(format = %target.format, output = %name, "serializing named output");
                    let options = self.config.merged_options(&target.format, &target.options);
                    let bytes = formats::serialize(&target.format, &value, &options)?;
                    out.insert(name, bytes);
                }
                Ok(TransformOutput::Multi(out))
            }
        }
    }
}

fn build_program(script: Script) -> Program {
    let mut templates = TemplateRegistry::new();
    let result = match script.body.kind {
        ExprKind::Program { templates: decls, result } => {
            for t in &decls {
                if let ExprKind::TemplateDecl(decl) = &t.kind {
                    templates.register(decl);
                }
            }
            fold_constants(*result)
        }
        _ => fold_constants(script.body),
    };
    Program { header: script.header, templates, result }
}

/// Trivial constant folding (§1.2, §2 — "beyond trivial constant
/// folding" is the non-goal, so the trivial case itself is in scope):
/// literal arithmetic and literal string concatenation nodes fold into
/// a single `Literal` once, at compile time.
fn fold_constants(expr: Expr) -> Expr {
    let Expr { kind, span } = expr;
    let kind = match kind {
        ExprKind::Binary { op, left, right } => {
            let left = fold_constants(*left);
            let right = fold_constants(*right);
            if let (ExprKind::Literal(l), ExprKind::Literal(r)) = (&left.kind, &right.kind) {
                if let Some(folded) = fold_literal_binary(op, l, r) {
                    return Expr::new(ExprKind::Literal(folded), span);
                }
            }
            ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) }
        }
        ExprKind::Unary { op, expr } => ExprKind::Unary { op, expr: Box::new(fold_constants(*expr)) },
        ExprKind::ArrayLit(items) => ExprKind::ArrayLit(items.into_iter().map(fold_constants).collect()),
        ExprKind::ObjectLit(entries) => ExprKind::ObjectLit(
            entries
                .into_iter()
                .map(|e| crate::ast::ObjectEntry { key: e.key, value: Box::new(fold_constants(*e.value)) })
                .collect(),
        ),
        ExprKind::Ternary { cond, then_branch, else_branch } => ExprKind::Ternary {
            cond: Box::new(fold_constants(*cond)),
            then_branch: Box::new(fold_constants(*then_branch)),
            else_branch: Box::new(fold_constants(*else_branch)),
        },
        ExprKind::Let { bindings, body } => ExprKind::Let {
            bindings: bindings
                .into_iter()
                .map(|b| crate::ast::Binding { name: b.name, value: Box::new(fold_constants(*b.value)) })
                .collect(),
            body: Box::new(fold_constants(*body)),
        },
        ExprKind::Pipeline { value, call } => {
            ExprKind::Pipeline { value: Box::new(fold_constants(*value)), call: Box::new(fold_constants(*call)) }
        }
        ExprKind::Call { callee, args } => ExprKind::Call {
            callee: Box::new(fold_constants(*callee)),
            args: args.into_iter().map(fold_constants).collect(),
        },
        ExprKind::Predicate { base, cond } => {
            ExprKind::Predicate { base: Box::new(fold_constants(*base)), cond: Box::new(fold_constants(*cond)) }
        }
        other => other,
    };
    Expr::new(kind, span)
}

fn fold_literal_binary(op: BinaryOp, left: &Literal, right: &Literal) -> Option<Literal> {
    use Literal::*;
    match (op, left, right) {
        (BinaryOp::Add, String(a), String(b)) => Some(String(format!("{a}{b}"))),
        (BinaryOp::Add, Integer(a), Integer(b)) => a.checked_add(*b).map(Integer),
        (BinaryOp::Sub, Integer(a), Integer(b)) => a.checked_sub(*b).map(Integer),
        (BinaryOp::Mul, Integer(a), Integer(b)) => a.checked_mul(*b).map(Integer),
        (BinaryOp::Add, Float(a), Float(b)) => Some(Float(a + b)),
        (BinaryOp::Sub, Float(a), Float(b)) => Some(Float(a - b)),
        (BinaryOp::Mul, Float(a), Float(b)) => Some(Float(a * b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(src: &str) -> String {
        format!("%utlx 1.0\ninput json\noutput json\n---\n{src}")
    }

    #[test]
    fn compiles_and_transforms_a_minimal_script() {
        let engine = Engine::compile_with_config(&script("$input.name"), EngineConfig::new()).unwrap();
        let out = engine.transform(br#"{"name": "Ada"}"#).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\"Ada\"");
    }

    #[test]
    fn transform_multi_also_accepts_a_single_output_script() {
        let engine = Engine::compile_with_config(&script("$input"), EngineConfig::new()).unwrap();
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), br#"{"a":1}"#.to_vec());
        let out = engine.transform_multi(inputs).unwrap();
        assert!(matches!(out, TransformOutput::Single(_)));
    }

    #[test]
    fn multi_output_script_rejects_single_transform() {
        let source = "%utlx 1.0\ninput json\noutput { a: json, b: json }\n---\n{ a: 1, b: 2 }";
        let engine = Engine::compile_with_config(source, EngineConfig::new()).unwrap();
        let err = engine.transform(br#"{}"#).unwrap_err();
        assert!(matches!(err, UtlxError::Engine(EngineError::ExpectedMultiOutput)));
    }

    #[test]
    fn multi_output_script_produces_a_named_map() {
        let source = "%utlx 1.0\ninput json\noutput { a: json, b: json }\n---\n{ a: 1, b: 2 }";
        let engine = Engine::compile_with_config(source, EngineConfig::new()).unwrap();
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), br#"{}"#.to_vec());
        match engine.transform_multi(inputs).unwrap() {
            TransformOutput::Multi(map) => {
                assert_eq!(map.get("a").map(|b| String::from_utf8_lossy(b).into_owned()), Some("1".to_string()));
                assert_eq!(map.get("b").map(|b| String::from_utf8_lossy(b).into_owned()), Some("2".to_string()));
            }
            TransformOutput::Single(_) => panic!("expected a multi-output map"),
        }
    }

    #[test]
    fn repeated_compile_of_the_same_source_hits_the_cache() {
        let source = script("$input");
        let e1 = Engine::compile_with_config(&source, EngineConfig::new()).unwrap();
        let e2 = Engine::compile_with_config(&source, EngineConfig::new()).unwrap();
        assert!(std::rc::Rc::ptr_eq(&e1.program, &e2.program));
    }

    #[test]
    fn missing_named_input_is_reported() {
        let source = "%utlx 1.0\ninput json widgets\noutput json\n---\n$input-widgets";
        let engine = Engine::compile_with_config(source, EngineConfig::new()).unwrap();
        let err = engine.transform_multi(HashMap::new()).unwrap_err();
        assert!(matches!(err, UtlxError::Engine(EngineError::MissingNamedInput { .. })));
    }

    #[test]
    fn constant_folding_collapses_literal_arithmetic_at_compile_time() {
        let folded = fold_constants(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::new(ExprKind::Literal(Literal::Integer(2)), crate::error::Span::single(crate::error::Position::new()))),
                right: Box::new(Expr::new(ExprKind::Literal(Literal::Integer(3)), crate::error::Span::single(crate::error::Position::new()))),
            },
            crate::error::Span::single(crate::error::Position::new()),
        ));
        assert!(matches!(folded.kind, ExprKind::Literal(Literal::Integer(5))));
    }
}
