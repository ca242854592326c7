//! String functions (§4.4 "string" category).

use crate::error::{RuntimeError, Span, UtlxError};
use crate::udm::Udm;

use super::{type_error, Invoker, StdlibFn};

fn arg_str<'a>(args: &'a [Udm], i: usize, func: &str, span: Span) -> Result<&'a str, UtlxError> {
    args[i]
        .as_str()
        .ok_or_else(|| type_error(func, i, "expected a string", span))
}

fn upper(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::string(arg_str(args, 0, "upper", span)?.to_uppercase()))
}

fn lower(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::string(arg_str(args, 0, "lower", span)?.to_lowercase()))
}

fn trim(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::string(arg_str(args, 0, "trim", span)?.trim().to_string()))
}

fn trim_start(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::string(arg_str(args, 0, "trimStart", span)?.trim_start().to_string()))
}

fn trim_end(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::string(arg_str(args, 0, "trimEnd", span)?.trim_end().to_string()))
}

fn split(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "split", span)?;
    let sep = arg_str(args, 1, "split", span)?;
    if sep.is_empty() {
        return Ok(Udm::array(s.chars().map(|c| Udm::string(c.to_string()))));
    }
    Ok(Udm::array(s.split(sep).map(Udm::string)))
}

fn join(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let arr = args[0]
        .as_array()
        .ok_or_else(|| type_error("join", 0, "expected an array", span))?;
    let sep = arg_str(args, 1, "join", span)?;
    let parts: Vec<String> = arr.iter().map(Udm::coerce_to_string).collect();
    Ok(Udm::string(parts.join(sep)))
}

fn replace(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "replace", span)?;
    let from = arg_str(args, 1, "replace", span)?;
    let to = arg_str(args, 2, "replace", span)?;
    Ok(Udm::string(s.replace(from, to)))
}

fn contains(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "contains", span)?;
    let needle = arg_str(args, 1, "contains", span)?;
    Ok(Udm::Boolean(s.contains(needle)))
}

fn starts_with(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "startsWith", span)?;
    let prefix = arg_str(args, 1, "startsWith", span)?;
    Ok(Udm::Boolean(s.starts_with(prefix)))
}

fn ends_with(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "endsWith", span)?;
    let suffix = arg_str(args, 1, "endsWith", span)?;
    Ok(Udm::Boolean(s.ends_with(suffix)))
}

fn substring(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "substring", span)?;
    let chars: Vec<char> = s.chars().collect();
    let start = args[1]
        .as_integer()
        .ok_or_else(|| type_error("substring", 1, "expected an integer", span))?
        .max(0) as usize;
    let end = if args.len() > 2 {
        args[2]
            .as_integer()
            .ok_or_else(|| type_error("substring", 2, "expected an integer", span))?
            .max(0) as usize
    } else {
        chars.len()
    };
    let start = start.min(chars.len());
    let end = end.min(chars.len()).max(start);
    Ok(Udm::string(chars[start..end].iter().collect::<String>()))
}

fn index_of(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "indexOf", span)?;
    let needle = arg_str(args, 1, "indexOf", span)?;
    match s.find(needle) {
        Some(byte_idx) => Ok(Udm::Integer(s[..byte_idx].chars().count() as i64)),
        None => Ok(Udm::Integer(-1)),
    }
}

fn pad_left(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "padLeft", span)?;
    let width = args[1]
        .as_integer()
        .ok_or_else(|| type_error("padLeft", 1, "expected an integer", span))?
        .max(0) as usize;
    let pad_char = arg_str(args, 2, "padLeft", span)?.chars().next().unwrap_or(' ');
    let len = s.chars().count();
    if len >= width {
        return Ok(Udm::string(s.to_string()));
    }
    let padding: String = std::iter::repeat(pad_char).take(width - len).collect();
    Ok(Udm::string(format!("{padding}{s}")))
}

fn pad_right(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "padRight", span)?;
    let width = args[1]
        .as_integer()
        .ok_or_else(|| type_error("padRight", 1, "expected an integer", span))?
        .max(0) as usize;
    let pad_char = arg_str(args, 2, "padRight", span)?.chars().next().unwrap_or(' ');
    let len = s.chars().count();
    if len >= width {
        return Ok(Udm::string(s.to_string()));
    }
    let padding: String = std::iter::repeat(pad_char).take(width - len).collect();
    Ok(Udm::string(format!("{s}{padding}")))
}

fn repeat(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "repeat", span)?;
    let n = args[1]
        .as_integer()
        .ok_or_else(|| type_error("repeat", 1, "expected an integer", span))?
        .max(0) as usize;
    Ok(Udm::string(s.repeat(n)))
}

fn matches_regex(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "matches", span)?;
    let pattern = arg_str(args, 1, "matches", span)?;
    let re = regex::Regex::new(pattern)
        .map_err(|e| RuntimeError::ArgumentType {
            function: "matches".to_string(),
            index: 1,
            hint: format!("invalid regular expression: {e}"),
            span,
        })?;
    Ok(Udm::Boolean(re.is_match(s)))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "upper", min_arity: 1, max_arity: 1, implementation: upper });
    v.push(StdlibFn { name: "lower", min_arity: 1, max_arity: 1, implementation: lower });
    v.push(StdlibFn { name: "trim", min_arity: 1, max_arity: 1, implementation: trim });
    v.push(StdlibFn { name: "trimStart", min_arity: 1, max_arity: 1, implementation: trim_start });
    v.push(StdlibFn { name: "trimEnd", min_arity: 1, max_arity: 1, implementation: trim_end });
    v.push(StdlibFn { name: "split", min_arity: 2, max_arity: 2, implementation: split });
    v.push(StdlibFn { name: "join", min_arity: 2, max_arity: 2, implementation: join });
    v.push(StdlibFn { name: "replace", min_arity: 3, max_arity: 3, implementation: replace });
    v.push(StdlibFn { name: "contains", min_arity: 2, max_arity: 2, implementation: contains });
    v.push(StdlibFn { name: "startsWith", min_arity: 2, max_arity: 2, implementation: starts_with });
    v.push(StdlibFn { name: "endsWith", min_arity: 2, max_arity: 2, implementation: ends_with });
    v.push(StdlibFn { name: "substring", min_arity: 2, max_arity: 3, implementation: substring });
    v.push(StdlibFn { name: "indexOf", min_arity: 2, max_arity: 2, implementation: index_of });
    v.push(StdlibFn { name: "padLeft", min_arity: 3, max_arity: 3, implementation: pad_left });
    v.push(StdlibFn { name: "padRight", min_arity: 3, max_arity: 3, implementation: pad_right });
    v.push(StdlibFn { name: "repeat", min_arity: 2, max_arity: 2, implementation: repeat });
    v.push(StdlibFn { name: "matches", min_arity: 2, max_arity: 2, implementation: matches_regex });
}
