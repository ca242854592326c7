//! Binary/text encoding functions (§4.4 "encoding" category).

use base64::Engine as _;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

use crate::error::{Span, UtlxError};
use crate::udm::Udm;

use super::{type_error, Invoker, StdlibFn};

fn bytes_of(args: &[Udm], i: usize, func: &str, span: Span) -> Result<Vec<u8>, UtlxError> {
    match &args[i] {
        Udm::Binary(b) => Ok(b.clone()),
        Udm::String(s) => Ok(s.as_bytes().to_vec()),
        _ => Err(type_error(func, i, "expected a binary value or string", span)),
    }
}

fn base64_encode(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let bytes = bytes_of(args, 0, "base64Encode", span)?;
    Ok(Udm::string(base64::engine::general_purpose::STANDARD.encode(bytes)))
}

fn base64_decode(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = args[0]
        .as_str()
        .ok_or_else(|| type_error("base64Decode", 0, "expected a string", span))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| type_error("base64Decode", 0, format!("invalid base64: {e}"), span))?;
    Ok(Udm::Binary(bytes))
}

fn hex_encode(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let bytes = bytes_of(args, 0, "hexEncode", span)?;
    Ok(Udm::string(hex::encode(bytes)))
}

fn hex_decode(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = args[0]
        .as_str()
        .ok_or_else(|| type_error("hexDecode", 0, "expected a string", span))?;
    let bytes = hex::decode(s).map_err(|e| type_error("hexDecode", 0, format!("invalid hex: {e}"), span))?;
    Ok(Udm::Binary(bytes))
}

fn url_encode(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = args[0]
        .as_str()
        .ok_or_else(|| type_error("urlEncode", 0, "expected a string", span))?;
    Ok(Udm::string(utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()))
}

fn url_decode(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = args[0]
        .as_str()
        .ok_or_else(|| type_error("urlDecode", 0, "expected a string", span))?;
    let decoded = percent_decode_str(s)
        .decode_utf8()
        .map_err(|e| type_error("urlDecode", 0, format!("invalid percent-encoding: {e}"), span))?;
    Ok(Udm::string(decoded.into_owned()))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "base64Encode", min_arity: 1, max_arity: 1, implementation: base64_encode });
    v.push(StdlibFn { name: "base64Decode", min_arity: 1, max_arity: 1, implementation: base64_decode });
    v.push(StdlibFn { name: "hexEncode", min_arity: 1, max_arity: 1, implementation: hex_encode });
    v.push(StdlibFn { name: "hexDecode", min_arity: 1, max_arity: 1, implementation: hex_decode });
    v.push(StdlibFn { name: "urlEncode", min_arity: 1, max_arity: 1, implementation: url_encode });
    v.push(StdlibFn { name: "urlDecode", min_arity: 1, max_arity: 1, implementation: url_decode });
}
