//! Hashing functions (§4.4 "crypto" category). Digest-only — UTL-X has
//! no encryption primitives, matching the original scope.

use md5::Md5;
use sha2::{Digest, Sha256};

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

fn md5_hash(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let bytes = bytes_of(args, 0, "md5", span)?;
    let digest = Md5::digest(&bytes);
    Ok(Udm::string(hex::encode(digest)))
}

fn sha256_hash(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let bytes = bytes_of(args, 0, "sha256", span)?;
    let digest = Sha256::digest(&bytes);
    Ok(Udm::string(hex::encode(digest)))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "md5", min_arity: 1, max_arity: 1, implementation: md5_hash });
    v.push(StdlibFn { name: "sha256", min_arity: 1, max_arity: 1, implementation: sha256_hash });
}
