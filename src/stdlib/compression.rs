//! Compression functions (§4.4 "compression" category, §4.5 "Binary
//! and compressed payloads", §6.3 magic-byte table, §8 scenario F).

use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, GzDecoder};
use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;

use crate::error::{CompressionError, Span, UtlxError};
use crate::udm::Udm;

use super::{type_error, Invoker, StdlibFn};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];

fn bytes_of(args: &[Udm], i: usize, func: &str, span: Span) -> Result<Vec<u8>, UtlxError> {
    match &args[i] {
        Udm::Binary(b) => Ok(b.clone()),
        Udm::String(s) => Ok(s.as_bytes().to_vec()),
        _ => Err(type_error(func, i, "expected a binary value or string", span)),
    }
}

fn gzip(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let data = bytes_of(args, 0, "gzip", span)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&data)
        .map_err(|e| CompressionError::Failed { algorithm: "gzip", message: e.to_string() })?;
    let out = encoder
        .finish()
        .map_err(|e| CompressionError::Failed { algorithm: "gzip", message: e.to_string() })?;
    Ok(Udm::Binary(out))
}

fn gunzip(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let data = bytes_of(args, 0, "gunzip", span)?;
    let mut decoder = GzDecoder::new(&data[..]);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CompressionError::Failed { algorithm: "gzip", message: e.to_string() })?;
    Ok(Udm::Binary(out))
}

fn deflate(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let data = bytes_of(args, 0, "deflate", span)?;
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&data)
        .map_err(|e| CompressionError::Failed { algorithm: "deflate", message: e.to_string() })?;
    let out = encoder
        .finish()
        .map_err(|e| CompressionError::Failed { algorithm: "deflate", message: e.to_string() })?;
    Ok(Udm::Binary(out))
}

fn inflate(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let data = bytes_of(args, 0, "inflate", span)?;
    let mut decoder = DeflateDecoder::new(&data[..]);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CompressionError::Failed { algorithm: "deflate", message: e.to_string() })?;
    Ok(Udm::Binary(out))
}

fn is_gzipped(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let data = bytes_of(args, 0, "isGzipped", span)?;
    Ok(Udm::Boolean(data.starts_with(&GZIP_MAGIC)))
}

fn is_zip(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let data = bytes_of(args, 0, "isZip", span)?;
    Ok(Udm::Boolean(data.starts_with(&ZIP_MAGIC)))
}

/// Auto-detects gzip vs. zip-deflate from magic bytes and decompresses
/// accordingly (§4.5: "A generic `compress(data, algo)` auto-detects
/// algorithm on decompression from magic bytes").
fn decompress(args: &[Udm], span: Span, inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let data = bytes_of(args, 0, "decompress", span)?;
    if data.starts_with(&GZIP_MAGIC) {
        return gunzip(args, span, inv);
    }
    if data.starts_with(&ZIP_MAGIC) {
        return Err(CompressionError::Failed {
            algorithm: "zip",
            message: "use zipExtract/zipReadEntry for zip archives".to_string(),
        }
        .into());
    }
    Err(CompressionError::UnknownMagic.into())
}

/// Builds a zip archive from an array of `{ name, data }` entries
/// (`data` a string or binary value), returned as `Udm::Binary`.
fn zip_create(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let entries = args[0]
        .as_array()
        .ok_or_else(|| type_error("zipCreate", 0, "expected an array of { name, data } entries", span))?;

    let mut buf = Vec::new();
    let cursor = std::io::Cursor::new(&mut buf);
    let mut writer = zip::ZipWriter::new(cursor);
    let options: zip::write::FileOptions<()> =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in entries.iter() {
        let obj = entry
            .as_object()
            .ok_or_else(|| type_error("zipCreate", 0, "expected an array of { name, data } entries", span))?;
        let name = obj
            .properties
            .get("name")
            .and_then(Udm::as_str)
            .ok_or_else(|| type_error("zipCreate", 0, "entry is missing a string \"name\"", span))?;
        let data = match obj.properties.get("data") {
            Some(Udm::Binary(b)) => b.clone(),
            Some(Udm::String(s)) => s.as_bytes().to_vec(),
            _ => return Err(type_error("zipCreate", 0, "entry is missing binary or string \"data\"", span)),
        };
        writer
            .start_file(name, options)
            .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
        writer
            .write_all(&data)
            .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
    }
    writer
        .finish()
        .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
    Ok(Udm::Binary(buf))
}

/// Extracts every entry of a zip archive into an object mapping entry
/// name to its contents as `Udm::Binary`.
fn zip_extract(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let data = bytes_of(args, 0, "zipExtract", span)?;
    let reader = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(reader)
        .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
    let mut out = crate::udm::UdmObject::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
        let name = entry.name().to_string();
        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
        out.properties.insert(name, Udm::Binary(contents));
    }
    Ok(Udm::object(out))
}

fn zip_list(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let data = bytes_of(args, 0, "zipList", span)?;
    let reader = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(reader)
        .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
        names.push(Udm::string(entry.name().to_string()));
    }
    Ok(Udm::array(names))
}

fn zip_read_entry(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let data = bytes_of(args, 0, "zipReadEntry", span)?;
    let entry_name = args[1]
        .as_str()
        .ok_or_else(|| type_error("zipReadEntry", 1, "expected a string", span))?;
    let reader = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(reader)
        .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
    let mut entry = archive
        .by_name(entry_name)
        .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
    let mut out = Vec::new();
    entry
        .read_to_end(&mut out)
        .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
    Ok(Udm::Binary(out))
}

/// A JAR is a zip archive with a `META-INF/MANIFEST.MF` entry (§6.3).
fn is_jar(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let data = bytes_of(args, 0, "isJar", span)?;
    if !data.starts_with(&ZIP_MAGIC) {
        return Ok(Udm::Boolean(false));
    }
    let reader = std::io::Cursor::new(data);
    let archive = zip::ZipArchive::new(reader)
        .map_err(|e| CompressionError::Failed { algorithm: "zip", message: e.to_string() })?;
    Ok(Udm::Boolean(archive.file_names().any(|n| n == "META-INF/MANIFEST.MF")))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "gzip", min_arity: 1, max_arity: 1, implementation: gzip });
    v.push(StdlibFn { name: "gunzip", min_arity: 1, max_arity: 1, implementation: gunzip });
    v.push(StdlibFn { name: "deflate", min_arity: 1, max_arity: 1, implementation: deflate });
    v.push(StdlibFn { name: "inflate", min_arity: 1, max_arity: 1, implementation: inflate });
    v.push(StdlibFn { name: "isGzipped", min_arity: 1, max_arity: 1, implementation: is_gzipped });
    v.push(StdlibFn { name: "isZip", min_arity: 1, max_arity: 1, implementation: is_zip });
    v.push(StdlibFn { name: "isJar", min_arity: 1, max_arity: 1, implementation: is_jar });
    v.push(StdlibFn { name: "decompress", min_arity: 1, max_arity: 1, implementation: decompress });
    v.push(StdlibFn { name: "zipList", min_arity: 1, max_arity: 1, implementation: zip_list });
    v.push(StdlibFn { name: "zipReadEntry", min_arity: 2, max_arity: 2, implementation: zip_read_entry });
    v.push(StdlibFn { name: "zipCreate", min_arity: 1, max_arity: 1, implementation: zip_create });
    v.push(StdlibFn { name: "zipExtract", min_arity: 1, max_arity: 1, implementation: zip_extract });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::udm::UdmObject;

    struct NoopInvoker;
    impl Invoker for NoopInvoker {
        fn call_lambda(&self, _lambda: &Udm, _args: &[Udm], _span: Span) -> Result<Udm, UtlxError> {
            unimplemented!()
        }
    }

    fn span() -> Span {
        Span::single(crate::error::Position::new())
    }

    #[test]
    fn zip_create_then_extract_round_trips() {
        let mut entry = UdmObject::new();
        entry.properties.insert("name".to_string(), Udm::string("hello.txt"));
        entry.properties.insert("data".to_string(), Udm::string("hello world"));
        let entries = Udm::array(vec![Udm::object(entry)]);

        let archive = zip_create(&[entries], span(), &NoopInvoker).unwrap();
        assert!(matches!(&archive, Udm::Binary(b) if b.starts_with(&ZIP_MAGIC)));

        let extracted = zip_extract(&[archive], span(), &NoopInvoker).unwrap();
        let obj = extracted.as_object().unwrap();
        let contents = obj.properties.get("hello.txt").unwrap();
        assert!(matches!(contents, Udm::Binary(b) if b == b"hello world"));
    }

    #[test]
    fn zip_create_then_list_reports_entry_names() {
        let mut entry = UdmObject::new();
        entry.properties.insert("name".to_string(), Udm::string("a.txt"));
        entry.properties.insert("data".to_string(), Udm::string("a"));
        let entries = Udm::array(vec![Udm::object(entry)]);

        let archive = zip_create(&[entries], span(), &NoopInvoker).unwrap();
        let names = zip_list(&[archive], span(), &NoopInvoker).unwrap();
        let names = names.as_array().unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].as_str(), Some("a.txt"));
    }
}
