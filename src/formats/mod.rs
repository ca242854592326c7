//! Format adapters (§4.5): one parser/serializer pair per supported
//! wire format, each converting `bytes ↔ UDM` under documented rules.
//! Dispatch by format name is a flat `match` rather than a dynamic
//! registry — the adapter set is fixed at compile time, so a
//! hash-based lookup would be ceremony without payoff.

pub mod csv;
pub mod json;
pub mod jsonschema;
pub mod xml;
pub mod xsd;
pub mod yaml;

use crate::ast::OptionsMap;
use crate::error::{FormatParseError, UtlxError};
use crate::udm::Udm;

/// A parser/serializer pair for one wire format.
pub trait Adapter {
    fn parse(&self, bytes: &[u8], options: &OptionsMap) -> Result<Udm, UtlxError>;
    fn serialize(&self, value: &Udm, options: &OptionsMap) -> Result<Vec<u8>, UtlxError>;
}

fn adapter_for(format: &str) -> Option<Box<dyn Adapter>> {
    match format {
        "json" => Some(Box::new(json::JsonAdapter)),
        "xml" => Some(Box::new(xml::XmlAdapter)),
        "csv" => Some(Box::new(csv::CsvAdapter)),
        "yaml" | "yml" => Some(Box::new(yaml::YamlAdapter)),
        "xsd" => Some(Box::new(xsd::XsdAdapter)),
        "jsch" | "json-schema" => Some(Box::new(jsonschema::JsonSchemaAdapter)),
        _ => None,
    }
}

/// Content-sniffs a format from its leading bytes (`input auto`, §6.1).
/// Cheap and deliberately simple: look at the first non-whitespace
/// byte after stripping a BOM.
fn detect_format(bytes: &[u8]) -> &'static str {
    let bytes = strip_bom(bytes);
    let first_non_ws = bytes.iter().find(|b| !b.is_ascii_whitespace());
    match first_non_ws {
        Some(b'{') | Some(b'[') => "json",
        Some(b'<') => "xml",
        Some(_) => {
            let text = String::from_utf8_lossy(bytes);
            let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
            if first_line.trim_start().starts_with("---") || first_line.contains(": ") {
                "yaml"
            } else {
                "csv"
            }
        }
        None => "json",
    }
}

pub fn parse(format: &str, bytes: &[u8], options: &OptionsMap) -> Result<Udm, UtlxError> {
    let resolved = if format == "auto" { detect_format(bytes) } else { format };
    let adapter = adapter_for(resolved).ok_or_else(|| FormatParseError::Malformed {
        adapter: "engine",
        message: format!("unknown input format '{format}'"),
        line: 0,
        column: 0,
    })?;
    adapter.parse(bytes, options)
}

pub fn serialize(format: &str, value: &Udm, options: &OptionsMap) -> Result<Vec<u8>, UtlxError> {
    let adapter = adapter_for(format).ok_or_else(|| FormatParseError::Malformed {
        adapter: "engine",
        message: format!("unknown output format '{format}'"),
        line: 0,
        column: 0,
    })?;
    adapter.serialize(value, options)
}

/// Strips a UTF-8 BOM if present (§4.5 XML/CSV "BOM" rules).
pub(crate) fn strip_bom(bytes: &[u8]) -> &[u8] {
    const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
    if bytes.starts_with(&BOM) {
        &bytes[3..]
    } else {
        bytes
    }
}

pub(crate) fn option_bool(options: &OptionsMap, key: &str, default: bool) -> bool {
    options.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

pub(crate) fn option_int(options: &OptionsMap, key: &str, default: i64) -> i64 {
    options.get(key).and_then(|v| v.as_integer()).unwrap_or(default)
}

pub(crate) fn option_str<'a>(options: &'a OptionsMap, key: &str, default: &'a str) -> &'a str {
    options.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}

pub(crate) fn option_list_of_strings(options: &OptionsMap, key: &str) -> Vec<String> {
    options
        .get(key)
        .and_then(|v| v.as_list())
        .map(|items| items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_format_sniffs_json_xml_and_csv() {
        let opts = OptionsMap::new();
        let json = parse("auto", br#"{"a": 1}"#, &opts).unwrap();
        assert!(json.is_object());

        let xml = parse("auto", b"<root><a>1</a></root>", &opts).unwrap();
        assert!(xml.is_object());

        let csv = parse("auto", b"a,b\n1,2\n", &opts).unwrap();
        assert!(csv.is_array());
    }
}
