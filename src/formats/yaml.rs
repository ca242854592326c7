//! YAML adapter (§4.5), via `serde_yaml`. A document maps onto UDM the
//! same way JSON's object/array/scalar tree does; YAML's looser scalar
//! grammar (unquoted `true`/`null`/bare numbers) is what `serde_yaml`
//! already resolves for us during `Value` deserialization.
//!
//! Multi-document streams (`---` separated) are split by
//! [`split_documents`], reused by the `yamlSplitDocuments` stdlib
//! function (§4.4) so a script can fan a multi-doc input out into an
//! array without the adapter and the stdlib function disagreeing on
//! what counts as a document boundary.

use serde_yaml::Value;

use crate::ast::OptionsMap;
use crate::error::{FormatParseError, FormatSerializeError, UtlxError};
use crate::udm::{Udm, UdmArray, UdmObject};

use super::Adapter;

pub struct YamlAdapter;

fn value_to_udm(value: Value) -> Udm {
    match value {
        Value::Null => Udm::Null,
        Value::Bool(b) => Udm::Boolean(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Udm::Integer(i)
            } else {
                Udm::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => Udm::String(s),
        Value::Sequence(items) => {
            let mut arr = UdmArray::new();
            arr.extend(items.into_iter().map(value_to_udm));
            Udm::Array(Box::new(arr))
        }
        Value::Mapping(map) => {
            let mut obj = UdmObject::new();
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => s,
                    other => serde_yaml::to_string(&other).unwrap_or_default().trim().to_string(),
                };
                obj.properties.insert(key, value_to_udm(v));
            }
            Udm::object(obj)
        }
        Value::Tagged(tagged) => value_to_udm(tagged.value),
    }
}

fn udm_to_value(value: &Udm) -> Value {
    match value {
        Udm::Null => Value::Null,
        Udm::Boolean(b) => Value::Bool(*b),
        Udm::Integer(i) => Value::Number((*i).into()),
        Udm::Float(f) => Value::Number((*f).into()),
        Udm::String(s) => Value::String(s.clone()),
        Udm::Array(a) => Value::Sequence(a.iter().map(udm_to_value).collect()),
        Udm::Object(o) => {
            let mut map = serde_yaml::Mapping::new();
            for (k, v) in o.attributes.iter() {
                map.insert(Value::String(format!("@{k}")), Value::String(v.clone()));
            }
            for (k, v) in o.properties.iter() {
                map.insert(Value::String(k.clone()), udm_to_value(v));
            }
            Value::Mapping(map)
        }
        other => Value::String(other.coerce_to_string()),
    }
}

/// Splits a multi-document YAML stream on `---` document markers that
/// begin a line, the rule `serde_yaml`'s single-document `Deserializer`
/// doesn't apply for us automatically outside of its `Deserializer::from_str`
/// multi-doc iterator, which this mirrors at the text level so callers
/// get raw per-document source instead of an eagerly parsed `Value`.
pub fn split_documents(text: &str) -> Vec<String> {
    let mut docs = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim_end() == "---" && !current.trim().is_empty() {
            docs.push(std::mem::take(&mut current));
        } else if line.trim_end() == "---" {
            current.clear();
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.trim().is_empty() {
        docs.push(current);
    }
    docs
}

impl Adapter for YamlAdapter {
    fn parse(&self, bytes: &[u8], _options: &OptionsMap) -> Result<Udm, UtlxError> {
        let text = std::str::from_utf8(bytes).map_err(|e| FormatParseError::Malformed {
            adapter: "yaml",
            message: format!("invalid UTF-8: {e}"),
            line: 0,
            column: 0,
        })?;
        let value: Value = serde_yaml::from_str(text).map_err(|e| FormatParseError::Malformed {
            adapter: "yaml",
            message: e.to_string(),
            line: e.location().map(|l| l.line()).unwrap_or(0),
            column: e.location().map(|l| l.column()).unwrap_or(0),
        })?;
        Ok(value_to_udm(value))
    }

    fn serialize(&self, value: &Udm, _options: &OptionsMap) -> Result<Vec<u8>, UtlxError> {
        let value = udm_to_value(value);
        let text = serde_yaml::to_string(&value).map_err(|e| FormatSerializeError::Unrepresentable {
            adapter: "yaml",
            message: e.to_string(),
        })?;
        Ok(text.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_bool_and_null_from_bare_scalars() {
        let adapter = YamlAdapter;
        let opts = OptionsMap::new();
        let udm = adapter.parse(b"active: true\nnickname: null\ncount: 3\n", &opts).unwrap();
        let obj = udm.as_object().unwrap();
        assert_eq!(obj.properties.get("active"), Some(&Udm::Boolean(true)));
        assert_eq!(obj.properties.get("nickname"), Some(&Udm::Null));
        assert_eq!(obj.properties.get("count"), Some(&Udm::Integer(3)));
    }

    #[test]
    fn splits_three_dash_separated_documents() {
        let docs = split_documents("a: 1\n---\nb: 2\n---\nc: 3\n");
        assert_eq!(docs.len(), 3);
    }
}
