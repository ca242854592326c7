//! JSON adapter (§4.5). Thin wrapper over `serde_json::Value`,
//! preserving the integer/float distinction on the way in and the
//! `pretty`/`indent` options on the way out.

use serde_json::Value;

use crate::ast::OptionsMap;
use crate::error::{FormatParseError, FormatSerializeError, UtlxError};
use crate::udm::{Udm, UdmArray, UdmObject};

use super::{option_bool, option_int, strip_bom, Adapter};

pub struct JsonAdapter;

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
        Value::Array(items) => {
            let mut arr = UdmArray::new();
            arr.extend(items.into_iter().map(value_to_udm));
            Udm::Array(Box::new(arr))
        }
        Value::Object(map) => {
            let mut obj = UdmObject::new();
            for (k, v) in map {
                obj.properties.insert(k, value_to_udm(v));
            }
            Udm::Object(Box::new(obj))
        }
    }
}

fn udm_to_value(value: &Udm) -> Value {
    match value {
        Udm::Null => Value::Null,
        Udm::Boolean(b) => Value::Bool(*b),
        Udm::Integer(i) => Value::from(*i),
        Udm::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Udm::String(s) => Value::String(s.clone()),
        Udm::Array(a) => Value::Array(a.iter().map(udm_to_value).collect()),
        Udm::Object(o) => {
            let mut map = serde_json::Map::new();
            for (k, v) in o.attributes.iter() {
                map.insert(format!("@{k}"), Value::String(v.clone()));
            }
            for (k, v) in o.properties.iter() {
                map.insert(k.clone(), udm_to_value(v));
            }
            Value::Object(map)
        }
        Udm::Date(d) => Value::String(d.to_string()),
        Udm::DateTime(d) => Value::String(d.to_rfc3339()),
        Udm::LocalDateTime(d) => Value::String(d.to_string()),
        Udm::Time(t) => Value::String(t.to_string()),
        Udm::Binary(b) => Value::String(base64::Engine::encode(&base64::engine::general_purpose::STANDARD, b)),
        Udm::Lambda(_) => Value::Null,
    }
}

impl Adapter for JsonAdapter {
    fn parse(&self, bytes: &[u8], _options: &OptionsMap) -> Result<Udm, UtlxError> {
        let bytes = strip_bom(bytes);
        let text = std::str::from_utf8(bytes).map_err(|e| FormatParseError::Malformed {
            adapter: "json",
            message: format!("invalid UTF-8: {e}"),
            line: 0,
            column: 0,
        })?;
        let value: Value = serde_json::from_str(text).map_err(|e| FormatParseError::Malformed {
            adapter: "json",
            message: e.to_string(),
            line: e.line(),
            column: e.column(),
        })?;
        Ok(value_to_udm(value))
    }

    fn serialize(&self, value: &Udm, options: &OptionsMap) -> Result<Vec<u8>, UtlxError> {
        let pretty = option_bool(options, "pretty", true);
        let value = udm_to_value(value);
        let text = if pretty {
            let indent = option_int(options, "indent", 2).max(0) as usize;
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(" ".repeat(indent).as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            serde::Serialize::serialize(&value, &mut ser).map_err(|e| FormatSerializeError::Unrepresentable {
                adapter: "json",
                message: e.to_string(),
            })?;
            String::from_utf8(buf).unwrap()
        } else {
            serde_json::to_string(&value).map_err(|e| FormatSerializeError::Unrepresentable {
                adapter: "json",
                message: e.to_string(),
            })?
        };
        Ok(text.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_integers_and_floats_distinctly() {
        let adapter = JsonAdapter;
        let opts = OptionsMap::new();
        let udm = adapter.parse(br#"{"a": 1, "b": 1.5}"#, &opts).unwrap();
        let obj = udm.as_object().unwrap();
        assert!(matches!(obj.properties.get("a"), Some(Udm::Integer(1))));
        assert!(matches!(obj.properties.get("b"), Some(Udm::Float(_))));
    }

    #[test]
    fn serializes_attributes_with_at_prefix() {
        let mut obj = UdmObject::new();
        obj.attributes.insert("id".to_string(), "7".to_string());
        obj.properties.insert("name".to_string(), Udm::string("x"));
        let adapter = JsonAdapter;
        let mut opts = OptionsMap::new();
        opts.insert("pretty".to_string(), crate::ast::OptionValue::Boolean(false));
        let out = adapter.serialize(&Udm::Object(Box::new(obj)), &opts).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"@id\":\"7\""));
    }
}
