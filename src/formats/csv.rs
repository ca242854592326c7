//! CSV adapter (§4.5), RFC 4180 via the `csv` crate. With headers
//! (default), rows become an array of Objects keyed by header name;
//! without, an array of arrays of scalars. Serialize also recognizes the
//! explicit `{ headers: [...], rows: [[...]] }` tabular Object shape.
//! Regional number formatting on serialize is delegated to
//! [`crate::stdlib::regional`] so the two call sites never drift apart
//! (the redesign note this split exists to satisfy), and applies to
//! both `Float` and `Integer` cells.

use crate::ast::OptionsMap;
use crate::error::{FormatParseError, FormatSerializeError, UtlxError};
use crate::stdlib::regional;
use crate::udm::{Udm, UdmArray, UdmObject};

use super::{option_bool, option_int, option_str, strip_bom, Adapter};

pub struct CsvAdapter;

/// Unquoted-token inference (§4.5 CSV): booleans, the null spellings
/// `""`/`null`/`nil`/`n/a`, numbers, else string. Shared with the XML
/// adapter's leaf-text inference so a JSON→XML→JSON or JSON→CSV→JSON
/// round trip keeps its Integer/Float distinction (§9.1).
pub(crate) fn infer_scalar(cell: &str) -> Udm {
    match cell {
        "" | "null" | "nil" | "n/a" => return Udm::Null,
        "true" => return Udm::Boolean(true),
        "false" => return Udm::Boolean(false),
        _ => {}
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Udm::Integer(i);
    }
    if cell.chars().any(|c| c == '.' || c == 'e' || c == 'E') {
        if let Ok(f) = cell.parse::<f64>() {
            return Udm::Float(f);
        }
    }
    Udm::string(cell)
}

fn delimiter_byte(options: &OptionsMap) -> u8 {
    match option_str(options, "delimiter", ",") {
        "\\t" | "\t" => b'\t',
        other => other.as_bytes().first().copied().unwrap_or(b','),
    }
}

fn quote_byte(options: &OptionsMap) -> u8 {
    option_str(options, "quote", "\"").as_bytes().first().copied().unwrap_or(b'"')
}

impl Adapter for CsvAdapter {
    fn parse(&self, bytes: &[u8], options: &OptionsMap) -> Result<Udm, UtlxError> {
        let bytes = strip_bom(bytes);
        let has_header = option_bool(options, "headers", true);
        let skip_empty = option_bool(options, "skipEmptyLines", true);
        let infer_types = option_bool(options, "inferTypes", true);

        let mut builder = ::csv::ReaderBuilder::new();
        builder
            .delimiter(delimiter_byte(options))
            .quote(quote_byte(options))
            .has_headers(false)
            .flexible(true);
        let mut reader = builder.from_reader(bytes);

        let mut headers: Option<Vec<String>> = None;
        let mut rows = UdmArray::new();

        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| FormatParseError::Malformed {
                adapter: "csv",
                message: e.to_string(),
                line: i + 1,
                column: 0,
            })?;
            if skip_empty && record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            if has_header && headers.is_none() {
                headers = Some(record.iter().map(str::to_string).collect());
                continue;
            }
            let row_value = if let Some(h) = &headers {
                let mut obj = UdmObject::new();
                for (idx, field) in record.iter().enumerate() {
                    let key = h.get(idx).cloned().unwrap_or_else(|| format!("col{idx}"));
                    let value = if infer_types { infer_scalar(field) } else { Udm::string(field) };
                    obj.properties.insert(key, value);
                }
                Udm::object(obj)
            } else {
                let mut cells = UdmArray::new();
                for field in record.iter() {
                    cells.push(if infer_types { infer_scalar(field) } else { Udm::string(field) });
                }
                Udm::Array(Box::new(cells))
            };
            rows.push(row_value);
        }
        Ok(Udm::Array(Box::new(rows)))
    }

    fn serialize(&self, value: &Udm, options: &OptionsMap) -> Result<Vec<u8>, UtlxError> {
        let include_bom = option_bool(options, "includeBOM", false);
        let include_header = option_bool(options, "headers", true);
        let regional_name = option_str(options, "regionalFormat", "none");
        let style = regional::style_named(regional_name).unwrap_or(regional::NONE);
        let decimals = option_int(options, "decimals", -1);
        let use_thousands = option_bool(options, "useThousands", true);

        let mut builder = ::csv::WriterBuilder::new();
        builder.delimiter(delimiter_byte(options)).quote(quote_byte(options));
        let mut writer = builder.from_writer(Vec::new());

        let render_scalar = |v: &Udm| -> String {
            match v {
                Udm::Float(f) if decimals >= 0 => regional::format_number(*f, style, decimals as u32, use_thousands),
                Udm::Integer(i) if decimals >= 0 => {
                    regional::format_number(*i as f64, style, decimals as u32, use_thousands)
                }
                other => other.coerce_to_string(),
            }
        };

        // The explicit `{ headers: [...], rows: [[...]] }` tabular Object
        // shape (§4.5 CSV Serialize) takes priority over the array-of-
        // objects/array-of-arrays shapes below.
        if let Some(obj) = value.as_object() {
            if let (Some(headers_val), Some(rows_val)) =
                (obj.properties.get("headers"), obj.properties.get("rows"))
            {
                let headers: Vec<String> = headers_val
                    .as_array()
                    .ok_or_else(|| FormatSerializeError::Unrepresentable {
                        adapter: "csv",
                        message: "'headers' must be an array of strings".to_string(),
                    })?
                    .iter()
                    .map(|h| h.coerce_to_string())
                    .collect();
                let rows = rows_val.as_array().ok_or_else(|| FormatSerializeError::Unrepresentable {
                    adapter: "csv",
                    message: "'rows' must be an array of arrays".to_string(),
                })?;

                if include_header && !headers.is_empty() {
                    writer.write_record(&headers).map_err(|e| FormatSerializeError::Unrepresentable {
                        adapter: "csv",
                        message: e.to_string(),
                    })?;
                }
                for row in rows.iter() {
                    let cells = row.as_array().ok_or_else(|| FormatSerializeError::Unrepresentable {
                        adapter: "csv",
                        message: "each 'rows' entry must be an array".to_string(),
                    })?;
                    let record: Vec<String> = cells.iter().map(render_scalar).collect();
                    writer.write_record(&record).map_err(|e| FormatSerializeError::Unrepresentable {
                        adapter: "csv",
                        message: e.to_string(),
                    })?;
                }

                return finish_writer(writer, include_bom);
            }
        }

        let rows = value.as_array().ok_or_else(|| FormatSerializeError::Unrepresentable {
            adapter: "csv",
            message: "CSV output requires an array of objects, an array of arrays, or a { headers, rows } object".to_string(),
        })?;

        let all_arrays = rows.iter().all(|r| r.is_array());
        if all_arrays && !rows.is_empty() {
            for row in rows.iter() {
                let cells: Vec<String> = row.as_array().unwrap().iter().map(render_scalar).collect();
                writer.write_record(&cells).map_err(|e| FormatSerializeError::Unrepresentable {
                    adapter: "csv",
                    message: e.to_string(),
                })?;
            }
        } else {
            let mut columns: Vec<String> = Vec::new();
            for row in rows.iter() {
                if let Some(obj) = row.as_object() {
                    for key in obj.property_keys() {
                        if !columns.iter().any(|c| c == key) {
                            columns.push(key.to_string());
                        }
                    }
                }
            }

            if include_header && !columns.is_empty() {
                writer.write_record(&columns).map_err(|e| FormatSerializeError::Unrepresentable {
                    adapter: "csv",
                    message: e.to_string(),
                })?;
            }

            for row in rows.iter() {
                let obj = row.as_object().ok_or_else(|| FormatSerializeError::Unrepresentable {
                    adapter: "csv",
                    message: "each CSV row must be an object".to_string(),
                })?;
                let record: Vec<String> = columns
                    .iter()
                    .map(|col| obj.properties.get(col).map(render_scalar).unwrap_or_default())
                    .collect();
                writer.write_record(&record).map_err(|e| FormatSerializeError::Unrepresentable {
                    adapter: "csv",
                    message: e.to_string(),
                })?;
            }
        }

        finish_writer(writer, include_bom)
    }
}

fn finish_writer(writer: ::csv::Writer<Vec<u8>>, include_bom: bool) -> Result<Vec<u8>, UtlxError> {
    let mut bytes = writer.into_inner().map_err(|e| FormatSerializeError::Unrepresentable {
        adapter: "csv",
        message: e.to_string(),
    })?;
    if include_bom {
        let mut with_bom = vec![0xEF, 0xBB, 0xBF];
        with_bom.append(&mut bytes);
        bytes = with_bom;
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_row_drives_property_keys_and_types() {
        let adapter = CsvAdapter;
        let opts = OptionsMap::new();
        let udm = adapter.parse(b"name,age\nAda,36\nGrace,85\n", &opts).unwrap();
        let rows = udm.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        let first = rows[0].as_object().unwrap();
        assert_eq!(first.properties.get("name").unwrap().as_str(), Some("Ada"));
        assert!(matches!(first.properties.get("age"), Some(Udm::Integer(36))));
    }

    #[test]
    fn empty_unquoted_cell_is_null() {
        let adapter = CsvAdapter;
        let opts = OptionsMap::new();
        let udm = adapter.parse(b"name,nickname\nAda,\n", &opts).unwrap();
        let row = udm.as_array().unwrap()[0].as_object().unwrap();
        assert_eq!(row.properties.get("nickname"), Some(&Udm::Null));
    }

    #[test]
    fn serialize_round_trips_header_and_values() {
        let adapter = CsvAdapter;
        let opts = OptionsMap::new();
        let udm = adapter.parse(b"name,age\nAda,36\n", &opts).unwrap();
        let out = adapter.serialize(&udm, &opts).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("name,age"));
        assert!(text.contains("Ada,36"));
    }

    #[test]
    fn headerless_rows_produce_array_of_arrays() {
        let adapter = CsvAdapter;
        let mut opts = OptionsMap::new();
        opts.insert("headers".to_string(), crate::ast::OptionValue::Boolean(false));
        let udm = adapter.parse(b"1,2\n3,4\n", &opts).unwrap();
        let rows = udm.as_array().unwrap();
        assert!(rows[0].is_array());
    }

    #[test]
    fn regional_format_applies_to_integer_cells_too() {
        let adapter = CsvAdapter;
        let mut opts = OptionsMap::new();
        opts.insert("regionalFormat".to_string(), crate::ast::OptionValue::String("european".to_string()));
        opts.insert("decimals".to_string(), crate::ast::OptionValue::Integer(2));
        let udm = adapter.parse(b"name,amount\nAlice,1234.5\nBob,10\n", &OptionsMap::new()).unwrap();
        let out = String::from_utf8(adapter.serialize(&udm, &opts).unwrap()).unwrap();
        assert!(out.contains("Alice,\"1.234,50\""), "got: {out:?}");
        assert!(out.contains("Bob,\"10,00\""), "got: {out:?}");
    }

    #[test]
    fn tabular_headers_rows_shape_serializes() {
        let adapter = CsvAdapter;
        let opts = OptionsMap::new();
        let mut obj = UdmObject::new();
        obj.properties.insert(
            "headers".to_string(),
            Udm::Array(Box::new(vec![Udm::string("a"), Udm::string("b")].into_iter().collect())),
        );
        obj.properties.insert(
            "rows".to_string(),
            Udm::Array(Box::new(
                vec![
                    Udm::Array(Box::new(vec![Udm::Integer(1), Udm::Integer(2)].into_iter().collect())),
                    Udm::Array(Box::new(vec![Udm::Integer(3), Udm::Integer(4)].into_iter().collect())),
                ]
                .into_iter()
                .collect(),
            )),
        );
        let out = String::from_utf8(adapter.serialize(&Udm::object(obj), &opts).unwrap()).unwrap();
        assert_eq!(out, "a,b\n1,2\n3,4\n");
    }
}
