//! XML adapter (§4.5). Event-driven via `quick-xml`, the same crate
//! the broader example pack reaches for over hand-rolled XML handling.
//!
//! Parse rules:
//! - every element becomes a UDM Object; its XML attributes become the
//!   object's `attributes` map (never `properties`), keeping the two
//!   namespaces disjoint per §3.1.
//! - namespace prefixes are preserved as part of the element's (and
//!   attribute's) name unconditionally — `xs:element` stays `xs:element`,
//!   never silently collapsed to `element` — since a script path like
//!   `$input["xs:element"]` has no other way to address a prefixed name.
//!   The `namespaces` option is a `prefix -> URI` declaration map (§6.2);
//!   declared bindings are merged with whatever `xmlns:*` bindings the
//!   document declares inline and recorded on the root element's
//!   `metadata["__namespaces"]`.
//! - an element with no attributes and no child elements collapses to
//!   its text content rather than a one-key object, type-inferred the
//!   same way an unquoted CSV cell is (§9.1: a JSON→XML→JSON round trip
//!   must keep its Integer/Float/Boolean/Null distinction).
//! - repeated child element names collect into an array; a name may
//!   also be forced into single-element-array form via the `arrays`
//!   option, since a downstream transform that expects a list
//!   shouldn't have to special-case the "only one came back" case.
//! - mixed content (text alongside child elements) is exposed under a
//!   synthetic `#text` property.
//! - each element Object's `metadata["__elementName"]` is set to its
//!   (namespace-qualified) tag name, the hook the interpreter's
//!   template dispatch (§4.3) reads to match `template match="Name"`
//!   against data that carries no inherent "name" field otherwise.
//! - serializing a top-level Array is rejected (§4.5 "single-root
//!   requirement"): XML has exactly one document root, so a script that
//!   produces an Array at the top level must wrap it in an Object first.

use std::collections::HashSet;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::ast::OptionsMap;
use crate::error::{FormatParseError, FormatSerializeError, UtlxError};
use crate::udm::{Udm, UdmObject};

use super::csv::infer_scalar;
use super::{option_bool, option_list_of_strings, option_str, strip_bom, Adapter};

pub struct XmlAdapter;

/// Element names are kept fully qualified (namespace prefix and all —
/// see module docs: prefix preservation is unconditional).
fn element_name(start: &BytesStart) -> Result<String, UtlxError> {
    std::str::from_utf8(start.name().as_ref())
        .map(str::to_string)
        .map_err(|_| {
            FormatParseError::Malformed {
                adapter: "xml",
                message: "non-UTF-8 element name".to_string(),
                line: 0,
                column: 0,
            }
            .into()
        })
}

/// Declared `prefix -> URI` bindings from the `namespaces` option map
/// (§6.2), e.g. `namespaces: { xs: "http://www.w3.org/2001/XMLSchema" }`.
fn declared_namespaces(options: &OptionsMap) -> crate::udm::Attributes {
    let mut out = crate::udm::Attributes::new();
    if let Some(map) = options.get("namespaces").and_then(|v| v.as_map()) {
        for (prefix, value) in map.iter() {
            if let Some(uri) = value.as_str() {
                out.insert(prefix.clone(), uri.to_string());
            }
        }
    }
    out
}

fn attributes_of(start: &BytesStart, inline_namespaces: &mut crate::udm::Attributes) -> Result<crate::udm::Attributes, UtlxError> {
    let mut attrs = crate::udm::Attributes::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| FormatParseError::Malformed {
            adapter: "xml",
            message: e.to_string(),
            line: 0,
            column: 0,
        })?;
        let raw_key = std::str::from_utf8(attr.key.as_ref()).unwrap_or_default();
        let key = raw_key.to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| FormatParseError::Malformed {
                adapter: "xml",
                message: e.to_string(),
                line: 0,
                column: 0,
            })?
            .into_owned();
        if raw_key == "xmlns" {
            inline_namespaces.insert(String::new(), value.clone());
        } else if let Some(prefix) = raw_key.strip_prefix("xmlns:") {
            inline_namespaces.insert(prefix.to_string(), value.clone());
        }
        attrs.insert(key, value);
    }
    Ok(attrs)
}

/// A partially-built element: attributes plus the interleaved stream of
/// (name, value) children and raw text runs, collected before the
/// final array/scalar collapsing pass.
struct PendingElement {
    attributes: crate::udm::Attributes,
    children: Vec<(String, Udm)>,
    text: String,
}

fn read_element(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    force_array: &HashSet<String>,
    inline_namespaces: &mut crate::udm::Attributes,
) -> Result<Udm, UtlxError> {
    let own_name = element_name(start)?;
    let mut pending = PendingElement {
        attributes: attributes_of(start, inline_namespaces)?,
        children: Vec::new(),
        text: String::new(),
    };
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(|e| FormatParseError::Malformed {
            adapter: "xml",
            message: e.to_string(),
            line: 0,
            column: 0,
        })? {
            Event::Start(child_start) => {
                let name = element_name(&child_start)?;
                let value = read_element(reader, &child_start, force_array, inline_namespaces)?;
                pending.children.push((name, value));
            }
            Event::Empty(child_start) => {
                let name = element_name(&child_start)?;
                let attrs = attributes_of(&child_start, inline_namespaces)?;
                let value = if attrs.is_empty() {
                    infer_scalar("")
                } else {
                    let mut meta = crate::udm::Metadata::new();
                    meta.insert("__elementName".to_string(), Udm::string(name.clone()));
                    Udm::object(UdmObject {
                        attributes: attrs,
                        metadata: Some(meta),
                        ..UdmObject::new()
                    })
                };
                pending.children.push((name, value));
            }
            Event::Text(t) | Event::CData(t) => {
                let decoded = t
                    .unescape()
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                pending.text.push_str(&decoded);
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(FormatParseError::Malformed {
                    adapter: "xml",
                    message: "unexpected end of document inside element".to_string(),
                    line: 0,
                    column: 0,
                }
                .into());
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(finish_element(&own_name, pending, force_array))
}

fn finish_element(name: &str, pending: PendingElement, force_array: &HashSet<String>) -> Udm {
    let trimmed_text = pending.text.trim().to_string();

    if pending.attributes.is_empty() && pending.children.is_empty() {
        return infer_scalar(&trimmed_text);
    }

    let mut obj = UdmObject {
        attributes: pending.attributes,
        ..UdmObject::new()
    };
    let mut meta = crate::udm::Metadata::new();
    meta.insert("__elementName".to_string(), Udm::string(name.to_string()));
    obj.metadata = Some(meta);

    if !trimmed_text.is_empty() {
        obj.properties.insert("#text".to_string(), infer_scalar(&trimmed_text));
    }

    for (name, value) in pending.children {
        use indexmap::map::Entry;
        match obj.properties.entry(name.clone()) {
            Entry::Occupied(mut e) => {
                let existing = e.get_mut();
                if let Udm::Array(arr) = existing {
                    arr.push(value);
                } else {
                    let prior = std::mem::replace(existing, Udm::Null);
                    let mut arr = crate::udm::UdmArray::new();
                    arr.push(prior);
                    arr.push(value);
                    *existing = Udm::Array(Box::new(arr));
                }
            }
            Entry::Vacant(e) => {
                if force_array.contains(&name) {
                    let mut arr = crate::udm::UdmArray::new();
                    arr.push(value);
                    e.insert(Udm::Array(Box::new(arr)));
                } else {
                    e.insert(value);
                }
            }
        }
    }

    Udm::object(obj)
}

impl Adapter for XmlAdapter {
    fn parse(&self, bytes: &[u8], options: &OptionsMap) -> Result<Udm, UtlxError> {
        let bytes = strip_bom(bytes);
        let force_array: HashSet<String> = option_list_of_strings(options, "arrays").into_iter().collect();
        let mut inline_namespaces = declared_namespaces(options);

        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text = false;
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).map_err(|e| FormatParseError::Malformed {
                adapter: "xml",
                message: e.to_string(),
                line: 0,
                column: 0,
            })? {
                Event::Start(start) => {
                    let mut root = read_element(&mut reader, &start, &force_array, &mut inline_namespaces)?;
                    if !inline_namespaces.is_empty() {
                        if let Udm::Object(obj) = &mut root {
                            let mut meta = obj.metadata.take().unwrap_or_default();
                            let mut ns_obj = UdmObject::new();
                            for (prefix, uri) in inline_namespaces.iter() {
                                ns_obj.properties.insert(prefix.clone(), Udm::string(uri.clone()));
                            }
                            meta.insert("__namespaces".to_string(), Udm::object(ns_obj));
                            obj.metadata = Some(meta);
                        }
                    }
                    return Ok(root);
                }
                Event::Eof => {
                    return Err(FormatParseError::Malformed {
                        adapter: "xml",
                        message: "document has no root element".to_string(),
                        line: 0,
                        column: 0,
                    }
                    .into());
                }
                _ => {}
            }
            buf.clear();
        }
    }

    fn serialize(&self, value: &Udm, options: &OptionsMap) -> Result<Vec<u8>, UtlxError> {
        if matches!(value, Udm::Array(_)) {
            return Err(unrepresentable(
                "top-level value is an Array; XML requires a single root element (wrap it in an Object first)",
            ));
        }
        let root_name = option_str(options, "rootName", "root").to_string();
        let pretty = option_bool(options, "pretty", true);
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        write_element(&root_name, value, 0, pretty, &mut out)?;
        Ok(out.into_bytes())
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

fn write_element(name: &str, value: &Udm, depth: usize, pretty: bool, out: &mut String) -> Result<(), UtlxError> {
    let indent = if pretty { "  ".repeat(depth) } else { String::new() };
    let newline = if pretty { "\n" } else { "" };

    match value {
        Udm::Object(obj) => {
            out.push_str(&indent);
            out.push('<');
            out.push_str(name);
            for (k, v) in obj.attributes.iter() {
                out.push_str(&format!(" {k}=\"{}\"", escape_attr(v)));
            }
            if obj.properties.is_empty() {
                out.push_str("/>");
                out.push_str(newline);
                return Ok(());
            }
            out.push('>');
            out.push_str(newline);
            for (key, child) in obj.properties.iter() {
                if key == "#text" {
                    out.push_str(&escape_text(&child.coerce_to_string()));
                    continue;
                }
                match child {
                    Udm::Array(items) => {
                        for item in items.iter() {
                            write_element(key, item, depth + 1, pretty, out)?;
                        }
                    }
                    other => write_element(key, other, depth + 1, pretty, out)?,
                }
            }
            out.push_str(&indent);
            out.push_str("</");
            out.push_str(name);
            out.push('>');
            out.push_str(newline);
        }
        Udm::Array(items) => {
            for item in items.iter() {
                write_element(name, item, depth, pretty, out)?;
            }
        }
        Udm::Null => {
            out.push_str(&indent);
            out.push_str(&format!("<{name}/>"));
            out.push_str(newline);
        }
        scalar => {
            out.push_str(&indent);
            out.push_str(&format!("<{name}>{}</{name}>", escape_text(&scalar.coerce_to_string())));
            out.push_str(newline);
        }
    }
    Ok(())
}

fn unrepresentable(message: impl Into<String>) -> UtlxError {
    FormatSerializeError::Unrepresentable { adapter: "xml", message: message.into() }.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_leaf_element_collapses_to_string() {
        let adapter = XmlAdapter;
        let opts = OptionsMap::new();
        let udm = adapter.parse(b"<root><name>Ada</name></root>", &opts).unwrap();
        let obj = udm.as_object().unwrap();
        assert_eq!(obj.properties.get("name").unwrap().as_str(), Some("Ada"));
    }

    #[test]
    fn repeated_children_become_an_array() {
        let adapter = XmlAdapter;
        let opts = OptionsMap::new();
        let udm = adapter
            .parse(b"<root><item>1</item><item>2</item></root>", &opts)
            .unwrap();
        let obj = udm.as_object().unwrap();
        assert!(matches!(obj.properties.get("item"), Some(Udm::Array(a)) if a.len() == 2));
    }

    #[test]
    fn attributes_land_in_the_attributes_map_not_properties() {
        let adapter = XmlAdapter;
        let opts = OptionsMap::new();
        let udm = adapter.parse(b"<root id=\"7\"><x>1</x></root>", &opts).unwrap();
        let obj = udm.as_object().unwrap();
        assert_eq!(obj.attributes.get("id").map(String::as_str), Some("7"));
        assert!(!obj.properties.contains_key("id"));
    }

    #[test]
    fn element_name_is_captured_for_template_dispatch() {
        let adapter = XmlAdapter;
        let opts = OptionsMap::new();
        let udm = adapter.parse(b"<Order><id>1</id></Order>", &opts).unwrap();
        let obj = udm.as_object().unwrap();
        let meta = obj.metadata.as_ref().unwrap();
        assert_eq!(meta.get("__elementName").unwrap().as_str(), Some("Order"));
    }

    #[test]
    fn namespace_prefixes_are_preserved_by_default() {
        let adapter = XmlAdapter;
        let opts = OptionsMap::new();
        let udm = adapter
            .parse(
                br#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"><xs:element name="a"/></xs:schema>"#,
                &opts,
            )
            .unwrap();
        let obj = udm.as_object().unwrap();
        assert!(obj.properties.contains_key("xs:element"));
    }

    #[test]
    fn declared_namespaces_option_is_recorded_on_root_metadata() {
        let adapter = XmlAdapter;
        let mut opts = OptionsMap::new();
        let mut ns = indexmap::IndexMap::new();
        ns.insert(
            "foo".to_string(),
            crate::ast::OptionValue::String("urn:example:foo".to_string()),
        );
        opts.insert("namespaces".to_string(), crate::ast::OptionValue::Map(ns));
        let udm = adapter.parse(b"<root><a>1</a></root>", &opts).unwrap();
        let obj = udm.as_object().unwrap();
        let meta = obj.metadata.as_ref().unwrap();
        let declared = meta.get("__namespaces").unwrap().as_object().unwrap();
        assert_eq!(declared.properties.get("foo").unwrap().as_str(), Some("urn:example:foo"));
    }

    #[test]
    fn serializing_a_top_level_array_is_rejected() {
        let adapter = XmlAdapter;
        let opts = OptionsMap::new();
        let arr = Udm::Array(Box::new(vec![Udm::Integer(1), Udm::Integer(2)].into_iter().collect()));
        assert!(adapter.serialize(&arr, &opts).is_err());
    }
}
