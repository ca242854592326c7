//! XSD adapter (§4.5, §4.6). An XSD document is itself XML, so parsing
//! reuses [`crate::formats::xml`] for the tree shape, with two additions
//! the plain XML adapter doesn't make on its own:
//!
//! - the `arrays` hint is pre-populated with the structural element
//!   names that repeat in any schema (`xs:element`, `xs:complexType`,
//!   `xs:simpleType`, `xs:sequence`, `xs:choice`, `xs:attribute`,
//!   `xs:group`, `xs:attributeGroup`) *before* delegating to the XML
//!   parser, merged with whatever `arrays` the caller already supplied.
//! - every schema component declaration (the same name list, minus the
//!   structural grouping ones that aren't themselves named components)
//!   gets a `scope` (`"global"` for a direct child of `<xs:schema>`,
//!   `"local"` otherwise), a `schemaType` (its local tag name), and a
//!   `version` (`"1.0"` or `"1.1"`, detected from `vc:minVersion` on the
//!   schema root) added to its own metadata.
//!
//! It also keeps a root-level `__metadata`-style summary
//! (`metadata["arrays"]`/`metadata["elements"]`) of every named element
//! found anywhere in the schema, keyed by declared `maxOccurs`/`type`,
//! for scripts that want a flat view rather than walking the tree.

use crate::ast::{OptionsMap, OptionValue};
use crate::udm::{Udm, UdmArray, UdmObject};
use crate::error::UtlxError;

use super::xml::XmlAdapter;
use super::Adapter;

pub struct XsdAdapter;

/// Structural XSD element names that repeat within a schema even when
/// only one occurrence appears in a given document.
const STRUCTURAL_ARRAY_HINTS: &[&str] = &[
    "xs:element",
    "xs:complexType",
    "xs:simpleType",
    "xs:sequence",
    "xs:choice",
    "xs:attribute",
    "xs:group",
    "xs:attributeGroup",
];

/// Local (prefix-stripped) names of XSD component declarations that get
/// a `scope`/`schemaType`/`version` metadata entry.
const SCHEMA_COMPONENT_NAMES: &[&str] =
    &["element", "attribute", "complexType", "simpleType", "group", "attributeGroup"];

fn local(name: &str) -> &str {
    name.split_once(':').map(|(_, local)| local).unwrap_or(name)
}

/// Merges the structural array hints into whatever `arrays` option the
/// caller already passed, so the XML parser sees them before it ever
/// builds the tree.
fn with_structural_array_hints(options: &OptionsMap) -> OptionsMap {
    let mut merged = options.clone();
    let mut names: Vec<OptionValue> =
        STRUCTURAL_ARRAY_HINTS.iter().map(|s| OptionValue::String((*s).to_string())).collect();
    if let Some(existing) = options.get("arrays").and_then(OptionValue::as_list) {
        for v in existing {
            if !names.iter().any(|n| n == v) {
                names.push(v.clone());
            }
        }
    }
    merged.insert("arrays".to_string(), OptionValue::List(names));
    merged
}

fn detect_version(root_attrs: &crate::udm::Attributes) -> &'static str {
    if root_attrs.keys().any(|k| local(k) == "minVersion") {
        "1.1"
    } else {
        "1.0"
    }
}

/// Recursively attaches `scope`/`schemaType`/`version` to every schema
/// component declaration. `parent_is_schema_root` is true exactly when
/// `value`'s immediate parent is the `<xs:schema>` (or `<schema>`)
/// document root, which makes `value` itself a "global" declaration.
fn annotate_components(value: &mut Udm, version: &'static str, parent_is_schema_root: bool) {
    let Udm::Object(obj) = value else { return };
    let element_name = obj
        .metadata
        .as_ref()
        .and_then(|m| m.get("__elementName"))
        .and_then(Udm::as_str)
        .map(str::to_string);

    if let Some(name) = &element_name {
        let tag = local(name);
        if SCHEMA_COMPONENT_NAMES.contains(&tag) {
            let scope = if parent_is_schema_root { "global" } else { "local" };
            let meta = obj.metadata.get_or_insert_with(Default::default);
            meta.insert("scope".to_string(), Udm::string(scope));
            meta.insert("schemaType".to_string(), Udm::string(tag.to_string()));
            meta.insert("version".to_string(), Udm::string(version));
        }
    }

    let this_is_schema_root = element_name.as_deref().map(|n| local(n) == "schema").unwrap_or(false);
    for child in obj.properties.values_mut() {
        match child {
            Udm::Array(items) => {
                for item in items.iter_mut() {
                    annotate_components(item, version, this_is_schema_root);
                }
            }
            other => annotate_components(other, version, this_is_schema_root),
        }
    }
}

fn collect_elements(value: &Udm, arrays: &mut Vec<String>, elements: &mut UdmObject) {
    let Some(obj) = value.as_object() else { return };
    let is_element = obj
        .metadata
        .as_ref()
        .and_then(|m| m.get("__elementName"))
        .and_then(Udm::as_str)
        .map(|n| local(n) == "element")
        .unwrap_or(false);

    if is_element {
        if let Some(name) = obj.attributes.get("name") {
            if let Some(type_name) = obj.attributes.get("type") {
                elements.properties.insert(name.clone(), Udm::string(type_name.clone()));
            }
            let max_occurs = obj.attributes.get("maxOccurs").map(String::as_str).unwrap_or("1");
            let is_repeating = max_occurs == "unbounded"
                || max_occurs.parse::<i64>().map(|n| n > 1).unwrap_or(false);
            if is_repeating && !arrays.contains(name) {
                arrays.push(name.clone());
            }
        }
    }

    for child in obj.properties.values() {
        match child {
            Udm::Array(items) => {
                for item in items.iter() {
                    collect_elements(item, arrays, elements);
                }
            }
            other => collect_elements(other, arrays, elements),
        }
    }
}

impl Adapter for XsdAdapter {
    fn parse(&self, bytes: &[u8], options: &OptionsMap) -> Result<Udm, UtlxError> {
        let xml_options = with_structural_array_hints(options);
        let mut schema = XmlAdapter.parse(bytes, &xml_options)?;

        let version = match &schema {
            Udm::Object(obj) => detect_version(&obj.attributes),
            _ => "1.0",
        };
        annotate_components(&mut schema, version, false);

        let mut arrays = Vec::new();
        let mut elements = UdmObject::new();
        collect_elements(&schema, &mut arrays, &mut elements);

        if let Udm::Object(ref mut obj) = schema {
            let mut meta = obj.metadata.take().unwrap_or_default();
            let arrays_udm: UdmArray = arrays.into_iter().map(Udm::string).collect();
            meta.insert("arrays".to_string(), Udm::Array(Box::new(arrays_udm)));
            meta.insert("elements".to_string(), Udm::object(elements));
            obj.metadata = Some(meta);
        }
        Ok(schema)
    }

    fn serialize(&self, value: &Udm, options: &OptionsMap) -> Result<Vec<u8>, UtlxError> {
        XmlAdapter.serialize(value, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
      <xs:element name="Order">
        <xs:complexType>
          <xs:sequence>
            <xs:element name="Item" type="xs:string" maxOccurs="unbounded"/>
            <xs:element name="Id" type="xs:integer"/>
          </xs:sequence>
        </xs:complexType>
      </xs:element>
    </xs:schema>"#;

    #[test]
    fn repeating_elements_are_collected_as_array_hints() {
        let adapter = XsdAdapter;
        let opts = OptionsMap::new();
        let udm = adapter.parse(SCHEMA.as_bytes(), &opts).unwrap();
        let obj = udm.as_object().unwrap();
        let meta = obj.metadata.as_ref().unwrap();
        let arrays = meta.get("arrays").unwrap().as_array().unwrap();
        assert!(arrays.iter().any(|v| v.as_str() == Some("Item")));
    }

    #[test]
    fn structural_array_hints_are_pre_populated_without_an_explicit_option() {
        let adapter = XsdAdapter;
        let opts = OptionsMap::new();
        let udm = adapter.parse(SCHEMA.as_bytes(), &opts).unwrap();
        let obj = udm.as_object().unwrap();
        // a single top-level xs:element still comes back as a one-item array
        assert!(matches!(obj.properties.get("xs:element"), Some(Udm::Array(a)) if a.len() == 1));
    }

    #[test]
    fn global_element_gets_scope_and_schema_type_metadata() {
        let adapter = XsdAdapter;
        let opts = OptionsMap::new();
        let udm = adapter.parse(SCHEMA.as_bytes(), &opts).unwrap();
        let root = udm.as_object().unwrap();
        let order = root.properties.get("xs:element").unwrap().as_array().unwrap()[0]
            .as_object()
            .unwrap();
        let meta = order.metadata.as_ref().unwrap();
        assert_eq!(meta.get("scope").unwrap().as_str(), Some("global"));
        assert_eq!(meta.get("schemaType").unwrap().as_str(), Some("element"));
        assert_eq!(meta.get("version").unwrap().as_str(), Some("1.0"));
    }

    #[test]
    fn vc_min_version_is_detected_as_xsd_1_1() {
        let adapter = XsdAdapter;
        let opts = OptionsMap::new();
        let schema = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:vc="http://www.w3.org/2007/XMLSchema-versioning" vc:minVersion="1.1">
          <xs:element name="Order"/>
        </xs:schema>"#;
        let udm = adapter.parse(schema.as_bytes(), &opts).unwrap();
        let root = udm.as_object().unwrap();
        let order = root.properties.get("xs:element").unwrap().as_array().unwrap()[0]
            .as_object()
            .unwrap();
        let meta = order.metadata.as_ref().unwrap();
        assert_eq!(meta.get("version").unwrap().as_str(), Some("1.1"));
    }
}
