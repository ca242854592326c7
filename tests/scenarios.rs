//! End-to-end scenarios exercising the whole pipeline (lex → parse →
//! interpret → format adapter) through the public `Engine` façade.

use std::collections::HashMap;

use utlx::Engine;

fn run(script: &str, input: &[u8]) -> String {
    let engine = Engine::compile(script).unwrap();
    String::from_utf8(engine.transform(input).unwrap()).unwrap()
}

/// Scenario A — attribute access after an array hint: a schema with
/// repeated `xs:element` nodes, read back as a list of names. Namespace
/// prefixes are always preserved, so `xs:element` in the path
/// expression matches the parsed element name directly.
#[test]
fn scenario_a_attribute_access_after_array_hint() {
    let script = r#"
%utlx 1.0
input xsd { arrays: ["xs:element"] }
output json { pretty: false }
---
{ names: map($input["xs:element"], (e) => e["@name"]) }
"#;
    let schema = br#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
      <xs:element name="customer"/>
      <xs:element name="order"/>
    </xs:schema>"#;
    assert_eq!(run(script, schema), r#"{"names":["customer","order"]}"#);
}

/// Scenario B — XML to JSON with a nested attribute.
#[test]
fn scenario_b_xml_to_json_with_nested_attribute() {
    let script = "%utlx 1.0\ninput xml\noutput json { pretty: false }\n---\n{ id: $input.@id, customer: $input.Customer }";
    let input = br#"<Order id="12345"><Customer>Alice</Customer></Order>"#;
    assert_eq!(run(script, input), r#"{"id":"12345","customer":"Alice"}"#);
}

/// Scenario C — CSV headered parse, identity transform, regional
/// render. Both `Float` and `Integer` cells go through regional
/// formatting (§4.5, §8): Bob's `amount` parses as a bare Integer but
/// still renders as `10,00` under `decimals: 2`.
#[test]
fn scenario_c_csv_headered_parse_and_regional_render() {
    let script = r#"
%utlx 1.0
input csv
output csv { regionalFormat: european, decimals: 2 }
---
$input
"#;
    let input = b"name,amount\nAlice,1234.5\nBob,10\n";
    let out = run(script, input);
    assert!(out.contains("name,amount"));
    assert!(out.contains("Alice,\"1.234,50\""), "got: {out:?}");
    assert!(out.contains("Bob,\"10,00\""), "got: {out:?}");
}

/// Scenario D — YAML multi-document split. `$input` is bound to the
/// raw document text (a JSON string), since `yamlSplitDocuments`
/// operates on text, not an already-parsed UDM tree; each split piece
/// is then parsed with `parseYaml`.
#[test]
fn scenario_d_yaml_multi_document_split() {
    let script = r#"
%utlx 1.0
input json
output json { pretty: false }
---
map(yamlSplitDocuments($input), (doc) => parseYaml(doc))
"#;
    let input = br#""a: 1\n---\nb: 2\n""#;
    assert_eq!(run(script, input), r#"[{"a":1},{"b":2}]"#);
}

/// Scenario E — template declaration + `apply`.
#[test]
fn scenario_e_template_and_apply() {
    let script = r#"
%utlx 1.0
input xml
output json { pretty: false }
---
template match="Items" { { items: apply(@.Item) } }
template match="Item" { { sku: @sku } }
apply($input)
"#;
    let input = br#"<Items><Item sku="A"/><Item sku="B"/></Items>"#;
    assert_eq!(run(script, input), r#"{"items":[{"sku":"A"},{"sku":"B"}]}"#);
}

/// Scenario F — gzip round trip and magic-byte detection. Equality is
/// checked via `base64Encode` since UDM's structural `==` never
/// compares a `Binary` equal to the `String` it was decompressed from
/// (distinct representations, per the `Eq`/`Ne` design note in
/// DESIGN.md).
#[test]
fn scenario_f_gzip_round_trip() {
    let script = r#"
%utlx 1.0
input json
output json { pretty: false }
---
let compressed = gzip($input.payload) =>
{
  wasGzipped: isGzipped(compressed),
  roundTripped: base64Encode(gunzip(compressed)) == base64Encode($input.payload)
}
"#;
    let input = br#"{"payload": "hello utlx"}"#;
    assert_eq!(run(script, input), r#"{"wasGzipped":true,"roundTripped":true}"#);
}

/// Named multi-input, multi-output transform, exercised through
/// [`Engine::transform_multi`] rather than the single-input shorthand.
#[test]
fn multi_input_multi_output_transform() {
    let script = r#"
%utlx 1.0
input json primary
input json secondary
output { merged: json, count: json }
---
{ merged: { a: $input-primary.a, b: $input-secondary.b }, count: 2 }
"#;
    let engine = Engine::compile(script).unwrap();
    let mut inputs = HashMap::new();
    inputs.insert("primary".to_string(), br#"{"a":1}"#.to_vec());
    inputs.insert("secondary".to_string(), br#"{"b":2}"#.to_vec());
    let out = engine.transform_multi(inputs).unwrap();
    match out {
        utlx::TransformOutput::Multi(map) => {
            assert_eq!(
                String::from_utf8(map.get("merged").unwrap().clone()).unwrap(),
                r#"{"a":1,"b":2}"#
            );
            assert_eq!(String::from_utf8(map.get("count").unwrap().clone()).unwrap(), "2");
        }
        utlx::TransformOutput::Single(_) => panic!("expected a named multi-output map"),
    }
}
