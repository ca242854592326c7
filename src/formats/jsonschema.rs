//! JSON Schema adapter (§4.5). Same tree shape as plain JSON — a
//! schema document has no special grammar of its own beyond JSON's —
//! plus two synthetic metadata properties: `draft`, derived from the
//! `$schema` URI, since scripts that branch on schema vocabulary
//! (draft-07 vs 2020-12) shouldn't have to re-parse that URI themselves;
//! and `usesDefs`, recording whether the schema's reusable definitions
//! live under `$defs` (2019-09+) or the older `definitions` keyword.

use crate::ast::OptionsMap;
use crate::error::UtlxError;
use crate::udm::Udm;

use super::json::JsonAdapter;
use super::Adapter;

pub struct JsonSchemaAdapter;

fn detect_draft(schema_uri: &str) -> &'static str {
    if schema_uri.contains("2020-12") {
        "2020-12"
    } else if schema_uri.contains("2019-09") {
        "2019-09"
    } else if schema_uri.contains("draft-07") || schema_uri.contains("draft7") {
        "draft-07"
    } else if schema_uri.contains("draft-06") {
        "draft-06"
    } else if schema_uri.contains("draft-04") {
        "draft-04"
    } else {
        "unknown"
    }
}

impl Adapter for JsonSchemaAdapter {
    fn parse(&self, bytes: &[u8], options: &OptionsMap) -> Result<Udm, UtlxError> {
        let mut value = JsonAdapter.parse(bytes, options)?;
        if let Udm::Object(ref mut obj) = value {
            let draft = obj
                .properties
                .get("$schema")
                .and_then(Udm::as_str)
                .map(detect_draft)
                .unwrap_or("unknown");
            let uses_defs = obj.properties.contains_key("$defs");
            let uses_definitions = obj.properties.contains_key("definitions");
            let mut meta = obj.metadata.take().unwrap_or_default();
            meta.insert("draft".to_string(), Udm::string(draft));
            meta.insert("usesDefs".to_string(), Udm::Boolean(uses_defs));
            meta.insert("usesDefinitions".to_string(), Udm::Boolean(uses_definitions));
            obj.metadata = Some(meta);
        }
        Ok(value)
    }

    fn serialize(&self, value: &Udm, options: &OptionsMap) -> Result<Vec<u8>, UtlxError> {
        JsonAdapter.serialize(value, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_draft_2020_12_from_schema_uri() {
        let adapter = JsonSchemaAdapter;
        let opts = OptionsMap::new();
        let bytes = br#"{"$schema": "https://json-schema.org/draft/2020-12/schema", "type": "object"}"#;
        let udm = adapter.parse(bytes, &opts).unwrap();
        let obj = udm.as_object().unwrap();
        let meta = obj.metadata.as_ref().unwrap();
        assert_eq!(meta.get("draft").unwrap().as_str(), Some("2020-12"));
    }

    #[test]
    fn detects_defs_vs_definitions_usage() {
        let adapter = JsonSchemaAdapter;
        let opts = OptionsMap::new();

        let with_defs = adapter
            .parse(br#"{"$defs": {"Name": {"type": "string"}}}"#, &opts)
            .unwrap();
        let meta = with_defs.as_object().unwrap().metadata.as_ref().unwrap();
        assert_eq!(meta.get("usesDefs").unwrap().as_bool(), Some(true));
        assert_eq!(meta.get("usesDefinitions").unwrap().as_bool(), Some(false));

        let with_definitions = adapter
            .parse(br#"{"definitions": {"Name": {"type": "string"}}}"#, &opts)
            .unwrap();
        let meta = with_definitions.as_object().unwrap().metadata.as_ref().unwrap();
        assert_eq!(meta.get("usesDefs").unwrap().as_bool(), Some(false));
        assert_eq!(meta.get("usesDefinitions").unwrap().as_bool(), Some(true));
    }
}
