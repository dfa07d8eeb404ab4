use crate::leaf::traits::LeafRenderer;
use crate::value::{parse_blob, Value};
use schema_types::PrimitiveKind;
use serde_json::{Map, Value as JsonValue};

/* Byte strings as 0x-prefixed hex */
pub struct BlobHandler;

impl LeafRenderer for BlobHandler {
    fn kinds(&self) -> &'static [PrimitiveKind] {
        &[PrimitiveKind::Blob]
    }

    fn format(&self, _kind: PrimitiveKind, value: &Value) -> String {
        match value {
            Value::Blob(bytes) if !bytes.is_empty() => format!("0x{}", hex::encode(bytes)),
            _ => String::new(),
        }
    }

    fn parse(&self, _kind: PrimitiveKind, input: &str) -> Result<Value, String> {
        if input.trim().is_empty() {
            return Ok(Value::Blob(Vec::new()));
        }
        parse_blob(input).map(Value::Blob).map_err(|e| super::sentence(&e))
    }

    fn enrich(&self, _kind: PrimitiveKind, value: &Value) -> Map<String, JsonValue> {
        let mut enrichment = Map::new();
        if let Value::Blob(bytes) = value {
            enrichment.insert("length".to_string(), JsonValue::from(bytes.len()));
        }
        enrichment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_with_or_without_prefix() {
        let handler = BlobHandler;
        assert_eq!(
            handler.parse(PrimitiveKind::Blob, "0x0aff"),
            Ok(Value::Blob(vec![0x0a, 0xff]))
        );
        assert_eq!(
            handler.parse(PrimitiveKind::Blob, "0aff"),
            Ok(Value::Blob(vec![0x0a, 0xff]))
        );
        assert!(handler.parse(PrimitiveKind::Blob, "0xabc").is_err());
        assert_eq!(
            handler.enrich(PrimitiveKind::Blob, &Value::Blob(vec![1, 2, 3]))["length"],
            JsonValue::from(3)
        );
    }
}
