/* Handler for timestamps (nanoseconds since the Unix epoch) */

use crate::leaf::traits::LeafRenderer;
use crate::value::{format_timestamp, parse_timestamp, Value};
use schema_types::PrimitiveKind;
use serde_json::{Map, Value as JsonValue};

pub struct TimestampHandler;

impl LeafRenderer for TimestampHandler {
    fn kinds(&self) -> &'static [PrimitiveKind] {
        &[PrimitiveKind::Timestamp]
    }

    fn format(&self, _kind: PrimitiveKind, value: &Value) -> String {
        match value {
            Value::Timestamp(nanos) => format_timestamp(*nanos).unwrap_or_else(|| nanos.to_string()),
            _ => String::new(),
        }
    }

    fn parse(&self, _kind: PrimitiveKind, input: &str) -> Result<Value, String> {
        parse_timestamp(input)
            .map(Value::Timestamp)
            .map_err(|e| super::sentence(&e))
    }

    fn enrich(&self, _kind: PrimitiveKind, value: &Value) -> Map<String, JsonValue> {
        let mut enrichment = Map::new();
        if let Value::Timestamp(nanos) = value {
            if let Some(iso) = format_timestamp(*nanos) {
                enrichment.insert("iso8601".to_string(), JsonValue::String(iso));
            }
            enrichment.insert("nanos".to_string(), JsonValue::from(*nanos));
        }
        enrichment
    }
}
