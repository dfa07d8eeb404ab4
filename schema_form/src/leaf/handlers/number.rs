/* Handler for integer and floating point kinds.
 *
 * Unbounded integers are edited as decimal strings so values beyond the
 * range of a JavaScript number survive the round trip through the UI. */

use super::sentence;
use crate::leaf::traits::{LeafRenderer, Widget};
use crate::value::{check_range, Value};
use schema_types::PrimitiveKind;
use serde_json::{Map, Value as JsonValue};

pub struct NumberHandler;

const KINDS: &[PrimitiveKind] = &[
    PrimitiveKind::Nat,
    PrimitiveKind::Int,
    PrimitiveKind::Nat8,
    PrimitiveKind::Nat16,
    PrimitiveKind::Nat32,
    PrimitiveKind::Nat64,
    PrimitiveKind::Int8,
    PrimitiveKind::Int16,
    PrimitiveKind::Int32,
    PrimitiveKind::Int64,
    PrimitiveKind::Float32,
    PrimitiveKind::Float64,
];

impl LeafRenderer for NumberHandler {
    fn kinds(&self) -> &'static [PrimitiveKind] {
        KINDS
    }

    fn widget(&self, kind: PrimitiveKind, _multiline: bool) -> Widget {
        match kind {
            PrimitiveKind::Nat | PrimitiveKind::Int => Widget::Text,
            _ => Widget::Number,
        }
    }

    fn format(&self, _kind: PrimitiveKind, value: &Value) -> String {
        match value {
            Value::Nat(n) => n.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            _ => String::new(),
        }
    }

    fn parse(&self, kind: PrimitiveKind, input: &str) -> Result<Value, String> {
        let input = input.trim().replace('_', "");
        if input.is_empty() {
            return Err("Enter a number".to_string());
        }

        let value = if kind.is_unsigned() {
            if input.starts_with('-') {
                return Err("Must not be negative".to_string());
            }
            Value::Nat(
                input
                    .parse::<u128>()
                    .map_err(|_| "Enter a whole number".to_string())?,
            )
        } else if kind.is_signed() {
            Value::Int(
                input
                    .parse::<i128>()
                    .map_err(|_| "Enter a whole number".to_string())?,
            )
        } else {
            let f = input
                .parse::<f64>()
                .map_err(|_| "Enter a number".to_string())?;
            if kind == PrimitiveKind::Float32 {
                Value::Float(f as f32 as f64)
            } else {
                Value::Float(f)
            }
        };

        check_range(kind, &value).map_err(|m| sentence(&m))?;
        Ok(value)
    }

    fn enrich(&self, kind: PrimitiveKind, _value: &Value) -> Map<String, JsonValue> {
        let mut enrichment = Map::new();
        if let Some(width) = kind.fixed_width() {
            enrichment.insert("bits".to_string(), JsonValue::from(width));
        }
        enrichment
    }
}
