use crate::leaf::traits::{LeafRenderer, Widget};
use crate::value::Value;
use schema_types::PrimitiveKind;

pub struct BoolHandler;

impl LeafRenderer for BoolHandler {
    fn kinds(&self) -> &'static [PrimitiveKind] {
        &[PrimitiveKind::Bool]
    }

    fn widget(&self, _kind: PrimitiveKind, _multiline: bool) -> Widget {
        Widget::Checkbox
    }

    fn format(&self, _kind: PrimitiveKind, value: &Value) -> String {
        match value {
            Value::Bool(true) => "true".to_string(),
            _ => "false".to_string(),
        }
    }

    fn parse(&self, _kind: PrimitiveKind, input: &str) -> Result<Value, String> {
        match input.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" | "" => Ok(Value::Bool(false)),
            _ => Err("Enter true or false".to_string()),
        }
    }
}
