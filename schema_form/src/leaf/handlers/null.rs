use crate::leaf::traits::{LeafRenderer, Widget};
use crate::value::Value;
use schema_types::PrimitiveKind;

pub struct NullHandler;

impl LeafRenderer for NullHandler {
    fn kinds(&self) -> &'static [PrimitiveKind] {
        &[PrimitiveKind::Null]
    }

    fn widget(&self, _kind: PrimitiveKind, _multiline: bool) -> Widget {
        Widget::Static
    }

    fn format(&self, _kind: PrimitiveKind, _value: &Value) -> String {
        String::new()
    }

    fn parse(&self, _kind: PrimitiveKind, _input: &str) -> Result<Value, String> {
        Ok(Value::Null)
    }
}
