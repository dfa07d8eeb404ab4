use crate::leaf::traits::LeafRenderer;
use crate::value::Value;
use schema_types::PrimitiveKind;

/* Free text, kept exactly as typed */
pub struct TextHandler;

impl LeafRenderer for TextHandler {
    fn kinds(&self) -> &'static [PrimitiveKind] {
        &[PrimitiveKind::Text]
    }

    fn format(&self, _kind: PrimitiveKind, value: &Value) -> String {
        match value {
            Value::Text(s) => s.clone(),
            _ => String::new(),
        }
    }

    fn parse(&self, _kind: PrimitiveKind, input: &str) -> Result<Value, String> {
        Ok(Value::text(input))
    }
}
