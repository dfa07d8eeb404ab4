use crate::leaf::traits::LeafRenderer;
use crate::principal::Principal;
use crate::value::Value;
use schema_types::PrimitiveKind;

/* Principals are edited in their checksummed text form. An empty box
 * clears the leaf back to "nothing entered", which is distinct from every
 * real principal (the management principal is the empty byte string). */
pub struct PrincipalHandler;

impl LeafRenderer for PrincipalHandler {
    fn kinds(&self) -> &'static [PrimitiveKind] {
        &[PrimitiveKind::Principal]
    }

    fn format(&self, _kind: PrimitiveKind, value: &Value) -> String {
        match value {
            Value::Principal(p) => p.to_text(),
            _ => String::new(),
        }
    }

    fn parse(&self, _kind: PrimitiveKind, input: &str) -> Result<Value, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Value::Empty);
        }
        Principal::from_text(input)
            .map(Value::Principal)
            .map_err(|e| super::sentence(&e.to_string()))
    }
}
