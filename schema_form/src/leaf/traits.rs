/* Leaf renderer trait and widget kinds */

use crate::value::Value;
use schema_types::PrimitiveKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/* Input widget a UI layer should use for a leaf */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Widget {
    Text,
    Textarea,
    Number,
    Checkbox,
    /* Nothing to enter */
    Static,
}

/* Converts between a primitive value and the text shown in its control */
pub trait LeafRenderer: Send + Sync {
    /* Kinds this renderer handles */
    fn kinds(&self) -> &'static [PrimitiveKind];

    fn widget(&self, _kind: PrimitiveKind, multiline: bool) -> Widget {
        if multiline {
            Widget::Textarea
        } else {
            Widget::Text
        }
    }

    /* Text shown in the control; the empty string for blank values */
    fn format(&self, kind: PrimitiveKind, value: &Value) -> String;

    /* Parse user input; the error is shown next to the field */
    fn parse(&self, kind: PrimitiveKind, input: &str) -> Result<Value, String>;

    /* Extra display fields merged into the leaf control */
    fn enrich(&self, _kind: PrimitiveKind, _value: &Value) -> Map<String, JsonValue> {
        Map::new()
    }
}
