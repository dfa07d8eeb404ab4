/* Caller-owned rendering hooks attached to field settings */

use crate::path::FieldPath;
use crate::value::Value;
use schema_types::TypeNode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Edit,
    View,
}

/* What a caller renderer sees about the field it renders */
pub struct AdornmentContext<'a> {
    pub mode: Mode,
    pub path: &'a FieldPath,
    pub label: &'a str,
    pub node: &'a TypeNode,
    /* None when the value is missing (view skew) */
    pub value: Option<&'a Value>,
    pub errors: &'a [String],
}

pub trait FieldRenderer: Send + Sync {
    fn render(&self, ctx: &AdornmentContext) -> JsonValue;
}

impl<F> FieldRenderer for F
where
    F: Fn(&AdornmentContext) -> JsonValue + Send + Sync,
{
    fn render(&self, ctx: &AdornmentContext) -> JsonValue {
        self(ctx)
    }
}

#[derive(Clone)]
pub enum Adornment {
    /* Caller content is rendered instead of the built-in control */
    Replace(Arc<dyn FieldRenderer>),
    /* Caller content is appended after the built-in control */
    End(Arc<dyn FieldRenderer>),
}

impl Adornment {
    pub fn replace(renderer: impl FieldRenderer + 'static) -> Self {
        Adornment::Replace(Arc::new(renderer))
    }

    pub fn end(renderer: impl FieldRenderer + 'static) -> Self {
        Adornment::End(Arc::new(renderer))
    }

    pub fn render(&self, ctx: &AdornmentContext) -> JsonValue {
        match self {
            Adornment::Replace(r) | Adornment::End(r) => r.render(ctx),
        }
    }
}

impl fmt::Debug for Adornment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adornment::Replace(_) => f.write_str("Adornment::Replace(..)"),
            Adornment::End(_) => f.write_str("Adornment::End(..)"),
        }
    }
}

impl PartialEq for Adornment {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Adornment::Replace(a), Adornment::Replace(b)) | (Adornment::End(a), Adornment::End(b)) => {
                Arc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}
