/* Structured values - the data a form edits and a viewer shows */

use crate::path::{FieldPath, Segment};
use crate::principal::Principal;
use crate::scope::Scope;
use chrono::{DateTime, SecondsFormat, Utc};
use schema_types::{PrimitiveKind, TypeNode};
use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error;

/* A value shaped by a TypeNode.
 *
 * `Empty` marks a position nothing has been entered for yet: a variant
 * whose case has not been chosen, or a principal leaf without input. It
 * only appears inside edit sessions and never survives encoding. */
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Text(String),
    Nat(u128),
    Int(i128),
    Float(f64),
    Principal(Principal),
    Blob(Vec<u8>),
    /* Nanoseconds since the Unix epoch */
    Timestamp(u64),
    Record(Vec<(String, Value)>),
    Variant(String, Box<Value>),
    Optional(Option<Box<Value>>),
    Vector(Vec<Value>),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at '{path}'")]
pub struct ValueError {
    pub path: FieldPath,
    pub message: String,
}

impl ValueError {
    pub fn new(path: &FieldPath, message: impl Into<String>) -> Self {
        Self {
            path: path.clone(),
            message: message.into(),
        }
    }

    fn mismatch(path: &FieldPath, expected: &str, found: &str) -> Self {
        Self::new(path, format!("expected {}, found {}", expected, found))
    }
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    pub fn record<N: Into<String>>(fields: impl IntoIterator<Item = (N, Value)>) -> Self {
        Value::Record(fields.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }

    pub fn variant(tag: impl Into<String>, value: Value) -> Self {
        Value::Variant(tag.into(), Box::new(value))
    }

    pub fn some(value: Value) -> Self {
        Value::Optional(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        Value::Optional(None)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
            Value::Nat(_) => "nat",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Principal(_) => "principal",
            Value::Blob(_) => "blob",
            Value::Timestamp(_) => "timestamp",
            Value::Record(_) => "record",
            Value::Variant(..) => "variant",
            Value::Optional(_) => "optional",
            Value::Vector(_) => "vector",
            Value::Empty => "nothing",
        }
    }

    /* Whether the value carries the representation used for `kind` */
    pub fn matches_kind(&self, kind: PrimitiveKind) -> bool {
        match self {
            Value::Null => kind == PrimitiveKind::Null,
            Value::Bool(_) => kind == PrimitiveKind::Bool,
            Value::Text(_) => kind == PrimitiveKind::Text,
            Value::Nat(_) => kind.is_unsigned(),
            Value::Int(_) => kind.is_signed(),
            Value::Float(_) => kind.is_float(),
            Value::Principal(_) => kind == PrimitiveKind::Principal,
            Value::Blob(_) => kind == PrimitiveKind::Blob,
            Value::Timestamp(_) => kind == PrimitiveKind::Timestamp,
            _ => false,
        }
    }

    /* "Nothing entered" for the purposes of the required rule */
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Text(s) => s.trim().is_empty(),
            Value::Blob(b) => b.is_empty(),
            Value::Vector(items) => items.is_empty(),
            Value::Optional(None) | Value::Empty => true,
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Nat(n) => Some(*n as f64),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Timestamp(t) => Some(*t as f64),
            _ => None,
        }
    }

    /* Length used by the length validators */
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::Text(s) => Some(s.chars().count()),
            Value::Blob(b) => Some(b.len()),
            Value::Vector(items) => Some(items.len()),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn child(&self, segment: &Segment) -> Option<&Value> {
        match (self, segment) {
            (Value::Record(_), Segment::Name(n)) => self.field(n),
            (Value::Record(_), Segment::Index(i)) => self.field(&i.to_string()),
            (Value::Variant(tag, v), Segment::Name(n)) if tag == n => Some(v.as_ref()),
            (Value::Variant(tag, v), Segment::Index(i)) if *tag == i.to_string() => {
                Some(v.as_ref())
            }
            (Value::Optional(Some(v)), Segment::Index(0)) => Some(v.as_ref()),
            (Value::Vector(items), Segment::Index(i)) => items.get(*i),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, segment: &Segment) -> Option<&mut Value> {
        match (self, segment) {
            (Value::Record(fields), Segment::Name(n)) => {
                fields.iter_mut().find(|(k, _)| k == n).map(|(_, v)| v)
            }
            (Value::Record(fields), Segment::Index(i)) => {
                let name = i.to_string();
                fields.iter_mut().find(|(k, _)| *k == name).map(|(_, v)| v)
            }
            (Value::Variant(tag, v), seg) => {
                let selected = match seg {
                    Segment::Name(n) => tag == n,
                    Segment::Index(i) => *tag == i.to_string(),
                    _ => false,
                };
                if selected {
                    Some(v.as_mut())
                } else {
                    None
                }
            }
            (Value::Optional(Some(v)), Segment::Index(0)) => Some(v.as_mut()),
            (Value::Vector(items), Segment::Index(i)) => items.get_mut(*i),
            _ => None,
        }
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(self, |value, segment| value.child(segment))
    }

    pub fn get_mut(&mut self, path: &FieldPath) -> Option<&mut Value> {
        let mut value = self;
        for segment in path.segments() {
            value = value.child_mut(segment)?;
        }
        Some(value)
    }

    /* ========================================================================
       JSON conversion
       ======================================================================== */

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null | Value::Empty | Value::Optional(None) => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Nat(n) => match u64::try_from(*n) {
                Ok(small) => JsonValue::Number(small.into()),
                Err(_) => JsonValue::String(n.to_string()),
            },
            Value::Int(i) => match i64::try_from(*i) {
                Ok(small) => JsonValue::Number(small.into()),
                Err(_) => JsonValue::String(i.to_string()),
            },
            Value::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(f.to_string())),
            Value::Principal(p) => JsonValue::String(p.to_text()),
            Value::Blob(bytes) => JsonValue::String(format!("0x{}", hex::encode(bytes))),
            Value::Timestamp(nanos) => match format_timestamp(*nanos) {
                Some(text) => JsonValue::String(text),
                None => JsonValue::Number((*nanos).into()),
            },
            Value::Record(fields) => {
                let mut map = Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json());
                }
                JsonValue::Object(map)
            }
            Value::Variant(tag, value) => {
                let mut map = Map::new();
                map.insert(tag.clone(), value.to_json());
                JsonValue::Object(map)
            }
            Value::Optional(Some(value)) => value.to_json(),
            Value::Vector(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
        }
    }

    /* Convert plain JSON into a value of the given type */
    pub fn from_json(json: &JsonValue, node: &TypeNode) -> Result<Value, ValueError> {
        let mut scope = Scope::new();
        Self::from_json_in(json, node, &mut scope, &FieldPath::root())
    }

    pub(crate) fn from_json_in<'t>(
        json: &JsonValue,
        node: &'t TypeNode,
        scope: &mut Scope<'t>,
        path: &FieldPath,
    ) -> Result<Value, ValueError> {
        let Some((node, pushed)) = scope.descend(node) else {
            return Err(ValueError::new(path, "unresolved recursive type"));
        };
        let result = Self::from_json_structural(json, node, scope, path);
        scope.unwind(pushed);
        result
    }

    /* Best-effort conversion for display. Positions that do not convert
     * keep an untyped rendition of the JSON so the viewer can show them as
     * unknown; absent record fields are left out. */
    pub fn from_json_lenient(json: &JsonValue, node: &TypeNode) -> Value {
        let mut scope = Scope::new();
        Self::lenient_in(json, node, &mut scope, &FieldPath::root())
    }

    fn lenient_in<'t>(
        json: &JsonValue,
        node: &'t TypeNode,
        scope: &mut Scope<'t>,
        path: &FieldPath,
    ) -> Value {
        if let Ok(value) = Self::from_json_in(json, node, scope, path) {
            return value;
        }
        let Some((structural, pushed)) = scope.descend(node) else {
            return untyped(json);
        };
        let value = match (structural, json) {
            (TypeNode::Record { fields }, JsonValue::Object(map)) => Value::Record(
                fields
                    .iter()
                    .filter_map(|field| {
                        let item = map.get(&field.name)?;
                        let child = path.child(&field.name);
                        Some((field.name.clone(), Self::lenient_in(item, &field.node, scope, &child)))
                    })
                    .collect(),
            ),
            (TypeNode::Variant { cases }, JsonValue::Object(map)) if map.len() == 1 => {
                match map.iter().next() {
                    Some((tag, inner)) => match cases.iter().find(|c| c.name == *tag) {
                        Some(case) => Value::variant(
                            tag.clone(),
                            Self::lenient_in(inner, &case.node, scope, &path.child(tag)),
                        ),
                        None => untyped(json),
                    },
                    None => untyped(json),
                }
            }
            (TypeNode::Optional { inner }, other) if !other.is_null() => {
                Value::some(Self::lenient_in(other, inner, scope, &path.index(0)))
            }
            (TypeNode::Vector { element }, JsonValue::Array(items)) => Value::Vector(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Self::lenient_in(item, element, scope, &path.index(i)))
                    .collect(),
            ),
            _ => untyped(json),
        };
        scope.unwind(pushed);
        value
    }

    fn from_json_structural<'t>(
        json: &JsonValue,
        node: &'t TypeNode,
        scope: &mut Scope<'t>,
        path: &FieldPath,
    ) -> Result<Value, ValueError> {
        match node {
            TypeNode::Primitive { kind } => primitive_from_json(json, *kind, path),
            TypeNode::Record { fields } => {
                let mut out = Vec::with_capacity(fields.len());
                match json {
                    JsonValue::Object(map) => {
                        for field in fields {
                            let child = path.child(&field.name);
                            let value = match map.get(&field.name) {
                                Some(j) => Self::from_json_in(j, &field.node, scope, &child)?,
                                None if is_optional(&field.node, scope) => Value::none(),
                                None => {
                                    return Err(ValueError::new(&child, "missing field"));
                                }
                            };
                            out.push((field.name.clone(), value));
                        }
                    }
                    JsonValue::Array(items) if node.is_tuple() => {
                        if items.len() != fields.len() {
                            return Err(ValueError::new(
                                path,
                                format!("expected {} items, found {}", fields.len(), items.len()),
                            ));
                        }
                        for (field, item) in fields.iter().zip(items) {
                            let child = path.child(&field.name);
                            out.push((
                                field.name.clone(),
                                Self::from_json_in(item, &field.node, scope, &child)?,
                            ));
                        }
                    }
                    other => return Err(ValueError::mismatch(path, "record", json_kind(other))),
                }
                Ok(Value::Record(out))
            }
            TypeNode::Variant { cases } => match json {
                JsonValue::Null => Ok(Value::Empty),
                JsonValue::String(tag) => {
                    let case = cases
                        .iter()
                        .find(|c| c.name == *tag)
                        .ok_or_else(|| ValueError::new(path, format!("unknown case '{}'", tag)))?;
                    let child = path.child(tag);
                    let value = Self::from_json_in(&JsonValue::Null, &case.node, scope, &child)?;
                    Ok(Value::variant(tag.clone(), value))
                }
                JsonValue::Object(map) if map.len() == 1 => {
                    let Some((tag, inner)) = map.iter().next() else {
                        return Err(ValueError::new(path, "empty variant object"));
                    };
                    let case = cases
                        .iter()
                        .find(|c| c.name == *tag)
                        .ok_or_else(|| ValueError::new(path, format!("unknown case '{}'", tag)))?;
                    let child = path.child(tag);
                    let value = Self::from_json_in(inner, &case.node, scope, &child)?;
                    Ok(Value::variant(tag.clone(), value))
                }
                other => Err(ValueError::mismatch(path, "variant", json_kind(other))),
            },
            TypeNode::Optional { inner } => match json {
                JsonValue::Null => Ok(Value::none()),
                other => Ok(Value::some(Self::from_json_in(
                    other,
                    inner,
                    scope,
                    &path.index(0),
                )?)),
            },
            TypeNode::Vector { element } => match json {
                JsonValue::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Self::from_json_in(item, element, scope, &path.index(i)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Vector),
                other => Err(ValueError::mismatch(path, "vector", json_kind(other))),
            },
            TypeNode::Named { .. } | TypeNode::Recursive { .. } => {
                Err(ValueError::new(path, "unresolved recursive type"))
            }
        }
    }

    /* ========================================================================
       Conformance
       ======================================================================== */

    /* Strict check: the value is complete and fits the type */
    pub fn check(&self, node: &TypeNode) -> Result<(), ValueError> {
        let mut scope = Scope::new();
        self.conforms_in(node, &mut scope, &FieldPath::root(), false)
    }

    /* Like `check`, but positions still `Empty` are accepted */
    pub fn check_partial(&self, node: &TypeNode) -> Result<(), ValueError> {
        let mut scope = Scope::new();
        self.conforms_in(node, &mut scope, &FieldPath::root(), true)
    }

    pub(crate) fn conforms_in<'t>(
        &self,
        node: &'t TypeNode,
        scope: &mut Scope<'t>,
        path: &FieldPath,
        allow_empty: bool,
    ) -> Result<(), ValueError> {
        let Some((node, pushed)) = scope.descend(node) else {
            return Err(ValueError::new(path, "unresolved recursive type"));
        };
        let result = self.conforms_structural(node, scope, path, allow_empty);
        scope.unwind(pushed);
        result
    }

    fn conforms_structural<'t>(
        &self,
        node: &'t TypeNode,
        scope: &mut Scope<'t>,
        path: &FieldPath,
        allow_empty: bool,
    ) -> Result<(), ValueError> {
        match (node, self) {
            (TypeNode::Primitive { .. } | TypeNode::Variant { .. }, Value::Empty) if allow_empty => {
                Ok(())
            }
            (TypeNode::Primitive { .. }, Value::Empty) => Err(ValueError::new(path, "nothing entered")),
            (TypeNode::Primitive { kind }, value) => {
                if !value.matches_kind(*kind) {
                    return Err(ValueError::mismatch(path, kind.name(), value.kind_name()));
                }
                check_range(*kind, value).map_err(|message| ValueError::new(path, message))
            }
            (TypeNode::Record { fields }, Value::Record(values)) => {
                if values.len() != fields.len() {
                    return Err(ValueError::new(
                        path,
                        format!("expected {} fields, found {}", fields.len(), values.len()),
                    ));
                }
                for field in fields {
                    let child = path.child(&field.name);
                    let value = self
                        .field(&field.name)
                        .ok_or_else(|| ValueError::new(&child, "missing field"))?;
                    value.conforms_in(&field.node, scope, &child, allow_empty)?;
                }
                Ok(())
            }
            (TypeNode::Variant { .. }, Value::Empty) => {
                Err(ValueError::new(path, "no case selected"))
            }
            (TypeNode::Variant { cases }, Value::Variant(tag, value)) => {
                let case = cases
                    .iter()
                    .find(|c| c.name == *tag)
                    .ok_or_else(|| ValueError::new(path, format!("unknown case '{}'", tag)))?;
                value.conforms_in(&case.node, scope, &path.child(tag), allow_empty)
            }
            (TypeNode::Optional { .. }, Value::Optional(None)) => Ok(()),
            (TypeNode::Optional { inner }, Value::Optional(Some(value))) => {
                value.conforms_in(inner, scope, &path.index(0), allow_empty)
            }
            (TypeNode::Vector { element }, Value::Vector(items)) => {
                for (i, item) in items.iter().enumerate() {
                    item.conforms_in(element, scope, &path.index(i), allow_empty)?;
                }
                Ok(())
            }
            (node, value) => Err(ValueError::mismatch(path, node.kind_name(), value.kind_name())),
        }
    }
}

fn is_optional<'t>(node: &'t TypeNode, scope: &mut Scope<'t>) -> bool {
    match scope.descend(node) {
        Some((node, pushed)) => {
            scope.unwind(pushed);
            matches!(node, TypeNode::Optional { .. })
        }
        None => false,
    }
}

/* JSON carried over without a type to guide it */
fn untyped(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(u) = n.as_u64() {
                Value::Nat(u.into())
            } else if let Some(i) = n.as_i64() {
                Value::Int(i.into())
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Value::text(s.clone()),
        JsonValue::Array(items) => Value::Vector(items.iter().map(untyped).collect()),
        JsonValue::Object(map) => Value::Record(
            map.iter()
                .map(|(name, item)| (name.clone(), untyped(item)))
                .collect(),
        ),
    }
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/* Range check for fixed-width integer kinds and float32 precision; other
 * kinds always pass */
pub fn check_range(kind: PrimitiveKind, value: &Value) -> Result<(), String> {
    if let (PrimitiveKind::Float32, Value::Float(f)) = (kind, value) {
        if !f.is_nan() && (*f as f32) as f64 != *f {
            return Err(format!("{} is not representable as {}", f, kind));
        }
        return Ok(());
    }
    let Some(width) = kind.fixed_width() else {
        return Ok(());
    };
    match value {
        Value::Nat(n) => {
            let max = (1u128 << width) - 1;
            if *n > max {
                return Err(format!("must be at most {} for {}", max, kind));
            }
        }
        Value::Int(i) => {
            let max = (1i128 << (width - 1)) - 1;
            let min = -(1i128 << (width - 1));
            if *i < min || *i > max {
                return Err(format!("must be between {} and {} for {}", min, max, kind));
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn format_timestamp(nanos: u64) -> Option<String> {
    let nanos = i64::try_from(nanos).ok()?;
    Some(DateTime::<Utc>::from_timestamp_nanos(nanos).to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn parse_timestamp(text: &str) -> Result<u64, String> {
    let text = text.trim();
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return text
            .parse::<u64>()
            .map_err(|_| "timestamp is out of range".to_string());
    }
    let parsed = DateTime::parse_from_rfc3339(text)
        .map_err(|_| "enter an RFC 3339 date, e.g. 2024-01-31T12:00:00Z".to_string())?;
    parsed
        .timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| "timestamp is out of range".to_string())
}

pub fn parse_blob(text: &str) -> Result<Vec<u8>, String> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(digits).map_err(|_| "enter hex bytes, e.g. 0x0a1b".to_string())
}

fn primitive_from_json(
    json: &JsonValue,
    kind: PrimitiveKind,
    path: &FieldPath,
) -> Result<Value, ValueError> {
    let mismatch = || ValueError::mismatch(path, kind.name(), json_kind(json));
    let value = match kind {
        PrimitiveKind::Null => match json {
            JsonValue::Null => Value::Null,
            _ => return Err(mismatch()),
        },
        PrimitiveKind::Bool => match json {
            JsonValue::Bool(b) => Value::Bool(*b),
            _ => return Err(mismatch()),
        },
        PrimitiveKind::Text => match json {
            JsonValue::String(s) => Value::Text(s.clone()),
            _ => return Err(mismatch()),
        },
        k if k.is_unsigned() => match json {
            JsonValue::Number(n) => Value::Nat(n.as_u64().ok_or_else(mismatch)? as u128),
            JsonValue::String(s) => Value::Nat(
                s.trim()
                    .parse::<u128>()
                    .map_err(|_| ValueError::new(path, format!("'{}' is not a {}", s, kind)))?,
            ),
            _ => return Err(mismatch()),
        },
        k if k.is_signed() => match json {
            JsonValue::Number(n) => Value::Int(n.as_i64().ok_or_else(mismatch)? as i128),
            JsonValue::String(s) => Value::Int(
                s.trim()
                    .parse::<i128>()
                    .map_err(|_| ValueError::new(path, format!("'{}' is not a {}", s, kind)))?,
            ),
            _ => return Err(mismatch()),
        },
        k if k.is_float() => {
            let f = match json {
                JsonValue::Number(n) => n.as_f64().ok_or_else(mismatch)?,
                JsonValue::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ValueError::new(path, format!("'{}' is not a {}", s, kind)))?,
                _ => return Err(mismatch()),
            };
            if kind == PrimitiveKind::Float32 {
                Value::Float(f as f32 as f64)
            } else {
                Value::Float(f)
            }
        }
        PrimitiveKind::Principal => match json {
            JsonValue::String(s) => Value::Principal(
                Principal::from_text(s).map_err(|e| ValueError::new(path, e.to_string()))?,
            ),
            _ => return Err(mismatch()),
        },
        PrimitiveKind::Blob => match json {
            JsonValue::String(s) => {
                Value::Blob(parse_blob(s).map_err(|e| ValueError::new(path, e))?)
            }
            JsonValue::Array(items) => Value::Blob(
                items
                    .iter()
                    .map(|item| {
                        item.as_u64()
                            .and_then(|b| u8::try_from(b).ok())
                            .ok_or_else(|| ValueError::new(path, "blob items must be bytes"))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            _ => return Err(mismatch()),
        },
        PrimitiveKind::Timestamp => match json {
            JsonValue::Number(n) => Value::Timestamp(n.as_u64().ok_or_else(mismatch)?),
            JsonValue::String(s) => {
                Value::Timestamp(parse_timestamp(s).map_err(|e| ValueError::new(path, e))?)
            }
            _ => return Err(mismatch()),
        },
        _ => return Err(mismatch()),
    };
    check_range(kind, &value).map_err(|message| ValueError::new(path, message))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person() -> TypeNode {
        TypeNode::record([
            ("name", TypeNode::primitive(PrimitiveKind::Text)),
            ("age", TypeNode::primitive(PrimitiveKind::Nat8)),
            (
                "nickname",
                TypeNode::optional(TypeNode::primitive(PrimitiveKind::Text)),
            ),
            (
                "role",
                TypeNode::variant([
                    ("Admin", TypeNode::primitive(PrimitiveKind::Null)),
                    ("Member", TypeNode::primitive(PrimitiveKind::Nat)),
                ]),
            ),
        ])
    }

    #[test]
    fn json_round_trip_through_type() {
        let json = json!({"name": "ada", "age": 36, "nickname": null, "role": {"Member": 7}});
        let value = Value::from_json(&json, &person()).expect("convert");
        assert_eq!(value.get(&FieldPath::parse("role.Member")), Some(&Value::Nat(7)));
        assert_eq!(value.to_json(), json);
        value.check(&person()).expect("conforms");
    }

    #[test]
    fn missing_optional_field_defaults_to_none() {
        let json = json!({"name": "ada", "age": 1, "role": "Admin"});
        let value = Value::from_json(&json, &person()).expect("convert");
        assert_eq!(value.field("nickname"), Some(&Value::none()));
        assert_eq!(
            value.field("role"),
            Some(&Value::variant("Admin", Value::Null))
        );
    }

    #[test]
    fn fixed_width_range_is_enforced() {
        let json = json!({"name": "ada", "age": 300, "role": "Admin"});
        let err = Value::from_json(&json, &person()).expect_err("out of range");
        assert_eq!(err.path, FieldPath::parse("age"));
    }

    #[test]
    fn large_numbers_become_strings() {
        let big = Value::Nat(u64::MAX as u128 + 1);
        assert_eq!(big.to_json(), json!("18446744073709551616"));
        let back =
            Value::from_json(&big.to_json(), &TypeNode::primitive(PrimitiveKind::Nat)).expect("nat");
        assert_eq!(back, big);
    }

    #[test]
    fn blobs_principals_and_timestamps_use_text_forms() {
        assert_eq!(Value::Blob(vec![0x0a, 0xff]).to_json(), json!("0x0aff"));
        assert_eq!(
            Value::Principal(Principal::anonymous()).to_json(),
            json!("2vxsx-fae")
        );
        assert_eq!(
            Value::Timestamp(1_000_000_000).to_json(),
            json!("1970-01-01T00:00:01Z")
        );
        let ts = Value::from_json(
            &json!("1970-01-01T00:00:01Z"),
            &TypeNode::primitive(PrimitiveKind::Timestamp),
        )
        .expect("timestamp");
        assert_eq!(ts, Value::Timestamp(1_000_000_000));
    }

    #[test]
    fn tuples_accept_arrays() {
        let tuple = TypeNode::tuple([
            TypeNode::primitive(PrimitiveKind::Text),
            TypeNode::primitive(PrimitiveKind::Int16),
        ]);
        let value = Value::from_json(&json!(["x", -5]), &tuple).expect("tuple");
        assert_eq!(value, Value::record([("0", Value::text("x")), ("1", Value::Int(-5))]));
    }

    #[test]
    fn unselected_variant_is_partial_only() {
        let node = TypeNode::variant([("A", TypeNode::primitive(PrimitiveKind::Null))]);
        assert!(Value::Empty.check_partial(&node).is_ok());
        assert!(Value::Empty.check(&node).is_err());
    }

    #[test]
    fn recursive_values_resolve_through_scope() {
        let list = TypeNode::named(
            "List",
            TypeNode::record([
                ("head", TypeNode::primitive(PrimitiveKind::Nat)),
                ("tail", TypeNode::optional(TypeNode::recursive("List"))),
            ]),
        );
        let json = json!({"head": 1, "tail": {"head": 2, "tail": null}});
        let value = Value::from_json(&json, &list).expect("list");
        assert_eq!(
            value.get(&FieldPath::parse("tail.0.head")),
            Some(&Value::Nat(2))
        );
        value.check(&list).expect("conforms");
    }

    #[test]
    fn float32_accepts_only_representable_values() {
        let node = TypeNode::primitive(PrimitiveKind::Float32);
        assert!(Value::Float(0.5).check(&node).is_ok());
        assert!(Value::Float(0.1).check(&node).is_err());
        assert!(Value::Float(0.1).check(&TypeNode::primitive(PrimitiveKind::Float64)).is_ok());

        let narrowed = Value::from_json(&json!(0.1), &node).expect("float32");
        assert_eq!(narrowed, Value::Float(0.1f32 as f64));
        narrowed.check(&node).expect("narrowed value conforms");
    }

    #[test]
    fn variant_payload_is_reachable_mutably() {
        let mut value = Value::record([("status", Value::variant("Suspended", Value::text("a")))]);
        if let Some(slot) = value.get_mut(&FieldPath::parse("status.Suspended")) {
            *slot = Value::text("b");
        }
        assert_eq!(
            value.get(&FieldPath::parse("status.Suspended")),
            Some(&Value::text("b"))
        );
        assert!(value.get_mut(&FieldPath::parse("status.Active")).is_none());
    }

    #[test]
    fn get_mut_reaches_vector_elements() {
        let mut value = Value::record([("tags", Value::Vector(vec![Value::text("a")]))]);
        if let Some(slot) = value.get_mut(&FieldPath::parse("tags.0")) {
            *slot = Value::text("b");
        }
        assert_eq!(
            value.get(&FieldPath::parse("tags.0")),
            Some(&Value::text("b"))
        );
        assert!(value.get(&FieldPath::parse("tags.1")).is_none());
    }
}
