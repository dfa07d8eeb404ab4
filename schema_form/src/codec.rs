//! Tuple Payload Codec
//!
//! Binary format for argument and result tuples carried in opaque blob
//! fields:
//!
//! - header: magic `TPL1`, then the tuple arity as ULEB128;
//! - `bool`: one byte, 0 or 1;
//! - `nat` / `int`: ULEB128 / SLEB128;
//! - fixed-width integers and floats: little-endian;
//! - `timestamp`: u64 little-endian nanoseconds;
//! - `text`, `blob`, `principal`: ULEB128 length followed by the bytes;
//! - `null`: nothing;
//! - record: fields in declaration order;
//! - variant: ULEB128 case index, then the case payload;
//! - optional: a 0/1 byte, then the payload when present;
//! - vector: ULEB128 element count, then the elements.
//!
//! Decoding consumes the whole buffer and is bounded by [`DecodeLimits`]:
//! a nesting depth, and a budget of vector elements for the whole payload.
//! A vector whose elements need at least one byte each may not declare more
//! elements than there are bytes left.

use crate::path::FieldPath;
use crate::principal::{Principal, MAX_PRINCIPAL_LEN};
use crate::scope::Scope;
use crate::value::{check_range, Value};
use schema_types::{PrimitiveKind, TypeNode};
use thiserror::Error;

pub const MAGIC: &[u8; 4] = b"TPL1";
pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_MAX_ITEMS: usize = 1 << 20;

/* Bounds on the work a single decode may do */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_depth: usize,
    /* Vector elements across the whole payload */
    pub max_items: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload does not start with the TPL1 header")]
    BadMagic,
    #[error("payload carries {found} values but the method takes {expected}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("payload ended early: need {needed} more bytes, have {available}")]
    UnexpectedEnd { needed: usize, available: usize },
    #[error("{0} bytes left over after decoding")]
    TrailingBytes(usize),
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),
    #[error("invalid optional tag {0:#04x}")]
    InvalidOptionTag(u8),
    #[error("case index {index} is out of range for {cases} cases")]
    InvalidCaseIndex { index: u128, cases: usize },
    #[error("text is not valid UTF-8")]
    InvalidUtf8,
    #[error("value does not fit {0}")]
    OutOfRange(PrimitiveKind),
    #[error("integer encoding overflows")]
    Overflow,
    #[error("nesting deeper than {0} levels")]
    DepthExceeded(usize),
    #[error("payload declares more than {0} vector elements")]
    TooManyItems(usize),
    #[error("principal is longer than {MAX_PRINCIPAL_LEN} bytes")]
    PrincipalTooLong,
    #[error("recursive type '{0}' has no enclosing definition")]
    Unresolved(String),
    #[error("payload type must be a tuple")]
    NotATuple,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("payload type must be a tuple")]
    NotATuple,
    #[error("at '{path}': expected {expected}, found {found}")]
    Mismatch {
        path: FieldPath,
        expected: String,
        found: &'static str,
    },
    #[error("at '{0}': nothing entered")]
    Incomplete(FieldPath),
    #[error("at '{path}': {message}")]
    OutOfRange { path: FieldPath, message: String },
    #[error("at '{0}': unresolved recursive type")]
    Unresolved(FieldPath),
}

/* ============================================================================
   Encoding
   ============================================================================ */

pub fn encode(value: &Value, tuple: &TypeNode) -> Result<Vec<u8>, EncodeError> {
    let TypeNode::Record { fields } = tuple.unwrap_named() else {
        return Err(EncodeError::NotATuple);
    };
    let mut out = MAGIC.to_vec();
    write_uleb(&mut out, fields.len() as u128);

    let mut scope = Scope::new();
    let mut encoder = Encoder { out };
    encoder.value(value, tuple, &mut scope, &FieldPath::root())?;
    Ok(encoder.out)
}

struct Encoder {
    out: Vec<u8>,
}

impl Encoder {
    fn value<'t>(
        &mut self,
        value: &Value,
        node: &'t TypeNode,
        scope: &mut Scope<'t>,
        path: &FieldPath,
    ) -> Result<(), EncodeError> {
        let Some((node, pushed)) = scope.descend(node) else {
            return Err(EncodeError::Unresolved(path.clone()));
        };
        let result = self.structural(value, node, scope, path);
        scope.unwind(pushed);
        result
    }

    fn structural<'t>(
        &mut self,
        value: &Value,
        node: &'t TypeNode,
        scope: &mut Scope<'t>,
        path: &FieldPath,
    ) -> Result<(), EncodeError> {
        let mismatch = || EncodeError::Mismatch {
            path: path.clone(),
            expected: node.kind_name().to_string(),
            found: value.kind_name(),
        };
        match (node, value) {
            (_, Value::Empty) => Err(EncodeError::Incomplete(path.clone())),
            (TypeNode::Primitive { kind }, value) => self.primitive(*kind, value, path),
            (TypeNode::Record { fields }, Value::Record(_)) => {
                for field in fields {
                    let child = path.child(&field.name);
                    let field_value = value.field(&field.name).ok_or_else(|| {
                        EncodeError::Mismatch {
                            path: child.clone(),
                            expected: field.node.kind_name().to_string(),
                            found: "nothing",
                        }
                    })?;
                    self.value(field_value, &field.node, scope, &child)?;
                }
                Ok(())
            }
            (TypeNode::Variant { cases }, Value::Variant(tag, inner)) => {
                let index = cases
                    .iter()
                    .position(|c| c.name == *tag)
                    .ok_or_else(mismatch)?;
                write_uleb(&mut self.out, index as u128);
                self.value(inner, &cases[index].node, scope, &path.child(tag))
            }
            (TypeNode::Optional { .. }, Value::Optional(None)) => {
                self.out.push(0);
                Ok(())
            }
            (TypeNode::Optional { inner }, Value::Optional(Some(v))) => {
                self.out.push(1);
                self.value(v, inner, scope, &path.index(0))
            }
            (TypeNode::Vector { element }, Value::Vector(items)) => {
                write_uleb(&mut self.out, items.len() as u128);
                for (i, item) in items.iter().enumerate() {
                    self.value(item, element, scope, &path.index(i))?;
                }
                Ok(())
            }
            _ => Err(mismatch()),
        }
    }

    fn primitive(
        &mut self,
        kind: PrimitiveKind,
        value: &Value,
        path: &FieldPath,
    ) -> Result<(), EncodeError> {
        if !value.matches_kind(kind) {
            return Err(EncodeError::Mismatch {
                path: path.clone(),
                expected: kind.name().to_string(),
                found: value.kind_name(),
            });
        }
        check_range(kind, value).map_err(|message| EncodeError::OutOfRange {
            path: path.clone(),
            message,
        })?;

        let out = &mut self.out;
        match (kind, value) {
            (PrimitiveKind::Null, _) => {}
            (PrimitiveKind::Bool, Value::Bool(b)) => out.push(u8::from(*b)),
            (PrimitiveKind::Text, Value::Text(s)) => write_bytes(out, s.as_bytes()),
            (PrimitiveKind::Nat, Value::Nat(n)) => write_uleb(out, *n),
            (PrimitiveKind::Int, Value::Int(i)) => write_sleb(out, *i),
            (PrimitiveKind::Nat8, Value::Nat(n)) => out.push(*n as u8),
            (PrimitiveKind::Nat16, Value::Nat(n)) => out.extend_from_slice(&(*n as u16).to_le_bytes()),
            (PrimitiveKind::Nat32, Value::Nat(n)) => out.extend_from_slice(&(*n as u32).to_le_bytes()),
            (PrimitiveKind::Nat64, Value::Nat(n)) => out.extend_from_slice(&(*n as u64).to_le_bytes()),
            (PrimitiveKind::Int8, Value::Int(i)) => out.extend_from_slice(&(*i as i8).to_le_bytes()),
            (PrimitiveKind::Int16, Value::Int(i)) => out.extend_from_slice(&(*i as i16).to_le_bytes()),
            (PrimitiveKind::Int32, Value::Int(i)) => out.extend_from_slice(&(*i as i32).to_le_bytes()),
            (PrimitiveKind::Int64, Value::Int(i)) => out.extend_from_slice(&(*i as i64).to_le_bytes()),
            (PrimitiveKind::Float32, Value::Float(f)) => {
                out.extend_from_slice(&(*f as f32).to_le_bytes())
            }
            (PrimitiveKind::Float64, Value::Float(f)) => out.extend_from_slice(&f.to_le_bytes()),
            (PrimitiveKind::Principal, Value::Principal(p)) => write_bytes(out, p.as_slice()),
            (PrimitiveKind::Blob, Value::Blob(b)) => write_bytes(out, b),
            (PrimitiveKind::Timestamp, Value::Timestamp(t)) => out.extend_from_slice(&t.to_le_bytes()),
            _ => {
                return Err(EncodeError::Mismatch {
                    path: path.clone(),
                    expected: kind.name().to_string(),
                    found: value.kind_name(),
                })
            }
        }
        Ok(())
    }
}

fn write_uleb(out: &mut Vec<u8>, mut n: u128) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn write_sleb(out: &mut Vec<u8>, mut n: i128) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        let done = (n == 0 && byte & 0x40 == 0) || (n == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_uleb(out, bytes.len() as u128);
    out.extend_from_slice(bytes);
}

/* ============================================================================
   Decoding
   ============================================================================ */

pub fn decode(bytes: &[u8], tuple: &TypeNode) -> Result<Value, DecodeError> {
    decode_with_limits(bytes, tuple, DecodeLimits::default())
}

pub fn decode_with_limits(
    bytes: &[u8],
    tuple: &TypeNode,
    limits: DecodeLimits,
) -> Result<Value, DecodeError> {
    let TypeNode::Record { fields } = tuple.unwrap_named() else {
        return Err(DecodeError::NotATuple);
    };

    let mut decoder = Decoder {
        data: bytes,
        pos: 0,
        depth: 0,
        items: 0,
        limits,
    };
    if decoder.take(MAGIC.len())? != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    let arity = decoder.uleb()?;
    if arity != fields.len() as u128 {
        return Err(DecodeError::ArityMismatch {
            expected: fields.len(),
            found: usize::try_from(arity).unwrap_or(usize::MAX),
        });
    }

    let mut scope = Scope::new();
    let value = decoder.value(tuple, &mut scope)?;

    let left = decoder.data.len() - decoder.pos;
    if left != 0 {
        return Err(DecodeError::TrailingBytes(left));
    }
    Ok(value)
}

struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
    items: usize,
    limits: DecodeLimits,
}

impl<'a> Decoder<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.data.len() - self.pos;
        if n > available {
            return Err(DecodeError::UnexpectedEnd {
                needed: n,
                available,
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    fn uleb(&mut self) -> Result<u128, DecodeError> {
        let mut result: u128 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.byte()?;
            let low = (byte & 0x7f) as u128;
            if shift >= 128 || (shift > 121 && low >> (128 - shift) != 0) {
                return Err(DecodeError::Overflow);
            }
            result |= low << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    fn sleb(&mut self) -> Result<i128, DecodeError> {
        let mut result: i128 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.byte()?;
            if shift >= 128 {
                return Err(DecodeError::Overflow);
            }
            result |= ((byte & 0x7f) as i128) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                if shift < 128 && byte & 0x40 != 0 {
                    result |= -1i128 << shift;
                }
                return Ok(result);
            }
        }
    }

    fn len(&mut self) -> Result<usize, DecodeError> {
        let n = self.uleb()?;
        let n = usize::try_from(n).map_err(|_| DecodeError::Overflow)?;
        let available = self.data.len() - self.pos;
        if n > available {
            return Err(DecodeError::UnexpectedEnd {
                needed: n,
                available,
            });
        }
        Ok(n)
    }

    /* Account for `count` elements of at least `width` bytes each */
    fn reserve_items(&mut self, count: usize, width: usize) -> Result<(), DecodeError> {
        let available = self.data.len() - self.pos;
        if width > 0 && count > available / width {
            return Err(DecodeError::UnexpectedEnd {
                needed: count.saturating_mul(width),
                available,
            });
        }
        self.items = self.items.saturating_add(count);
        if self.items > self.limits.max_items {
            return Err(DecodeError::TooManyItems(self.limits.max_items));
        }
        Ok(())
    }

    fn value<'t>(&mut self, node: &'t TypeNode, scope: &mut Scope<'t>) -> Result<Value, DecodeError> {
        if self.depth >= self.limits.max_depth {
            return Err(DecodeError::DepthExceeded(self.limits.max_depth));
        }
        let Some((node, pushed)) = scope.descend(node) else {
            let id = match node {
                TypeNode::Recursive { id } => id.clone(),
                other => other.kind_name().to_string(),
            };
            return Err(DecodeError::Unresolved(id));
        };
        self.depth += 1;
        let result = self.structural(node, scope);
        self.depth -= 1;
        scope.unwind(pushed);
        result
    }

    fn structural<'t>(
        &mut self,
        node: &'t TypeNode,
        scope: &mut Scope<'t>,
    ) -> Result<Value, DecodeError> {
        match node {
            TypeNode::Primitive { kind } => self.primitive(*kind),
            TypeNode::Record { fields } => {
                let mut out = Vec::with_capacity(fields.len());
                for field in fields {
                    out.push((field.name.clone(), self.value(&field.node, scope)?));
                }
                Ok(Value::Record(out))
            }
            TypeNode::Variant { cases } => {
                let index = self.uleb()?;
                let case = usize::try_from(index)
                    .ok()
                    .and_then(|i| cases.get(i))
                    .ok_or(DecodeError::InvalidCaseIndex {
                        index,
                        cases: cases.len(),
                    })?;
                let inner = self.value(&case.node, scope)?;
                Ok(Value::variant(case.name.clone(), inner))
            }
            TypeNode::Optional { inner } => match self.byte()? {
                0 => Ok(Value::none()),
                1 => Ok(Value::some(self.value(inner, scope)?)),
                other => Err(DecodeError::InvalidOptionTag(other)),
            },
            TypeNode::Vector { element } => {
                let count = self.uleb()?;
                let count = usize::try_from(count).map_err(|_| DecodeError::Overflow)?;
                self.reserve_items(count, min_width(element))?;
                let mut items = Vec::new();
                for _ in 0..count {
                    items.push(self.value(element, scope)?);
                }
                Ok(Value::Vector(items))
            }
            TypeNode::Named { id, .. } | TypeNode::Recursive { id } => {
                Err(DecodeError::Unresolved(id.clone()))
            }
        }
    }

    fn primitive(&mut self, kind: PrimitiveKind) -> Result<Value, DecodeError> {
        let value = match kind {
            PrimitiveKind::Null => Value::Null,
            PrimitiveKind::Bool => match self.byte()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => return Err(DecodeError::InvalidBool(other)),
            },
            PrimitiveKind::Text => {
                let len = self.len()?;
                let bytes = self.take(len)?;
                Value::Text(
                    std::str::from_utf8(bytes)
                        .map_err(|_| DecodeError::InvalidUtf8)?
                        .to_string(),
                )
            }
            PrimitiveKind::Nat => Value::Nat(self.uleb()?),
            PrimitiveKind::Int => Value::Int(self.sleb()?),
            PrimitiveKind::Nat8 => Value::Nat(self.byte()? as u128),
            PrimitiveKind::Nat16 => Value::Nat(u16::from_le_bytes(self.array()?) as u128),
            PrimitiveKind::Nat32 => Value::Nat(u32::from_le_bytes(self.array()?) as u128),
            PrimitiveKind::Nat64 => Value::Nat(u64::from_le_bytes(self.array()?) as u128),
            PrimitiveKind::Int8 => Value::Int(i8::from_le_bytes(self.array()?) as i128),
            PrimitiveKind::Int16 => Value::Int(i16::from_le_bytes(self.array()?) as i128),
            PrimitiveKind::Int32 => Value::Int(i32::from_le_bytes(self.array()?) as i128),
            PrimitiveKind::Int64 => Value::Int(i64::from_le_bytes(self.array()?) as i128),
            PrimitiveKind::Float32 => Value::Float(f32::from_le_bytes(self.array()?) as f64),
            PrimitiveKind::Float64 => Value::Float(f64::from_le_bytes(self.array()?)),
            PrimitiveKind::Principal => {
                let len = self.len()?;
                let bytes = self.take(len)?;
                Value::Principal(
                    Principal::from_slice(bytes).map_err(|_| DecodeError::PrincipalTooLong)?,
                )
            }
            PrimitiveKind::Blob => {
                let len = self.len()?;
                Value::Blob(self.take(len)?.to_vec())
            }
            PrimitiveKind::Timestamp => Value::Timestamp(u64::from_le_bytes(self.array()?)),
        };
        check_range(kind, &value).map_err(|_| DecodeError::OutOfRange(kind))?;
        Ok(value)
    }
}

/* Fewest bytes any value of the type encodes to. Back-references count as
 * zero; their enclosing optional, vector or variant already takes a byte. */
fn min_width(node: &TypeNode) -> usize {
    match node {
        TypeNode::Primitive { kind } => match kind {
            PrimitiveKind::Null => 0,
            PrimitiveKind::Float32 => 4,
            PrimitiveKind::Float64 | PrimitiveKind::Timestamp => 8,
            k => k.fixed_width().map(|bits| bits as usize / 8).unwrap_or(1),
        },
        TypeNode::Record { fields } => fields.iter().map(|f| min_width(&f.node)).sum(),
        TypeNode::Variant { .. } | TypeNode::Optional { .. } | TypeNode::Vector { .. } => 1,
        TypeNode::Named { node, .. } => min_width(node),
        TypeNode::Recursive { .. } => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> TypeNode {
        TypeNode::tuple([
            TypeNode::primitive(PrimitiveKind::Text),
            TypeNode::primitive(PrimitiveKind::Int),
            TypeNode::optional(TypeNode::primitive(PrimitiveKind::Nat16)),
        ])
    }

    #[test]
    fn encodes_header_and_fields() {
        let value = Value::record([
            ("0", Value::text("hi")),
            ("1", Value::Int(-1)),
            ("2", Value::some(Value::Nat(0x0102))),
        ]);
        let bytes = encode(&value, &args()).expect("encode");
        assert_eq!(
            bytes,
            vec![b'T', b'P', b'L', b'1', 3, 2, b'h', b'i', 0x7f, 1, 0x02, 0x01]
        );
        assert_eq!(decode(&bytes, &args()), Ok(value));
    }

    #[test]
    fn leb128_edges() {
        for n in [0u128, 127, 128, 300, u64::MAX as u128, u128::MAX] {
            let mut out = Vec::new();
            write_uleb(&mut out, n);
            let mut d = Decoder { data: &out, pos: 0, depth: 0, items: 0, limits: DecodeLimits::default() };
            assert_eq!(d.uleb(), Ok(n));
        }
        for i in [0i128, -1, 63, 64, -64, -65, i64::MIN as i128, i128::MIN, i128::MAX] {
            let mut out = Vec::new();
            write_sleb(&mut out, i);
            let mut d = Decoder { data: &out, pos: 0, depth: 0, items: 0, limits: DecodeLimits::default() };
            assert_eq!(d.sleb(), Ok(i));
        }
    }

    #[test]
    fn arity_must_match() {
        let single = TypeNode::tuple([TypeNode::primitive(PrimitiveKind::Text)]);
        let bytes = encode(&Value::record([("0", Value::text("x"))]), &single).expect("encode");
        let pair = TypeNode::tuple([
            TypeNode::primitive(PrimitiveKind::Nat64),
            TypeNode::primitive(PrimitiveKind::Nat64),
        ]);
        assert_eq!(
            decode(&bytes, &pair),
            Err(DecodeError::ArityMismatch { expected: 2, found: 1 })
        );
    }

    #[test]
    fn rejects_trailing_and_truncated_input() {
        let single = TypeNode::tuple([TypeNode::primitive(PrimitiveKind::Nat32)]);
        let mut bytes = encode(&Value::record([("0", Value::Nat(7))]), &single).expect("encode");
        bytes.push(0);
        assert_eq!(decode(&bytes, &single), Err(DecodeError::TrailingBytes(1)));
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            decode(&bytes, &single),
            Err(DecodeError::UnexpectedEnd { .. })
        ));
        assert_eq!(decode(b"NOPE", &single), Err(DecodeError::BadMagic));
    }

    #[test]
    fn unselected_variant_cannot_be_encoded() {
        let tuple = TypeNode::tuple([TypeNode::variant([(
            "A",
            TypeNode::primitive(PrimitiveKind::Null),
        )])]);
        let err = encode(&Value::record([("0", Value::Empty)]), &tuple).expect_err("incomplete");
        assert_eq!(err, EncodeError::Incomplete(FieldPath::parse("0")));
    }

    #[test]
    fn uninhabitable_recursion_hits_depth_limit() {
        let tuple = TypeNode::tuple([TypeNode::named(
            "Loop",
            TypeNode::record([("again", TypeNode::recursive("Loop"))]),
        )]);
        let bytes = [b'T', b'P', b'L', b'1', 1];
        let limits = DecodeLimits {
            max_depth: 8,
            ..DecodeLimits::default()
        };
        assert_eq!(
            decode_with_limits(&bytes, &tuple, limits),
            Err(DecodeError::DepthExceeded(8))
        );
    }

    fn header_with_count(count: u128) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        write_uleb(&mut bytes, 1);
        write_uleb(&mut bytes, count);
        bytes
    }

    #[test]
    fn element_count_is_bounded_by_remaining_bytes() {
        let tuple = TypeNode::tuple([TypeNode::vector(TypeNode::primitive(PrimitiveKind::Nat32))]);
        let mut bytes = header_with_count(1_000_000);
        bytes.extend_from_slice(&[0; 8]);
        assert_eq!(
            decode(&bytes, &tuple),
            Err(DecodeError::UnexpectedEnd {
                needed: 4_000_000,
                available: 8
            })
        );
    }

    #[test]
    fn zero_width_elements_use_the_item_budget() {
        let tuple = TypeNode::tuple([TypeNode::vector(TypeNode::primitive(PrimitiveKind::Null))]);
        let bytes = header_with_count(5_000_000);
        assert_eq!(
            decode(&bytes, &tuple),
            Err(DecodeError::TooManyItems(DEFAULT_MAX_ITEMS))
        );

        let limits = DecodeLimits {
            max_items: 3,
            ..DecodeLimits::default()
        };
        let small = header_with_count(3);
        assert_eq!(
            decode_with_limits(&small, &tuple, limits),
            Ok(Value::record([(
                "0",
                Value::Vector(vec![Value::Null, Value::Null, Value::Null])
            )]))
        );

        let nested = TypeNode::tuple([TypeNode::vector(TypeNode::vector(TypeNode::primitive(
            PrimitiveKind::Null,
        )))]);
        let mut bytes = header_with_count(2);
        bytes.extend_from_slice(&[2, 2]);
        assert_eq!(
            decode_with_limits(&bytes, &nested, limits),
            Err(DecodeError::TooManyItems(3))
        );
    }

    #[test]
    fn float32_round_trip_is_exact() {
        let tuple = TypeNode::tuple([TypeNode::primitive(PrimitiveKind::Float32)]);
        for f in [1.5, -0.25, 0.1f32 as f64] {
            let value = Value::record([("0", Value::Float(f))]);
            let bytes = encode(&value, &tuple).expect("encode");
            assert_eq!(decode(&bytes, &tuple), Ok(value));
        }
        assert!(matches!(
            encode(&Value::record([("0", Value::Float(0.1))]), &tuple),
            Err(EncodeError::OutOfRange { .. })
        ));
    }
}
