use serde::{Deserialize, Serialize};
use std::fmt;

/* Leaf kinds of the type algebra */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveKind {
    Null,
    Bool,
    Text,
    /* Unbounded unsigned integer */
    Nat,
    /* Unbounded signed integer */
    Int,
    Nat8,
    Nat16,
    Nat32,
    Nat64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    /* Identifier of an account or endpoint, shown in its checksummed text form */
    Principal,
    Blob,
    /* Nanoseconds since the Unix epoch */
    Timestamp,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 18] = [
        PrimitiveKind::Null,
        PrimitiveKind::Bool,
        PrimitiveKind::Text,
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
        PrimitiveKind::Principal,
        PrimitiveKind::Blob,
        PrimitiveKind::Timestamp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Null => "null",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Text => "text",
            PrimitiveKind::Nat => "nat",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Nat8 => "nat8",
            PrimitiveKind::Nat16 => "nat16",
            PrimitiveKind::Nat32 => "nat32",
            PrimitiveKind::Nat64 => "nat64",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
            PrimitiveKind::Principal => "principal",
            PrimitiveKind::Blob => "blob",
            PrimitiveKind::Timestamp => "timestamp",
        }
    }

    /* Kinds edited through a free-text box, where an empty box means "not filled in" */
    pub fn is_text_shaped(&self) -> bool {
        matches!(self, PrimitiveKind::Text | PrimitiveKind::Principal)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Nat
                | PrimitiveKind::Nat8
                | PrimitiveKind::Nat16
                | PrimitiveKind::Nat32
                | PrimitiveKind::Nat64
        )
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int
                | PrimitiveKind::Int8
                | PrimitiveKind::Int16
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveKind::Float32 | PrimitiveKind::Float64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_unsigned() || self.is_signed() || self.is_float()
    }

    /* Bit width of fixed-size integers; None for unbounded and non-integer kinds */
    pub fn fixed_width(&self) -> Option<u32> {
        match self {
            PrimitiveKind::Nat8 | PrimitiveKind::Int8 => Some(8),
            PrimitiveKind::Nat16 | PrimitiveKind::Int16 => Some(16),
            PrimitiveKind::Nat32 | PrimitiveKind::Int32 => Some(32),
            PrimitiveKind::Nat64 | PrimitiveKind::Int64 => Some(64),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/* A named member of a record or a case of a variant */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type", default = "null_type")]
    pub ty: TypeExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

fn null_type() -> TypeExpr {
    TypeExpr::Primitive(PrimitiveKind::Null)
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct RecordType {
    pub fields: Vec<FieldDef>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct VariantType {
    /* Cases without a `type` carry no payload (null) */
    pub cases: Vec<FieldDef>,
}

/* Source form of a type as published by an endpoint.
 * `Ref` names another definition of the same program. */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum TypeExpr {
    Primitive(PrimitiveKind),
    Record(RecordType),
    Variant(VariantType),
    Optional(Box<TypeExpr>),
    Vector(Box<TypeExpr>),
    Tuple(Vec<TypeExpr>),
    Ref(String),
}

impl TypeExpr {
    pub fn reference(name: impl Into<String>) -> Self {
        TypeExpr::Ref(name.into())
    }

    /* Names of every definition this expression refers to, in order of appearance */
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Primitive(_) => {}
            TypeExpr::Record(record) => record
                .fields
                .iter()
                .for_each(|f| f.ty.collect_references(out)),
            TypeExpr::Variant(variant) => variant
                .cases
                .iter()
                .for_each(|c| c.ty.collect_references(out)),
            TypeExpr::Optional(inner) | TypeExpr::Vector(inner) => inner.collect_references(out),
            TypeExpr::Tuple(items) => items.iter().for_each(|t| t.collect_references(out)),
            TypeExpr::Ref(name) => out.push(name.as_str()),
        }
    }
}

/* A named type definition */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct TypeDef {
    pub name: String,
    #[serde(with = "serde_yml::with::singleton_map_recursive")]
    pub kind: TypeExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/* A remote method: its argument and result tuples */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct MethodDef {
    pub name: String,
    #[serde(default, with = "serde_yml::with::singleton_map_recursive")]
    pub args: Vec<TypeExpr>,
    #[serde(default, with = "serde_yml::with::singleton_map_recursive")]
    pub results: Vec<TypeExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typedef_parses_from_singleton_map_yaml() {
        let yaml = r#"
name: Group
kind:
  record:
    fields:
      - name: id
        type:
          primitive: text
      - name: members
        type:
          vector:
            ref: User
"#;
        let def: TypeDef = serde_yml::from_str(yaml).expect("parse typedef");
        assert_eq!(def.name, "Group");
        let TypeExpr::Record(record) = &def.kind else {
            panic!("expected record, got {:?}", def.kind);
        };
        assert_eq!(record.fields.len(), 2);
        assert_eq!(
            record.fields[0].ty,
            TypeExpr::Primitive(PrimitiveKind::Text)
        );
        assert_eq!(def.kind.referenced_names(), vec!["User"]);
    }

    #[test]
    fn variant_case_without_type_is_null() {
        let yaml = r#"
name: Status
kind:
  variant:
    cases:
      - name: Active
      - name: Archived
"#;
        let def: TypeDef = serde_yml::from_str(yaml).expect("parse typedef");
        let TypeExpr::Variant(variant) = &def.kind else {
            panic!("expected variant");
        };
        assert!(variant
            .cases
            .iter()
            .all(|c| c.ty == TypeExpr::Primitive(PrimitiveKind::Null)));
    }

    #[test]
    fn primitive_kind_names_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_name(kind.name()), Some(kind));
        }
        assert!(PrimitiveKind::Principal.is_text_shaped());
        assert!(!PrimitiveKind::Blob.is_text_shaped());
        assert_eq!(PrimitiveKind::Int16.fixed_width(), Some(16));
        assert_eq!(PrimitiveKind::Nat.fixed_width(), None);
    }
}
