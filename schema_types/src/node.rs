use crate::types::PrimitiveKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/* A record field or variant case in resolved form */
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct FieldNode {
    pub name: String,
    pub node: TypeNode,
}

/* Normalized type tree.
 *
 * `Named` is a transparent anchor emitted whenever a named definition is
 * expanded. It adds no path segment; `Recursive(id)` refers back to the
 * nearest enclosing `Named` carrying the same id. */
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TypeNode {
    Primitive { kind: PrimitiveKind },
    Record { fields: Vec<FieldNode> },
    Variant { cases: Vec<FieldNode> },
    Optional { inner: Box<TypeNode> },
    Vector { element: Box<TypeNode> },
    Recursive { id: String },
    Named { id: String, node: Box<TypeNode> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("recursive reference '{0}' has no enclosing definition")]
    DanglingRecursion(String),
    #[error("duplicate name '{name}' in {container}")]
    DuplicateName { container: &'static str, name: String },
}

impl TypeNode {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeNode::Primitive { kind }
    }

    pub fn record<N: Into<String>>(fields: impl IntoIterator<Item = (N, TypeNode)>) -> Self {
        TypeNode::Record {
            fields: fields
                .into_iter()
                .map(|(name, node)| FieldNode {
                    name: name.into(),
                    node,
                })
                .collect(),
        }
    }

    pub fn variant<N: Into<String>>(cases: impl IntoIterator<Item = (N, TypeNode)>) -> Self {
        TypeNode::Variant {
            cases: cases
                .into_iter()
                .map(|(name, node)| FieldNode {
                    name: name.into(),
                    node,
                })
                .collect(),
        }
    }

    pub fn optional(inner: TypeNode) -> Self {
        TypeNode::Optional {
            inner: Box::new(inner),
        }
    }

    pub fn vector(element: TypeNode) -> Self {
        TypeNode::Vector {
            element: Box::new(element),
        }
    }

    pub fn recursive(id: impl Into<String>) -> Self {
        TypeNode::Recursive { id: id.into() }
    }

    pub fn named(id: impl Into<String>, node: TypeNode) -> Self {
        TypeNode::Named {
            id: id.into(),
            node: Box::new(node),
        }
    }

    /* Function-argument tuple: a record with positional field names */
    pub fn tuple(items: impl IntoIterator<Item = TypeNode>) -> Self {
        TypeNode::Record {
            fields: items
                .into_iter()
                .enumerate()
                .map(|(i, node)| FieldNode {
                    name: i.to_string(),
                    node,
                })
                .collect(),
        }
    }

    /* Strip any `Named` anchors */
    pub fn unwrap_named(&self) -> &TypeNode {
        let mut node = self;
        while let TypeNode::Named { node: inner, .. } = node {
            node = inner;
        }
        node
    }

    pub fn is_tuple(&self) -> bool {
        match self.unwrap_named() {
            TypeNode::Record { fields } => fields
                .iter()
                .enumerate()
                .all(|(i, f)| f.name == i.to_string()),
            _ => false,
        }
    }

    /* Short constructor name used in diagnostics */
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeNode::Primitive { kind } => kind.name(),
            TypeNode::Record { .. } => "record",
            TypeNode::Variant { .. } => "variant",
            TypeNode::Optional { .. } => "optional",
            TypeNode::Vector { .. } => "vector",
            TypeNode::Recursive { .. } => "recursive",
            TypeNode::Named { node, .. } => node.kind_name(),
        }
    }

    /* Check that every back-reference has an enclosing anchor and that
     * record fields and variant cases are unique. */
    pub fn validate(&self) -> Result<(), NodeError> {
        let mut anchors = Vec::new();
        self.validate_in(&mut anchors)
    }

    fn validate_in<'a>(&'a self, anchors: &mut Vec<&'a str>) -> Result<(), NodeError> {
        match self {
            TypeNode::Primitive { .. } => Ok(()),
            TypeNode::Record { fields } => {
                check_unique("record", fields)?;
                fields.iter().try_for_each(|f| f.node.validate_in(anchors))
            }
            TypeNode::Variant { cases } => {
                check_unique("variant", cases)?;
                cases.iter().try_for_each(|c| c.node.validate_in(anchors))
            }
            TypeNode::Optional { inner } => inner.validate_in(anchors),
            TypeNode::Vector { element } => element.validate_in(anchors),
            TypeNode::Recursive { id } => {
                if anchors.iter().any(|a| *a == id.as_str()) {
                    Ok(())
                } else {
                    Err(NodeError::DanglingRecursion(id.clone()))
                }
            }
            TypeNode::Named { id, node } => {
                anchors.push(id.as_str());
                let result = node.validate_in(anchors);
                anchors.pop();
                result
            }
        }
    }
}

fn check_unique(container: &'static str, members: &[FieldNode]) -> Result<(), NodeError> {
    for (i, member) in members.iter().enumerate() {
        if members[..i].iter().any(|m| m.name == member.name) {
            return Err(NodeError::DuplicateName {
                container,
                name: member.name.clone(),
            });
        }
    }
    Ok(())
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNode::Primitive { kind } => write!(f, "{}", kind),
            TypeNode::Record { fields } => {
                write!(f, "record {{")?;
                for (i, field) in fields.iter().enumerate() {
                    let sep = if i == 0 { " " } else { "; " };
                    write!(f, "{}{} : {}", sep, field.name, field.node)?;
                }
                if fields.is_empty() {
                    write!(f, "}}")
                } else {
                    write!(f, " }}")
                }
            }
            TypeNode::Variant { cases } => {
                write!(f, "variant {{")?;
                for (i, case) in cases.iter().enumerate() {
                    let sep = if i == 0 { " " } else { "; " };
                    match case.node {
                        TypeNode::Primitive {
                            kind: PrimitiveKind::Null,
                        } => write!(f, "{}{}", sep, case.name)?,
                        _ => write!(f, "{}{} : {}", sep, case.name, case.node)?,
                    }
                }
                if cases.is_empty() {
                    write!(f, "}}")
                } else {
                    write!(f, " }}")
                }
            }
            TypeNode::Optional { inner } => write!(f, "opt {}", inner),
            TypeNode::Vector { element } => write!(f, "vec {}", element),
            TypeNode::Recursive { id } => write!(f, "{}", id),
            TypeNode::Named { id, node } => write!(f, "{} = {}", id, node),
        }
    }
}
