//! Type Expansion
//!
//! Turns the source form of a schema program into resolved `TypeNode` trees.
//! Every expanded definition is wrapped in a `Named` anchor; a reference to a
//! definition that is already being expanded on the current branch becomes a
//! `Recursive` back-reference instead of expanding forever.

use crate::error::{ResolveError, Result};
use crate::file::SchemaProgram;
use schema_types::{FieldDef, FieldNode, TypeExpr, TypeNode};
use std::sync::Arc;

/* Upper bound on the nodes one expansion may produce */
pub const MAX_EXPANDED_NODES: usize = 100_000;

/* How a caller picks the type to resolve from a program */
#[derive(Clone)]
pub enum TypeSelector {
    /* A named type definition */
    Name(String),
    /* Argument tuple of a method */
    MethodArgs(String),
    /* Result tuple of a method */
    MethodResults(String),
    /* Arbitrary selection over the parsed program */
    Select(Arc<dyn Fn(&SchemaProgram) -> Result<Selected> + Send + Sync>),
}

/* What a custom selector returns */
#[derive(Debug, Clone, PartialEq)]
pub enum Selected {
    Name(String),
    Node(TypeNode),
}

impl TypeSelector {
    pub fn name(name: impl Into<String>) -> Self {
        TypeSelector::Name(name.into())
    }

    pub fn method_args(method: impl Into<String>) -> Self {
        TypeSelector::MethodArgs(method.into())
    }

    pub fn method_results(method: impl Into<String>) -> Self {
        TypeSelector::MethodResults(method.into())
    }

    pub fn select<F>(f: F) -> Self
    where
        F: Fn(&SchemaProgram) -> Result<Selected> + Send + Sync + 'static,
    {
        TypeSelector::Select(Arc::new(f))
    }
}

impl std::fmt::Debug for TypeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeSelector::Name(n) => write!(f, "Name({})", n),
            TypeSelector::MethodArgs(m) => write!(f, "MethodArgs({})", m),
            TypeSelector::MethodResults(m) => write!(f, "MethodResults({})", m),
            TypeSelector::Select(_) => write!(f, "Select(..)"),
        }
    }
}

impl SchemaProgram {
    /* Expand a named definition into a validated TypeNode */
    pub fn expand_type(&self, name: &str) -> Result<TypeNode> {
        let node = Expander::new(self).expand_ref(name)?;
        node.validate()?;
        Ok(node)
    }

    /* Argument tuple of a method, as a record with fields "0", "1", ... */
    pub fn method_args(&self, method: &str) -> Result<TypeNode> {
        let def = self
            .method(method)
            .ok_or_else(|| ResolveError::UnknownMethod(method.to_string()))?;
        self.expand_tuple(&def.args)
    }

    pub fn method_results(&self, method: &str) -> Result<TypeNode> {
        let def = self
            .method(method)
            .ok_or_else(|| ResolveError::UnknownMethod(method.to_string()))?;
        self.expand_tuple(&def.results)
    }

    /* Expand a free-standing expression in the context of this program */
    pub fn expand_expr(&self, expr: &TypeExpr) -> Result<TypeNode> {
        let node = Expander::new(self).expand(expr)?;
        node.validate()?;
        Ok(node)
    }

    pub fn select(&self, selector: &TypeSelector) -> Result<TypeNode> {
        match selector {
            TypeSelector::Name(name) => self.expand_type(name),
            TypeSelector::MethodArgs(method) => self.method_args(method),
            TypeSelector::MethodResults(method) => self.method_results(method),
            TypeSelector::Select(f) => match f(self)? {
                Selected::Name(name) => self.expand_type(&name),
                Selected::Node(node) => {
                    node.validate()?;
                    Ok(node)
                }
            },
        }
    }

    fn expand_tuple(&self, items: &[TypeExpr]) -> Result<TypeNode> {
        let mut expander = Expander::new(self);
        let nodes = items
            .iter()
            .map(|item| expander.expand(item))
            .collect::<Result<Vec<_>>>()?;
        let node = TypeNode::tuple(nodes);
        node.validate()?;
        Ok(node)
    }
}

struct Expander<'p> {
    program: &'p SchemaProgram,
    /* Definitions being expanded on the current branch */
    in_progress: Vec<&'p str>,
    produced: usize,
    limit: usize,
}

impl<'p> Expander<'p> {
    fn new(program: &'p SchemaProgram) -> Self {
        Self::with_limit(program, MAX_EXPANDED_NODES)
    }

    fn with_limit(program: &'p SchemaProgram, limit: usize) -> Self {
        Self {
            program,
            in_progress: Vec::new(),
            produced: 0,
            limit,
        }
    }

    fn count(&mut self) -> Result<()> {
        self.produced += 1;
        if self.produced > self.limit {
            return Err(ResolveError::TooLarge { limit: self.limit });
        }
        Ok(())
    }

    fn expand_ref(&mut self, name: &str) -> Result<TypeNode> {
        self.count()?;
        if self.in_progress.iter().any(|n| *n == name) {
            tracing::trace!(type_name = name, "back-reference");
            return Ok(TypeNode::recursive(name));
        }

        let def = self
            .program
            .type_def(name)
            .ok_or_else(|| ResolveError::UnknownType(name.to_string()))?;

        self.in_progress.push(def.name.as_str());
        let expanded = self.expand(&def.kind);
        self.in_progress.pop();

        Ok(TypeNode::named(def.name.clone(), expanded?))
    }

    fn expand(&mut self, expr: &TypeExpr) -> Result<TypeNode> {
        self.count()?;
        Ok(match expr {
            TypeExpr::Primitive(kind) => TypeNode::primitive(*kind),
            TypeExpr::Record(record) => TypeNode::Record {
                fields: self.expand_members(&record.fields)?,
            },
            TypeExpr::Variant(variant) => TypeNode::Variant {
                cases: self.expand_members(&variant.cases)?,
            },
            TypeExpr::Optional(inner) => TypeNode::optional(self.expand(inner)?),
            TypeExpr::Vector(element) => TypeNode::vector(self.expand(element)?),
            TypeExpr::Tuple(items) => TypeNode::tuple(
                items
                    .iter()
                    .map(|item| self.expand(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            TypeExpr::Ref(name) => self.expand_ref(name)?,
        })
    }

    fn expand_members(&mut self, members: &[FieldDef]) -> Result<Vec<FieldNode>> {
        members
            .iter()
            .map(|m| {
                Ok(FieldNode {
                    name: m.name.clone(),
                    node: self.expand(&m.ty)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = r#"
package: demo
types:
  - name: Tree
    kind:
      record:
        fields:
          - name: label
            type:
              primitive: text
          - name: children
            type:
              vector:
                ref: Tree
  - name: Label
    kind:
      ref: Tree
  - name: Loop
    kind:
      record:
        fields:
          - name: again
            type:
              ref: Loop
methods:
  - name: plant
    args:
      - ref: Tree
      - primitive: nat64
"#;

    fn program() -> SchemaProgram {
        SchemaProgram::from_yaml(PROGRAM).expect("parse program")
    }

    #[test]
    fn self_reference_becomes_recursive() {
        let node = program().expand_type("Tree").expect("expand");
        let TypeNode::Named { id, node: inner } = &node else {
            panic!("expected named anchor");
        };
        assert_eq!(id, "Tree");
        let TypeNode::Record { fields } = inner.as_ref() else {
            panic!("expected record");
        };
        assert_eq!(
            fields[1].node,
            TypeNode::vector(TypeNode::recursive("Tree"))
        );
    }

    #[test]
    fn alias_nests_anchors() {
        let node = program().expand_type("Label").expect("expand");
        let TypeNode::Named { id, node: inner } = &node else {
            panic!("expected named anchor");
        };
        assert_eq!(id, "Label");
        assert!(matches!(inner.as_ref(), TypeNode::Named { id, .. } if id == "Tree"));
    }

    #[test]
    fn uninhabitable_cycle_is_still_representable() {
        let node = program().expand_type("Loop").expect("expand");
        assert_eq!(node.validate(), Ok(()));
    }

    #[test]
    fn method_args_form_a_tuple() {
        let node = program().method_args("plant").expect("args");
        assert!(node.is_tuple());
        assert_eq!(
            program().method_results("plant").expect("results"),
            TypeNode::tuple(Vec::new())
        );
    }

    #[test]
    fn unknown_names_are_reported() {
        assert_eq!(
            program().expand_type("Nope"),
            Err(ResolveError::UnknownType("Nope".to_string()))
        );
        assert_eq!(
            program().method_args("nope"),
            Err(ResolveError::UnknownMethod("nope".to_string()))
        );
    }

    #[test]
    fn shared_definitions_are_bounded() {
        /* Each level references the one below twice */
        let mut yaml = String::from("package: diamond\ntypes:\n  - name: L0\n    kind:\n      primitive: nat8\n");
        for level in 1..=24 {
            yaml.push_str(&format!(
                "  - name: L{level}\n    kind:\n      record:\n        fields:\n          - name: left\n            type:\n              ref: L{below}\n          - name: right\n            type:\n              ref: L{below}\n",
                level = level,
                below = level - 1
            ));
        }
        let program = SchemaProgram::from_yaml(&yaml).expect("parse program");

        assert!(program.expand_type("L4").is_ok());
        assert_eq!(
            program.expand_type("L24"),
            Err(ResolveError::TooLarge {
                limit: MAX_EXPANDED_NODES
            })
        );

        let small = Expander::with_limit(&program, 10).expand_ref("L4");
        assert_eq!(small, Err(ResolveError::TooLarge { limit: 10 }));
    }

    #[test]
    fn custom_selector_can_build_a_node() {
        let selector = TypeSelector::select(|program| {
            let first = program.method_names().next().unwrap_or_default().to_string();
            Ok(Selected::Node(program.method_args(&first)?))
        });
        let node = program().select(&selector).expect("select");
        assert!(node.is_tuple());
    }
}
