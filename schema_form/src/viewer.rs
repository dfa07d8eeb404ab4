//! Form Viewer
//!
//! Read-only rendering of a value against its type. The value may have
//! drifted from the type: positions that do not fit render as
//! [`Control::Unknown`](crate::render::Control::Unknown), missing optional
//! slots render as absent and extra record fields are ignored.

use crate::bridge::PayloadCatalog;
use crate::config::EngineOptions;
use crate::errors::EngineError;
use crate::path::FieldPath;
use crate::render::RenderNode;
use crate::settings::SettingsTable;
use crate::value::Value;
use crate::walker::Walker;
use schema_types::TypeNode;
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct FormViewer {
    node: TypeNode,
    value: Value,
    table: SettingsTable,
    options: EngineOptions,
    expanded: BTreeSet<String>,
    catalog: Option<PayloadCatalog>,
}

impl FormViewer {
    pub fn mount(node: TypeNode, value: Value, table: SettingsTable) -> Result<Self, EngineError> {
        node.validate()?;
        Ok(Self {
            node,
            value,
            table,
            options: EngineOptions::default(),
            expanded: BTreeSet::new(),
            catalog: None,
        })
    }

    /// Mount from plain JSON. Never fails on the value; only the type is
    /// checked.
    pub fn from_json(node: TypeNode, json: &JsonValue, table: SettingsTable) -> Result<Self, EngineError> {
        let value = Value::from_json_lenient(json, &node);
        Self::mount(node, value, table)
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Decode payload leaves through the method tuples of `catalog`
    pub fn with_catalog(mut self, catalog: PayloadCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Render one more level below the collapsed recursion point at `path`
    pub fn expand(&mut self, path: &FieldPath) {
        self.expanded.insert(path.to_key());
    }

    pub fn render(&self) -> RenderNode {
        let mut walker = Walker::view(
            &self.table,
            &self.options,
            &self.value,
            &self.expanded,
            self.catalog.as_ref(),
        );
        let rendered = walker.render(&self.node);
        tracing::trace!(kind = self.node.kind_name(), "view rendered");
        rendered
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn node(&self) -> &TypeNode {
        &self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Control;
    use schema_types::PrimitiveKind;
    use serde_json::json;

    fn person() -> TypeNode {
        TypeNode::record([
            ("name", TypeNode::primitive(PrimitiveKind::Text)),
            ("age", TypeNode::primitive(PrimitiveKind::Nat8)),
            ("nick", TypeNode::optional(TypeNode::primitive(PrimitiveKind::Text))),
        ])
    }

    #[test]
    fn renders_a_matching_value() {
        let viewer = FormViewer::from_json(
            person(),
            &json!({"name": "ada", "age": 36, "nick": null}),
            SettingsTable::new(),
        )
        .expect("mount");
        let rendered = viewer.render();
        let name = rendered.find(&FieldPath::parse("name")).and_then(|n| n.leaf()).expect("name");
        assert_eq!(name.text, "ada");
        assert_eq!(
            rendered.find(&FieldPath::parse("nick")).map(|n| &n.control),
            Some(&Control::Optional {
                present: false,
                body: None
            })
        );
    }

    #[test]
    fn tolerates_skew() {
        let viewer = FormViewer::from_json(
            person(),
            &json!({"name": "ada", "age": "old", "extra": true}),
            SettingsTable::new(),
        )
        .expect("mount");
        let rendered = viewer.render();
        assert!(matches!(
            rendered.find(&FieldPath::parse("age")).map(|n| &n.control),
            Some(Control::Unknown { .. })
        ));
        assert!(matches!(
            rendered.find(&FieldPath::parse("nick")).map(|n| &n.control),
            Some(Control::Optional { present: false, .. })
        ));
        assert!(rendered.find(&FieldPath::parse("extra")).is_none());
    }

    #[test]
    fn rejects_dangling_back_reference() {
        let err = FormViewer::mount(TypeNode::recursive("Tree"), Value::Null, SettingsTable::new())
            .expect_err("dangling");
        assert!(matches!(err, EngineError::InvalidType(_)));
    }
}
