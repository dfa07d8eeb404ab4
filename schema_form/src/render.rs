/* Render tree produced by editors and viewers.
 *
 * A UI layer turns each node into widgets and routes user input back to
 * the editor using the node's `path`. Serializes to JSON for the browser
 * binding and the CLI. */

use crate::leaf::Widget;
use crate::path::FieldPath;
use schema_types::PrimitiveKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    /* Stable identity of the position; list elements keep their key when
     * the list is reordered */
    pub key: String,
    pub path: FieldPath,
    pub label: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(flatten)]
    pub control: Control,
    /* Caller content appended after the built-in control */
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "kebab-case")]
pub enum Control {
    Leaf(LeafControl),
    Record {
        fields: Vec<RenderNode>,
    },
    Variant {
        cases: Vec<CaseOption>,
        selected: Option<String>,
        body: Option<Box<RenderNode>>,
    },
    Optional {
        present: bool,
        body: Option<Box<RenderNode>>,
    },
    Vector {
        items: Vec<RenderNode>,
        can_add: bool,
    },
    /* Recursion ceiling reached; expanding the path renders one more level */
    LoadMore {
        type_id: String,
    },
    /* Output of a replacing adornment */
    Custom {
        content: JsonValue,
    },
    Payload(PayloadControl),
    /* The value does not fit the type at this position */
    Unknown {
        reason: String,
    },
    /* The type itself could not be obtained */
    Unavailable {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafControl {
    pub kind: PrimitiveKind,
    pub widget: Widget,
    /* What the input box shows: the formatted value, or the draft the
     * user typed when it did not parse */
    pub text: String,
    /* Null while a draft is pending */
    pub value: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOption {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadControl {
    /* idle, pending, decoded, decode-failed or unresolved */
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /* Raw bytes as 0x-hex */
    pub bytes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /* Decoded tuple, rendered by a nested editor or viewer */
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Box<RenderNode>>,
}

impl RenderNode {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            key: String::new(),
            path: FieldPath::root(),
            label: String::new(),
            hidden: false,
            disabled: false,
            errors: Vec::new(),
            control: Control::Unavailable {
                reason: reason.into(),
            },
            end: None,
        }
    }

    pub fn children(&self) -> Vec<&RenderNode> {
        match &self.control {
            Control::Record { fields } => fields.iter().collect(),
            Control::Vector { items, .. } => items.iter().collect(),
            Control::Variant { body, .. } | Control::Optional { body, .. } => {
                body.iter().map(|b| b.as_ref()).collect()
            }
            _ => Vec::new(),
        }
    }

    /* Pre-order visit of this node and its structural descendants. Payload
     * bodies belong to another tuple and are not visited. */
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a RenderNode)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    pub fn find(&self, path: &FieldPath) -> Option<&RenderNode> {
        if self.path == *path {
            return Some(self);
        }
        self.children().into_iter().find_map(|child| child.find(path))
    }

    /* Every path in the tree, in visiting order */
    pub fn paths(&self) -> Vec<FieldPath> {
        let mut paths = Vec::new();
        self.walk(&mut |node| paths.push(node.path.clone()));
        paths
    }

    pub fn leaf(&self) -> Option<&LeafControl> {
        match &self.control {
            Control::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&PayloadControl> {
        match &self.control {
            Control::Payload(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(path: &str, text: &str) -> RenderNode {
        RenderNode {
            key: path.to_string(),
            path: FieldPath::parse(path),
            label: path.to_string(),
            hidden: false,
            disabled: false,
            errors: Vec::new(),
            control: Control::Leaf(LeafControl {
                kind: PrimitiveKind::Text,
                widget: Widget::Text,
                text: text.to_string(),
                value: JsonValue::String(text.to_string()),
                placeholder: None,
                extra: Map::new(),
            }),
            end: None,
        }
    }

    #[test]
    fn serializes_with_flattened_control() {
        let node = leaf("name", "ada");
        let json = node.to_json();
        assert_eq!(json["control"], "leaf");
        assert_eq!(json["widget"], "text");
        assert_eq!(json["path"], "name");
        assert!(json.get("errors").is_none());

        let back: RenderNode = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, node);
    }

    #[test]
    fn walk_and_find() {
        let root = RenderNode {
            control: Control::Record {
                fields: vec![leaf("a", "1"), leaf("b", "2")],
            },
            ..RenderNode::unavailable("")
        };
        assert_eq!(
            root.paths(),
            vec![FieldPath::root(), FieldPath::parse("a"), FieldPath::parse("b")]
        );
        assert_eq!(
            root.find(&FieldPath::parse("b")).and_then(|n| n.leaf()).map(|l| l.text.as_str()),
            Some("2")
        );
    }
}
